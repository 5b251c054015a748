//! CoverageJSON document types.
//!
//! Covers the subset produced by the encoder: a `CoverageCollection` of
//! `MultiPoint` coverages, each with a time axis, a composite tuple axis and
//! one 1-D `NdArray` per parameter. All maps are ordered so that encoding
//! the same input twice yields byte-identical JSON.
//!
//! See: <https://covjson.org/>

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::CovJsonResult;
use crate::parameters::CovJsonParameter;
use crate::tree::AxisValue;

/// Scalar request metadata (axis name → representative value).
pub type MarsMetadata = BTreeMap<String, AxisValue>;

/// A CoverageJSON document holding several coverages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageCollection {
    /// Document type (always "CoverageCollection").
    #[serde(rename = "type")]
    pub type_: CoverageType,

    /// Domain type shared by all coverages.
    #[serde(rename = "domainType")]
    pub domain_type: DomainType,

    /// Reference systems for the domain axes.
    #[serde(default)]
    pub referencing: Vec<ReferenceSystemConnection>,

    /// Parameter definitions keyed by parameter shortname.
    #[serde(default)]
    pub parameters: BTreeMap<String, CovJsonParameter>,

    /// Coverages in grouping-key order.
    #[serde(default)]
    pub coverages: Vec<Coverage>,
}

impl CoverageCollection {
    /// Create an empty document.
    pub fn new(domain_type: DomainType) -> Self {
        Self {
            type_: CoverageType::CoverageCollection,
            domain_type,
            referencing: Vec::new(),
            parameters: BTreeMap::new(),
            coverages: Vec::new(),
        }
    }

    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> CovJsonResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> CovJsonResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> CovJsonResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Coverage type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CoverageType {
    /// Single coverage.
    Coverage,
    /// Collection of coverages.
    CoverageCollection,
}

/// Domain types produced and read by this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DomainType {
    /// Multi-point set.
    MultiPoint,
}

/// One coverage: a domain, its ranges and the request metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coverage {
    /// Request metadata. Shared between the coverages of one document.
    #[serde(rename = "mars:metadata", default)]
    pub mars_metadata: Arc<MarsMetadata>,

    /// Type (always "Coverage").
    #[serde(rename = "type")]
    pub type_: CoverageType,

    pub domain: Domain,

    /// Data arrays keyed by parameter shortname.
    #[serde(default)]
    pub ranges: BTreeMap<String, NdArray>,
}

impl Coverage {
    pub fn new(mars_metadata: Arc<MarsMetadata>, domain: Domain) -> Self {
        Self {
            mars_metadata,
            type_: CoverageType::Coverage,
            domain,
            ranges: BTreeMap::new(),
        }
    }

    /// Add a range array for a parameter.
    pub fn with_range(mut self, name: impl Into<String>, range: NdArray) -> Self {
        self.ranges.insert(name.into(), range);
        self
    }

    /// First timestamp on the time axis.
    pub fn timestamp(&self) -> Option<&str> {
        self.domain.axes.t.values.first().map(String::as_str)
    }
}

/// The domain of a coverage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Domain {
    /// Domain type (always "Domain").
    #[serde(rename = "type")]
    pub type_: String,

    /// Axis definitions.
    pub axes: DomainAxes,
}

impl Domain {
    /// Create a domain with a time axis and a composite tuple axis.
    pub fn composite(
        timestamps: Vec<String>,
        coordinates: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            type_: "Domain".to_string(),
            axes: DomainAxes {
                t: TimeAxis { values: timestamps },
                composite: CompositeAxis {
                    data_type: "tuple".to_string(),
                    coordinates,
                    values,
                },
            },
        }
    }

    /// Number of composite coordinates.
    pub fn len(&self) -> usize {
        self.axes.composite.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.composite.values.is_empty()
    }
}

/// Axes of a MultiPoint domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainAxes {
    pub t: TimeAxis,
    pub composite: CompositeAxis,
}

/// Time axis (ISO 8601 strings).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeAxis {
    pub values: Vec<String>,
}

/// Composite axis: one tuple per point, components named by `coordinates`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositeAxis {
    /// Data type (always "tuple").
    #[serde(rename = "dataType")]
    pub data_type: String,

    /// Component names, in the order of the document's reference system.
    pub coordinates: Vec<String>,

    /// Tuples such as `[lat, lon]` or `[lat, lon, level]`.
    pub values: Vec<Vec<f64>>,
}

/// Connection between axes and their reference system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceSystemConnection {
    /// Axes that use this reference system.
    pub coordinates: Vec<String>,

    /// The reference system.
    pub system: ReferenceSystem,
}

impl ReferenceSystemConnection {
    /// A geographic CRS over the given coordinate names.
    pub fn geographic(coordinates: Vec<String>, id: impl Into<String>) -> Self {
        Self {
            coordinates,
            system: ReferenceSystem::Geographic { id: id.into() },
        }
    }
}

/// Reference system definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ReferenceSystem {
    /// Geographic coordinate reference system.
    #[serde(rename = "GeographicCRS")]
    Geographic {
        /// CRS identifier URI.
        id: String,
    },
}

/// N-dimensional array containing data values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NdArray {
    /// Type (always "NdArray").
    #[serde(rename = "type")]
    pub type_: String,

    /// Data type of values.
    #[serde(rename = "dataType")]
    pub data_type: String,

    /// Shape of the array.
    #[serde(default)]
    pub shape: Vec<usize>,

    /// Names of axes in order.
    #[serde(rename = "axisNames", default)]
    pub axis_names: Vec<String>,

    /// The data values (null for missing data).
    pub values: Vec<Option<f64>>,
}

impl NdArray {
    /// Create an N-dimensional float array. NaN values become nulls.
    pub fn new(values: Vec<f64>, shape: Vec<usize>, axis_names: Vec<String>) -> Self {
        Self::with_missing(
            values
                .into_iter()
                .map(|v| if v.is_nan() { None } else { Some(v) })
                .collect(),
            shape,
            axis_names,
        )
    }

    /// Create an array with missing data support.
    pub fn with_missing(
        values: Vec<Option<f64>>,
        shape: Vec<usize>,
        axis_names: Vec<String>,
    ) -> Self {
        Self {
            type_: "NdArray".to_string(),
            data_type: "float".to_string(),
            shape,
            axis_names,
            values,
        }
    }

    /// 1-D array over the points of a coverage, with the parameter as axis name.
    pub fn series(parameter: &str, values: Vec<f64>) -> Self {
        let shape = vec![values.len()];
        Self::new(values, shape, vec![parameter.to_string()])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values as floats, with missing entries as NaN.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    }
}
