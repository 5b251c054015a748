//! Reading CoverageJSON documents back into coordinate/value containers.
//!
//! The decoder holds the document read-only. [`Decoder::to_dataset`] realigns
//! the `(datetime, point)` pairs of all coverages into one dense array per
//! parameter.

use std::collections::BTreeMap;

use ndarray::Array2;
use tracing::debug;

use crate::coverage_json::{
    CoverageCollection, Domain, DomainAxes, MarsMetadata, NdArray,
};
use crate::dataset::LabeledDataset;
use crate::error::{CovJsonError, CovJsonResult};
use crate::parameters::CovJsonParameter;
use crate::tree::AxisValue;

/// Read-only view over a decoded document.
#[derive(Debug, Clone)]
pub struct Decoder {
    document: CoverageCollection,
}

impl Decoder {
    pub fn new(document: CoverageCollection) -> Self {
        Self { document }
    }

    /// Parse a document and wrap it.
    pub fn from_json(json: &str) -> CovJsonResult<Self> {
        Ok(Self::new(CoverageCollection::from_json(json)?))
    }

    pub fn document(&self) -> &CoverageCollection {
        &self.document
    }

    /// Domain of every coverage, in document order.
    pub fn domains(&self) -> Vec<&Domain> {
        self.document.coverages.iter().map(|c| &c.domain).collect()
    }

    /// Ranges of every coverage, in document order.
    pub fn ranges(&self) -> Vec<&BTreeMap<String, NdArray>> {
        self.document.coverages.iter().map(|c| &c.ranges).collect()
    }

    /// Parameter names declared by the document.
    pub fn parameters(&self) -> Vec<&str> {
        self.document.parameters.keys().map(String::as_str).collect()
    }

    /// One value list per coverage for each parameter. Missing values are NaN.
    pub fn get_values(&self) -> CovJsonResult<BTreeMap<String, Vec<Vec<f64>>>> {
        let mut values = BTreeMap::new();
        for parameter in self.document.parameters.keys() {
            let per_coverage = self
                .document
                .coverages
                .iter()
                .enumerate()
                .map(|(i, coverage)| {
                    coverage
                        .ranges
                        .get(parameter)
                        .map(NdArray::to_f64_vec)
                        .ok_or_else(|| missing_range(parameter, i))
                })
                .collect::<CovJsonResult<Vec<_>>>()?;
            values.insert(parameter.clone(), per_coverage);
        }
        Ok(values)
    }

    /// Axes of the first coverage.
    pub fn get_coordinates(&self) -> CovJsonResult<&DomainAxes> {
        self.document
            .coverages
            .first()
            .map(|c| &c.domain.axes)
            .ok_or_else(empty_document)
    }

    /// `mars:metadata` of every coverage, in document order.
    pub fn mars_metadata(&self) -> Vec<&MarsMetadata> {
        self.document
            .coverages
            .iter()
            .map(|c| c.mars_metadata.as_ref())
            .collect()
    }

    pub fn get_parameter_metadata(&self, parameter: &str) -> CovJsonResult<&CovJsonParameter> {
        self.document
            .parameters
            .get(parameter)
            .ok_or_else(|| CovJsonError::UnknownParameter(parameter.to_string()))
    }

    /// Variable attributes `type`, `units` and `long_name` of a parameter.
    pub fn parameter_attrs(&self, parameter: &str) -> CovJsonResult<BTreeMap<String, String>> {
        let metadata = self.get_parameter_metadata(parameter)?;
        let mut attrs = BTreeMap::new();
        attrs.insert("type".to_string(), metadata.type_.clone());
        attrs.insert(
            "units".to_string(),
            metadata.unit_symbol(parameter)?.to_string(),
        );
        attrs.insert(
            "long_name".to_string(),
            metadata.observed_property_id(parameter)?.to_string(),
        );
        Ok(attrs)
    }

    /// Export to a labeled `(datetimes, points)` dataset.
    ///
    /// Points and their `x`, `y`, `z` coordinates come from the first
    /// coverage; every coverage contributes one datetime row. Variables are
    /// keyed by their `long_name`.
    pub fn to_dataset(&self) -> CovJsonResult<LabeledDataset> {
        let axes = self.get_coordinates()?;
        let n_points = axes.composite.values.len();

        let (mut x, mut y, mut z) = (
            Vec::with_capacity(n_points),
            Vec::with_capacity(n_points),
            Vec::with_capacity(n_points),
        );
        for tuple in &axes.composite.values {
            match tuple.as_slice() {
                [a, b] => {
                    x.push(*a);
                    y.push(*b);
                    z.push(f64::NAN);
                }
                [a, b, c, ..] => {
                    x.push(*a);
                    y.push(*b);
                    z.push(*c);
                }
                _ => {
                    return Err(CovJsonError::MalformedDocument(format!(
                        "composite tuple {:?} has fewer than two components",
                        tuple
                    )))
                }
            }
        }

        let datetimes = self
            .document
            .coverages
            .iter()
            .enumerate()
            .map(|(i, coverage)| {
                coverage.timestamp().map(str::to_string).ok_or_else(|| {
                    CovJsonError::MalformedDocument(format!(
                        "coverage {} has an empty time axis",
                        i
                    ))
                })
            })
            .collect::<CovJsonResult<Vec<_>>>()?;

        for (i, domain) in self.domains().into_iter().enumerate() {
            if domain.len() != n_points {
                return Err(CovJsonError::MalformedDocument(format!(
                    "coverage {} has {} points, expected {}",
                    i,
                    domain.len(),
                    n_points
                )));
            }
        }

        let mut dataset = LabeledDataset::new(datetimes, x, y, z)?;

        for parameter in self.document.parameters.keys() {
            let attrs = self.parameter_attrs(parameter)?;
            let mut values = Array2::from_elem((dataset.n_datetimes(), n_points), f64::NAN);

            for (row, coverage) in self.document.coverages.iter().enumerate() {
                let range = coverage
                    .ranges
                    .get(parameter)
                    .ok_or_else(|| missing_range(parameter, row))?;
                if range.len() != n_points {
                    return Err(CovJsonError::MalformedDocument(format!(
                        "range '{}' of coverage {} has {} values, expected {}",
                        parameter,
                        row,
                        range.len(),
                        n_points
                    )));
                }
                for (col, value) in range.values.iter().enumerate() {
                    values[[row, col]] = value.unwrap_or(f64::NAN);
                }
            }

            let name = attrs
                .get("long_name")
                .cloned()
                .unwrap_or_else(|| parameter.clone());
            dataset.add_variable(name, values, attrs)?;
        }

        if let Some(first) = self.document.coverages.first() {
            for (key, value) in first.mars_metadata.iter() {
                dataset.attrs.insert(key.clone(), value.clone());
            }
            if let Some(date) = first.timestamp() {
                dataset
                    .attrs
                    .insert("date".to_string(), AxisValue::from(date));
            }
        }

        debug!(
            datetimes = dataset.n_datetimes(),
            points = dataset.n_points(),
            variables = dataset.data_vars.len(),
            "Decoded document to labeled dataset"
        );
        Ok(dataset)
    }
}

fn missing_range(parameter: &str, coverage: usize) -> CovJsonError {
    CovJsonError::MalformedDocument(format!(
        "coverage {} has no range for parameter '{}'",
        coverage, parameter
    ))
}

fn empty_document() -> CovJsonError {
    CovJsonError::MalformedDocument("document has no coverages".to_string())
}
