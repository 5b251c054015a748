//! Encoder configuration loading and types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CovJsonError, CovJsonResult};
use crate::tree::AxisRole;

/// OGC CRS84 identifier used for the composite spatial axis.
pub const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

/// Which tree axes vary inside or across coverages.
///
/// Axes that do not vary under the selected grouping are recorded as
/// scalar `mars:metadata` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingAxes {
    /// One coverage per date; composite tuples are `[lat, value]`.
    #[default]
    Date,
    /// One coverage per date; levels vary inside it and tuples are `[lat, value, level]`.
    DateLevel,
    /// One coverage per (date, number, step); levels vary inside it.
    DateNumberStep,
}

impl GroupingAxes {
    /// Whether an axis of this role varies under this grouping.
    pub fn varies(&self, role: AxisRole) -> bool {
        match role {
            AxisRole::Date | AxisRole::Param | AxisRole::Latitude | AxisRole::Longitude => true,
            AxisRole::Levelist => !matches!(self, GroupingAxes::Date),
            AxisRole::Number | AxisRole::Step => matches!(self, GroupingAxes::DateNumberStep),
            AxisRole::Other => false,
        }
    }

    /// Whether composite coordinates carry a level component.
    pub fn has_level(&self) -> bool {
        self.varies(AxisRole::Levelist)
    }

    /// Whether coverages are split by ensemble member and forecast step.
    pub fn splits_members(&self) -> bool {
        matches!(self, GroupingAxes::DateNumberStep)
    }
}

impl fmt::Display for GroupingAxes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupingAxes::Date => "date",
            GroupingAxes::DateLevel => "date_level",
            GroupingAxes::DateNumberStep => "date_number_step",
        };
        f.write_str(s)
    }
}

impl FromStr for GroupingAxes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "date" => Ok(GroupingAxes::Date),
            "date_level" => Ok(GroupingAxes::DateLevel),
            "date_number_step" => Ok(GroupingAxes::DateNumberStep),
            other => Err(format!(
                "unknown grouping '{}' (expected date, date_level or date_number_step)",
                other
            )),
        }
    }
}

/// Coordinate reference system attached to every document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Component names of the composite axis.
    #[serde(default = "default_coordinates")]
    pub coordinates: Vec<String>,

    /// Geographic CRS identifier URI.
    #[serde(default = "default_crs_id")]
    pub crs_id: String,
}

fn default_coordinates() -> Vec<String> {
    vec!["x".to_string(), "y".to_string(), "z".to_string()]
}

fn default_crs_id() -> String {
    CRS84.to_string()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            coordinates: default_coordinates(),
            crs_id: default_crs_id(),
        }
    }
}

/// Encoder configuration, usually loaded from YAML.
///
/// ```yaml
/// grouping: date_level
/// reference:
///   coordinates: [x, y, z]
///   crs_id: http://www.opengis.net/def/crs/OGC/1.3/CRS84
/// parameter_catalog: /etc/covjson/parameters.yaml
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    #[serde(default)]
    pub grouping: GroupingAxes,

    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Optional parameter catalog file; the built-in catalog is used otherwise.
    #[serde(default)]
    pub parameter_catalog: Option<PathBuf>,
}

impl EncoderConfig {
    /// Configuration with the given grouping and defaults elsewhere.
    pub fn with_grouping(grouping: GroupingAxes) -> Self {
        Self {
            grouping,
            ..Self::default()
        }
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> CovJsonResult<Self> {
        let config: EncoderConfig = serde_yaml::from_str(content)?;
        if config.reference.coordinates.len() < 2 {
            return Err(CovJsonError::InvalidConfig(format!(
                "reference needs at least 2 coordinates, got {:?}",
                config.reference.coordinates
            )));
        }
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> CovJsonResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(path = ?path, grouping = %config.grouping, "Loaded encoder config");
        Ok(config)
    }
}
