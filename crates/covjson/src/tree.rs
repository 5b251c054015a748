//! Hierarchical query results and axis classification.
//!
//! A result tree has one level per request dimension (date, number, step,
//! levelist, param, latitude, ...). Leaves carry the spatial values of the
//! innermost axis and a flat array of numeric results.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CovJsonError, CovJsonResult};

/// Role of a tree axis, resolved from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisRole {
    Date,
    Number,
    Step,
    Levelist,
    Latitude,
    Longitude,
    Param,
    /// Any other request key; contributes a scalar to `mars:metadata`.
    Other,
}

impl AxisRole {
    /// Classify an axis name. Unknown names are never an error.
    pub fn from_name(name: &str) -> Self {
        match name {
            "date" => AxisRole::Date,
            "number" => AxisRole::Number,
            "step" => AxisRole::Step,
            "levelist" => AxisRole::Levelist,
            "latitude" => AxisRole::Latitude,
            "longitude" => AxisRole::Longitude,
            "param" => AxisRole::Param,
            _ => AxisRole::Other,
        }
    }

    /// Canonical axis name for this role (`None` for `Other`).
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            AxisRole::Date => Some("date"),
            AxisRole::Number => Some("number"),
            AxisRole::Step => Some("step"),
            AxisRole::Levelist => Some("levelist"),
            AxisRole::Latitude => Some("latitude"),
            AxisRole::Longitude => Some("longitude"),
            AxisRole::Param => Some("param"),
            AxisRole::Other => None,
        }
    }
}

/// A scalar value on a tree axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AxisValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl AxisValue {
    /// Read the value as a float; text is parsed.
    pub fn as_f64(&self, axis: &str) -> CovJsonResult<f64> {
        match self {
            AxisValue::Int(v) => Ok(*v as f64),
            AxisValue::Float(v) => Ok(*v),
            AxisValue::Text(s) => {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| CovJsonError::NonNumericValue {
                        axis: axis.to_string(),
                        value: s.clone(),
                    })
            }
        }
    }

    /// Render the value as an ISO 8601 UTC timestamp (`...Z`).
    ///
    /// Recognised inputs are `YYYYMMDD`, `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS`
    /// and `YYYY-MM-DD HH:MM:SS`. Anything else is kept verbatim.
    pub fn to_timestamp(&self) -> String {
        let raw = self.to_string();
        let trimmed = raw.strip_suffix('Z').unwrap_or(&raw);
        match parse_datetime(trimmed) {
            Some(dt) => format!("{}Z", dt.format("%Y-%m-%dT%H:%M:%S")),
            None => format!("{}Z", trimmed),
        }
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y%m%d", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Int(v) => write!(f, "{}", v),
            AxisValue::Float(v) => write!(f, "{}", v),
            AxisValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AxisValue {
    fn from(v: i64) -> Self {
        AxisValue::Int(v)
    }
}

impl From<i32> for AxisValue {
    fn from(v: i32) -> Self {
        AxisValue::Int(v as i64)
    }
}

impl From<f64> for AxisValue {
    fn from(v: f64) -> Self {
        AxisValue::Float(v)
    }
}

impl From<&str> for AxisValue {
    fn from(v: &str) -> Self {
        AxisValue::Text(v.to_string())
    }
}

impl From<String> for AxisValue {
    fn from(v: String) -> Self {
        AxisValue::Text(v)
    }
}

/// One node of a result tree.
///
/// The node owns its children; the whole tree is released together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultTree {
    /// Axis name (e.g. "date", "param", "class").
    pub axis: String,

    /// Values selected on this axis.
    #[serde(default)]
    pub values: Vec<AxisValue>,

    /// Flat numeric results; only populated on leaves. JSON `null` reads as NaN.
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_floats",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub result: Vec<f64>,

    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResultTree>,
}

fn deserialize_nullable_floats<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

impl ResultTree {
    /// Create the root node of a tree.
    pub fn root() -> Self {
        Self::node("root", Vec::<AxisValue>::new())
    }

    /// Create an internal node.
    pub fn node<V: Into<AxisValue>>(axis: impl Into<String>, values: Vec<V>) -> Self {
        Self {
            axis: axis.into(),
            values: values.into_iter().map(Into::into).collect(),
            result: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a leaf node carrying spatial values and results.
    pub fn leaf<V: Into<AxisValue>>(
        axis: impl Into<String>,
        values: Vec<V>,
        result: Vec<f64>,
    ) -> Self {
        Self::node(axis, values).with_result(result)
    }

    /// Append a child.
    pub fn with_child(mut self, child: ResultTree) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = ResultTree>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the leaf result array.
    pub fn with_result(mut self, result: Vec<f64>) -> Self {
        self.result = result;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn role(&self) -> AxisRole {
        AxisRole::from_name(&self.axis)
    }

    /// Number of levels below and including this node.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(ResultTree::depth).max().unwrap_or(0)
    }

    /// Number of leaves under this node.
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(ResultTree::leaf_count).sum()
        }
    }
}
