//! Labeled two-dimensional dataset used as the array export target.
//!
//! Every variable is a dense `(datetimes, points)` array; the points carry
//! `x`, `y` and `z` coordinates. Attributes follow the CF-like names used by
//! array libraries (`type`, `units`, `long_name`).

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{CovJsonError, CovJsonResult};
use crate::tree::AxisValue;

/// Name of the time dimension.
pub const DATETIME_DIM: &str = "datetimes";
/// Name of the point dimension.
pub const POINT_DIM: &str = "points";

/// One data variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataArray {
    pub dims: Vec<String>,
    pub values: Array2<f64>,
    pub attrs: BTreeMap<String, String>,
}

impl DataArray {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Values of one datetime row.
    pub fn row(&self, datetime: usize) -> ArrayView1<'_, f64> {
        self.values.row(datetime)
    }
}

/// A set of variables sharing `(datetimes, points)` dimensions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabeledDataset {
    pub dims: Vec<String>,
    pub datetimes: Vec<String>,
    pub points: Vec<usize>,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    /// NaN where the source coordinates had no vertical component.
    pub z: Array1<f64>,
    pub data_vars: BTreeMap<String, DataArray>,
    pub attrs: BTreeMap<String, AxisValue>,
}

impl LabeledDataset {
    /// Create a dataset without variables.
    pub fn new(
        datetimes: Vec<String>,
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
    ) -> CovJsonResult<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(CovJsonError::MalformedDocument(format!(
                "coordinate lengths differ: x={}, y={}, z={}",
                x.len(),
                y.len(),
                z.len()
            )));
        }

        Ok(Self {
            dims: vec![DATETIME_DIM.to_string(), POINT_DIM.to_string()],
            datetimes,
            points: (0..x.len()).collect(),
            x: Array1::from(x),
            y: Array1::from(y),
            z: Array1::from(z),
            data_vars: BTreeMap::new(),
            attrs: BTreeMap::new(),
        })
    }

    pub fn n_datetimes(&self) -> usize {
        self.datetimes.len()
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Add a variable; its shape must be `(datetimes, points)`.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        values: Array2<f64>,
        attrs: BTreeMap<String, String>,
    ) -> CovJsonResult<()> {
        let name = name.into();
        let expected = (self.n_datetimes(), self.n_points());
        if values.dim() != expected {
            return Err(CovJsonError::MalformedDocument(format!(
                "variable '{}' has shape {:?}, expected {:?}",
                name,
                values.dim(),
                expected
            )));
        }

        self.data_vars.insert(
            name,
            DataArray {
                dims: self.dims.clone(),
                values,
                attrs,
            },
        );
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&DataArray> {
        self.data_vars.get(name)
    }

    /// Single value of a variable.
    pub fn value(&self, name: &str, datetime: usize, point: usize) -> Option<f64> {
        self.variable(name)
            .and_then(|var| var.values.get((datetime, point)).copied())
    }

    /// The `date` attribute, if present.
    pub fn date(&self) -> Option<&AxisValue> {
        self.attrs.get("date")
    }
}
