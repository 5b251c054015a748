//! Common test fixtures for CoverageJSON tests.
//!
//! This module provides pre-defined catalogs, trees and documents that
//! represent common scenarios in point extraction.

use std::io::Write;
use std::sync::Arc;

use covjson::{ParameterCatalog, ParameterDefinition, ResultTree};
use tempfile::NamedTempFile;

/// Common date values.
pub mod dates {
    /// Single forecast date as a MARS integer.
    pub const DATE: i64 = 20230101;

    /// Two consecutive dates.
    pub const TWO_DATES: [i64; 2] = [20230101, 20230102];

    /// ISO form of [`DATE`].
    pub const DATE_ISO: &str = "2023-01-01T00:00:00Z";
}

/// Common parameter ids.
pub mod params {
    /// 2 metre temperature
    pub const T2M: i64 = 167;
    /// Total precipitation
    pub const TP: i64 = 228;
    /// Temperature on pressure levels
    pub const T: i64 = 130;
}

/// Catalog YAML with a handful of surface parameters.
pub const CATALOG_YAML: &str = r#"parameters:
  - id: 167
    shortname: 2t
    description: 2 metre temperature
    units: K
  - id: 228
    shortname: tp
    description: Total precipitation
    units: m
  - id: 130
    shortname: t
    description: Temperature
    units: K
"#;

/// Encoder configuration YAML for the level grouping.
pub const LEVEL_CONFIG_YAML: &str = r#"grouping: date_level
reference:
  coordinates: [x, y, z]
"#;

/// Small catalog shared by integration tests.
pub fn test_catalog() -> Arc<ParameterCatalog> {
    let catalog = ParameterCatalog::from_definitions(vec![
        ParameterDefinition::new(167, "2t", "2 metre temperature", "K"),
        ParameterDefinition::new(228, "tp", "Total precipitation", "m"),
        ParameterDefinition::new(130, "t", "Temperature", "K"),
        ParameterDefinition::new(500011, "t2m", "Temperature at 2 metres", "K"),
    ])
    .expect("fixture catalog has unique entries");
    Arc::new(catalog)
}

/// One date, one parameter, one level and one spatial value.
pub fn single_point_tree() -> ResultTree {
    ResultTree::root().with_child(
        ResultTree::node("date", vec![dates::DATE]).with_child(
            ResultTree::node("param", vec![params::T2M]).with_child(
                ResultTree::node("latitude", vec![51.5])
                    .with_child(ResultTree::leaf("longitude", vec![-0.1], vec![280.5])),
            ),
        ),
    )
}

/// Result tree in its JSON interchange form.
pub const SINGLE_POINT_TREE_JSON: &str = r#"{
  "axis": "root",
  "children": [{
    "axis": "date",
    "values": [20230101],
    "children": [{
      "axis": "param",
      "values": ["167"],
      "children": [{
        "axis": "latitude",
        "values": [51.5],
        "children": [{
          "axis": "longitude",
          "values": [-0.1],
          "result": [280.5]
        }]
      }]
    }]
  }]
}"#;

/// Write `contents` to a temporary file that lives as long as the handle.
pub fn write_temp_file(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}
