//! CoverageJSON encoding and decoding for point-extraction results
//!
//! This crate turns hierarchical query results (a tree whose levels are
//! axes such as date, number, step, levelist, param and latitude) into a
//! `MultiPoint` CoverageJSON `CoverageCollection`, and reads such documents
//! back into a labeled `(datetimes, points)` dataset.
//!
//! # Grouping
//!
//! Which axes split coverages is selected with [`GroupingAxes`]:
//! - `Date`: one coverage per date, tuples `[lat, lon]`
//! - `DateLevel`: one coverage per date, tuples `[lat, lon, level]`
//! - `DateNumberStep`: one coverage per (date, number, step)
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use covjson::{Encoder, EncoderConfig, ParameterCatalog, ResultTree};
//!
//! let tree = ResultTree::root().with_child(
//!     ResultTree::node("date", vec![20230101]).with_child(
//!         ResultTree::node("param", vec![167]).with_child(
//!             ResultTree::node("latitude", vec![51.5])
//!                 .with_child(ResultTree::leaf("longitude", vec![-0.1], vec![280.5])),
//!         ),
//!     ),
//! );
//!
//! let catalog = Arc::new(ParameterCatalog::builtin().unwrap());
//! let doc = Encoder::new(EncoderConfig::default(), catalog)
//!     .from_tree(&tree)
//!     .unwrap();
//! assert_eq!(doc.coverages.len(), 1);
//! assert!(doc.parameters.contains_key("2t"));
//! ```

pub mod config;
pub mod coverage_json;
pub mod dataset;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod flatten;
pub mod parameters;
pub mod tree;

// Re-export commonly used types
pub use config::{EncoderConfig, GroupingAxes, ReferenceConfig, CRS84};
pub use coverage_json::{
    Coverage, CoverageCollection, Domain, DomainType, MarsMetadata, NdArray, ReferenceSystem,
    ReferenceSystemConnection,
};
pub use dataset::{DataArray, LabeledDataset};
pub use decoder::Decoder;
pub use encoder::{mars_metadata, CoverageCoords, Encoder};
pub use error::{CovJsonError, CovJsonResult};
pub use flatten::{flatten, FlattenedTree, GroupBucket, ResultLayout, LAYOUT_ORDER};
pub use parameters::{CovJsonParameter, ParameterCatalog, ParameterDefinition, Unit};
pub use tree::{AxisRole, AxisValue, ResultTree};
