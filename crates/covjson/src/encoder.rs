//! CoverageJSON document builder and coverage assembler.
//!
//! An [`Encoder`] owns the document while it is being built. The `from_*`
//! builders consume the encoder and return the finished document, so a
//! failure never leaves a partially built document behind.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::EncoderConfig;
use crate::coverage_json::{
    Coverage, CoverageCollection, Domain, DomainType, MarsMetadata, NdArray,
    ReferenceSystemConnection,
};
use crate::dataset::LabeledDataset;
use crate::error::{CovJsonError, CovJsonResult};
use crate::flatten::flatten;
use crate::parameters::ParameterCatalog;
use crate::tree::{AxisValue, ResultTree};

/// Domain coordinates of one coverage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageCoords {
    /// Time axis values (ISO 8601).
    pub t: Vec<String>,
    /// Composite tuples.
    pub composite: Vec<Vec<f64>>,
}

/// Builds a `MultiPoint` CoverageJSON document.
#[derive(Debug, Clone)]
pub struct Encoder {
    config: EncoderConfig,
    catalog: Arc<ParameterCatalog>,
    document: CoverageCollection,
}

impl Encoder {
    /// Create an encoder with an empty document.
    pub fn new(config: EncoderConfig, catalog: Arc<ParameterCatalog>) -> Self {
        Self {
            config,
            catalog,
            document: CoverageCollection::new(DomainType::MultiPoint),
        }
    }

    /// Create an encoder, loading the catalog named in the config or the built-in one.
    pub fn from_config(config: EncoderConfig) -> CovJsonResult<Self> {
        let catalog = match &config.parameter_catalog {
            Some(path) => ParameterCatalog::load(path)?,
            None => ParameterCatalog::builtin()?,
        };
        Ok(Self::new(config, Arc::new(catalog)))
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ParameterCatalog {
        &self.catalog
    }

    /// The document built so far.
    pub fn document(&self) -> &CoverageCollection {
        &self.document
    }

    /// Register a parameter's metadata under its shortname. Idempotent.
    pub fn add_parameter(&mut self, id: &str) -> CovJsonResult<String> {
        let name = self.catalog.convert_param_id_to_param(id)?;
        if !self.document.parameters.contains_key(&name) {
            let metadata = self.catalog.parameter_metadata(id)?;
            self.document.parameters.insert(name.clone(), metadata);
        }
        Ok(name)
    }

    /// Attach a coordinate reference system.
    pub fn add_reference(&mut self, reference: ReferenceSystemConnection) {
        self.document.referencing.push(reference);
    }

    /// Reference system described by the configuration.
    pub fn configured_reference(&self) -> ReferenceSystemConnection {
        ReferenceSystemConnection::geographic(
            self.config.reference.coordinates.clone(),
            self.config.reference.crs_id.clone(),
        )
    }

    fn ensure_reference(&mut self) {
        if self.document.referencing.is_empty() {
            let reference = self.configured_reference();
            self.add_reference(reference);
        }
    }

    /// Assemble one coverage and append it to the document.
    ///
    /// Range keys are raw parameter ids; they are translated to shortnames
    /// and registered as document parameters.
    pub fn add_coverage<I>(
        &mut self,
        mars_metadata: Arc<MarsMetadata>,
        coords: CoverageCoords,
        ranges: I,
    ) -> CovJsonResult<()>
    where
        I: IntoIterator<Item = (String, Vec<f64>)>,
    {
        let coordinates = self
            .document
            .referencing
            .first()
            .map(|r| r.coordinates.clone())
            .ok_or(CovJsonError::MissingReference)?;

        let points = coords.composite.len();
        let domain = Domain::composite(coords.t, coordinates, coords.composite);
        let mut coverage = Coverage::new(mars_metadata, domain);

        for (id, values) in ranges {
            let name = self.add_parameter(&id)?;
            if coverage.ranges.contains_key(&name) {
                return Err(CovJsonError::DuplicateParameter(name));
            }
            let range = NdArray::series(&name, values);
            coverage.ranges.insert(name, range);
        }

        debug!(
            timestamp = coverage.timestamp().unwrap_or(""),
            points,
            parameters = coverage.ranges.len(),
            "Assembled coverage"
        );
        self.document.coverages.push(coverage);
        Ok(())
    }

    /// Encode a result tree: one coverage per group, in first-seen order.
    pub fn from_tree(mut self, tree: &ResultTree) -> CovJsonResult<CoverageCollection> {
        let grouping = self.config.grouping;
        let flat = flatten(tree, grouping)?;

        self.ensure_reference();
        for param in &flat.parameters {
            self.add_parameter(param)?;
        }

        let shared = Arc::new(flat.metadata);
        for group in flat.groups {
            let metadata = if grouping.splits_members() {
                let mut own = MarsMetadata::clone(&shared);
                if let Some(number) = group.number {
                    own.insert("number".to_string(), number);
                }
                if let Some(step) = group.step {
                    own.insert("step".to_string(), step);
                }
                Arc::new(own)
            } else {
                Arc::clone(&shared)
            };

            let coords = CoverageCoords {
                t: vec![group.timestamp],
                composite: group.composite,
            };
            self.add_coverage(metadata, coords, group.ranges)?;
        }

        info!(
            grouping = %grouping,
            coverages = self.document.coverages.len(),
            parameters = self.document.parameters.len(),
            "Encoded result tree"
        );
        Ok(self.document)
    }

    /// Encode a labeled dataset: one coverage per datetime.
    ///
    /// Dataset attributes other than `date` become the shared `mars:metadata`.
    pub fn from_dataset(mut self, dataset: &LabeledDataset) -> CovJsonResult<CoverageCollection> {
        self.ensure_reference();

        let metadata: MarsMetadata = dataset
            .attrs
            .iter()
            .filter(|(key, _)| key.as_str() != "date")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let shared = Arc::new(metadata);

        let composite: Vec<Vec<f64>> = (0..dataset.n_points())
            .map(|p| {
                let (x, y, z) = (dataset.x[p], dataset.y[p], dataset.z[p]);
                if z.is_nan() {
                    vec![x, y]
                } else {
                    vec![x, y, z]
                }
            })
            .collect();

        for (row, datetime) in dataset.datetimes.iter().enumerate() {
            let ranges: BTreeMap<String, Vec<f64>> = dataset
                .data_vars
                .iter()
                .map(|(name, var)| (name.clone(), var.row(row).to_vec()))
                .collect();

            let coords = CoverageCoords {
                t: vec![datetime.clone()],
                composite: composite.clone(),
            };
            self.add_coverage(Arc::clone(&shared), coords, ranges)?;
        }

        info!(
            coverages = self.document.coverages.len(),
            points = dataset.n_points(),
            "Encoded labeled dataset"
        );
        Ok(self.document)
    }
}

/// Metadata block from key/value pairs.
pub fn mars_metadata<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> MarsMetadata
where
    K: Into<String>,
    V: Into<AxisValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
