//! Parameter metadata and the parameter catalog.
//!
//! The catalog translates request parameter ids (numeric paramIds or
//! shortnames) into the shortnames used as CoverageJSON keys, and supplies
//! the unit and observed-property metadata of each parameter.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{CovJsonError, CovJsonResult};

/// Catalog compiled into the crate, used when no catalog file is configured.
const BUILTIN_CATALOG: &str = include_str!("../data/parameters.yaml");

/// A parameter in CoverageJSON format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CovJsonParameter {
    /// Type (always "Parameter").
    #[serde(rename = "type")]
    pub type_: String,

    /// Description of the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<I18nString>,

    /// Unit of measurement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,

    /// The observed property.
    #[serde(rename = "observedProperty")]
    pub observed_property: ObservedProperty,
}

impl CovJsonParameter {
    /// Create a new CoverageJSON parameter whose observed property has the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            type_: "Parameter".to_string(),
            description: None,
            unit: None,
            observed_property: ObservedProperty::new(id),
        }
    }

    /// Set the unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the description; also used as the observed property label.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        let desc = desc.into();
        self.observed_property.label = Some(I18nString::english(&desc));
        self.description = Some(I18nString::english(&desc));
        self
    }

    /// Unit symbol, or a lookup failure naming the parameter.
    pub fn unit_symbol(&self, parameter: &str) -> CovJsonResult<&str> {
        self.unit
            .as_ref()
            .and_then(|u| u.symbol.as_ref())
            .map(UnitSymbol::value)
            .ok_or_else(|| CovJsonError::MissingParameterMetadata {
                parameter: parameter.to_string(),
                field: "unit.symbol".to_string(),
            })
    }

    /// Observed property id, or a lookup failure naming the parameter.
    pub fn observed_property_id(&self, parameter: &str) -> CovJsonResult<&str> {
        self.observed_property
            .id
            .as_deref()
            .ok_or_else(|| CovJsonError::MissingParameterMetadata {
                parameter: parameter.to_string(),
                field: "observedProperty.id".to_string(),
            })
    }
}

/// Internationalized string supporting multiple languages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum I18nString {
    /// Simple string (assumes English).
    Simple(String),
    /// Map of language codes to strings.
    Localized(BTreeMap<String, String>),
}

impl I18nString {
    /// Create an English-only i18n string.
    pub fn english(s: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert("en".to_string(), s.to_string());
        I18nString::Localized(map)
    }

    /// Get the English text, or any available text.
    pub fn text(&self) -> &str {
        match self {
            I18nString::Simple(s) => s,
            I18nString::Localized(map) => map
                .get("en")
                .or_else(|| map.values().next())
                .map(|s| s.as_str())
                .unwrap_or(""),
        }
    }
}

/// The observed property being measured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedProperty {
    /// Identifier for the property (the parameter shortname).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<I18nString>,

    /// Description of the property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<I18nString>,
}

impl ObservedProperty {
    /// Create a new observed property with an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            label: None,
            description: None,
        }
    }
}

/// Unit of measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    /// Human-readable label for the unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<I18nString>,

    /// Symbol or abbreviation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<UnitSymbol>,
}

impl Unit {
    /// Create a unit from a symbol string.
    pub fn from_symbol(symbol: impl Into<String>) -> Self {
        Self {
            label: None,
            symbol: Some(UnitSymbol::Simple(symbol.into())),
        }
    }
}

/// Unit symbol representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UnitSymbol {
    /// Simple string symbol.
    Simple(String),
    /// Structured symbol with type and value.
    Structured {
        /// Symbol value.
        value: String,
        /// Symbol type (e.g., "<http://www.opengis.net/def/uom/UCUM/>").
        #[serde(rename = "type")]
        type_: Option<String>,
    },
}

impl UnitSymbol {
    /// Get the symbol string.
    pub fn value(&self) -> &str {
        match self {
            UnitSymbol::Simple(s) => s,
            UnitSymbol::Structured { value, .. } => value,
        }
    }
}

/// One entry of the parameter catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterDefinition {
    /// Numeric parameter id (e.g. 167).
    pub id: u32,
    /// Shortname used as the CoverageJSON key (e.g. "2t").
    pub shortname: String,
    pub description: String,
    pub units: String,
}

impl ParameterDefinition {
    pub fn new(
        id: u32,
        shortname: impl Into<String>,
        description: impl Into<String>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            id,
            shortname: shortname.into(),
            description: description.into(),
            units: units.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    parameters: Vec<ParameterDefinition>,
}

/// Lookup table from parameter ids and shortnames to definitions.
///
/// Construction rejects colliding ids or shortnames, so the translation
/// from id to shortname is unambiguous and idempotent.
#[derive(Debug, Clone)]
pub struct ParameterCatalog {
    definitions: Vec<ParameterDefinition>,
    by_key: HashMap<String, usize>,
}

impl ParameterCatalog {
    /// Build a catalog from definitions.
    pub fn from_definitions(definitions: Vec<ParameterDefinition>) -> CovJsonResult<Self> {
        let mut by_key = HashMap::with_capacity(definitions.len() * 2);
        for (idx, def) in definitions.iter().enumerate() {
            for key in [def.id.to_string(), def.shortname.clone()] {
                match by_key.get(&key) {
                    Some(&existing) if existing != idx => {
                        return Err(CovJsonError::DuplicateParameter(key));
                    }
                    _ => {
                        by_key.insert(key, idx);
                    }
                }
            }
        }
        Ok(Self {
            definitions,
            by_key,
        })
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> CovJsonResult<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Parse a catalog from YAML (`parameters: [{id, shortname, description, units}]`).
    pub fn from_yaml_str(content: &str) -> CovJsonResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        Self::from_definitions(file.parameters)
    }

    /// Load a catalog from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> CovJsonResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&content)?;
        tracing::debug!(path = ?path, count = catalog.len(), "Loaded parameter catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_key.contains_key(id.trim())
    }

    /// Look up a definition by numeric id or shortname.
    pub fn get(&self, id: &str) -> CovJsonResult<&ParameterDefinition> {
        self.by_key
            .get(id.trim())
            .map(|&idx| &self.definitions[idx])
            .ok_or_else(|| CovJsonError::UnknownParameter(id.to_string()))
    }

    /// Translate a parameter id to its shortname. Shortnames map to themselves.
    pub fn convert_param_id_to_param(&self, id: &str) -> CovJsonResult<String> {
        self.get(id).map(|def| def.shortname.clone())
    }

    /// CoverageJSON metadata for a parameter: type, unit symbol and observed property.
    pub fn parameter_metadata(&self, id: &str) -> CovJsonResult<CovJsonParameter> {
        let def = self.get(id)?;
        Ok(CovJsonParameter::new(def.shortname.clone())
            .with_description(def.description.clone())
            .with_unit(Unit::from_symbol(def.units.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small_catalog() -> ParameterCatalog {
        ParameterCatalog::from_definitions(vec![
            ParameterDefinition::new(167, "2t", "2 metre temperature", "K"),
            ParameterDefinition::new(228, "tp", "Total precipitation", "m"),
        ])
        .unwrap()
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = ParameterCatalog::builtin().unwrap();
        assert!(catalog.len() > 10);
        assert_eq!(catalog.convert_param_id_to_param("167").unwrap(), "2t");
        assert_eq!(catalog.convert_param_id_to_param("10u").unwrap(), "10u");
    }

    #[test]
    fn test_convert_is_idempotent() {
        let catalog = small_catalog();
        let once = catalog.convert_param_id_to_param("167").unwrap();
        let twice = catalog.convert_param_id_to_param(&once).unwrap();
        assert_eq!(once, "2t");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_parameter() {
        let catalog = small_catalog();
        let err = catalog.convert_param_id_to_param("999").unwrap_err();
        assert!(matches!(err, CovJsonError::UnknownParameter(ref p) if p == "999"));
        assert!(catalog.parameter_metadata("999").is_err());
    }

    #[test]
    fn test_duplicate_shortname_rejected() {
        let result = ParameterCatalog::from_definitions(vec![
            ParameterDefinition::new(167, "2t", "2 metre temperature", "K"),
            ParameterDefinition::new(500011, "2t", "Another temperature", "K"),
        ]);
        assert!(matches!(result, Err(CovJsonError::DuplicateParameter(ref k)) if k == "2t"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = ParameterCatalog::from_definitions(vec![
            ParameterDefinition::new(167, "2t", "2 metre temperature", "K"),
            ParameterDefinition::new(167, "t2m", "2 metre temperature", "K"),
        ]);
        assert!(matches!(result, Err(CovJsonError::DuplicateParameter(ref k)) if k == "167"));
    }

    #[test]
    fn test_parameter_metadata() {
        let catalog = small_catalog();
        let param = catalog.parameter_metadata("167").unwrap();

        assert_eq!(param.type_, "Parameter");
        assert_eq!(param.unit_symbol("2t").unwrap(), "K");
        assert_eq!(param.observed_property_id("2t").unwrap(), "2t");
        assert_eq!(param.description.as_ref().unwrap().text(), "2 metre temperature");
    }

    #[test]
    fn test_parameter_serialization() {
        let param = small_catalog().parameter_metadata("tp").unwrap();
        let json = serde_json::to_string(&param).unwrap();

        assert!(json.contains("\"type\":\"Parameter\""));
        assert!(json.contains("\"unit\":{\"symbol\":\"m\"}"));
        assert!(json.contains("\"observedProperty\":{\"id\":\"tp\""));
        assert!(json.contains("\"en\":\"Total precipitation\""));
    }

    #[test]
    fn test_missing_unit_is_lookup_failure() {
        let param = CovJsonParameter::new("2t");
        let err = param.unit_symbol("2t").unwrap_err();
        assert!(matches!(
            err,
            CovJsonError::MissingParameterMetadata { ref field, .. } if field == "unit.symbol"
        ));
    }

    #[test]
    fn test_unit_deserialization() {
        let json = r#"{"label":{"en":"Kelvin"},"symbol":"K"}"#;
        let unit: Unit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.symbol.as_ref().unwrap().value(), "K");

        let json = r#"{"symbol":{"value":"K","type":"http://www.opengis.net/def/uom/UCUM/"}}"#;
        let unit: Unit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.symbol.as_ref().unwrap().value(), "K");
    }

    #[test]
    fn test_i18n_string() {
        let s = I18nString::english("Temperature");
        assert_eq!(s.text(), "Temperature");
        assert_eq!(I18nString::Simple("Wind".to_string()).text(), "Wind");
    }

    #[test]
    fn test_catalog_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "parameters:").unwrap();
        writeln!(file, "  - id: 167").unwrap();
        writeln!(file, "    shortname: t2m").unwrap();
        writeln!(file, "    description: 2 metre temperature").unwrap();
        writeln!(file, "    units: K").unwrap();

        let catalog = ParameterCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("t2m"));
        assert_eq!(catalog.convert_param_id_to_param("167").unwrap(), "t2m");
    }
}
