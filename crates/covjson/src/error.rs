//! Error types for CoverageJSON encoding and decoding.

use thiserror::Error;

/// Result type alias using CovJsonError.
pub type CovJsonResult<T> = Result<T, CovJsonError>;

/// Errors that can occur while building or reading a CoverageJSON document.
///
/// Every variant is raised while the document is still being constructed,
/// so a failed encode or decode never hands back a partial document.
#[derive(Debug, Error)]
pub enum CovJsonError {
    // === Result tree errors ===
    /// A leaf's result array does not match the cardinalities on its path.
    #[error("Malformed result tree at {path}: expected {expected} results, found {actual}")]
    MalformedTree {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// An axis value that must be numeric could not be read as a float.
    #[error("Non-numeric value '{value}' on axis '{axis}'")]
    NonNumericValue { axis: String, value: String },

    // === Lookup errors ===
    /// Parameter id or shortname missing from the parameter catalog.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A parameter definition lacks a field required for export.
    #[error("Missing metadata '{field}' for parameter '{parameter}'")]
    MissingParameterMetadata { parameter: String, field: String },

    /// A coverage was added before any coordinate reference system.
    #[error("No coordinate reference system has been attached to the document")]
    MissingReference,

    /// Two catalog entries share an id or shortname.
    #[error("Duplicate parameter in catalog: {0}")]
    DuplicateParameter(String),

    // === Document errors ===
    /// The CoverageJSON document does not have the expected structure.
    #[error("Malformed CoverageJSON document: {0}")]
    MalformedDocument(String),

    // === Infrastructure errors ===
    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CovJsonError {
    /// Short, stable name of the error category, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CovJsonError::MalformedTree { .. } | CovJsonError::NonNumericValue { .. } => {
                "malformed_tree"
            }
            CovJsonError::UnknownParameter(_) | CovJsonError::MissingParameterMetadata { .. } => {
                "lookup"
            }
            CovJsonError::MissingReference => "missing_reference",
            CovJsonError::DuplicateParameter(_) => "catalog",
            CovJsonError::MalformedDocument(_) => "malformed_document",
            CovJsonError::InvalidConfig(_) => "config",
            CovJsonError::Json(_) | CovJsonError::Yaml(_) => "parse",
            CovJsonError::Io(_) => "io",
        }
    }

    /// Whether the error was caused by the caller's input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, CovJsonError::Io(_))
    }
}
