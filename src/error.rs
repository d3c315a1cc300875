use crate::headers::HeaderKind;

/// Errors raised while validating, merging, or attaching security headers
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("Unknown header '{key}'. Headers are: {}", .allowed.join(", "))]
    UnknownHeader { key: String, allowed: Vec<String> },

    #[error("Invalid parameter '{field}' for {kind}. Params are: {}", .allowed.join(", "))]
    UnknownField {
        kind: HeaderKind,
        field: String,
        allowed: Vec<String>,
    },

    #[error("Invalid input '{value}' for '{field}' parameter of {kind}. Options are: {}", .allowed.join(", "))]
    InvalidValue {
        kind: HeaderKind,
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Invalid directive '{directive}'. Directives are: {}", .allowed.join(", "))]
    UnknownDirective {
        directive: String,
        allowed: Vec<String>,
    },

    #[error("Header {name} cannot carry value '{value}'")]
    InvalidHeaderValue { name: String, value: String },

    #[error("Invalid overrides: {0}")]
    InvalidOverrides(#[from] serde_json::Error),
}

impl HeaderError {
    /// The header kind the error refers to, if it is tied to one
    pub fn kind(&self) -> Option<HeaderKind> {
        match self {
            Self::UnknownField { kind, .. } | Self::InvalidValue { kind, .. } => Some(*kind),
            Self::UnknownDirective { .. } => Some(HeaderKind::Csp),
            _ => None,
        }
    }
}

/// Result type for header operations
pub type Result<T> = std::result::Result<T, HeaderError>;
