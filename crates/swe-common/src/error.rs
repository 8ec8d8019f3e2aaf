//! Error types for the SWE Common data model.

use thiserror::Error;

use crate::value::DataType;

/// Result type alias using DataError.
pub type DataResult<T> = Result<T, DataError>;

/// Errors raised by data blocks and the component schema tree.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    // === Value coercion ===
    #[error("Cannot convert {from} to {to}: {reason}")]
    Conversion {
        from: DataType,
        to: DataType,
        reason: String,
    },

    // === Schema usage ===
    #[error("Invalid component structure: {0}")]
    Structure(String),

    #[error("Component '{0}' is not an array")]
    NotAnArray(String),

    #[error("No item selected in choice '{0}'")]
    NoChoiceSelected(String),

    #[error("Choice '{name}' has no item {index} ({count} items)")]
    InvalidChoiceItem {
        name: String,
        index: i64,
        count: usize,
    },

    #[error("Component '{0}' has no data block bound")]
    Unbound(String),

    #[error("Data block mismatch: expected {expected}, found {found}")]
    BlockMismatch { expected: String, found: String },

    #[error("Path '{0}' does not resolve to a component")]
    PathNotFound(String),

    #[error("Invalid component definition: {0}")]
    InvalidDefinition(String),
}

impl DataError {
    /// Create a Conversion error.
    pub fn conversion(from: DataType, to: DataType, reason: impl Into<String>) -> Self {
        Self::Conversion {
            from,
            to,
            reason: reason.into(),
        }
    }

    /// Create a Structure error.
    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure(msg.into())
    }

    /// Create a BlockMismatch error.
    pub fn block_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::BlockMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Whether this error was raised by a value coercion.
    pub fn is_conversion(&self) -> bool {
        matches!(self, DataError::Conversion { .. })
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::InvalidDefinition(format!("JSON error: {}", err))
    }
}
