//! Error types for accessor calls.

use swe_common::DataError;
use thiserror::Error;

/// Result type alias using AccessorError.
pub type AccessorResult<T> = Result<T, AccessorError>;

/// Errors raised the first time an accessor method is used.
#[derive(Debug, Error)]
pub enum AccessorError {
    /// No root-level component matches the method name.
    #[error("no component matches accessor method '{0}'")]
    Unresolved(String),

    /// The method's path exists but points at the wrong kind of component.
    #[error("accessor method '{method}' needs {expected} but '{path}' is a {found}")]
    IncompatibleKind {
        method: String,
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Nothing has been wrapped yet.
    #[error("accessor has no data block")]
    Unbound,

    #[error(transparent)]
    Data(#[from] DataError),
}

impl AccessorError {
    pub fn incompatible(method: &str, path: &str, expected: &'static str, found: &'static str) -> Self {
        Self::IncompatibleKind {
            method: method.to_string(),
            path: path.to_string(),
            expected,
            found,
        }
    }
}
