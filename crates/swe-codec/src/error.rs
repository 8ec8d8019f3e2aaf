//! Error types for stream encoding and decoding.

use swe_common::DataError;
use thiserror::Error;

/// Result type alias using CodecError.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while reading or writing a data stream.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed token or structure in the input.
    #[error("parse error at offset {offset}: {reason}")]
    Parse { offset: u64, reason: String },

    /// Input ended in the middle of a record.
    #[error("stream truncated at offset {offset}")]
    Truncated { offset: u64 },

    /// A value could not be written in the configured format.
    #[error("write error: {0}")]
    Write(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema usage error surfaced while walking a record.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The stream failed earlier and cannot be resumed.
    #[error("stream unusable after error at offset {offset}")]
    Poisoned { offset: u64 },

    #[error("configuration error: {0}")]
    Config(String),
}

impl CodecError {
    /// Create a Parse error.
    pub fn parse(offset: u64, reason: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            reason: reason.into(),
        }
    }

    /// Create a Write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Stream offset carried by this error, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::Parse { offset, .. } | Self::Truncated { offset } | Self::Poisoned { offset } => {
                Some(*offset)
            }
            _ => None,
        }
    }

}
