//! Error types for MoMem
//!
//! Provides a unified error type for codec, record and storage operations.

use thiserror::Error;

/// Result type alias using MomemError
pub type Result<T> = std::result::Result<T, MomemError>;

/// Unified error type for MoMem operations
#[derive(Debug, Error)]
pub enum MomemError {
    // -------------------------------------------------------------------------
    // Encode Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Integer out of range: {0} (only unsigned 64-bit values are encodable)")]
    IntegerOutOfRange(i64),

    #[error("Field `{field}` too long: {actual} > {limit}")]
    Validation {
        field: &'static str,
        limit: usize,
        actual: usize,
    },

    // -------------------------------------------------------------------------
    // Decode Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt data at byte {position}: {reason}")]
    CorruptData { reason: String, position: usize },

    #[error("Element {index} out of bounds for list of {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Timestamp {0} is not a representable date")]
    InvalidTimestamp(f64),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Not empty: {0}")]
    NotEmpty(String),

    #[error("No free identifier after {attempts} attempts")]
    IdExhausted { attempts: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MomemError {
    /// Shorthand for building a `CorruptData` error
    pub(crate) fn corrupt(reason: impl Into<String>, position: usize) -> Self {
        MomemError::CorruptData {
            reason: reason.into(),
            position,
        }
    }
}
