//! Error types for Waveform QC.

use thiserror::Error;

/// Result type alias for Waveform QC operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Waveform QC.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unrecognized configuration key `{key}` for plugin {plugin}")]
    UnknownConfigKey { plugin: String, key: String },

    // Validation errors (20-29)
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("merge requires at least one new mask")]
    EmptyNewMasks,

    #[error("mask {mask_id} is rejected and cannot be modified or merged")]
    RejectedMask { mask_id: String },

    #[error("invalid interval: end {end} precedes start {start}")]
    InvalidInterval { start: String, end: String },

    #[error("QC type {qc_type} is not valid for category {category}")]
    CategoryTypeMismatch { category: String, qc_type: String },

    // Plugin lifecycle errors (30-39)
    #[error("invalid plugin state: {0}")]
    InvalidState(String),

    // Merge data-completeness errors (40-49)
    #[error("incomplete span: {0}")]
    IncompleteSpan(String),

    // Serialization errors (60-69)
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable numeric code for this error type.
    /// Used for detailed error reporting in structured output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::UnknownConfigKey { .. } => 11,
            Error::Validation(_) => 20,
            Error::EmptyNewMasks => 21,
            Error::RejectedMask { .. } => 22,
            Error::InvalidInterval { .. } => 23,
            Error::CategoryTypeMismatch { .. } => 24,
            Error::InvalidState(_) => 30,
            Error::IncompleteSpan(_) => 40,
            Error::Json(_) => 60,
        }
    }
}
