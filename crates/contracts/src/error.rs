//! Error taxonomy of the buffer crates.
//!
//! Layered by origin: config / estimator / io.

use thiserror::Error;

/// Unified error type.
#[derive(Debug, Error)]
pub enum BufferError {
    // ===== configuration =====
    /// Parameter file could not be parsed.
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Parameter value out of its allowed range.
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== estimation =====
    /// The missing-sample correction produced a negative period over many
    /// consecutive updates; the estimator state no longer fits the stream.
    #[error(
        "estimator corruption: corrected period {corrected_ns}ns is negative \
         (sample {period_sample_ns}ns, mean {period_mean_ns}ns, \
         missing {missing}, updates {updates})"
    )]
    EstimatorCorruption {
        missing: usize,
        period_sample_ns: f64,
        period_mean_ns: f64,
        corrected_ns: f64,
        updates: usize,
    },

    // ===== generic =====
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Everything else.
    #[error("{0}")]
    Other(String),
}

impl BufferError {
    /// Build a config parse error.
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Build a config validation error.
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}
