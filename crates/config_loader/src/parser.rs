//! Parsing of buffer parameter files.
//!
//! Supports TOML (primary) and JSON (optional) formats.

use contracts::{BufferError, BufferParams};

/// Parameter file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML parameters.
pub fn parse_toml(content: &str) -> Result<BufferParams, BufferError> {
    toml::from_str(content).map_err(|e| BufferError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON parameters.
pub fn parse_json(content: &str) -> Result<BufferParams, BufferError> {
    serde_json::from_str(content).map_err(|e| BufferError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse parameters in the given format.
pub fn parse(content: &str, format: ConfigFormat) -> Result<BufferParams, BufferError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
