//! # Config Loader
//!
//! Loading and validation of buffer parameters.
//!
//! Responsibilities:
//! - parse TOML/JSON parameter files
//! - validate parameter ranges
//! - produce a ready-to-use [`BufferParams`]
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let params = ConfigLoader::load_from_path(Path::new("buffer.toml")).unwrap();
//! println!("mode: {:?}", params.mode);
//! ```

mod parser;
mod validator;

pub use contracts::BufferParams;
pub use parser::ConfigFormat;
pub use validator::validate;

use contracts::BufferError;
use std::path::Path;

/// Parameter loader.
///
/// Static methods for loading parameters from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load parameters from a file path.
    ///
    /// The format is detected from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - file cannot be read
    /// - unsupported format
    /// - parse failure
    /// - validation failure
    pub fn load_from_path(path: &Path) -> Result<BufferParams, BufferError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load parameters from a string.
    ///
    /// # Errors
    /// - parse failure
    /// - validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<BufferParams, BufferError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize parameters to a TOML string.
    pub fn to_toml(params: &BufferParams) -> Result<String, BufferError> {
        toml::to_string_pretty(params)
            .map_err(|e| BufferError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize parameters to a JSON string.
    pub fn to_json(params: &BufferParams) -> Result<String, BufferError> {
        serde_json::to_string_pretty(params)
            .map_err(|e| BufferError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer the parameter format from the file extension.
    fn detect_format(path: &Path) -> Result<ConfigFormat, BufferError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            BufferError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| BufferError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read the parameter file.
    fn read_file(path: &Path) -> Result<String, BufferError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate the parameter content.
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<BufferParams, BufferError> {
        let params = parser::parse(content, format)?;
        validator::validate(&params)?;
        Ok(params)
    }
}
