//! Immutable run configuration.
//!
//! Built once at startup (from CLI flags, optionally layered over a TOML
//! file) and passed by reference to the driver and transport. Nothing mutates
//! it after construction.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::store::OutputFormat;
use crate::endpoints::{
    DataType, DatabaseCode, Endpoint, ResponseFormat, DEFAULT_HOST, DEFAULT_PROTOCOL,
};

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "QUANDL_API_KEY";

pub const DEFAULT_INPUT_FILE: &str = "constituents_json.json";

/// Sector value that selects every symbol in the input list.
pub const ALL_SECTORS: &str = "all";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },
    #[error("parse config TOML: {0}")]
    Parse(String),
    #[error("serialize config: {0}")]
    Serialize(String),
    #[error("invalid value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullConfig {
    /// Sent as the `api_key` query parameter. Anonymous requests are rate limited.
    pub api_key: Option<String>,
    pub data_type: DataType,
    pub database_code: DatabaseCode,
    pub format: ResponseFormat,
    pub output_format: OutputFormat,
    /// Symbol list file name, resolved under `{path}/input/`.
    pub input_file: String,
    /// `all` (or empty) for every symbol, otherwise an exact sector name.
    pub sector: String,
    /// Base directory holding `input/` and `output/`.
    pub path: PathBuf,
    /// Single ticker override; bypasses the input file when set.
    pub ticker: Option<String>,
    pub protocol: String,
    pub host: String,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            data_type: DataType::Data,
            database_code: DatabaseCode::Wiki,
            format: ResponseFormat::Json,
            output_format: OutputFormat::Json,
            input_file: DEFAULT_INPUT_FILE.to_string(),
            sector: ALL_SECTORS.to_string(),
            path: PathBuf::from("."),
            ticker: None,
            protocol: DEFAULT_PROTOCOL.to_string(),
            host: DEFAULT_HOST.to_string(),
        }
    }
}

impl PullConfig {
    /// Load a config from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Fill the API key from `QUANDL_API_KEY` when none is configured.
    /// Empty keys are treated as absent.
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            self.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.protocol.clone(), self.host.clone())
    }

    /// Data type segment sent upstream.
    ///
    /// CBOE datasets are requested without the `/data` segment: the bare
    /// dataset document carries the rows under `dataset`. An empty string is
    /// not a recognized data type, so the endpoint builder drops it.
    pub fn request_data_type(&self) -> &'static str {
        match (self.data_type, self.database_code) {
            (DataType::Data, DatabaseCode::Cboe) => "",
            (data_type, _) => data_type.as_str(),
        }
    }

    pub fn input_path(&self) -> PathBuf {
        self.path.join("input").join(&self.input_file)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path.join("output")
    }

    /// Reject combinations the pipeline cannot process.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format == ResponseFormat::Xml {
            return Err(ConfigError::Invalid(
                "xml responses are not supported; use json or csv".into(),
            ));
        }
        if self.data_type == DataType::Metadata && self.format != ResponseFormat::Json {
            return Err(ConfigError::Invalid(
                "metadata pulls require the json format".into(),
            ));
        }
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        Ok(())
    }
}
