//! Endpoint builder for the Quandl v3 REST API.
//!
//! URL shape: `{protocol}://{host}{suffix}/{version}/{service}[/{option}]/{param}[/{data_type}][.{format}]`
//!
//! The option, data type and format segments are appended only when the value
//! is one the service recognizes. Unrecognized values are dropped from the URL
//! without an error; callers rely on this to request e.g. a CBOE dataset
//! without the `/data` segment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PullError;

pub const DEFAULT_HOST: &str = "www.quandl.com";
pub const DEFAULT_PROTOCOL: &str = "https";
pub const API_SUFFIX: &str = "/api";
pub const API_VERSION: &str = "v3";

/// Name of the only service the API client supports.
pub const DATASETS: &str = "datasets";

/// A service the endpoint builder knows how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Datasets,
}

impl Service {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            DATASETS => Some(Service::Datasets),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Service::Datasets => DATASETS,
        }
    }

    /// Database codes accepted as the option segment.
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Service::Datasets => &["CBOE", "WIKI"],
        }
    }

    pub fn data_types(&self) -> &'static [&'static str] {
        match self {
            Service::Datasets => &["data", "metadata"],
        }
    }

    pub fn formats(&self) -> &'static [&'static str] {
        match self {
            Service::Datasets => &["json", "xml", "csv"],
        }
    }
}

/// Base location of the API. Host and protocol can be pointed elsewhere
/// (a mirror, a local test server).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    protocol: String,
    host: String,
    suffix: String,
    version: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            host: DEFAULT_HOST.to_string(),
            suffix: API_SUFFIX.to_string(),
            version: API_VERSION.to_string(),
        }
    }
}

impl Endpoint {
    pub fn new(protocol: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Build the request URL for one dataset.
    ///
    /// `param` (the ticker) is always appended. `option`, `data_type` and
    /// `format` are appended only if the service recognizes them.
    pub fn url(
        &self,
        service: &str,
        option: &str,
        param: &str,
        data_type: &str,
        format: &str,
    ) -> Result<String, PullError> {
        let svc = Service::from_name(service)
            .ok_or_else(|| PullError::InvalidService(service.to_string()))?;

        let mut url = format!(
            "{}://{}{}/{}/{}",
            self.protocol,
            self.host,
            self.suffix,
            self.version,
            svc.name()
        );
        if svc.options().contains(&option) {
            url.push('/');
            url.push_str(option);
        }
        url.push('/');
        url.push_str(param);
        if svc.data_types().contains(&data_type) {
            url.push('/');
            url.push_str(data_type);
        }
        if svc.formats().contains(&format) {
            url.push('.');
            url.push_str(format);
        }
        Ok(url)
    }
}

/// Build a URL against the public API host.
pub fn build_url(
    service: &str,
    option: &str,
    param: &str,
    data_type: &str,
    format: &str,
) -> Result<String, PullError> {
    Endpoint::default().url(service, option, param, data_type, format)
}

/// Dataset family a request targets. Each code has its own record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DatabaseCode {
    /// End-of-day US equity prices.
    #[default]
    #[serde(rename = "WIKI")]
    Wiki,
    /// CBOE futures settlements.
    #[serde(rename = "CBOE")]
    Cboe,
}

impl DatabaseCode {
    pub const ALL: [DatabaseCode; 2] = [DatabaseCode::Wiki, DatabaseCode::Cboe];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseCode::Wiki => "WIKI",
            DatabaseCode::Cboe => "CBOE",
        }
    }
}

impl fmt::Display for DatabaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WIKI" => Ok(DatabaseCode::Wiki),
            "CBOE" => Ok(DatabaseCode::Cboe),
            _ => Err(format!("unknown database code '{s}'. Valid: WIKI, CBOE")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Data,
    Metadata,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Data => "data",
            DataType::Metadata => "metadata",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(DataType::Data),
            "metadata" => Ok(DataType::Metadata),
            _ => Err(format!("unknown data type '{s}'. Valid: data, metadata")),
        }
    }
}

/// Response body format requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
    Csv,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
            ResponseFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ResponseFormat::Json),
            "xml" => Ok(ResponseFormat::Xml),
            "csv" => Ok(ResponseFormat::Csv),
            _ => Err(format!("unknown format '{s}'. Valid: json, xml, csv")),
        }
    }
}
