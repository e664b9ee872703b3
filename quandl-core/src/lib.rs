//! Quandl Core: endpoint building, envelope parsing, row reshaping, typed
//! records and per-date persistence.
//!
//! Pipeline per ticker:
//! - Build the dataset URL and fetch it over a blocking HTTP transport
//! - Check the response for an API error envelope
//! - Reshape the positional `data` rows into records keyed by column name
//! - Decode the records into the fixed schema of the database code
//! - Write one file per date under `{path}/output/{symbol}/`

pub mod config;
pub mod data;
pub mod endpoints;
pub mod error;

pub use config::{ConfigError, PullConfig};
pub use endpoints::{build_url, DataType, DatabaseCode, Endpoint, ResponseFormat};
pub use error::{PullError, RemoteErrorKind};
