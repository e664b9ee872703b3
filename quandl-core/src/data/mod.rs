//! Fetching, reshaping and persisting dataset rows

pub mod envelope;
pub mod http;
pub mod pull;
pub mod record;
pub mod reshape;
pub mod store;
pub mod symbols;
pub mod transport;

pub use envelope::{DataSet, DatasetMetadata};
pub use http::HttpTransport;
pub use pull::{pull_single, pull_symbols, resolve_tickers, LogProgress, PullProgress, PullSummary};
pub use record::{CboeBar, DatedRecord, Records, WikiBar};
pub use reshape::reshape;
pub use store::{OutputFormat, OutputStore, WriteSummary};
pub use symbols::{read_input_list, SymbolEntry, SymbolList};
pub use transport::{RawResponse, Transport};
