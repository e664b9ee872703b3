//! Pull orchestrator: runs each ticker through the pipeline in input order.
//!
//! Per ticker: fetch → check error envelope → reshape → decode → persist.
//! Metadata pulls replace reshape/decode with a metadata decode.
//!
//! A remote error classified as an invalid code or an unrecognized URL skips
//! the ticker. Every other error aborts the whole run and is returned to the
//! caller.

use super::envelope;
use super::record::{self, Records};
use super::reshape::reshape;
use super::store::{OutputStore, WriteSummary};
use super::symbols::read_input_list;
use super::transport::Transport;
use crate::config::PullConfig;
use crate::endpoints::{DataType, Endpoint, ResponseFormat, DATASETS};
use crate::error::PullError;

/// What one ticker produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Data { records: Records, write: WriteSummary },
    Metadata { written: bool },
}

impl TickerOutcome {
    pub fn record_count(&self) -> usize {
        match self {
            TickerOutcome::Data { records, .. } => records.len(),
            TickerOutcome::Metadata { .. } => 0,
        }
    }
}

/// Per-ticker line of the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerReport {
    pub symbol: String,
    pub records: usize,
    pub written: usize,
    pub skipped: usize,
}

/// Summary of a completed run.
#[derive(Debug, Default)]
pub struct PullSummary {
    pub total: usize,
    pub fetched: Vec<TickerReport>,
    /// Tickers dropped because of a skippable remote error.
    pub skipped: Vec<(String, PullError)>,
}

impl PullSummary {
    pub fn skipped_symbols(&self) -> Vec<&str> {
        self.skipped.iter().map(|(s, _)| s.as_str()).collect()
    }

    pub fn files_written(&self) -> usize {
        self.fetched.iter().map(|r| r.written).sum()
    }
}

/// Progress callback for multi-ticker runs.
pub trait PullProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// The ticker hit a skippable remote error; the run continues.
    fn on_skipped(&self, symbol: &str, error: &PullError);

    fn on_complete(&self, report: &TickerReport);

    fn on_batch_complete(&self, summary: &PullSummary);
}

/// Progress reporter that emits `tracing` events.
pub struct LogProgress;

impl PullProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        tracing::info!(symbol, "[{}/{}] fetching", index + 1, total);
    }

    fn on_skipped(&self, symbol: &str, error: &PullError) {
        tracing::warn!(symbol, %error, "removing ticker from list, error ignored");
    }

    fn on_complete(&self, report: &TickerReport) {
        tracing::info!(
            symbol = %report.symbol,
            records = report.records,
            written = report.written,
            skipped = report.skipped,
            "done"
        );
    }

    fn on_batch_complete(&self, summary: &PullSummary) {
        tracing::info!(
            total = summary.total,
            fetched = summary.fetched.len(),
            skipped = summary.skipped.len(),
            files = summary.files_written(),
            "pull complete"
        );
    }
}

/// Tickers for this run: the single-ticker override, or the filtered input list.
pub fn resolve_tickers(config: &PullConfig) -> Result<Vec<String>, PullError> {
    match config.ticker.as_deref() {
        Some(ticker) if !ticker.is_empty() => Ok(vec![ticker.to_string()]),
        _ => read_input_list(&config.path, &config.input_file, &config.sector),
    }
}

/// Pull every symbol in order. Stops at the first non-skippable error.
pub fn pull_symbols(
    transport: &dyn Transport,
    store: &OutputStore,
    config: &PullConfig,
    symbols: &[&str],
    progress: &dyn PullProgress,
) -> Result<PullSummary, PullError> {
    config.validate()?;

    let mut summary = PullSummary {
        total: symbols.len(),
        ..PullSummary::default()
    };

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, symbols.len());

        match pull_single(transport, store, config, symbol) {
            Ok(outcome) => {
                let write = match &outcome {
                    TickerOutcome::Data { write, .. } => *write,
                    TickerOutcome::Metadata { written } => WriteSummary {
                        written: usize::from(*written),
                        skipped: usize::from(!*written),
                    },
                };
                let report = TickerReport {
                    symbol: symbol.to_string(),
                    records: outcome.record_count(),
                    written: write.written,
                    skipped: write.skipped,
                };
                progress.on_complete(&report);
                summary.fetched.push(report);
            }
            Err(e) if e.is_skippable() => {
                progress.on_skipped(symbol, &e);
                summary.skipped.push((symbol.to_string(), e));
            }
            Err(e) => {
                tracing::error!(symbol, error = %e, "aborting run");
                return Err(e);
            }
        }
    }

    progress.on_batch_complete(&summary);
    Ok(summary)
}

/// Run one ticker through the pipeline.
pub fn pull_single(
    transport: &dyn Transport,
    store: &OutputStore,
    config: &PullConfig,
    symbol: &str,
) -> Result<TickerOutcome, PullError> {
    let body = fetch(transport, &config.endpoint(), config, symbol)?;

    if config.data_type == DataType::Metadata {
        let metadata = envelope::parse_metadata(&body)?;
        let written = store.write_metadata(symbol, &metadata)?;
        return Ok(TickerOutcome::Metadata { written });
    }

    let dataset = match config.format {
        ResponseFormat::Json => envelope::parse_dataset(&body)?,
        ResponseFormat::Csv => envelope::parse_csv(&body)?,
        ResponseFormat::Xml => return Err(PullError::UnsupportedFormat("xml".into())),
    };
    tracing::debug!(symbol, rows = dataset.row_count(), "transforming data set");

    let reshaped = reshape(&dataset.column_names, &dataset.data)?;
    let records = record::decode(config.database_code, &reshaped)?;
    let write = store.write(symbol, &records)?;

    // Decoded records are not echoed anywhere beyond the files written above.
    Ok(TickerOutcome::Data { records, write })
}

/// Fetch and error-check one dataset body.
fn fetch(
    transport: &dyn Transport,
    endpoint: &Endpoint,
    config: &PullConfig,
    symbol: &str,
) -> Result<Vec<u8>, PullError> {
    let url = endpoint.url(
        DATASETS,
        config.database_code.as_str(),
        symbol,
        config.request_data_type(),
        config.format.as_str(),
    )?;

    let resp = transport.get(&url)?;
    envelope::check_error(&resp.body, config.format)?;
    if !resp.is_success() {
        return Err(PullError::Transport(format!(
            "HTTP {} for {symbol}",
            resp.status
        )));
    }
    Ok(resp.body)
}
