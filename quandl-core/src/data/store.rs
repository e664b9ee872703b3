//! Per-date output files.
//!
//! Layout: `{output_dir}/{SYMBOL}/{date}.json` (or `{date}.txt` for the
//! Parquet format), plus `{output_dir}/{SYMBOL}/metadata.json` for metadata
//! pulls.
//!
//! Persistence is additive only: a file that already exists is never
//! rewritten. New files are written to a `.tmp` sibling and renamed into
//! place.

use polars::prelude::{DataFrame, ParquetWriter};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::envelope::DatasetMetadata;
use super::record::{DatedRecord, Records};
use crate::error::PullError;

pub const METADATA_FILE: &str = "metadata.json";

/// Encoding of the per-date files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON, tab indented.
    #[default]
    Json,
    /// Single-row Parquet file.
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "txt",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "parquet" => Ok(OutputFormat::Parquet),
            _ => Err(format!("unknown output format '{s}'. Valid: json, parquet")),
        }
    }
}

/// Counts from writing one symbol's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub skipped: usize,
}

pub struct OutputStore {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl OutputStore {
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(symbol)
    }

    /// `{output_dir}/{symbol}/{date}.{ext}`
    pub fn record_path(&self, symbol: &str, date: &str) -> PathBuf {
        self.symbol_dir(symbol)
            .join(format!("{date}.{}", self.format.extension()))
    }

    pub fn metadata_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join(METADATA_FILE)
    }

    /// Write every decoded record for a symbol.
    pub fn write(&self, symbol: &str, records: &Records) -> Result<WriteSummary, PullError> {
        match records {
            Records::Wiki(bars) => self.write_records(symbol, bars),
            Records::Cboe(bars) => self.write_records(symbol, bars),
        }
    }

    /// Write one file per record, skipping dates that already have a file.
    pub fn write_records<R: DatedRecord>(
        &self,
        symbol: &str,
        records: &[R],
    ) -> Result<WriteSummary, PullError> {
        self.ensure_symbol_dir(symbol)?;

        let mut summary = WriteSummary::default();
        for record in records {
            let date = record.date().ok_or_else(|| {
                PullError::SchemaMismatch(format!("{symbol}: record has no date field"))
            })?;
            if !is_plain_file_name(date) {
                return Err(PullError::SchemaMismatch(format!(
                    "{symbol}: '{date}' cannot be used as a file name"
                )));
            }
            let path = self.record_path(symbol, date);
            if exists(&path)? {
                summary.skipped += 1;
                continue;
            }

            match self.format {
                OutputFormat::Json => write_atomic(&path, &to_pretty_json(record)?)?,
                OutputFormat::Parquet => write_parquet(&mut record.to_frame()?, &path)?,
            }
            tracing::debug!(path = %path.display(), "wrote record");
            summary.written += 1;
        }
        Ok(summary)
    }

    /// Write the metadata document once. Returns false if it already existed.
    pub fn write_metadata(
        &self,
        symbol: &str,
        metadata: &DatasetMetadata,
    ) -> Result<bool, PullError> {
        self.ensure_symbol_dir(symbol)?;
        let path = self.metadata_path(symbol);
        if exists(&path)? {
            return Ok(false);
        }
        write_atomic(&path, &to_pretty_json(metadata)?)?;
        Ok(true)
    }

    fn ensure_symbol_dir(&self, symbol: &str) -> Result<(), PullError> {
        if !is_plain_file_name(symbol) {
            return Err(PullError::FileSystem(format!(
                "symbol '{symbol}' cannot be used as a directory name"
            )));
        }
        let dir = self.symbol_dir(symbol);
        fs::create_dir_all(&dir)
            .map_err(|e| PullError::FileSystem(format!("create {}: {e}", dir.display())))
    }
}

/// A single path component that stays inside its parent directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.')
}

fn exists(path: &Path) -> Result<bool, PullError> {
    path.try_exists()
        .map_err(|e| PullError::FileSystem(format!("stat {}: {e}", path.display())))
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PullError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value
        .serialize(&mut ser)
        .map_err(|e| PullError::SchemaMismatch(format!("serialize record: {e}")))?;
    Ok(buf)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PullError> {
    let tmp_path = tmp_path(path);
    fs::write(&tmp_path, bytes)
        .map_err(|e| PullError::FileSystem(format!("write {}: {e}", tmp_path.display())))?;
    rename_into_place(&tmp_path, path)
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), PullError> {
    let tmp_path = tmp_path(path);
    let file = fs::File::create(&tmp_path)
        .map_err(|e| PullError::FileSystem(format!("create {}: {e}", tmp_path.display())))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| PullError::FileSystem(format!("write parquet: {e}")))?;
    rename_into_place(&tmp_path, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn rename_into_place(tmp_path: &Path, path: &Path) -> Result<(), PullError> {
    fs::rename(tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        PullError::FileSystem(format!("rename into {}: {e}", path.display()))
    })
}
