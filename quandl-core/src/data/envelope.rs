//! Response envelope parsing.
//!
//! A response body is read twice: once for the `quandl_error` envelope, once
//! for the dataset wrapper holding `column_names` and the positional `data`
//! rows. CSV bodies are read into the same `DataSet` shape.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::endpoints::ResponseFormat;
use crate::error::{PullError, RemoteErrorKind};

/// Error code returned for a dataset code that does not exist.
pub const INVALID_CODE: &str = "QECx02";

const INVALID_CODE_MESSAGE: &str = "Quandl code. Please check your Quandl codes and try again";
const UNRECOGNIZED_URL_MESSAGE: &str = "We could not recognize the URL you requested";

/// The tabular payload of a dataset response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    pub column_names: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
    #[serde(default)]
    pub column_index: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub transform: Option<String>,
    #[serde(default)]
    pub collapse: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub newest_available_date: Option<String>,
    #[serde(default)]
    pub oldest_available_date: Option<String>,
}

impl DataSet {
    pub fn row_count(&self) -> usize {
        self.data.len()
    }
}

/// Descriptive document returned for the `metadata` data type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default)]
    pub id: Option<u64>,
    pub dataset_code: String,
    #[serde(default)]
    pub database_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub refreshed_at: Option<String>,
    #[serde(default)]
    pub newest_available_date: Option<String>,
    #[serde(default)]
    pub oldest_available_date: Option<String>,
    #[serde(default)]
    pub column_names: Vec<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default, rename = "type")]
    pub dataset_type: Option<String>,
    #[serde(default)]
    pub premium: Option<bool>,
    #[serde(default)]
    pub database_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    quandl_error: Option<QuandlError>,
}

#[derive(Debug, Default, Deserialize)]
struct QuandlError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Map a remote error to the conditions the driver knows how to skip.
///
/// The explicit error code is matched first; the message substrings cover
/// responses that arrive without a code.
pub fn classify(code: Option<&str>, message: &str) -> RemoteErrorKind {
    if code == Some(INVALID_CODE) || message.contains(INVALID_CODE_MESSAGE) {
        RemoteErrorKind::InvalidCode
    } else if message.contains(UNRECOGNIZED_URL_MESSAGE) {
        RemoteErrorKind::UnrecognizedUrl
    } else {
        RemoteErrorKind::Other
    }
}

/// Check a response body for an API error envelope.
///
/// JSON bodies must parse. CSV bodies are only inspected when they look like
/// a JSON object, since errors are always reported as JSON.
pub fn check_error(body: &[u8], format: ResponseFormat) -> Result<(), PullError> {
    if format != ResponseFormat::Json && !looks_like_json_object(body) {
        return Ok(());
    }

    let envelope: ErrorEnvelope = serde_json::from_slice(body)
        .map_err(|e| PullError::Parse(format!("error envelope: {e}")))?;

    let Some(err) = envelope.quandl_error else {
        return Ok(());
    };
    match err.message {
        Some(message) if !message.is_empty() => Err(PullError::Remote {
            kind: classify(err.code.as_deref(), &message),
            code: err.code,
            message,
        }),
        _ => Ok(()),
    }
}

fn looks_like_json_object(body: &[u8]) -> bool {
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

/// Parse a JSON dataset response.
///
/// `data.json` requests wrap the rows in `dataset_data`; bare dataset
/// requests (CBOE) wrap them in `dataset`.
pub fn parse_dataset(body: &[u8]) -> Result<DataSet, PullError> {
    let mut root: Value =
        serde_json::from_slice(body).map_err(|e| PullError::Parse(format!("dataset: {e}")))?;

    let inner = ["dataset_data", "dataset"]
        .iter()
        .find_map(|key| root.get_mut(*key).map(Value::take))
        .ok_or_else(|| {
            PullError::Parse("response has neither 'dataset_data' nor 'dataset'".into())
        })?;

    serde_json::from_value(inner).map_err(|e| PullError::Parse(format!("dataset: {e}")))
}

/// Parse a CSV dataset response: a header row of column names, then one
/// record per observation.
///
/// Cells that parse as finite numbers become JSON numbers, empty cells
/// become null, anything else stays a string. Ragged rows are kept as-is so
/// the reshaper reports them against the header.
pub fn parse_csv(body: &[u8]) -> Result<DataSet, PullError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let column_names: Vec<String> = reader
        .headers()
        .map_err(|e| PullError::Parse(format!("csv header: {e}")))?
        .iter()
        .map(String::from)
        .collect();

    let mut data = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PullError::Parse(format!("csv record: {e}")))?;
        data.push(record.iter().map(csv_cell).collect());
    }

    Ok(DataSet {
        column_names,
        data,
        ..DataSet::default()
    })
}

fn csv_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    cell.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}

/// Parse the `dataset` document returned for a metadata request.
pub fn parse_metadata(body: &[u8]) -> Result<DatasetMetadata, PullError> {
    #[derive(Deserialize)]
    struct Wrapper {
        dataset: DatasetMetadata,
    }

    serde_json::from_slice::<Wrapper>(body)
        .map(|w| w.dataset)
        .map_err(|e| PullError::Parse(format!("metadata: {e}")))
}
