//! Row reshaper: positional rows → records keyed by column name.
//!
//! The API returns a dataset as `column_names` plus a bare array of arrays.
//! Nothing downstream can work with positional cells, so this is where the
//! schema is re-established:
//!
//! - each cell is paired with the column name at the same index
//! - numbers and strings pass through unchanged
//! - any other JSON value (null, bool, array, object) is emitted as its JSON
//!   text in a string
//! - a `Date` column additionally produces a `DayOfWeek` field holding the
//!   English weekday name, emitted immediately before `Date`
//!
//! Key order inside each record follows emission order (serde_json is built
//! with `preserve_order`).

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::error::PullError;

/// Column that triggers day-of-week enrichment.
pub const DATE_COLUMN: &str = "Date";

/// Derived field inserted ahead of [`DATE_COLUMN`].
pub const DAY_OF_WEEK_FIELD: &str = "DayOfWeek";

/// Calendar date format used by the API.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reshape rows and serialize them as a JSON array for typed decoding.
///
/// An empty row list yields `[]`.
pub fn reshape(column_names: &[String], rows: &[Vec<Value>]) -> Result<Vec<u8>, PullError> {
    let records = reshape_rows(column_names, rows)?;
    serde_json::to_vec(&records).map_err(|e| PullError::Parse(format!("reshaped rows: {e}")))
}

/// Reshape rows into keyed records, one per input row, in input order.
pub fn reshape_rows(
    column_names: &[String],
    rows: &[Vec<Value>],
) -> Result<Vec<Map<String, Value>>, PullError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| reshape_row(column_names, row, i))
        .collect()
}

fn reshape_row(
    column_names: &[String],
    row: &[Value],
    index: usize,
) -> Result<Map<String, Value>, PullError> {
    // A short row must not be silently truncated, a long one has cells
    // without a name.
    if row.len() != column_names.len() {
        return Err(PullError::IndexOutOfRange {
            row: index,
            expected: column_names.len(),
            found: row.len(),
        });
    }

    let mut record = Map::with_capacity(row.len() + 1);
    for (name, value) in column_names.iter().zip(row) {
        if name == DATE_COLUMN {
            let date = parse_date(value)?;
            record.insert(
                DAY_OF_WEEK_FIELD.to_string(),
                Value::String(weekday_name(date)),
            );
        }
        record.insert(name.clone(), classify(value));
    }
    Ok(record)
}

/// Three-way type dispatch over a raw cell.
fn classify(value: &Value) -> Value {
    match value {
        Value::Number(_) | Value::String(_) => value.clone(),
        other => Value::String(other.to_string()),
    }
}

fn parse_date(value: &Value) -> Result<NaiveDate, PullError> {
    let text = value.as_str().ok_or_else(|| PullError::DateParse {
        value: value.to_string(),
        reason: "date cell is not a string".into(),
    })?;
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| PullError::DateParse {
        value: text.to_string(),
        reason: e.to_string(),
    })?;
    // The raw text becomes a file name, so only the canonical zero-padded
    // form is accepted.
    if date.format(DATE_FORMAT).to_string() != text {
        return Err(PullError::DateParse {
            value: text.to_string(),
            reason: "expected YYYY-MM-DD".into(),
        });
    }
    Ok(date)
}

/// Full English weekday name ("Monday" .. "Sunday").
pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}
