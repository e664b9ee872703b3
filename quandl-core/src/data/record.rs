//! Typed records, one fixed schema per database code.
//!
//! Decoding is permissive about keys: fields missing from a reshaped record
//! decode to `None` and keys with no matching field are ignored. A known key
//! holding the wrong JSON type is a schema mismatch.

use polars::prelude::*;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::endpoints::DatabaseCode;
use crate::error::PullError;

/// A record that can be persisted as one file per date.
pub trait DatedRecord: Serialize {
    /// Observation date, used as the output file name.
    fn date(&self) -> Option<&str>;

    /// One-row columnar representation of the record.
    fn to_frame(&self) -> Result<DataFrame, PullError>;
}

/// End-of-day equity bar (`WIKI`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WikiBar {
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
    #[serde(rename = "DayOfWeek", default)]
    pub day_of_week: Option<String>,
    #[serde(rename = "Open", default, deserialize_with = "nullable_f64")]
    pub open: Option<f64>,
    #[serde(rename = "High", default, deserialize_with = "nullable_f64")]
    pub high: Option<f64>,
    #[serde(rename = "Low", default, deserialize_with = "nullable_f64")]
    pub low: Option<f64>,
    #[serde(rename = "Close", default, deserialize_with = "nullable_f64")]
    pub close: Option<f64>,
    #[serde(rename = "Volume", default, deserialize_with = "nullable_f64")]
    pub volume: Option<f64>,
    #[serde(rename = "Ex-Dividend", default, deserialize_with = "nullable_f64")]
    pub ex_dividend: Option<f64>,
    #[serde(rename = "Split Ratio", default, deserialize_with = "nullable_f64")]
    pub split_ratio: Option<f64>,
    #[serde(rename = "Adj. Open", default, deserialize_with = "nullable_f64")]
    pub adj_open: Option<f64>,
    #[serde(rename = "Adj. High", default, deserialize_with = "nullable_f64")]
    pub adj_high: Option<f64>,
    #[serde(rename = "Adj. Low", default, deserialize_with = "nullable_f64")]
    pub adj_low: Option<f64>,
    #[serde(rename = "Adj. Close", default, deserialize_with = "nullable_f64")]
    pub adj_close: Option<f64>,
    #[serde(rename = "Adj. Volume", default, deserialize_with = "nullable_f64")]
    pub adj_volume: Option<f64>,
}

/// Futures settlement bar (`CBOE`). The date column is `Trade Date`, so the
/// reshaper never derives a day of week for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CboeBar {
    #[serde(rename = "Trade Date", default)]
    pub trade_date: Option<String>,
    #[serde(rename = "DayOfWeek", default)]
    pub day_of_week: Option<String>,
    #[serde(rename = "Open", default, deserialize_with = "nullable_f64")]
    pub open: Option<f64>,
    #[serde(rename = "High", default, deserialize_with = "nullable_f64")]
    pub high: Option<f64>,
    #[serde(rename = "Low", default, deserialize_with = "nullable_f64")]
    pub low: Option<f64>,
    #[serde(rename = "Close", default, deserialize_with = "nullable_f64")]
    pub close: Option<f64>,
    #[serde(rename = "Settle", default, deserialize_with = "nullable_f64")]
    pub settle: Option<f64>,
    #[serde(rename = "Change", default, deserialize_with = "nullable_f64")]
    pub change: Option<f64>,
    #[serde(rename = "Total Volume", default, deserialize_with = "nullable_f64")]
    pub total_volume: Option<f64>,
    #[serde(rename = "EFP", default, deserialize_with = "nullable_f64")]
    pub efp: Option<f64>,
    #[serde(
        rename = "Prev. Day Open Interest",
        default,
        deserialize_with = "nullable_f64"
    )]
    pub prev_day_open_interest: Option<f64>,
}

impl DatedRecord for WikiBar {
    fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    fn to_frame(&self) -> Result<DataFrame, PullError> {
        frame(vec![
            Column::new("Date".into(), [self.date.clone()]),
            Column::new("DayOfWeek".into(), [self.day_of_week.clone()]),
            Column::new("Open".into(), [self.open]),
            Column::new("High".into(), [self.high]),
            Column::new("Low".into(), [self.low]),
            Column::new("Close".into(), [self.close]),
            Column::new("Volume".into(), [self.volume]),
            Column::new("ExDividend".into(), [self.ex_dividend]),
            Column::new("SplitRatio".into(), [self.split_ratio]),
            Column::new("AdjOpen".into(), [self.adj_open]),
            Column::new("AdjHigh".into(), [self.adj_high]),
            Column::new("AdjLow".into(), [self.adj_low]),
            Column::new("AdjClose".into(), [self.adj_close]),
            Column::new("AdjVolume".into(), [self.adj_volume]),
        ])
    }
}

impl DatedRecord for CboeBar {
    fn date(&self) -> Option<&str> {
        self.trade_date.as_deref()
    }

    fn to_frame(&self) -> Result<DataFrame, PullError> {
        frame(vec![
            Column::new("TradeDate".into(), [self.trade_date.clone()]),
            Column::new("DayOfWeek".into(), [self.day_of_week.clone()]),
            Column::new("Open".into(), [self.open]),
            Column::new("High".into(), [self.high]),
            Column::new("Low".into(), [self.low]),
            Column::new("Close".into(), [self.close]),
            Column::new("Settle".into(), [self.settle]),
            Column::new("Change".into(), [self.change]),
            Column::new("TotalVolume".into(), [self.total_volume]),
            Column::new("EFP".into(), [self.efp]),
            Column::new("PrevDayOpenInterest".into(), [self.prev_day_open_interest]),
        ])
    }
}

fn frame(columns: Vec<Column>) -> Result<DataFrame, PullError> {
    DataFrame::new(columns).map_err(|e| PullError::FileSystem(format!("dataframe creation: {e}")))
}

/// Decoded rows of one dataset, tagged by schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    Wiki(Vec<WikiBar>),
    Cboe(Vec<CboeBar>),
}

impl Records {
    pub fn database_code(&self) -> DatabaseCode {
        match self {
            Records::Wiki(_) => DatabaseCode::Wiki,
            Records::Cboe(_) => DatabaseCode::Cboe,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::Wiki(v) => v.len(),
            Records::Cboe(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode reshaped bytes into the schema selected by `database`.
pub fn decode(database: DatabaseCode, bytes: &[u8]) -> Result<Records, PullError> {
    let mismatch = |e: serde_json::Error| PullError::SchemaMismatch(format!("{database}: {e}"));
    match database {
        DatabaseCode::Wiki => serde_json::from_slice(bytes)
            .map(Records::Wiki)
            .map_err(mismatch),
        DatabaseCode::Cboe => serde_json::from_slice(bytes)
            .map(Records::Cboe)
            .map_err(mismatch),
    }
}

/// Numeric field decoder.
///
/// The reshaper turns a JSON null cell into the string `"null"`; both forms
/// decode to `None`. Any other string is a type mismatch.
fn nullable_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("number {n} is not representable as f64"))),
        Some(Value::String(s)) if s == "null" => Ok(None),
        Some(other) => Err(de::Error::custom(format!("expected a number, found {other}"))),
    }
}
