//! End-to-end pull tests against a local HTTP server.
//!
//! These drive the real blocking HTTP transport through the whole pipeline:
//! endpoint → request → envelope → reshape → decode → files on disk.

use httpmock::prelude::*;
use quandl_core::data::{
    pull_symbols, resolve_tickers, HttpTransport, LogProgress, OutputFormat, OutputStore,
    WikiBar,
};
use quandl_core::{DataType, DatabaseCode, PullConfig, PullError, ResponseFormat};
use std::fs;
use std::path::Path;

const FB_DATA: &str = r#"{"dataset_data":{"limit":null,"transform":null,"column_index":null,
    "column_names":["Date","Open","High","Low","Close","Volume","Ex-Dividend","Split Ratio",
    "Adj. Open","Adj. High","Adj. Low","Adj. Close","Adj. Volume"],
    "start_date":"2018-03-26","end_date":"2018-03-27","frequency":"daily",
    "data":[
      ["2018-03-27",156.31,162.85,150.75,152.19,76787884.0,0.0,1.0,156.31,162.85,150.75,152.19,76787884.0],
      ["2018-03-26",160.82,161.1,149.02,160.06,125438294.0,0.0,1.0,160.82,161.1,149.02,160.06,125438294.0]
    ],"collapse":null,"order":null}}"#;

const BAD_CODE: &str = r#"{"quandl_error":{"code":"QECx02","message":"You have submitted an incorrect Quandl code. Please check your Quandl codes and try again."}}"#;

const BAD_URL: &str = r#"{"quandl_error":{"code":"QEPx04","message":"We could not recognize the URL you requested: /api/v3/datasets/WIKI/BRK.B/data.json. Please check your URL and try again."}}"#;

const SYMBOLS: &str = r#"[
    {"Name": "Facebook, Inc.", "Sector": "Information Technology", "Symbol": "FB"},
    {"Name": "Bogus", "Sector": "Information Technology", "Symbol": "ZZZZ"},
    {"Name": "Berkshire Hathaway", "Sector": "Financials", "Symbol": "BRK.B"}
]"#;

fn config_for(server: &MockServer, base: &Path) -> PullConfig {
    PullConfig {
        api_key: Some("test-key".into()),
        protocol: "http".into(),
        host: server.address().to_string(),
        path: base.to_path_buf(),
        ..PullConfig::default()
    }
}

fn write_symbol_list(base: &Path) {
    fs::create_dir_all(base.join("input")).unwrap();
    fs::write(base.join("input").join("constituents_json.json"), SYMBOLS).unwrap();
}

#[test]
fn pulls_sector_and_skips_known_bad_tickers() {
    let server = MockServer::start();
    let fb = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v3/datasets/WIKI/FB/data.json")
            .query_param("api_key", "test-key");
        then.status(200)
            .header("content-type", "application/json")
            .body(FB_DATA);
    });
    let bogus = server.mock(|when, then| {
        when.method(GET).path("/api/v3/datasets/WIKI/ZZZZ/data.json");
        then.status(404).body(BAD_CODE);
    });

    let base = tempfile::tempdir().unwrap();
    write_symbol_list(base.path());
    let config = PullConfig {
        sector: "Information Technology".into(),
        ..config_for(&server, base.path())
    };

    let tickers = resolve_tickers(&config).unwrap();
    assert_eq!(tickers, vec!["FB", "ZZZZ"]);
    let refs: Vec<&str> = tickers.iter().map(String::as_str).collect();

    let transport = HttpTransport::new(config.api_key.clone()).unwrap();
    let store = OutputStore::new(config.output_dir(), config.output_format);
    let summary = pull_symbols(&transport, &store, &config, &refs, &LogProgress).unwrap();

    fb.assert();
    bogus.assert();
    assert_eq!(summary.skipped_symbols(), vec!["ZZZZ"]);
    assert_eq!(summary.files_written(), 2);

    let file = base.path().join("output/FB/2018-03-27.json");
    let bar: WikiBar = serde_json::from_str(&fs::read_to_string(file).unwrap()).unwrap();
    assert_eq!(bar.day_of_week.as_deref(), Some("Tuesday"));
    assert_eq!(bar.close, Some(152.19));
    assert_eq!(bar.adj_volume, Some(76787884.0));
    assert!(!base.path().join("output/ZZZZ").exists());
}

#[test]
fn unrecognized_url_is_skipped() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v3/datasets/WIKI/BRK.B/data.json");
        then.status(400).body(BAD_URL);
    });

    let base = tempfile::tempdir().unwrap();
    let config = config_for(&server, base.path());
    let transport = HttpTransport::new(None).unwrap();
    let store = OutputStore::new(config.output_dir(), config.output_format);

    let summary = pull_symbols(&transport, &store, &config, &["BRK.B"], &LogProgress).unwrap();
    assert_eq!(summary.skipped_symbols(), vec!["BRK.B"]);
    assert!(summary.fetched.is_empty());
}

#[test]
fn rerun_is_idempotent() {
    let server = MockServer::start();
    let fb = server.mock(|when, then| {
        when.method(GET).path("/api/v3/datasets/WIKI/FB/data.json");
        then.status(200).body(FB_DATA);
    });

    let base = tempfile::tempdir().unwrap();
    let config = config_for(&server, base.path());
    let transport = HttpTransport::new(None).unwrap();
    let store = OutputStore::new(config.output_dir(), config.output_format);

    let first = pull_symbols(&transport, &store, &config, &["FB"], &LogProgress).unwrap();
    let path = base.path().join("output/FB/2018-03-26.json");
    let before = fs::read(&path).unwrap();

    let second = pull_symbols(&transport, &store, &config, &["FB"], &LogProgress).unwrap();
    assert_eq!(first.files_written(), 2);
    assert_eq!(second.files_written(), 0);
    assert_eq!(second.fetched[0].skipped, 2);
    assert_eq!(fs::read(&path).unwrap(), before);
    fb.assert_hits(2);
}

#[test]
fn csv_format_goes_through_the_same_pipeline() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v3/datasets/WIKI/FB/data.csv");
        then.status(200)
            .header("content-type", "text/csv")
            .body("Date,Open,Close\n2024-01-03,11.0,12.5\n2024-01-02,10.5,11.0\n");
    });

    let base = tempfile::tempdir().unwrap();
    let config = PullConfig {
        format: ResponseFormat::Csv,
        ..config_for(&server, base.path())
    };
    let transport = HttpTransport::new(None).unwrap();
    let store = OutputStore::new(config.output_dir(), config.output_format);

    let summary = pull_symbols(&transport, &store, &config, &["FB"], &LogProgress).unwrap();
    assert_eq!(summary.files_written(), 2);

    let text = fs::read_to_string(base.path().join("output/FB/2024-01-02.json")).unwrap();
    let bar: WikiBar = serde_json::from_str(&text).unwrap();
    assert_eq!(bar.day_of_week.as_deref(), Some("Tuesday"));
    assert_eq!(bar.open, Some(10.5));
}

#[test]
fn metadata_pull_writes_metadata_file() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v3/datasets/WIKI/FB/metadata.json");
        then.status(200).body(
            r#"{"dataset":{"id":9775409,"dataset_code":"FB","database_code":"WIKI",
               "name":"Facebook Inc. (FB) Prices","column_names":["Date","Open"],
               "frequency":"daily","type":"Time Series","premium":false}}"#,
        );
    });

    let base = tempfile::tempdir().unwrap();
    let config = PullConfig {
        data_type: DataType::Metadata,
        ..config_for(&server, base.path())
    };
    let transport = HttpTransport::new(None).unwrap();
    let store = OutputStore::new(config.output_dir(), config.output_format);

    let summary = pull_symbols(&transport, &store, &config, &["FB"], &LogProgress).unwrap();
    assert_eq!(summary.files_written(), 1);
    let text = fs::read_to_string(base.path().join("output/FB/metadata.json")).unwrap();
    assert!(text.contains("\"dataset_code\": \"FB\""));
}

#[test]
fn parquet_output_for_cboe() {
    let server = MockServer::start();
    let vx = server.mock(|when, then| {
        when.method(GET).path("/api/v3/datasets/CBOE/VX1.json");
        then.status(200).body(
            r#"{"dataset":{"dataset_code":"VX1",
               "column_names":["Trade Date","Open","High","Low","Close","Settle","Change",
                 "Total Volume","EFP","Prev. Day Open Interest"],
               "data":[["2017-12-29",11.2,11.35,10.9,11.05,11.04,-0.21,63025.0,12.0,249587.0]]}}"#,
        );
    });

    let base = tempfile::tempdir().unwrap();
    let config = PullConfig {
        database_code: DatabaseCode::Cboe,
        output_format: OutputFormat::Parquet,
        ..config_for(&server, base.path())
    };
    let transport = HttpTransport::new(None).unwrap();
    let store = OutputStore::new(config.output_dir(), config.output_format);

    let summary = pull_symbols(&transport, &store, &config, &["VX1"], &LogProgress).unwrap();
    vx.assert();
    assert_eq!(summary.files_written(), 1);
    assert!(base.path().join("output/VX1/2017-12-29.txt").exists());
}

#[test]
fn network_failure_is_fatal() {
    let base = tempfile::tempdir().unwrap();
    let config = PullConfig {
        protocol: "http".into(),
        host: "127.0.0.1:1".into(),
        path: base.path().to_path_buf(),
        ..PullConfig::default()
    };
    let transport = HttpTransport::new(None).unwrap();
    let store = OutputStore::new(config.output_dir(), config.output_format);

    let err = pull_symbols(&transport, &store, &config, &["FB", "AAPL"], &LogProgress)
        .unwrap_err();
    assert!(matches!(err, PullError::Transport(_)));
}
