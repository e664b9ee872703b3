//! Quandl CLI: pull datasets for a list of tickers into per-date files.
//!
//! Commands:
//! - `pull`: fetch every selected ticker and write `{path}/output/{SYMBOL}/{date}.json`
//! - `url`: print the request URL for one ticker without fetching it
//! - `symbols`: list the tickers (or sectors) selected from the input file
//!
//! Settings come from an optional TOML file; command-line flags override it.
//! The API key falls back to the `QUANDL_API_KEY` environment variable.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use quandl_core::data::{
    pull_symbols, resolve_tickers, HttpTransport, LogProgress, OutputFormat, OutputStore,
    SymbolList,
};
use quandl_core::endpoints::DATASETS;
use quandl_core::{DataType, DatabaseCode, PullConfig, ResponseFormat};

#[derive(Parser)]
#[command(name = "quandl", about = "Quandl CLI: pull end-of-day datasets to disk")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every selected ticker and write one file per date.
    Pull {
        #[command(flatten)]
        opts: PullArgs,
    },
    /// Print the request URL for a ticker.
    Url {
        #[command(flatten)]
        opts: PullArgs,
    },
    /// List the tickers selected from the input file.
    Symbols {
        #[command(flatten)]
        opts: SymbolsArgs,
    },
}

/// Flags shared by every command. Unset flags keep the config file value.
#[derive(Args, Debug, Default)]
struct PullArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Quandl API key. Defaults to $QUANDL_API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    /// Data type: data or metadata.
    #[arg(long)]
    datatype: Option<DataType>,

    /// Database code: WIKI or CBOE.
    #[arg(long)]
    dbcode: Option<DatabaseCode>,

    /// Response format: json or csv.
    #[arg(long)]
    format: Option<ResponseFormat>,

    /// Symbol list file name under {path}/input/.
    #[arg(long)]
    input_file: Option<String>,

    /// Sector to pull, or "all".
    #[arg(long)]
    sector: Option<String>,

    /// Base directory holding input/ and output/.
    #[arg(long)]
    path: Option<PathBuf>,

    /// Pull a single ticker instead of the input list.
    #[arg(long)]
    ticker: Option<String>,

    /// Output file format: json or parquet.
    #[arg(long)]
    output_format: Option<OutputFormat>,
}

/// Flags for `symbols`: only what selects the input list.
#[derive(Args, Debug, Default)]
struct SymbolsArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbol list file name under {path}/input/.
    #[arg(long)]
    input_file: Option<String>,

    /// Sector to list, or "all".
    #[arg(long)]
    sector: Option<String>,

    /// Base directory holding input/.
    #[arg(long)]
    path: Option<PathBuf>,

    /// Print the distinct sector names instead of tickers.
    #[arg(long, default_value_t = false)]
    sectors: bool,
}

impl SymbolsArgs {
    fn into_config(self) -> Result<PullConfig> {
        PullArgs {
            config: self.config,
            input_file: self.input_file,
            sector: self.sector,
            path: self.path,
            ..PullArgs::default()
        }
        .into_config()
    }
}

impl PullArgs {
    /// Load the config file (or defaults) and apply the flags on top.
    fn into_config(self) -> Result<PullConfig> {
        let mut config = match &self.config {
            Some(path) => PullConfig::from_file(path)?,
            None => PullConfig::default(),
        };

        if let Some(key) = self.api_key {
            config.api_key = Some(key);
        }
        if let Some(data_type) = self.datatype {
            config.data_type = data_type;
        }
        if let Some(code) = self.dbcode {
            config.database_code = code;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(input_file) = self.input_file {
            config.input_file = input_file;
        }
        if let Some(sector) = self.sector {
            config.sector = sector;
        }
        if let Some(path) = self.path {
            config.path = path;
        }
        if let Some(ticker) = self.ticker {
            config.ticker = Some(ticker);
        }
        if let Some(output_format) = self.output_format {
            config.output_format = output_format;
        }

        Ok(config.with_env_api_key())
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pull { opts } => run_pull(opts.into_config()?),
        Commands::Url { opts } => run_url(&opts.into_config()?),
        Commands::Symbols { opts } => {
            let sectors = opts.sectors;
            run_symbols(&opts.into_config()?, sectors)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_pull(config: PullConfig) -> Result<()> {
    config.validate()?;

    let transport = HttpTransport::new(config.api_key.clone())?;
    if !transport.has_api_key() {
        tracing::warn!("no API key configured; anonymous requests are rate limited");
    }
    let store = OutputStore::new(config.output_dir(), config.output_format);

    let tickers = resolve_tickers(&config)?;
    if tickers.is_empty() {
        bail!("no tickers selected for sector '{}'", config.sector);
    }
    let refs: Vec<&str> = tickers.iter().map(String::as_str).collect();

    tracing::info!(
        database = %config.database_code,
        data_type = %config.data_type,
        format = %config.format,
        output = %store.output_dir().display(),
        tickers = refs.len(),
        "starting pull"
    );

    match pull_symbols(&transport, &store, &config, &refs, &LogProgress) {
        Ok(summary) => {
            for (symbol, err) in &summary.skipped {
                eprintln!("Skipped {symbol}: {err}");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "pull failed");
            std::process::exit(1);
        }
    }
}

fn run_url(config: &PullConfig) -> Result<()> {
    let ticker = config
        .ticker
        .as_deref()
        .filter(|t| !t.is_empty())
        .context("--ticker is required for the url command")?;

    let url = config.endpoint().url(
        DATASETS,
        config.database_code.as_str(),
        ticker,
        config.request_data_type(),
        config.format.as_str(),
    )?;
    println!("{url}");
    Ok(())
}

fn run_symbols(config: &PullConfig, sectors: bool) -> Result<()> {
    let list = SymbolList::from_file(&config.input_path())?;

    if sectors {
        for name in list.sector_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let symbols = list.symbols_in_sector(&config.sector);
    for symbol in &symbols {
        println!("{symbol}");
    }
    eprintln!(
        "{} of {} symbols in sector '{}'",
        symbols.len(),
        list.len(),
        config.sector
    );
    Ok(())
}
