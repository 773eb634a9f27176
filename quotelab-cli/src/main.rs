//! QuoteLab CLI: symbol resolution, price collection and model signals.
//!
//! Commands:
//! - `resolve`: print the canonical `TICKER.SUFFIX` for a ticker or company name
//! - `collect`: fetch the watchlist from Stooq and merge it into the price store
//! - `analyze`: ask the model for a signal on one or more symbols
//! - `signals reset` / `signals show`: manage the signal log
//! - `status`: report the price store and per-symbol watermarks

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quotelab_core::collect::Watermark;
use quotelab_core::data::{HttpClient, StooqProvider, YahooChart, YahooSearch};
use quotelab_core::domain::SignalRow;
use quotelab_core::llm::GeminiClient;
use quotelab_core::resolve::Resolver;
use quotelab_core::store::{CsvTable, ParquetPriceTable, TableStore};
use quotelab_runner::{
    AnalysisRequest, AnalyzeError, Analyzer, AppConfig, Collector, EntryOutcome, LogProgress,
    DEFAULT_CONFIG_FILE,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "quotelab",
    version,
    about = "QuoteLab CLI: stock symbol resolution, price collection and LLM trading signals"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Data directory. Overrides [storage] data_dir.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a ticker or company name to TICKER.SUFFIX.
    Resolve {
        /// Ticker (AAPL, AAPL.US) or company name (Apple, 삼성전자).
        query: String,

        /// Suffix for bare tickers from unknown exchanges (default from config: US).
        #[arg(long)]
        market: Option<String>,

        /// Skip the Yahoo search lookup.
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Collect daily prices for every active watchlist entry.
    Collect,
    /// Analyze symbols with the model and record the signals.
    Analyze {
        /// Symbols or company names (e.g., TSLA.US "Apple" 카카오).
        #[arg(required = true)]
        queries: Vec<String>,

        /// Number of most recent rows sent to the model.
        #[arg(long)]
        lookback: Option<usize>,

        /// Model identifier (e.g., models/gemini-2.5-flash).
        #[arg(long)]
        model: Option<String>,

        /// Suffix for bare tickers from unknown exchanges.
        #[arg(long)]
        market: Option<String>,
    },
    /// Signal log commands.
    Signals {
        #[command(subcommand)]
        action: SignalsAction,
    },
    /// Report the price store and watermarks.
    Status,
}

#[derive(Subcommand)]
enum SignalsAction {
    /// Replace the signal log with an empty one (header only).
    Reset,
    /// Print the signal log.
    Show,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    match cli.command {
        Commands::Resolve {
            query,
            market,
            offline,
        } => {
            apply_market(&mut config, market);
            run_resolve(&config, &query, offline)
        }
        Commands::Collect => run_collect(&config),
        Commands::Analyze {
            queries,
            lookback,
            model,
            market,
        } => {
            apply_market(&mut config, market);
            if let Some(lookback) = lookback {
                config.analyzer.lookback = lookback;
            }
            if let Some(model) = model {
                config.analyzer.model = model;
            }
            config.validate()?;
            run_analyze(&config, &queries)
        }
        Commands::Signals { action } => match action {
            SignalsAction::Reset => run_signals_reset(&config),
            SignalsAction::Show => run_signals_show(&config),
        },
        Commands::Status => run_status(&config),
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn apply_market(config: &mut AppConfig, market: Option<String>) {
    if let Some(market) = market {
        config.resolver.default_suffix = market;
    }
}

fn http_client(config: &AppConfig) -> Result<HttpClient> {
    HttpClient::new(config.http.timeout(), config.http.max_retries).context("building HTTP client")
}

fn price_table(config: &AppConfig) -> ParquetPriceTable {
    ParquetPriceTable::new("prices", config.storage.prices_path())
}

fn state_table(config: &AppConfig) -> CsvTable<Watermark> {
    CsvTable::new("state", config.storage.state_path())
}

fn signal_table(config: &AppConfig) -> CsvTable<SignalRow> {
    CsvTable::new("signals", config.storage.signals_path())
}

fn run_resolve(config: &AppConfig, query: &str, offline: bool) -> Result<()> {
    let search = YahooSearch::new(http_client(config)?);
    let resolver = if offline {
        Resolver::offline()
    } else {
        Resolver::new(&search)
    };
    let symbol = resolver.resolve(query, &config.resolver.default_suffix)?;
    println!("{symbol}");
    Ok(())
}

fn run_collect(config: &AppConfig) -> Result<()> {
    let watchlist = &config.collector.watchlist;
    if watchlist.is_empty() {
        println!("Watchlist is empty; add [[collector.watchlist]] entries to the config.");
        return Ok(());
    }

    let http = http_client(config)?;
    let search = YahooSearch::new(http.clone());
    let stooq = StooqProvider::new(http);
    let collector = Collector::new(
        Resolver::new(&search),
        &stooq,
        &config.collector,
        &config.resolver.default_suffix,
    );

    let summary = collector.run(
        watchlist,
        &price_table(config),
        &state_table(config),
        &LogProgress,
    )?;

    for entry in &summary.entries {
        match &entry.outcome {
            EntryOutcome::Merged { symbol, added } => {
                println!("[ok]   {:<24} {:<12} +{added} rows", entry.target, symbol.as_str())
            }
            EntryOutcome::Skipped => println!("[skip] {:<24} inactive", entry.target),
            EntryOutcome::Failed { reason } => {
                println!("[err]  {:<24} {reason}", entry.target)
            }
        }
    }
    println!(
        "{} merged, {} skipped, {} failed; {} rows added, {} rows stored",
        summary.merged(),
        summary.skipped(),
        summary.failed(),
        summary.rows_added(),
        summary.total_rows
    );

    if summary.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_analyze(config: &AppConfig, queries: &[String]) -> Result<()> {
    let http = http_client(config)?;
    let search = YahooSearch::new(http.clone());
    let chart = YahooChart::new(http.clone());
    let gemini = GeminiClient::from_env(http, &config.analyzer.api_key_env)?;

    let analyzer = Analyzer::new(
        Resolver::new(&search),
        Some(&chart),
        &gemini,
        &config.analyzer,
        &config.resolver.default_suffix,
    );
    let requests: Vec<AnalysisRequest> = queries
        .iter()
        .map(|q| AnalysisRequest::new(q.as_str(), &config.analyzer))
        .collect();

    println!(
        "[>] Analyzing {} request(s): lookback {} rows, model {}",
        requests.len(),
        config.analyzer.lookback,
        config.analyzer.model
    );
    println!();

    let prices = price_table(config);
    let signals = signal_table(config);
    let results = analyzer.analyze_batch(&requests, &prices, &signals);

    let mut failed = 0;
    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(outcome) => {
                println!("[ok] {}", request.query);
                println!("    Symbol: {}", outcome.symbol);
                println!("    Date: {}", outcome.date);
                println!("    Signal: {}", outcome.value);
                match outcome.threshold {
                    Some(c) => println!("    Confidence: {c:.2}"),
                    None => println!("    Confidence: N/A"),
                }
                println!("    Message: {}", outcome.message);
            }
            Err(e) => {
                failed += 1;
                report_analyze_error(&request.query, &e);
            }
        }
        println!();
    }

    info!(path = %config.storage.signals_path().display(), "signal log updated");
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn report_analyze_error(query: &str, err: &AnalyzeError) {
    if err.is_connectivity() {
        println!("[warn] {query}: {err}");
        println!("       The remote call may still complete; check the signal log later.");
        return;
    }
    match err.http_status() {
        Some((code, url)) => {
            println!("[err] {query}: HTTP {code}");
            println!("      {url}");
        }
        None => println!("[err] {query}: {err}"),
    }
}

fn run_signals_reset(config: &AppConfig) -> Result<()> {
    let table = signal_table(config);
    table.save(&[])?;
    println!("Signal log reset: {}", table.path().display());
    Ok(())
}

fn run_signals_show(config: &AppConfig) -> Result<()> {
    let rows = signal_table(config).load()?;
    if rows.is_empty() {
        println!("Signal log is empty.");
        return Ok(());
    }

    println!(
        "{:<12} {:<8} {:<10} {:<5} {:>5}  {:<20}  message",
        "symbol", "type", "date", "value", "conf", "created_at"
    );
    for row in &rows {
        let confidence = row
            .threshold
            .map(|c| format!("{c:.2}"))
            .unwrap_or_default();
        println!(
            "{:<12} {:<8} {:<10} {:<5} {:>5}  {:<20}  {}",
            row.symbol.as_str(),
            row.kind,
            row.date,
            row.value.as_str(),
            confidence,
            row.created_at.format("%Y-%m-%d %H:%M:%S"),
            row.message
        );
    }
    Ok(())
}

fn run_status(config: &AppConfig) -> Result<()> {
    let prices = price_table(config);
    println!("Data directory: {}", config.storage.data_dir.display());

    match prices.meta()? {
        None => println!("Price store: empty (run `quotelab collect`)"),
        Some(meta) => {
            println!("Price store: {}", prices.path().display());
            println!("  rows:       {}", meta.row_count);
            println!("  symbols:    {}", meta.symbols.join(", "));
            if let (Some(first), Some(last)) = (meta.first_date, meta.last_date) {
                println!("  range:      {first} → {last}");
            }
            println!("  hash:       {}", &meta.data_hash[..meta.data_hash.len().min(16)]);
            println!("  written at: {}", meta.written_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }

    let marks = state_table(config).load()?;
    if !marks.is_empty() {
        println!();
        println!("{:<12} last_date", "symbol");
        for mark in &marks {
            println!("{:<12} {}", mark.symbol.as_str(), mark.last_date);
        }
    }

    let signals = signal_table(config).load()?;
    println!();
    println!("Signal log: {} row(s)", signals.len());
    Ok(())
}
