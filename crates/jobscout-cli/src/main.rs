use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobscout_client::{Adzuna, Indeed, ReqwestTransport, Seek, TransportConfig};
use jobscout_core::engine::{RunReport, SearchEngine};
use jobscout_core::export::{export_filename, write_csv};
use jobscout_core::throttle::{ThrottleConfig, ThrottledTransport};
use jobscout_core::traits::{JobBoard, Transport};
use jobscout_core::{
    AppError, EngineConfig, SearchScope, SearchTerms, StatusResponse, TracingRunReporter,
};

#[derive(Parser)]
#[command(name = "jobscout", version, about = "Paginated job board scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one job board and export every listing to CSV
    Search {
        /// Board to search
        #[arg(short, long, value_enum)]
        board: BoardKind,

        /// Free-text search terms
        #[arg(short, long)]
        terms: String,

        /// Where the terms must appear
        #[arg(long, value_enum, default_value_t = ScopeArg::Title)]
        scope: ScopeArg,

        /// Require every term instead of any of them
        #[arg(long, default_value_t = false)]
        all_terms: bool,

        /// CSV destination (defaults to jobs-export-<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fetches in flight per stage (overrides JOBSCOUT_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-fetch timeout in seconds (overrides JOBSCOUT_FETCH_TIMEOUT_SECS)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: Option<u64>,

        /// Minimum delay between requests to the same host, in milliseconds
        #[arg(long, env = "JOBSCOUT_DELAY_MS")]
        delay_ms: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BoardKind {
    Adzuna,
    Indeed,
    Seek,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    Title,
    TitleAndDescription,
}

impl From<ScopeArg> for SearchScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Title => SearchScope::Title,
            ScopeArg::TitleAndDescription => SearchScope::TitleAndDescription,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            board,
            terms,
            scope,
            all_terms,
            output,
            concurrency,
            timeout_secs,
            delay_ms,
        } => {
            let mut config = EngineConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
            if let Some(n) = concurrency {
                config = config.with_concurrency(n);
            }
            if let Some(secs) = timeout_secs {
                config = config.with_fetch_timeout(Duration::from_secs(secs));
            }
            let search = SearchTerms::new(terms)
                .with_scope(scope.into())
                .with_every_term(all_terms);

            cmd_search(board, &search, config, delay_ms, output).await?;
        }
    }

    Ok(())
}

async fn cmd_search(
    board: BoardKind,
    search: &SearchTerms,
    config: EngineConfig,
    delay_ms: Option<u64>,
    output: Option<PathBuf>,
) -> Result<()> {
    let transport = ReqwestTransport::with_config(TransportConfig {
        timeout: config.fetch_timeout,
        ..TransportConfig::default()
    })
    .map_err(|e| anyhow::anyhow!(e))?;

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            token.cancel();
        }
    });

    let outcome = match delay_ms {
        Some(ms) => {
            let delay = Duration::from_millis(ms);
            let throttle = ThrottleConfig::new(delay).with_jitter(delay / 2);
            let transport = ThrottledTransport::new(transport, throttle);
            search_board(board, transport, search, config, cancel).await
        }
        None => search_board(board, transport, search, config, cancel).await,
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&StatusResponse::from_error(&e))?);
            return Err(anyhow::anyhow!(e));
        }
    };

    if report.is_no_results() {
        println!("{}", serde_json::to_string_pretty(&StatusResponse::no_results())?);
        return Ok(());
    }

    let path = output
        .unwrap_or_else(|| PathBuf::from(export_filename(chrono::Local::now().date_naive())));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_csv(&report.table, BufWriter::new(file)).map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        rows = report.table.len(),
        absent = report.absent,
        pages = report.page_count,
        total = report.total_results,
        path = %path.display(),
        "Export written"
    );
    println!("{}", path.display());

    Ok(())
}

async fn search_board<T: Transport>(
    board: BoardKind,
    transport: T,
    search: &SearchTerms,
    config: EngineConfig,
    cancel: CancellationToken,
) -> Result<RunReport, AppError> {
    match board {
        BoardKind::Adzuna => run_board(Adzuna, transport, search, config, cancel).await,
        BoardKind::Indeed => run_board(Indeed, transport, search, config, cancel).await,
        BoardKind::Seek => run_board(Seek, transport, search, config, cancel).await,
    }
}

async fn run_board<B: JobBoard, T: Transport>(
    board: B,
    transport: T,
    search: &SearchTerms,
    config: EngineConfig,
    cancel: CancellationToken,
) -> Result<RunReport, AppError> {
    tracing::info!(board = board.name(), terms = %search.terms, "Searching");
    SearchEngine::new(board, transport, config)
        .with_cancellation(cancel)
        .search(search, &TracingRunReporter)
        .await
}
