//! BizNavi: e-commerce operations assistant CLI
//!
//! Usage:
//!   biznavi                       chat (default)
//!   biznavi build-index           build the policy knowledge index
//!   biznavi verify-sales          independent gross/net revenue check
//!   biznavi forecast Kurta        demand forecast report
//!
//! Set RUST_LOG=debug for verbose diagnostics on stderr.

mod config;
mod render;
mod repl;

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use biznavi_contracts::{
    dataset::Provenance,
    error::{NaviError, NaviResult},
};
use biznavi_core::{traits::DatasetProvider, Orchestrator, Session};
use biznavi_data::{CsvDatasetProvider, PersistedKnowledgeIndex, StoredIndex, TrendSeasonalModel};
use biznavi_routing::RuleOracle;
use biznavi_tools::{builtin_catalog, forecast_summary, format, sales_figures, SalesFilter};

use crate::config::AppConfig;

// ── CLI definition ────────────────────────────────────────────────────────────

/// BizNavi: ask questions about sales, warehouse policies and demand.
#[derive(Parser)]
#[command(
    name = "biznavi",
    about = "E-commerce operations assistant",
    long_about = "Answers questions about the sales report, warehouse policies and future\n\
                  demand, and draws charts, inside a persistent chat session."
)]
struct Cli {
    /// Configuration file (default: ./biznavi.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat session (the default).
    Chat,
    /// Build the policy knowledge index from the policy CSV.
    BuildIndex {
        /// Policy CSV to index instead of the configured one.
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Compute gross and net revenue directly, bypassing routing.
    VerifySales {
        #[arg(long, default_value = "Kurta")]
        category: String,
        /// Month number, 1 = January.
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Forecast unit demand for one category.
    Forecast {
        category: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref());

    // RUST_LOG wins over the configured filter.
    let filter = config
        .as_ref()
        .map(|c| c.logging.filter.as_str())
        .unwrap_or("warn");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let result = config.and_then(|config| match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(&config),
        Command::BuildIndex { source } => run_build_index(&config, source.as_deref()),
        Command::VerifySales {
            category,
            month,
            year,
        } => run_verify_sales(&config, category, month, year),
        Command::Forecast { category, days } => run_forecast(&config, &category, days),
    });

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn dataset_provider(config: &AppConfig) -> Arc<CsvDatasetProvider> {
    Arc::new(CsvDatasetProvider::new(
        &config.data.default_dataset,
        &config.data.uploaded_dataset,
    ))
}

// ── chat ──────────────────────────────────────────────────────────────────────

fn run_chat(config: &AppConfig) -> NaviResult<()> {
    let provider = dataset_provider(config);
    if let Provenance::Default { path } = provider.provenance() {
        if !path.is_file() {
            warn!(path = %path.display(), "default dataset not found; sales tools will report it");
        }
    }

    let index = Arc::new(PersistedKnowledgeIndex::new(&config.knowledge.index_path));
    let catalog = builtin_catalog(provider.clone(), index, Arc::new(TrendSeasonalModel::new()))?;

    let oracle = match &config.routing.routes {
        Some(path) => RuleOracle::from_file(path)?,
        None => RuleOracle::with_default_routes()?,
    };
    info!(tools = catalog.len(), routes = oracle.config().routes.len(), "assistant ready");

    let orchestrator = Orchestrator::new(catalog, Box::new(oracle)).with_dataset(provider.clone());
    let session = Session::new();

    let stdin = io::stdin();
    repl::run(&orchestrator, &session, &provider, stdin.lock(), io::stdout()).map_err(|e| {
        NaviError::Config {
            reason: format!("terminal I/O failed: {e}"),
        }
    })
}

// ── build-index ───────────────────────────────────────────────────────────────

fn run_build_index(config: &AppConfig, source: Option<&Path>) -> NaviResult<()> {
    let k = &config.knowledge;
    let source = source.unwrap_or(&k.source);

    let index = StoredIndex::build(source, k.chunk_size, k.chunk_overlap)?;
    index.save(&k.index_path)?;

    println!(
        "Indexed {} chunks from '{}' into '{}'.",
        index.chunks.len(),
        source.display(),
        k.index_path.display()
    );
    println!("Source fingerprint (SHA-256): {}", index.source_sha256);
    Ok(())
}

// ── verify-sales ──────────────────────────────────────────────────────────────

fn run_verify_sales(
    config: &AppConfig,
    category: String,
    month: u32,
    year: Option<i32>,
) -> NaviResult<()> {
    let view = dataset_provider(config).current()?;
    let filter = SalesFilter {
        category: Some(category),
        month: Some(month),
        year,
    };
    let figures = sales_figures(&view.dataset, &filter).map_err(|e| NaviError::Dataset {
        reason: e.to_string(),
    })?;

    let rule = "=".repeat(60);
    println!("{rule}");
    println!("Sales verification{} ({})", filter.describe(), view.provenance);
    println!("{rule}");
    println!("Total records found       : {}", figures.matched_rows);
    println!("Valid records (no cancel) : {}", figures.valid_rows);
    println!("{}", "-".repeat(60));
    println!("Gross revenue (including cancelled) : {}", format::inr(figures.gross_amount));
    println!("Net revenue   (excluding cancelled) : {}", format::inr(figures.net_amount));
    println!("{rule}");
    Ok(())
}

// ── forecast ──────────────────────────────────────────────────────────────────

fn run_forecast(config: &AppConfig, category: &str, days: u32) -> NaviResult<()> {
    let view = dataset_provider(config).current()?;
    let summary = forecast_summary(&view.dataset, &TrendSeasonalModel::new(), category, days)
        .map_err(|e| NaviError::Forecast {
            reason: e.to_string(),
        })?;

    println!("{}", summary.report());
    println!();
    println!("First days of the forecast ({}):", view.provenance);
    for (date, units) in summary.predictions.iter().take(7) {
        println!("  {date}  {units:>8.1}");
    }
    Ok(())
}
