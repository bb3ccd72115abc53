mod assemble;
mod catalog;
mod dataset;
mod error;
mod fetch;
mod parser;
mod sentiment;
mod settings;
mod store;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::dataset::DatasetFormat;
use crate::fetch::{FetchPool, FetchStats, HttpFetcher};
use crate::parser::layout::QGUIDE_2023;
use crate::settings::{Overrides, Settings, StoreKind};
use crate::store::{DirStore, RawStore, SqliteStore};

#[derive(Parser)]
#[command(name = "qguide", about = "Course evaluation report fetcher and dataset builder")]
struct Cli {
    /// Raw store backend (overrides config)
    #[arg(long, global = true, value_enum)]
    store: Option<StoreKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every catalog page into the raw store
    Fetch {
        /// Concurrent downloads (5-15)
        #[arg(short, long, allow_negative_numbers = true)]
        workers: Option<i64>,
        /// Only fetch the first N catalog entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Parse the raw store into the output dataset
    Assemble {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t)]
        format: DatasetFormat,
    },
    /// Fetch + assemble in one pipeline
    Run {
        #[arg(short, long, allow_negative_numbers = true)]
        workers: Option<i64>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t)]
        format: DatasetFormat,
    },
    /// Compare the catalog against the raw store
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut overrides = Overrides {
        store: cli.store,
        ..Default::default()
    };
    match &cli.command {
        Commands::Fetch { workers, .. } => overrides.workers = *workers,
        Commands::Assemble { output, .. } => overrides.output = output.clone(),
        Commands::Run {
            workers, output, ..
        } => {
            overrides.workers = *workers;
            overrides.output = output.clone();
        }
        Commands::Stats => {}
    }
    let settings = Settings::load(&overrides).context("Failed to load configuration")?;
    info!(settings = ?settings, "Configuration loaded");

    let catalog = Catalog::load(&settings.catalog)
        .with_context(|| format!("Failed to read catalog {}", settings.catalog.display()))?;
    if catalog.is_empty() {
        warn!("Catalog {} has no rows", settings.catalog.display());
    }
    let store = open_store(&settings)?;

    let result = match cli.command {
        Commands::Fetch { limit, .. } => {
            let stats = fetch(&settings, &catalog, store.as_ref(), limit).await?;
            print_fetch_stats(&stats);
            Ok(())
        }
        Commands::Assemble { format, .. } => build_dataset(&settings, &catalog, store.as_ref(), format),
        Commands::Run { limit, format, .. } => {
            let t_fetch = Instant::now();
            let stats = fetch(&settings, &catalog, store.as_ref(), limit).await?;
            print_fetch_stats(&stats);
            println!("Fetched in {:.1}s", t_fetch.elapsed().as_secs_f64());

            let t_assemble = Instant::now();
            build_dataset(&settings, &catalog, store.as_ref(), format)?;
            println!("Assembled in {:.1}s", t_assemble.elapsed().as_secs_f64());
            Ok(())
        }
        Commands::Stats => {
            let coverage = catalog.coverage(store.as_ref())?;
            println!("Catalog:   {}", coverage.catalog);
            println!("Stored:    {}", coverage.stored);
            println!("Pending:   {}", coverage.pending.len());
            println!("Orphans:   {}", coverage.orphans.len());
            for id in &coverage.orphans {
                println!("  {}", id);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn open_store(settings: &Settings) -> anyhow::Result<Box<dyn RawStore>> {
    let store: Box<dyn RawStore> = match settings.store {
        StoreKind::Dir => Box::new(
            DirStore::open(&settings.raw_dir)
                .with_context(|| format!("Failed to open {}", settings.raw_dir.display()))?,
        ),
        StoreKind::Sqlite => Box::new(
            SqliteStore::open(&settings.sqlite_path)
                .with_context(|| format!("Failed to open {}", settings.sqlite_path.display()))?,
        ),
    };
    Ok(store)
}

async fn fetch(
    settings: &Settings,
    catalog: &Catalog,
    store: &dyn RawStore,
    limit: Option<usize>,
) -> anyhow::Result<FetchStats> {
    let mut packages = catalog.packages();
    if let Some(n) = limit {
        packages.truncate(n);
    }

    let fetcher = HttpFetcher::new().context("Failed to build HTTP client")?;
    let pool = FetchPool::new(fetcher, settings.worker_count())
        .with_attempt_timeout(settings.attempt_timeout());
    println!("Downloading {} pages...", packages.len());
    Ok(pool.run(packages, store).await?)
}

fn print_fetch_stats(stats: &FetchStats) {
    println!(
        "Downloaded {}/{} pages successfully ({} errors).",
        stats.ok, stats.total, stats.errors
    );
    for id in &stats.failed {
        println!("  failed: {}", id);
    }
}

fn build_dataset(
    settings: &Settings,
    catalog: &Catalog,
    store: &dyn RawStore,
    format: DatasetFormat,
) -> anyhow::Result<()> {
    let assembly = assemble::assemble(store, catalog, &QGUIDE_2023)?;
    dataset::save(&assembly.records, &settings.output, format)
        .with_context(|| format!("Failed to write {}", settings.output.display()))?;
    println!(
        "Wrote {} records to {} ({} skipped).",
        assembly.records.len(),
        settings.output.display(),
        assembly.skipped.len()
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
