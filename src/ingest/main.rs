//! Dataset ingest and validation.
//!
//! Loads the reference CSVs, replays every range row through the
//! validated store and reports the rows it refused.

mod report;

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cuadrante::dataset::{read_range_rows, RANGES_FILE};
use cuadrante::{Config, Dataset};

use crate::report::write_report;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Validate a zone dataset and report range conflicts")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset directory (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Write rejected rows as CSV to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Exit with an error when any row is rejected
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data.dir = dir;
    }

    info!("Cuadrante Ingest");
    info!("Dataset: {}", config.data.dir.display());
    let import_start = Utc::now();

    let dataset = Dataset::load_reference(&config.data.dir)?;
    let rows = read_range_rows(&config.data.dir)?;

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let report = dataset.import_ranges(&rows, |n| pb.set_position(n as u64));
    pb.finish_and_clear();

    for rejected in &report.rejected {
        println!(
            "{} line {} ({}): {}",
            RANGES_FILE, rejected.line, rejected.street_id, rejected.error
        );
    }

    if let Some(path) = &args.report {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        write_report(file, RANGES_FILE, &report.rejected)?;
        info!("Report written to {}", path.display());
    }

    let elapsed = Utc::now() - import_start;
    info!(
        "Ingest complete in {}s: {} zones, {} streets, {} ranges accepted, {} rejected",
        elapsed.num_seconds(),
        dataset.catalog.len(),
        dataset.streets.len(),
        report.accepted,
        report.rejected.len()
    );

    if !report.is_clean() {
        if args.strict {
            anyhow::bail!("{} range rows rejected", report.rejected.len());
        }
        warn!("Dataset has rejected rows; rerun with --strict to fail on them");
    }

    Ok(())
}
