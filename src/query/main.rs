//! Zone resolution from the command line.
//!
//! Resolves free text through the geocoder pipeline, or structured
//! street + number / block pairs straight against the range table.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cuadrante::geocoder::NominatimGeocoder;
use cuadrante::models::StreetId;
use cuadrante::resolver::ZoneMatch;
use cuadrante::{AddressPipeline, Config, Dataset, ZoneResolver};

mod batch;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "resolve")]
#[command(about = "Resolve addresses to patrol zones")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset directory (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Free-text address through the geocoder pipeline
    Text {
        text: String,
    },
    /// Street id and house number against the range table
    Number {
        #[arg(long)]
        street: i64,
        number: String,
    },
    /// Street id and block label against the range table
    Block {
        #[arg(long)]
        street: i64,
        block: String,
    },
    /// Active ranges of a street, by start
    Ranges {
        #[arg(long)]
        street: i64,
    },
    /// CSV of street_id,house_number,block_label; assignments to stdout or --output
    Batch {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data.dir = dir;
    }

    let (dataset, report) = Dataset::load(&config.data)?;
    if !report.is_clean() {
        warn!(
            "{} range rows rejected while loading; run ingest for details",
            report.rejected.len()
        );
    }
    let resolver = ZoneResolver::new(dataset.ranges.clone());

    match args.command {
        Command::Text { text } => {
            let geocoder = NominatimGeocoder::new(&config.geocoder)?;
            let pipeline = AddressPipeline::new(
                Arc::new(geocoder),
                dataset.streets.clone(),
                dataset.addresses.clone(),
                resolver,
                config.pipeline.clone(),
            );
            let resolution = pipeline.resolve(&text).await?;
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
        Command::Number { street, number } => {
            let found = resolver.resolve_by_number(StreetId(street), &number);
            print_match(&resolver, found)?;
        }
        Command::Block { street, block } => {
            let found = resolver.resolve_by_block(StreetId(street), &block);
            print_match(&resolver, found)?;
        }
        Command::Ranges { street } => {
            let ranges = resolver.store().ranges_for_street(StreetId(street));
            println!("{}", serde_json::to_string_pretty(&ranges)?);
        }
        Command::Batch { input, output } => {
            let addresses = batch::read_input(&input)?;
            let rows = batch::assign_all(&resolver, &addresses);
            let resolved = rows.iter().filter(|r| r.zone_id.is_some()).count();

            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    batch::write_output(file, &rows)?;
                }
                None => batch::write_output(io::stdout().lock(), &rows)?,
            }
            info!("Resolved {}/{} addresses", resolved, rows.len());
        }
    }

    Ok(())
}

fn print_match(resolver: &ZoneResolver, found: Option<ZoneMatch>) -> Result<()> {
    let body = match found {
        Some(m) => {
            let area = resolver
                .resolve_zone_and_area(&m.zone)
                .map(|(_, area)| area);
            json!({
                "zone": m.zone,
                "area": area,
                "range": m.range,
            })
        }
        None => json!({ "zone": null }),
    };
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
