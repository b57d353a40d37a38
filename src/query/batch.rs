//! Batch zone assignment for structured addresses read from CSV.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use cuadrante::models::{Method, Source, StructuredAddress};
use cuadrante::ZoneResolver;

/// One output line: the input columns followed by the assignment
#[derive(Debug, Serialize)]
pub struct BatchRow {
    pub street_id: i64,
    pub house_number: Option<String>,
    pub block_label: Option<String>,
    pub zone_id: Option<i64>,
    pub zone_code: Option<String>,
    pub area_id: Option<i64>,
    pub area_code: Option<String>,
    pub range_id: Option<u64>,
    pub source: Source,
    pub method: Method,
}

pub fn read_input(path: &Path) -> Result<Vec<StructuredAddress>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<StructuredAddress>, _>>()
        .context("Failed to parse batch input")?;
    info!("Read {} addresses from {}", rows.len(), path.display());
    Ok(rows)
}

/// Assign every address in parallel; output keeps input order
pub fn assign_all(resolver: &ZoneResolver, addresses: &[StructuredAddress]) -> Vec<BatchRow> {
    let catalog = resolver.store().catalog();

    addresses
        .par_iter()
        .map(|address| {
            let assignment = resolver.assign(address);
            let zone = assignment.zone_id.and_then(|id| catalog.zone_by_id(id));
            let area = assignment.area_id.and_then(|id| catalog.area_by_id(id));

            BatchRow {
                street_id: address.street_id.0,
                house_number: address.house_number.clone(),
                block_label: address.block_label.clone(),
                zone_id: assignment.zone_id.map(|z| z.0),
                zone_code: zone.map(|z| z.code.clone()),
                area_id: assignment.area_id.map(|a| a.0),
                area_code: area.map(|a| a.code.clone()),
                range_id: assignment.range_id.map(|r| r.0),
                source: assignment.provenance.source,
                method: assignment.provenance.method,
            }
        })
        .collect()
}

pub fn write_output<W: Write>(out: W, rows: &[BatchRow]) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
