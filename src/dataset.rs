//! CSV reference data: areas, zones, streets, known addresses and ranges.
//!
//! Range rows are replayed through the validated insert so a dataset can
//! never carry overlaps the store itself would reject.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

use crate::catalog::{AddressBook, StreetDirectory, ZoneCatalog};
use crate::config::DataConfig;
use crate::error::{RangeError, ValidationError};
use crate::models::{
    Address, AddressId, Area, AreaId, GeoPoint, NewRange, Side, Street, StreetId, Zone, ZoneId,
};
use crate::ranges::RangeStore;

pub const AREAS_FILE: &str = "areas.csv";
pub const ZONES_FILE: &str = "zones.csv";
pub const STREETS_FILE: &str = "streets.csv";
pub const ADDRESSES_FILE: &str = "addresses.csv";
pub const RANGES_FILE: &str = "ranges.csv";

/// Actor recorded on ranges created by a dataset load
pub const LOAD_ACTOR: &str = "dataset-load";

#[derive(Debug, Deserialize)]
struct AreaRow {
    id: i64,
    code: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZoneRow {
    id: i64,
    code: String,
    area_id: i64,
    active: Option<bool>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StreetRow {
    id: i64,
    name: String,
    neighborhood: Option<String>,
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct AddressRow {
    id: i64,
    street_id: i64,
    house_number: Option<String>,
    block_label: Option<String>,
    lot_label: Option<String>,
    zone_id: Option<i64>,
    area_id: Option<i64>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// One line of `ranges.csv`
#[derive(Debug, Clone, Deserialize)]
pub struct RangeRow {
    pub street_id: i64,
    pub zone_id: i64,
    pub range_start: Option<u32>,
    pub range_end: Option<u32>,
    pub side: Option<String>,
    pub block_label: Option<String>,
    pub priority: Option<i64>,
}

impl RangeRow {
    /// Blank side means BOTH
    pub fn to_new_range(&self) -> Result<NewRange, ValidationError> {
        let side = match self.side.as_deref().map(str::trim) {
            None | Some("") => Side::Both,
            Some(s) => s.parse()?,
        };

        Ok(NewRange {
            street_id: StreetId(self.street_id),
            zone_id: ZoneId(self.zone_id),
            range_start: self.range_start,
            range_end: self.range_end,
            side,
            block_label: self.block_label.clone(),
            priority: self.priority,
        })
    }
}

/// A range row the store refused
#[derive(Debug, Clone)]
pub struct RejectedRow {
    /// Line in the CSV file, header being line 1
    pub line: usize,
    pub street_id: StreetId,
    pub error: RangeError,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedRow>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Everything the resolver and pipeline need, loaded from one directory
pub struct Dataset {
    pub catalog: Arc<ZoneCatalog>,
    pub streets: Arc<StreetDirectory>,
    pub addresses: Arc<AddressBook>,
    pub ranges: Arc<RangeStore>,
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize().enumerate() {
        let row = result.with_context(|| format!("{}: bad row at line {}", path.display(), i + 2))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Missing optional files load as empty
fn read_optional_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        warn!("{} not found, continuing without it", path.display());
        return Ok(Vec::new());
    }
    read_rows(path)
}

pub fn read_range_rows(dir: &Path) -> Result<Vec<RangeRow>> {
    read_optional_rows(&dir.join(RANGES_FILE))
}

impl Dataset {
    /// Load reference data and replay every range row through the store
    pub fn load(config: &DataConfig) -> Result<(Self, LoadReport)> {
        let dataset = Self::load_reference(&config.dir)?;
        let rows = read_range_rows(&config.dir)?;
        let report = dataset.import_ranges(&rows, |_| {});
        Ok((dataset, report))
    }

    /// Load zones, streets and addresses with an empty range store
    pub fn load_reference(dir: &Path) -> Result<Self> {
        info!("Loading reference data from {}", dir.display());

        let areas: Vec<Area> = read_rows::<AreaRow>(&dir.join(AREAS_FILE))?
            .into_iter()
            .map(|r| Area {
                id: AreaId(r.id),
                code: r.code,
                name: r.name,
            })
            .collect();

        let zones: Vec<Zone> = read_rows::<ZoneRow>(&dir.join(ZONES_FILE))?
            .into_iter()
            .map(|r| Zone {
                id: ZoneId(r.id),
                code: r.code,
                area_id: AreaId(r.area_id),
                active: r.active.unwrap_or(true),
                centroid: r.lat.zip(r.lon).map(|(lat, lon)| GeoPoint::new(lat, lon)),
            })
            .collect();

        let streets: Vec<Street> = read_rows::<StreetRow>(&dir.join(STREETS_FILE))?
            .into_iter()
            .map(|r| Street {
                id: StreetId(r.id),
                name: r.name,
                neighborhood: r.neighborhood,
                active: r.active.unwrap_or(true),
            })
            .collect();

        let addresses: Vec<Address> = read_optional_rows::<AddressRow>(&dir.join(ADDRESSES_FILE))?
            .into_iter()
            .map(|r| {
                let mut address = Address::new(AddressId(r.id), StreetId(r.street_id));
                if let Some(number) = r.house_number.as_deref() {
                    address = address.with_number(number);
                }
                if let Some(block) = r.block_label.as_deref() {
                    address = address.with_block(block, r.lot_label.as_deref());
                }
                address.zone_id = r.zone_id.map(ZoneId);
                address.area_id = r.area_id.map(AreaId);
                address.location = r.lat.zip(r.lon).map(|(lat, lon)| GeoPoint::new(lat, lon));
                address
            })
            .collect();

        info!(
            "Loaded {} streets and {} addresses",
            streets.len(),
            addresses.len()
        );

        let catalog = Arc::new(ZoneCatalog::new(areas, zones));
        Ok(Self {
            ranges: Arc::new(RangeStore::new(catalog.clone())),
            catalog,
            streets: Arc::new(StreetDirectory::new(streets)),
            addresses: Arc::new(AddressBook::new(addresses)),
        })
    }

    /// Insert range rows in file order. `progress` is called once per row
    /// with the number of rows handled so far.
    pub fn import_ranges(&self, rows: &[RangeRow], mut progress: impl FnMut(usize)) -> LoadReport {
        let mut report = LoadReport::default();

        for (i, row) in rows.iter().enumerate() {
            let line = i + 2;
            let result = row
                .to_new_range()
                .map_err(RangeError::from)
                .and_then(|new| self.ranges.insert(new, LOAD_ACTOR));

            match result {
                Ok(_) => report.accepted += 1,
                Err(error) => {
                    warn!("{} line {}: {}", RANGES_FILE, line, error);
                    report.rejected.push(RejectedRow {
                        line,
                        street_id: StreetId(row.street_id),
                        error,
                    });
                }
            }
            progress(i + 1);
        }

        info!(
            "Imported {} ranges, rejected {}",
            report.accepted,
            report.rejected.len()
        );
        report
    }
}
