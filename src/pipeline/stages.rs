//! The individual fallback stages of the address pipeline.
//!
//! Each stage either yields a [`StageHit`] or passes to the next one.

use tracing::debug;

use super::MatchedReference;
use crate::catalog::{AddressBook, ZoneCatalog};
use crate::geocoder::GeocodedAddress;
use crate::models::{normalize_block_label, Address, AreaId, Method, StreetId, ZoneId};
use crate::resolver::{parse_house_number, ZoneResolver};

/// A stage that found a zone
#[derive(Debug, Clone)]
pub(crate) struct StageHit {
    pub zone_id: ZoneId,
    pub area_id: Option<AreaId>,
    pub method: Method,
    pub matched: Option<MatchedReference>,
    pub distance: Option<f64>,
}

impl StageHit {
    fn from_address(address: &Address, zone_id: ZoneId, method: Method) -> Self {
        Self {
            zone_id,
            area_id: address.area_id,
            method,
            matched: Some(MatchedReference::from(address)),
            distance: None,
        }
    }
}

/// Everything the address-based stages read
pub(crate) struct StageContext<'a> {
    pub addresses: &'a AddressBook,
    pub catalog: &'a ZoneCatalog,
    pub resolver: &'a ZoneResolver,
    pub candidates: &'a [StreetId],
    pub parsed: &'a GeocodedAddress,
}

/// Lot order: numeric lots by value, then other labels, missing lots last
fn lot_key(lot: Option<&str>) -> (bool, bool, u32, &str) {
    match lot {
        Some(label) => match label.parse::<u32>() {
            Ok(n) => (false, false, n, label),
            Err(_) => (false, true, 0, label),
        },
        None => (true, true, 0, ""),
    }
}

/// House numbers compare without case or whitespace
fn same_number(a: &str, b: &str) -> bool {
    let fold = |s: &str| s.split_whitespace().collect::<String>().to_uppercase();
    fold(a) == fold(b)
}

impl<'a> StageContext<'a> {
    /// Addresses on candidate streets that already carry a zone
    fn zoned(&self) -> impl Iterator<Item = (&'a Address, ZoneId)> + 'a {
        self.addresses
            .on_streets(self.candidates)
            .filter_map(|a| a.zone_id.map(|z| (a, z)))
    }

    /// Stage 3: an address with the same house number, or the same block (and lot)
    pub fn exact(&self) -> Option<StageHit> {
        let number = self.parsed.number.as_deref();
        let block = self.parsed.block.as_deref().and_then(normalize_block_label);
        let lot = self.parsed.lot.as_deref().and_then(normalize_block_label);

        if number.is_none() && block.is_none() {
            debug!("Exact match skipped: no number or block parsed");
            return None;
        }

        let hit = self.zoned().find(|(a, _)| {
            let number_hit = match (number, a.house_number.as_deref()) {
                (Some(wanted), Some(have)) => same_number(wanted, have),
                _ => false,
            };
            let block_hit = match &block {
                Some(wanted) => {
                    a.block_label.as_deref() == Some(wanted.as_str())
                        && lot
                            .as_deref()
                            .map_or(true, |l| a.lot_label.as_deref() == Some(l))
                }
                None => false,
            };
            number_hit || block_hit
        });

        debug!("Exact match: {}", if hit.is_some() { "hit" } else { "miss" });
        hit.map(|(a, zone_id)| StageHit::from_address(a, zone_id, Method::Exact))
    }

    /// Stage 4: closest numbered address in the same hundred-block
    pub fn nearest_in_block(&self) -> Option<StageHit> {
        let wanted = parse_house_number(self.parsed.number.as_deref()?)?;
        let hundred = wanted / 100;

        let best = self
            .zoned()
            .filter_map(|(a, zone_id)| {
                let n = parse_house_number(a.house_number.as_deref()?)?;
                (n / 100 == hundred).then_some((a, zone_id, n))
            })
            .min_by_key(|(a, _, n)| (n.abs_diff(wanted), *n, a.id));

        debug!(
            "Nearest in block {}xx: {}",
            hundred,
            if best.is_some() { "hit" } else { "miss" }
        );
        best.map(|(a, zone_id, n)| {
            let mut hit = StageHit::from_address(a, zone_id, Method::NearestInBlock);
            hit.distance = Some(n.abs_diff(wanted) as f64);
            hit
        })
    }

    /// Stage 5: any address in the same block, lowest lot first (by value
    /// when the lot is a number)
    pub fn block_fallback(&self) -> Option<StageHit> {
        let block = self.parsed.block.as_deref().and_then(normalize_block_label)?;

        let best = self
            .zoned()
            .filter(|(a, _)| a.block_label.as_deref() == Some(block.as_str()))
            .min_by(|(a, _), (b, _)| {
                lot_key(a.lot_label.as_deref())
                    .cmp(&lot_key(b.lot_label.as_deref()))
                    .then(a.id.cmp(&b.id))
            });

        debug!(
            "Block fallback '{}': {}",
            block,
            if best.is_some() { "hit" } else { "miss" }
        );
        best.map(|(a, zone_id)| StageHit::from_address(a, zone_id, Method::BlockFallback))
    }

    /// Stage 6: range table of the first candidate street
    pub fn range_lookup(&self) -> Option<StageHit> {
        let street_id = *self.candidates.first()?;
        let number = self.parsed.number.as_deref()?;
        let found = self.resolver.resolve_by_number(street_id, number)?;

        debug!("Range lookup on {}: {}", street_id, found.range.id);
        Some(StageHit {
            zone_id: found.zone.id,
            area_id: Some(found.zone.area_id),
            method: Method::RangeLookup,
            matched: None,
            distance: None,
        })
    }

    /// Stage 7: nearest zone centroid to the geocoded point
    pub fn nearest_by_coordinate(&self, radius_m: f64) -> Option<StageHit> {
        let (zone, distance) = self.catalog.nearest_zone(self.parsed.location, radius_m)?;

        debug!("Nearest zone {} at {:.0} m", zone.code, distance);
        Some(StageHit {
            zone_id: zone.id,
            area_id: Some(zone.area_id),
            method: Method::NearestByCoordinate,
            matched: None,
            distance: Some(distance),
        })
    }
}
