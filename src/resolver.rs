//! Zone resolution for structured addresses (street + house number or block).

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::models::{
    Area, AreaId, Method, Provenance, RangeId, Source, StreetId, StreetSegmentRange,
    StructuredAddress, Zone, ZoneId,
};
use crate::ranges::RangeStore;

/// Parse a raw house number by keeping only its digits.
///
/// `"250-A"` gives 250; `"S/N"`, blanks and values beyond `u32` give `None`.
pub fn parse_house_number(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// A zone together with the range that selected it
#[derive(Debug, Clone)]
pub struct ZoneMatch {
    pub zone: Zone,
    pub range: StreetSegmentRange,
}

/// Outcome of assigning a zone to a structured address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<AreaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_id: Option<RangeId>,
    pub provenance: Provenance,
}

impl Assignment {
    /// No range matched; the caller assigns the zone by hand
    pub fn manual() -> Self {
        Self {
            zone_id: None,
            area_id: None,
            range_id: None,
            provenance: Provenance::new(Source::Manual, Method::Unresolved),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.zone_id.is_some()
    }
}

/// Resolves (street, number) and (street, block) pairs to zones
#[derive(Clone)]
pub struct ZoneResolver {
    store: Arc<RangeStore>,
}

impl ZoneResolver {
    pub fn new(store: Arc<RangeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RangeStore {
        &self.store
    }

    /// Best zone for a house number: first range (by priority) whose side
    /// accepts the number's parity.
    pub fn resolve_by_number(&self, street_id: StreetId, house_number: &str) -> Option<ZoneMatch> {
        let number = parse_house_number(house_number)?;
        self.resolve_by_value(street_id, number)
    }

    /// Same as [`resolve_by_number`](Self::resolve_by_number) for an already parsed number
    pub fn resolve_by_value(&self, street_id: StreetId, number: u32) -> Option<ZoneMatch> {
        let catalog = self.store.catalog();
        let found = self
            .store
            .ranges_containing(street_id, number)
            .into_iter()
            .filter(|r| r.side.accepts(number))
            .find_map(|range| {
                let zone = catalog.zone_by_id(range.zone_id)?.clone();
                Some(ZoneMatch { zone, range })
            });

        debug!(
            "Number {} on {}: {}",
            number,
            street_id,
            found
                .as_ref()
                .map(|m| m.zone.code.as_str())
                .unwrap_or("no match")
        );
        found
    }

    /// Zone mapped to a block label; no parity applies
    pub fn resolve_by_block(&self, street_id: StreetId, block_label: &str) -> Option<ZoneMatch> {
        let range = self.store.range_for_block(street_id, block_label)?;
        let zone = self.store.catalog().zone_by_id(range.zone_id)?.clone();
        Some(ZoneMatch { zone, range })
    }

    pub fn resolve_zone_and_area(&self, zone: &Zone) -> Option<(Zone, Area)> {
        let area = self.store.catalog().area_of_zone(zone)?;
        Some((zone.clone(), area.clone()))
    }

    /// Zone assignment for an address being created or updated: house
    /// number first, block label second, manual otherwise.
    pub fn assign(&self, address: &StructuredAddress) -> Assignment {
        let by_number = address
            .house_number
            .as_deref()
            .and_then(|n| self.resolve_by_number(address.street_id, n))
            .map(|m| (m, Method::RangeLookup));

        let found = by_number.or_else(|| {
            address
                .block_label
                .as_deref()
                .and_then(|b| self.resolve_by_block(address.street_id, b))
                .map(|m| (m, Method::BlockLookup))
        });

        match found {
            Some((m, method)) => Assignment {
                zone_id: Some(m.zone.id),
                area_id: Some(m.zone.area_id),
                range_id: Some(m.range.id),
                provenance: Provenance::new(Source::Database, method),
            },
            None => Assignment::manual(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ZoneCatalog;
    use crate::models::{AreaId, NewRange, RangeUpdate, Side};

    const S1: StreetId = StreetId(1);
    const Z1: ZoneId = ZoneId(1);
    const Z2: ZoneId = ZoneId(2);

    fn resolver() -> ZoneResolver {
        let catalog = ZoneCatalog::new(
            vec![Area::new(AreaId(10), "S-10")],
            vec![
                Zone::new(Z1, "C-1", AreaId(10)),
                Zone::new(Z2, "C-2", AreaId(10)),
            ],
        );
        ZoneResolver::new(Arc::new(RangeStore::new(Arc::new(catalog))))
    }

    #[test]
    fn test_parse_house_number() {
        assert_eq!(parse_house_number("450"), Some(450));
        assert_eq!(parse_house_number("250-A"), Some(250));
        assert_eq!(parse_house_number(" Nº 12 "), Some(12));
        assert_eq!(parse_house_number("S/N"), None);
        assert_eq!(parse_house_number(""), None);
        assert_eq!(parse_house_number("99999999999"), None);
    }

    #[test]
    fn test_two_segment_street() {
        let resolver = resolver();
        let store = resolver.store();
        store
            .insert(NewRange::numbered(S1, Z1, 100, 299, Side::Both), "admin")
            .unwrap();
        store
            .insert(NewRange::numbered(S1, Z2, 300, 599, Side::Both), "admin")
            .unwrap();

        assert_eq!(resolver.resolve_by_number(S1, "450").unwrap().zone.id, Z2);
        assert_eq!(resolver.resolve_by_number(S1, "250-A").unwrap().zone.id, Z1);
        assert!(resolver.resolve_by_number(S1, "999").is_none());
        assert!(resolver.resolve_by_number(S1, "S/N").is_none());
    }

    #[test]
    fn test_parity_filter() {
        let resolver = resolver();
        let store = resolver.store();
        store
            .insert(NewRange::numbered(S1, Z1, 100, 200, Side::Even), "admin")
            .unwrap();
        store
            .insert(NewRange::numbered(S1, Z2, 100, 200, Side::Odd), "admin")
            .unwrap();

        for n in 100..=200u32 {
            let m = resolver.resolve_by_value(S1, n).unwrap();
            if n % 2 == 0 {
                assert_eq!(m.range.side, Side::Even);
            } else {
                assert_eq!(m.range.side, Side::Odd);
            }
        }
    }

    #[test]
    fn test_odd_number_skips_higher_priority_even_range() {
        let resolver = resolver();
        let store = resolver.store();
        store
            .insert(NewRange::numbered(S1, Z1, 100, 200, Side::Even).with_priority(1), "admin")
            .unwrap();
        store
            .insert(NewRange::numbered(S1, Z2, 100, 200, Side::Odd).with_priority(9), "admin")
            .unwrap();

        assert_eq!(resolver.resolve_by_number(S1, "151").unwrap().zone.id, Z2);
        assert_eq!(resolver.resolve_by_number(S1, "150").unwrap().zone.id, Z1);
    }

    #[test]
    fn test_lower_priority_value_wins_among_survivors() {
        let resolver = resolver();
        let store = resolver.store();
        // A block-only record matches every number and competes on priority
        store
            .insert(NewRange::block(S1, Z2, "A").with_priority(5), "admin")
            .unwrap();
        let ranged = store
            .insert(NewRange::numbered(S1, Z1, 100, 200, Side::Both).with_priority(2), "admin")
            .unwrap();
        assert_eq!(resolver.resolve_by_number(S1, "150").unwrap().zone.id, Z1);

        store
            .update(ranged.id, RangeUpdate { priority: Some(7), ..Default::default() }, "admin")
            .unwrap();
        assert_eq!(resolver.resolve_by_number(S1, "150").unwrap().zone.id, Z2);
    }

    #[test]
    fn test_block_lookup_is_case_insensitive() {
        let resolver = resolver();
        resolver
            .store()
            .insert(NewRange::block(S1, Z2, "A"), "admin")
            .unwrap();
        assert_eq!(resolver.resolve_by_block(S1, "a").unwrap().zone.id, Z2);
        assert!(resolver.resolve_by_block(S1, "B").is_none());
        assert!(resolver.resolve_by_block(StreetId(2), "A").is_none());
    }

    #[test]
    fn test_zone_and_area() {
        let resolver = resolver();
        let zone = Zone::new(Z1, "C-1", AreaId(10));
        let (z, a) = resolver.resolve_zone_and_area(&zone).unwrap();
        assert_eq!(z.id, Z1);
        assert_eq!(a.code, "S-10");
    }

    #[test]
    fn test_assign_structured_address() {
        let resolver = resolver();
        let store = resolver.store();
        store
            .insert(NewRange::numbered(S1, Z1, 1, 99, Side::Both), "admin")
            .unwrap();
        // Block-only records also match any number, so keep this one behind the range
        store
            .insert(NewRange::block(S1, Z2, "F").with_priority(2), "admin")
            .unwrap();

        let by_number = resolver.assign(&StructuredAddress {
            street_id: S1,
            house_number: Some("45".to_string()),
            block_label: None,
        });
        assert_eq!(by_number.zone_id, Some(Z1));
        assert_eq!(by_number.area_id, Some(AreaId(10)));
        assert_eq!(by_number.provenance.method, Method::RangeLookup);

        let by_block = resolver.assign(&StructuredAddress {
            street_id: S1,
            house_number: Some("S/N".to_string()),
            block_label: Some("f".to_string()),
        });
        assert_eq!(by_block.zone_id, Some(Z2));
        assert_eq!(by_block.provenance, Provenance::new(Source::Database, Method::BlockLookup));

        let manual = resolver.assign(&StructuredAddress {
            street_id: StreetId(5),
            house_number: Some("10".to_string()),
            block_label: None,
        });
        assert!(!manual.is_resolved());
        assert_eq!(manual.provenance.source, Source::Manual);
    }
}
