//! Read-only catalog of zones (cuadrantes) and their parent areas (sectores).

use hashbrown::HashMap;
use tracing::{info, warn};

use super::CentroidIndex;
use crate::error::ValidationError;
use crate::models::{Area, AreaId, GeoPoint, Zone, ZoneId};

pub struct ZoneCatalog {
    areas: HashMap<AreaId, Area>,
    zones: HashMap<ZoneId, Zone>,
    centroids: CentroidIndex,
}

impl ZoneCatalog {
    /// Build the catalog. Zones whose parent area is unknown are skipped.
    pub fn new(areas: Vec<Area>, zones: Vec<Zone>) -> Self {
        let areas: HashMap<AreaId, Area> = areas.into_iter().map(|a| (a.id, a)).collect();

        let mut by_id = HashMap::with_capacity(zones.len());
        for zone in zones {
            if !areas.contains_key(&zone.area_id) {
                warn!(
                    "Skipping zone {} ({}): parent {} not found",
                    zone.code, zone.id, zone.area_id
                );
                continue;
            }
            by_id.insert(zone.id, zone);
        }

        let centroids = CentroidIndex::build(by_id.values().filter(|z| z.active));

        info!(
            "Zone catalog ready: {} areas, {} zones",
            areas.len(),
            by_id.len()
        );

        Self {
            areas,
            zones: by_id,
            centroids,
        }
    }

    pub fn zone_by_id(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn area_by_id(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(&id)
    }

    pub fn area_of_zone(&self, zone: &Zone) -> Option<&Area> {
        self.areas.get(&zone.area_id)
    }

    /// Zone that a range may point at: it must exist and be active
    pub fn active_zone(&self, id: ZoneId) -> Result<&Zone, ValidationError> {
        match self.zones.get(&id) {
            Some(zone) if zone.active => Ok(zone),
            Some(_) => Err(ValidationError::InactiveZone(id)),
            None => Err(ValidationError::UnknownZone(id)),
        }
    }

    /// Nearest zone by centroid within `radius_m` metres, with its distance
    pub fn nearest_zone(&self, point: GeoPoint, radius_m: f64) -> Option<(&Zone, f64)> {
        let (id, distance) = self.centroids.nearest_within(point, radius_m)?;
        self.zones.get(&id).map(|zone| (zone, distance))
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ZoneCatalog {
        let mut retired = Zone::new(ZoneId(3), "C-3", AreaId(1));
        retired.active = false;
        ZoneCatalog::new(
            vec![Area::new(AreaId(1), "S-1")],
            vec![
                Zone::new(ZoneId(1), "C-1", AreaId(1)).with_centroid(-12.05, -77.04),
                Zone::new(ZoneId(2), "C-2", AreaId(99)),
                retired,
            ],
        )
    }

    #[test]
    fn test_zone_and_area_lookup() {
        let catalog = catalog();
        let zone = catalog.zone_by_id(ZoneId(1)).unwrap();
        assert_eq!(catalog.area_of_zone(zone).unwrap().code, "S-1");
        assert!(catalog.zone_by_id(ZoneId(42)).is_none());
    }

    #[test]
    fn test_orphan_zone_skipped() {
        let catalog = catalog();
        assert!(catalog.zone_by_id(ZoneId(2)).is_none());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_active_zone_checks() {
        let catalog = catalog();
        assert!(catalog.active_zone(ZoneId(1)).is_ok());
        assert_eq!(
            catalog.active_zone(ZoneId(3)),
            Err(ValidationError::InactiveZone(ZoneId(3)))
        );
        assert_eq!(
            catalog.active_zone(ZoneId(7)),
            Err(ValidationError::UnknownZone(ZoneId(7)))
        );
    }

    #[test]
    fn test_nearest_zone() {
        let catalog = catalog();
        let (zone, distance) = catalog
            .nearest_zone(GeoPoint::new(-12.0501, -77.0401), 1000.0)
            .unwrap();
        assert_eq!(zone.id, ZoneId(1));
        assert!(distance < 50.0);
    }
}
