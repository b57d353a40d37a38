//! Spatial index over zone centroids for nearest-zone lookups.

use geo::{Distance, Haversine, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::{GeoPoint, Zone, ZoneId};

/// Lower bound for metres per degree of latitude, keeps the envelope on the generous side
const METRES_PER_DEGREE: f64 = 110_000.0;

/// Wrapper for R-tree indexing of zone centroids
#[derive(Debug, Clone)]
pub struct IndexedCentroid {
    pub zone_id: ZoneId,
    pub point: GeoPoint,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedCentroid {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedCentroid {
    pub fn new(zone: &Zone) -> Option<Self> {
        let point = zone.centroid?;
        Some(Self {
            zone_id: zone.id,
            point,
            envelope: AABB::from_point([point.lon, point.lat]),
        })
    }
}

/// R-tree of zone centroids keyed by (lon, lat)
pub struct CentroidIndex {
    tree: RTree<IndexedCentroid>,
}

impl CentroidIndex {
    /// Build the index from all zones that carry a centroid
    pub fn build<'a>(zones: impl IntoIterator<Item = &'a Zone>) -> Self {
        let indexed: Vec<IndexedCentroid> = zones
            .into_iter()
            .filter_map(IndexedCentroid::new)
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Centroid index built with {} zones", tree.size());

        Self { tree }
    }

    /// Nearest centroid within `radius_m` metres (great-circle distance).
    ///
    /// Candidates come from a lat/lon envelope sized to the radius, then the
    /// exact distance decides. Equal distances resolve to the lower zone id.
    pub fn nearest_within(&self, origin: GeoPoint, radius_m: f64) -> Option<(ZoneId, f64)> {
        if radius_m < 0.0 {
            return None;
        }

        let lat_delta = radius_m / METRES_PER_DEGREE;
        let cos_lat = origin.lat.to_radians().cos().abs().max(1e-6);
        let lon_delta = (lat_delta / cos_lat).min(180.0);

        let query_envelope = AABB::from_corners(
            [origin.lon - lon_delta, origin.lat - lat_delta],
            [origin.lon + lon_delta, origin.lat + lat_delta],
        );
        let from: Point<f64> = origin.to_point();

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|ic| (ic.zone_id, Haversine.distance(from, ic.point.to_point())))
            .filter(|(_, distance)| *distance <= radius_m)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AreaId;

    fn zone(id: i64, lat: f64, lon: f64) -> Zone {
        Zone::new(ZoneId(id), format!("C-{}", id), AreaId(1)).with_centroid(lat, lon)
    }

    #[test]
    fn test_empty_index() {
        let index = CentroidIndex::build(&Vec::<Zone>::new());
        assert!(index.is_empty());
        assert!(index
            .nearest_within(GeoPoint::new(-12.05, -77.04), 1000.0)
            .is_none());
    }

    #[test]
    fn test_nearest_picks_closest() {
        // ~0.0045 deg lat is roughly 500 m
        let zones = vec![zone(1, -12.0500, -77.0400), zone(2, -12.0545, -77.0400)];
        let index = CentroidIndex::build(&zones);
        assert_eq!(index.len(), 2);

        let (id, distance) = index
            .nearest_within(GeoPoint::new(-12.0540, -77.0400), 1000.0)
            .unwrap();
        assert_eq!(id, ZoneId(2));
        assert!(distance < 100.0);
    }

    #[test]
    fn test_radius_cut_off() {
        let zones = vec![zone(1, -12.0500, -77.0400)];
        let index = CentroidIndex::build(&zones);

        // ~1.67 km south
        assert!(index
            .nearest_within(GeoPoint::new(-12.0650, -77.0400), 1000.0)
            .is_none());
        assert!(index
            .nearest_within(GeoPoint::new(-12.0650, -77.0400), 2000.0)
            .is_some());
    }

    #[test]
    fn test_zones_without_centroid_skipped() {
        let zones = vec![Zone::new(ZoneId(9), "C-9", AreaId(1))];
        let index = CentroidIndex::build(&zones);
        assert!(index.is_empty());
    }
}
