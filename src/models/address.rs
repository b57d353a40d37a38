//! Addresses and the provenance of their zone assignment.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AreaId, StreetId, ZoneId};

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `geo` points are (x = lon, y = lat)
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressId(pub i64);

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "address/{}", self.0)
    }
}

/// Where a zone assignment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Our own address book or range table
    Database,
    /// External geocoding provider (possibly followed by a spatial lookup)
    ExternalGeocoder,
    /// Assigned by an operator
    Manual,
}

/// Which strategy produced a zone assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    Exact,
    NearestInBlock,
    BlockFallback,
    RangeLookup,
    BlockLookup,
    NearestByCoordinate,
    Unresolved,
    GeocodingFailed,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Exact => "exact",
            Method::NearestInBlock => "nearest-in-block",
            Method::BlockFallback => "block-fallback",
            Method::RangeLookup => "range-lookup",
            Method::BlockLookup => "block-lookup",
            Method::NearestByCoordinate => "nearest-by-coordinate",
            Method::Unresolved => "unresolved",
            Method::GeocodingFailed => "geocoding-failed",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: Source,
    pub method: Method,
}

impl Provenance {
    pub fn new(source: Source, method: Method) -> Self {
        Self { source, method }
    }
}

/// A known address on a street, with its stored zone assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub street_id: StreetId,

    /// Raw house number, may carry suffixes ("250-A") or be "S/N"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,

    /// Block (manzana), normalized upper-case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_label: Option<String>,

    /// Lot (lote), normalized upper-case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<AreaId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,

    pub active: bool,
}

impl Address {
    pub fn new(id: AddressId, street_id: StreetId) -> Self {
        Self {
            id,
            street_id,
            house_number: None,
            block_label: None,
            lot_label: None,
            zone_id: None,
            area_id: None,
            location: None,
            provenance: None,
            active: true,
        }
    }

    pub fn with_number(mut self, number: &str) -> Self {
        self.house_number = Some(number.trim().to_string());
        self
    }

    pub fn with_block(mut self, block: &str, lot: Option<&str>) -> Self {
        self.block_label = super::normalize_block_label(block);
        self.lot_label = lot.and_then(super::normalize_block_label);
        self
    }

    pub fn with_zone(mut self, zone_id: ZoneId, area_id: AreaId) -> Self {
        self.zone_id = Some(zone_id);
        self.area_id = Some(area_id);
        self
    }
}

/// Structured address input, as submitted by the address create/update workflow
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredAddress {
    pub street_id: StreetId,
    pub house_number: Option<String>,
    pub block_label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serializes_kebab_case() {
        let json = serde_json::to_string(&Method::NearestInBlock).unwrap();
        assert_eq!(json, "\"nearest-in-block\"");
        let json = serde_json::to_string(&Source::ExternalGeocoder).unwrap();
        assert_eq!(json, "\"external-geocoder\"");
        assert_eq!(Method::NearestByCoordinate.to_string(), "nearest-by-coordinate");
    }

    #[test]
    fn test_method_display_matches_serde() {
        let all = [
            Method::Exact,
            Method::NearestInBlock,
            Method::BlockFallback,
            Method::RangeLookup,
            Method::BlockLookup,
            Method::NearestByCoordinate,
            Method::Unresolved,
            Method::GeocodingFailed,
        ];
        for method in all {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method));
        }
        assert!(serde_json::from_str::<Method>("\"manual\"").is_err());
    }

    #[test]
    fn test_builder_normalizes_labels() {
        let a = Address::new(AddressId(1), StreetId(2)).with_block(" b ", Some("07"));
        assert_eq!(a.block_label.as_deref(), Some("B"));
        assert_eq!(a.lot_label.as_deref(), Some("07"));
    }
}
