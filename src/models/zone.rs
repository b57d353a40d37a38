//! Administrative patrol hierarchy: areas (sectores) grouping zones (cuadrantes).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::GeoPoint;

/// Identifier of a zone (cuadrante)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub i64);

/// Identifier of an area (sector)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub i64);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone/{}", self.0)
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "area/{}", self.0)
    }
}

/// A grouping of zones (sector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,

    /// Short code, e.g. "S-03"
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Area {
    pub fn new(id: AreaId, code: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: None,
        }
    }
}

/// Smallest patrol unit (cuadrante)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,

    /// Short code, e.g. "C-12"
    pub code: String,

    /// Parent area
    pub area_id: AreaId,

    /// Inactive zones stay resolvable by id but are rejected as range targets
    pub active: bool,

    /// Representative point, used by nearest-zone lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<GeoPoint>,
}

impl Zone {
    pub fn new(id: ZoneId, code: impl Into<String>, area_id: AreaId) -> Self {
        Self {
            id,
            code: code.into(),
            area_id,
            active: true,
            centroid: None,
        }
    }

    pub fn with_centroid(mut self, lat: f64, lon: f64) -> Self {
        self.centroid = Some(GeoPoint { lat, lon });
        self
    }
}
