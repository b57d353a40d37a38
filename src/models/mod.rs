//! Core data models for zone resolution.

pub mod address;
pub mod range;
pub mod street;
pub mod zone;

pub use address::{Address, AddressId, GeoPoint, Method, Provenance, Source, StructuredAddress};
pub use range::{
    clamp_priority, normalize_block_label, HouseRange, NewRange, RangeId, RangeUpdate, Side,
    StreetSegmentRange,
};
pub use street::{Street, StreetId};
pub use zone::{Area, AreaId, Zone, ZoneId};
