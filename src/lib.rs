//! Cuadrante - address-to-zone resolution engine
//!
//! Maps street addresses to patrol zones (cuadrantes) and their areas
//! (sectores). Shared by the `ingest` and `resolve` binaries.

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod geocoder;
pub mod models;
pub mod pipeline;
pub mod ranges;
pub mod resolver;

pub use config::Config;
pub use dataset::{Dataset, LoadReport};
pub use error::{ConflictError, PipelineError, RangeError, ValidationError};
pub use models::{Area, Street, StreetSegmentRange, Zone};
pub use pipeline::{AddressPipeline, Resolution};
pub use resolver::ZoneResolver;
