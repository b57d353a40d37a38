//! Read-only reference data: zones and areas, streets, known addresses.
//!
//! These are owned by the surrounding administration system and loaded
//! once; the engine only reads them.

mod addresses;
mod index;
mod streets;
mod zones;

pub use addresses::AddressBook;
pub use index::CentroidIndex;
pub use streets::StreetDirectory;
pub use zones::ZoneCatalog;
