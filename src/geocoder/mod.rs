//! External geocoding collaborator.
//!
//! The engine only needs one call: free text in, coordinates plus parsed
//! address fragments out. Providers are swappable behind [`Geocoder`].

mod fragments;
mod nominatim;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::GeoPoint;

pub use fragments::{parse_fragments, Fragments};
pub use nominatim::NominatimGeocoder;

/// A provider answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedAddress {
    pub location: GeoPoint,
    /// Street as written in the query text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    /// Street as named by the provider, often with abbreviations expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
    /// Provider's display form of the address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

impl GeocodedAddress {
    /// Build from a provider point and the fragments parsed out of the query text
    pub fn from_fragments(location: GeoPoint, fragments: Fragments) -> Self {
        Self {
            location,
            street_name: fragments.street,
            provider_street: None,
            number: fragments.number,
            block: fragments.block,
            lot: fragments.lot,
            formatted: None,
        }
    }

    /// Street names to search for, the written form first
    pub fn street_names(&self) -> impl Iterator<Item = &str> {
        let provider = self
            .provider_street
            .as_deref()
            .filter(|p| self.street_name.as_deref().map_or(true, |s| !s.eq_ignore_ascii_case(p)));
        self.street_name.as_deref().into_iter().chain(provider)
    }
}

/// Geocoding provider.
///
/// `Ok(None)` means the provider answered but found nothing; `Err` means
/// the provider could not be reached or answered garbage. The engine treats
/// both as a failed geocode and never retries.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, text: &str) -> Result<Option<GeocodedAddress>>;
}
