//! Free-text address resolution.
//!
//! A geocoded address is matched against known addresses first and the
//! range table second; the geocoded point itself is the last resort. The
//! first stage that finds a zone wins.

mod stages;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{AddressBook, StreetDirectory};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, ValidationError};
use crate::geocoder::{GeocodedAddress, Geocoder};
use crate::models::{
    Address, AddressId, AreaId, Method, Provenance, Source, StreetId, ZoneId,
};
use crate::resolver::ZoneResolver;
use stages::{StageContext, StageHit};

/// Known address a resolution was derived from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedReference {
    pub address_id: AddressId,
    pub street_id: StreetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_label: Option<String>,
}

impl From<&Address> for MatchedReference {
    fn from(address: &Address) -> Self {
        Self {
            address_id: address.id,
            street_id: address.street_id,
            house_number: address.house_number.clone(),
            block_label: address.block_label.clone(),
            lot_label: address.lot_label.clone(),
        }
    }
}

/// Outcome of resolving a free-text address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<AreaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_reference: Option<MatchedReference>,
    /// House-number distance for nearest-in-block, metres for nearest-by-coordinate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
}

impl Resolution {
    /// The geocoder failed, timed out or found nothing
    pub fn geocoding_failed() -> Self {
        Self::empty(Provenance::new(Source::ExternalGeocoder, Method::GeocodingFailed))
    }

    fn empty(provenance: Provenance) -> Self {
        Self {
            zone_id: None,
            zone_code: None,
            area_id: None,
            area_code: None,
            latitude: None,
            longitude: None,
            provenance,
            matched_reference: None,
            distance: None,
            formatted_address: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.zone_id.is_some()
    }
}

pub struct AddressPipeline {
    geocoder: Arc<dyn Geocoder>,
    streets: Arc<StreetDirectory>,
    addresses: Arc<AddressBook>,
    resolver: ZoneResolver,
    config: PipelineConfig,
    geocoder_timeout: Duration,
}

impl AddressPipeline {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        streets: Arc<StreetDirectory>,
        addresses: Arc<AddressBook>,
        resolver: ZoneResolver,
        config: PipelineConfig,
    ) -> Self {
        let geocoder_timeout = config.geocoder_timeout();
        Self {
            geocoder,
            streets,
            addresses,
            resolver,
            config,
            geocoder_timeout,
        }
    }

    pub fn with_geocoder_timeout(mut self, timeout: Duration) -> Self {
        self.geocoder_timeout = timeout;
        self
    }

    pub fn resolver(&self) -> &ZoneResolver {
        &self.resolver
    }

    /// Resolve free text to a zone.
    ///
    /// Only input that is too short is an error. Geocoder failures and
    /// unmatched addresses come back as a [`Resolution`] without a zone.
    pub async fn resolve(&self, text: &str) -> Result<Resolution, PipelineError> {
        let chars = text.chars().filter(|c| !c.is_whitespace()).count();
        if chars < self.config.min_input_chars {
            return Err(ValidationError::InputTooShort {
                min: self.config.min_input_chars,
                got: chars,
            }
            .into());
        }

        let Some(parsed) = self.geocode(text).await else {
            return Ok(Resolution::geocoding_failed());
        };

        let candidates = self.street_candidates(&parsed);

        let catalog = self.resolver.store().catalog();
        let ctx = StageContext {
            addresses: &self.addresses,
            catalog,
            resolver: &self.resolver,
            candidates: &candidates,
            parsed: &parsed,
        };

        let hit = ctx
            .exact()
            .or_else(|| ctx.nearest_in_block())
            .or_else(|| ctx.block_fallback())
            .or_else(|| ctx.range_lookup())
            .or_else(|| ctx.nearest_by_coordinate(self.config.nearest_zone_radius_m));

        let resolution = self.build(parsed, hit);
        info!(
            "Resolved '{}' via {}: {}",
            text,
            resolution.provenance.method,
            resolution.zone_code.as_deref().unwrap_or("no zone")
        );
        Ok(resolution)
    }

    /// Streets matching the written name first, then the provider's name,
    /// without repeats and capped at the configured limit
    fn street_candidates(&self, parsed: &GeocodedAddress) -> Vec<StreetId> {
        let limit = self.config.street_candidate_limit;
        let mut candidates: Vec<StreetId> = Vec::new();

        for name in parsed.street_names() {
            for street in self.streets.search(name, limit) {
                if candidates.len() < limit && !candidates.contains(&street.id) {
                    candidates.push(street.id);
                }
            }
            debug!("Street candidates after '{}': {}", name, candidates.len());
        }

        if candidates.is_empty() {
            debug!("No street candidates, address stages will miss");
        }
        candidates
    }

    async fn geocode(&self, text: &str) -> Option<GeocodedAddress> {
        match tokio::time::timeout(self.geocoder_timeout, self.geocoder.geocode(text)).await {
            Ok(Ok(Some(parsed))) => Some(parsed),
            Ok(Ok(None)) => {
                debug!("Geocoder found nothing for '{}'", text);
                None
            }
            Ok(Err(e)) => {
                warn!("Geocoder failed for '{}': {:#}", text, e);
                None
            }
            Err(_) => {
                warn!(
                    "Geocoder timed out after {:?} for '{}'",
                    self.geocoder_timeout, text
                );
                None
            }
        }
    }

    fn build(&self, parsed: GeocodedAddress, hit: Option<StageHit>) -> Resolution {
        let source_of = |method: Method| match method {
            Method::NearestByCoordinate | Method::Unresolved => Source::ExternalGeocoder,
            _ => Source::Database,
        };

        let mut resolution = match hit {
            Some(hit) => {
                let catalog = self.resolver.store().catalog();
                let zone = catalog.zone_by_id(hit.zone_id);
                let area_id = hit.area_id.or(zone.map(|z| z.area_id));
                let area = area_id.and_then(|id| catalog.area_by_id(id));

                let mut r = Resolution::empty(Provenance::new(source_of(hit.method), hit.method));
                r.zone_id = Some(hit.zone_id);
                r.zone_code = zone.map(|z| z.code.clone());
                r.area_id = area_id;
                r.area_code = area.map(|a| a.code.clone());
                r.matched_reference = hit.matched;
                r.distance = hit.distance;
                r
            }
            None => Resolution::empty(Provenance::new(
                source_of(Method::Unresolved),
                Method::Unresolved,
            )),
        };

        resolution.latitude = Some(parsed.location.lat);
        resolution.longitude = Some(parsed.location.lon);
        resolution.formatted_address = parsed.formatted;
        resolution
    }
}
