//! Geocoder backed by a Nominatim-compatible `/search` endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{parse_fragments, GeocodedAddress, Geocoder};
use crate::config::GeocoderConfig;
use crate::models::GeoPoint;

pub struct NominatimGeocoder {
    client: Client,
    search_url: Url,
    country_codes: Option<String>,
    city_hint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    pedestrian: Option<String>,
    house_number: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid geocoder base URL: {}", config.base_url))?;
        let search_url = base.join("search").context("Failed to build search URL")?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            search_url,
            country_codes: config.country_codes.clone(),
            city_hint: config.city_hint.clone(),
        })
    }

    fn request_url(&self, text: &str) -> Url {
        let query = match &self.city_hint {
            Some(city) if !text.to_lowercase().contains(&city.to_lowercase()) => {
                format!("{}, {}", text, city)
            }
            _ => text.to_string(),
        };

        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", &query)
                .append_pair("format", "jsonv2")
                .append_pair("addressdetails", "1")
                .append_pair("limit", "1");
            if let Some(codes) = &self.country_codes {
                pairs.append_pair("countrycodes", codes);
            }
        }
        url
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, text: &str) -> Result<Option<GeocodedAddress>> {
        let url = self.request_url(text);
        debug!("Geocoding request: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Geocoder request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Geocoder answered with status {}", status);
            anyhow::bail!("Geocoder answered with status {}", status);
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .context("Failed to parse geocoder response")?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let lat: f64 = place.lat.parse().context("Invalid latitude in geocoder response")?;
        let lon: f64 = place.lon.parse().context("Invalid longitude in geocoder response")?;

        Ok(Some(to_geocoded(
            GeoPoint::new(lat, lon),
            text,
            place.display_name,
            place.address,
        )))
    }
}

/// The provider's house number wins over the one parsed from the text.
/// Its road is kept next to the written street, not in place of it.
/// Block and lot only ever come from the text.
fn to_geocoded(
    location: GeoPoint,
    text: &str,
    display_name: Option<String>,
    address: NominatimAddress,
) -> GeocodedAddress {
    let mut fragments = parse_fragments(text);
    if let Some(number) = address.house_number {
        fragments.number = Some(number);
    }

    let mut geocoded = GeocodedAddress::from_fragments(location, fragments);
    geocoded.provider_street = address.road.or(address.pedestrian);
    geocoded.formatted = display_name;
    geocoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocoder(city_hint: Option<&str>) -> NominatimGeocoder {
        NominatimGeocoder::new(&GeocoderConfig {
            base_url: "https://geo.example.org/nominatim/".to_string(),
            city_hint: city_hint.map(String::from),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_request_url() {
        let url = geocoder(Some("Lima")).request_url("Jr. Huallaga 250");
        assert_eq!(url.path(), "/nominatim/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".to_string(), "Jr. Huallaga 250, Lima".to_string())));
        assert!(pairs.contains(&("countrycodes".to_string(), "pe".to_string())));
        assert!(pairs.contains(&("format".to_string(), "jsonv2".to_string())));
    }

    #[test]
    fn test_city_hint_not_repeated() {
        let url = geocoder(Some("Lima")).request_url("Jr. Huallaga 250, Cercado de Lima");
        let q = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(q, "Jr. Huallaga 250, Cercado de Lima");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = NominatimGeocoder::new(&GeocoderConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_response_parsing_prefers_provider_fields() {
        let body = r#"[{"lat":"-12.0464","lon":"-77.0428","display_name":"250, Jirón Huallaga, Lima",
            "address":{"road":"Jirón Huallaga","house_number":"250"}}]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(body).unwrap();
        let place = places.into_iter().next().unwrap();
        let geocoded = to_geocoded(
            GeoPoint::new(-12.0464, -77.0428),
            "Jr Huallaga 250 Mz. A",
            place.display_name,
            place.address,
        );
        assert_eq!(geocoded.street_name.as_deref(), Some("Jr Huallaga"));
        assert_eq!(geocoded.provider_street.as_deref(), Some("Jirón Huallaga"));
        assert_eq!(
            geocoded.street_names().collect::<Vec<_>>(),
            vec!["Jr Huallaga", "Jirón Huallaga"]
        );
        assert_eq!(geocoded.number.as_deref(), Some("250"));
        assert_eq!(geocoded.block.as_deref(), Some("A"));
        assert_eq!(geocoded.formatted.as_deref(), Some("250, Jirón Huallaga, Lima"));
    }

    #[test]
    fn test_point_without_street_is_kept() {
        let geocoded = to_geocoded(
            GeoPoint::new(-12.2, -76.93),
            "Mz. B Lt. 4, Villa El Salvador",
            Some("Villa El Salvador, Lima".to_string()),
            NominatimAddress::default(),
        );
        assert_eq!(geocoded.location, GeoPoint::new(-12.2, -76.93));
        assert_eq!(geocoded.street_name, None);
        assert_eq!(geocoded.street_names().count(), 0);
        assert_eq!(geocoded.block.as_deref(), Some("B"));
        assert_eq!(geocoded.lot.as_deref(), Some("4"));
    }

    #[test]
    fn test_missing_address_details() {
        let body = r#"[{"lat":"-12.0","lon":"-77.0"}]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(body).unwrap();
        assert!(places[0].address.road.is_none());
    }
}
