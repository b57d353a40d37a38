use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub pipeline: PipelineConfig,
    pub geocoder: GeocoderConfig,
}

/// Where the CSV reference data lives
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum non-whitespace characters in a free-text address
    pub min_input_chars: usize,
    /// Maximum street candidates taken from the name search
    pub street_candidate_limit: usize,
    /// Search radius for the nearest-zone fallback, in metres
    pub nearest_zone_radius_m: f64,
    pub geocoder_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_input_chars: 3,
            street_candidate_limit: 10,
            nearest_zone_radius_m: 1000.0,
            geocoder_timeout_secs: 10,
        }
    }
}

impl PipelineConfig {
    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Nominatim-compatible endpoint
    pub base_url: String,
    pub user_agent: String,
    /// Comma-separated ISO 3166-1 codes to restrict results
    pub country_codes: Option<String>,
    /// Appended to queries that do not name a city
    pub city_hint: Option<String>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("cuadrante/", env!("CARGO_PKG_VERSION")).to_string(),
            country_codes: Some("pe".to_string()),
            city_hint: None,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pipeline.min_input_chars, 3);
        assert_eq!(config.pipeline.street_candidate_limit, 10);
        assert_eq!(config.pipeline.nearest_zone_radius_m, 1000.0);
        assert_eq!(config.pipeline.geocoder_timeout(), Duration::from_secs(10));
        assert_eq!(config.data.dir, PathBuf::from("data"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            nearest_zone_radius_m = 500.0

            [geocoder]
            city_hint = "Lima"
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.nearest_zone_radius_m, 500.0);
        assert_eq!(config.pipeline.street_candidate_limit, 10);
        assert_eq!(config.geocoder.city_hint.as_deref(), Some("Lima"));
        assert_eq!(config.geocoder.country_codes.as_deref(), Some("pe"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cuadrante.toml");
        fs::write(&path, "[data]\ndir = \"/srv/zones\"\n").unwrap();
        let config = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.data.dir, PathBuf::from("/srv/zones"));
        assert!(Config::load_from_file(dir.path().join("missing.toml")).is_err());
    }
}
