//! Runtime configuration, read once at startup from flags and environment.

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::geocoding::providers::{DEFAULT_GOOGLE_MAPS_URL, DEFAULT_MAPBOX_URL, DEFAULT_NOMINATIM_URL};
use crate::geocoding::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Grist geocoder: webhook that resolves Grist address records to
/// coordinates and writes them back to the table.
///
/// Every option can also be given as an environment variable or in a
/// `.env` file. Geocoding backends whose key is not set are skipped.
#[derive(Parser, Debug, Clone)]
#[command(name = "grist-geocoder", version, about, long_about = None)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Bearer token webhook callers must present.
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Base URL of the Grist site, including any team prefix (e.g. https://grist.example.org/o/docs).
    #[arg(long, env = "GRIST_BASE_URL")]
    pub grist_base_url: String,

    /// Grist API key used to write coordinates back.
    #[arg(long, env = "GRIST_ACCESS_TOKEN", hide_env_values = true)]
    pub grist_access_token: String,

    /// Id of the Grist document holding the table.
    #[arg(long, env = "GRIST_DOCUMENT")]
    pub grist_document: String,

    /// Table whose Latitude and Longitude columns are updated.
    #[arg(long, env = "GRIST_TABLE", default_value = "Locations")]
    pub grist_table: String,

    /// Mapbox access token; Mapbox is skipped when unset.
    #[arg(long, env = "MAPBOX_API_KEY", hide_env_values = true)]
    mapbox_api_key: Option<String>,

    /// Mapbox forward geocoding endpoint.
    #[arg(long, env = "MAPBOX_URL", default_value = DEFAULT_MAPBOX_URL)]
    pub mapbox_url: String,

    /// Identifying User-Agent required by the Nominatim usage policy; Nominatim
    /// is skipped when unset.
    #[arg(long, env = "NOMINATIM_USER_AGENT")]
    nominatim_user_agent: Option<String>,

    /// Referer header sent to Nominatim.
    #[arg(long, env = "NOMINATIM_REFERER")]
    nominatim_referer: Option<String>,

    /// Nominatim search endpoint.
    #[arg(long, env = "NOMINATIM_URL", default_value = DEFAULT_NOMINATIM_URL)]
    pub nominatim_url: String,

    /// Google Maps Geocoding API key; Google Maps is skipped when unset.
    #[arg(long, env = "GOOGLE_MAPS_GEOCODER_API_KEY", hide_env_values = true)]
    google_maps_api_key: Option<String>,

    /// Google Maps geocode endpoint.
    #[arg(long, env = "GOOGLE_MAPS_URL", default_value = DEFAULT_GOOGLE_MAPS_URL)]
    pub google_maps_url: String,

    /// Timeout in seconds for every outbound request.
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Tracing filter directive; RUST_LOG takes precedence.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("HTTP_TIMEOUT_SECS must be greater than zero")]
    ZeroTimeout,
    #[error("no geocoding backend configured: set MAPBOX_API_KEY, NOMINATIM_USER_AGENT or GOOGLE_MAPS_GEOCODER_API_KEY")]
    NoBackends,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("ACCESS_TOKEN", &self.access_token),
            ("GRIST_BASE_URL", &self.grist_base_url),
            ("GRIST_ACCESS_TOKEN", &self.grist_access_token),
            ("GRIST_DOCUMENT", &self.grist_document),
            ("GRIST_TABLE", &self.grist_table),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.enabled_backends().is_empty() {
            return Err(ConfigError::NoBackends);
        }
        Ok(())
    }

    pub fn mapbox_api_key(&self) -> Option<&str> {
        non_empty(&self.mapbox_api_key)
    }

    pub fn nominatim_user_agent(&self) -> Option<&str> {
        non_empty(&self.nominatim_user_agent)
    }

    pub fn nominatim_referer(&self) -> Option<&str> {
        non_empty(&self.nominatim_referer)
    }

    pub fn google_maps_api_key(&self) -> Option<&str> {
        non_empty(&self.google_maps_api_key)
    }

    /// Backends that will make it into the chain, in priority order.
    pub fn enabled_backends(&self) -> Vec<ProviderId> {
        [
            (ProviderId::Mapbox, self.mapbox_api_key().is_some()),
            (ProviderId::Nominatim, self.nominatim_user_agent().is_some()),
            (ProviderId::GoogleMaps, self.google_maps_api_key().is_some()),
        ]
        .into_iter()
        .filter_map(|(id, enabled)| enabled.then_some(id))
        .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Shared HTTP agent for backends and the update sink.
    pub fn http_agent(&self) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(self.timeout())
            .user_agent(concat!("grist-geocoder/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(extra: &[&str]) -> Self {
        let base = [
            "grist-geocoder",
            "--access-token",
            "secret",
            "--grist-base-url",
            "http://grist.test",
            "--grist-access-token",
            "grist-secret",
            "--grist-document",
            "doc1",
        ];
        Self::parse_from(base.iter().chain(extra.iter()).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_defaults() {
        let config = Config::for_tests(&["--mapbox-api-key", "pk.key"]);
        assert_eq!(config.grist_table, "Locations");
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.mapbox_url, DEFAULT_MAPBOX_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_backends_rejected() {
        let config = Config::for_tests(&[]);
        assert!(config.enabled_backends().is_empty());
        assert_eq!(config.validate(), Err(ConfigError::NoBackends));
    }

    #[test]
    fn test_blank_key_disables_backend() {
        let config = Config::for_tests(&["--mapbox-api-key", "  ", "--google-maps-api-key", "g"]);
        assert_eq!(config.mapbox_api_key(), None);
        assert_eq!(config.enabled_backends(), vec![ProviderId::GoogleMaps]);
    }

    #[test]
    fn test_blank_required_setting_rejected() {
        let config = Config::for_tests(&["--grist-table", " ", "--mapbox-api-key", "pk"]);
        assert_eq!(config.validate(), Err(ConfigError::Missing("GRIST_TABLE")));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = Config::for_tests(&["--http-timeout-secs", "0", "--mapbox-api-key", "pk"]);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn test_blank_access_token_rejected() {
        let mut config = Config::for_tests(&["--mapbox-api-key", "pk"]);
        config.access_token = "  ".into();
        assert_eq!(config.validate(), Err(ConfigError::Missing("ACCESS_TOKEN")));
    }

    #[test]
    fn test_missing_access_token_is_parse_error() {
        let result = Config::command()
            .mut_arg("access_token", |arg| arg.env(None::<&str>))
            .try_get_matches_from([
                "grist-geocoder",
                "--grist-base-url",
                "http://grist.test",
                "--grist-access-token",
                "t",
                "--grist-document",
                "d",
            ]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_json_log_format() {
        let config = Config::for_tests(&["--log-format", "json"]);
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
