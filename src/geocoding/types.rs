//! Core types for the geocoding subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Mapbox,
    Nominatim,
    GoogleMaps,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mapbox => write!(f, "Mapbox"),
            Self::Nominatim => write!(f, "Nominatim"),
            Self::GoogleMaps => write!(f, "Google Maps"),
        }
    }
}

/// One location returned by a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub lat: f64,
    pub lon: f64,
}

impl Candidate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside the WGS84 range.
    pub fn is_usable(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Terminal result of running an address through the provider chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeResult {
    Found {
        lat: f64,
        lon: f64,
        provider: ProviderId,
    },
    NotFound,
}

impl GeocodeResult {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::Found { provider, .. } => Some(*provider),
            Self::NotFound => None,
        }
    }
}

/// Why a single backend attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider rejected the request ({status}): {message}")]
    Provider { status: String, message: String },
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<ureq::Error> for GeocodeError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => Self::Status {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => Self::Network(transport_message(&transport)),
        }
    }
}

/// Describe a transport failure without its request URL, whose query string
/// may hold an API key.
pub(crate) fn transport_message(transport: &ureq::Transport) -> String {
    let mut message = transport.kind().to_string();
    if let Some(detail) = transport.message() {
        message.push_str(": ");
        message.push_str(detail);
    }
    if let Some(source) = std::error::Error::source(transport) {
        message.push_str(": ");
        message.push_str(&source.to_string());
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_usable() {
        assert!(Candidate::new(51.5034, -0.1276).is_usable());
        assert!(Candidate::new(-90.0, 180.0).is_usable());
    }

    #[test]
    fn test_candidate_out_of_range() {
        assert!(!Candidate::new(91.0, 0.0).is_usable());
        assert!(!Candidate::new(0.0, -180.5).is_usable());
        assert!(!Candidate::new(f64::NAN, 0.0).is_usable());
        assert!(!Candidate::new(0.0, f64::INFINITY).is_usable());
    }

    #[test]
    fn test_result_provider() {
        let found = GeocodeResult::Found {
            lat: 1.0,
            lon: 2.0,
            provider: ProviderId::Nominatim,
        };
        assert!(found.is_found());
        assert_eq!(found.provider(), Some(ProviderId::Nominatim));
        assert_eq!(GeocodeResult::NotFound.provider(), None);
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(ProviderId::GoogleMaps.to_string(), "Google Maps");
        assert_eq!(
            serde_json::to_string(&ProviderId::GoogleMaps).unwrap(),
            "\"google_maps\""
        );
    }
}
