//! Geocoding backends: Mapbox, Nominatim, and Google Maps.
//!
//! Each backend asks its service for a single forward-geocoding result and
//! hands back the raw candidates. Deciding whether a result is usable is the
//! chain's job.

use super::types::{Candidate, GeocodeError, ProviderId};
use serde::Deserialize;
use ureq::Agent;

pub const DEFAULT_MAPBOX_URL: &str = "https://api.mapbox.com/search/geocode/v6/forward";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_GOOGLE_MAPS_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// A single external geocoding service.
pub trait Backend: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Forward geocode free-text address, best match first.
    fn geocode(&self, address: &str) -> Result<Vec<Candidate>, GeocodeError>;
}

fn invalid_response(err: std::io::Error) -> GeocodeError {
    GeocodeError::InvalidResponse(err.to_string())
}

// ─── Mapbox ─────────────────────────────────────────────────────

pub struct Mapbox {
    agent: Agent,
    url: String,
    api_key: String,
}

impl Mapbox {
    pub fn new(agent: Agent, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            agent,
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct MapboxResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Deserialize)]
struct MapboxFeature {
    geometry: MapboxGeometry,
}

#[derive(Deserialize)]
struct MapboxGeometry {
    /// GeoJSON order: longitude first.
    coordinates: Vec<f64>,
}

fn mapbox_candidates(response: MapboxResponse) -> Vec<Candidate> {
    response
        .features
        .into_iter()
        .filter_map(|f| match f.geometry.coordinates.as_slice() {
            [lon, lat, ..] => Some(Candidate::new(*lat, *lon)),
            _ => None,
        })
        .collect()
}

impl Backend for Mapbox {
    fn id(&self) -> ProviderId {
        ProviderId::Mapbox
    }

    fn geocode(&self, address: &str) -> Result<Vec<Candidate>, GeocodeError> {
        let response: MapboxResponse = self
            .agent
            .get(&self.url)
            .query("q", address)
            .query("access_token", &self.api_key)
            .query("limit", "1")
            .call()?
            .into_json()
            .map_err(invalid_response)?;

        Ok(mapbox_candidates(response))
    }
}

// ─── Nominatim ──────────────────────────────────────────────────

/// OpenStreetMap Nominatim. No key, but the usage policy requires an
/// identifying User-Agent and asks for a Referer.
pub struct Nominatim {
    agent: Agent,
    url: String,
    user_agent: String,
    referer: Option<String>,
}

impl Nominatim {
    pub fn new(
        agent: Agent,
        url: impl Into<String>,
        user_agent: impl Into<String>,
        referer: Option<String>,
    ) -> Self {
        Self {
            agent,
            url: url.into(),
            user_agent: user_agent.into(),
            referer,
        }
    }
}

#[derive(Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

fn nominatim_candidates(places: Vec<NominatimPlace>) -> Result<Vec<Candidate>, GeocodeError> {
    places
        .into_iter()
        .map(|p| {
            let lat = p
                .lat
                .parse::<f64>()
                .map_err(|e| GeocodeError::InvalidResponse(format!("invalid lat: {e}")))?;
            let lon = p
                .lon
                .parse::<f64>()
                .map_err(|e| GeocodeError::InvalidResponse(format!("invalid lon: {e}")))?;
            Ok(Candidate::new(lat, lon))
        })
        .collect()
}

impl Backend for Nominatim {
    fn id(&self) -> ProviderId {
        ProviderId::Nominatim
    }

    fn geocode(&self, address: &str) -> Result<Vec<Candidate>, GeocodeError> {
        let mut request = self
            .agent
            .get(&self.url)
            .set("User-Agent", &self.user_agent)
            .query("q", address)
            .query("format", "jsonv2")
            .query("limit", "1");
        if let Some(referer) = &self.referer {
            request = request.set("Referer", referer);
        }

        let places: Vec<NominatimPlace> = request.call()?.into_json().map_err(invalid_response)?;
        nominatim_candidates(places)
    }
}

// ─── Google Maps ────────────────────────────────────────────────

pub struct GoogleMaps {
    agent: Agent,
    url: String,
    api_key: String,
}

impl GoogleMaps {
    pub fn new(agent: Agent, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            agent,
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GoogleResult {
    geometry: GoogleGeometry,
}

#[derive(Deserialize)]
struct GoogleGeometry {
    location: GoogleLocation,
}

#[derive(Deserialize)]
struct GoogleLocation {
    lat: f64,
    lng: f64,
}

fn google_candidates(response: GoogleResponse) -> Result<Vec<Candidate>, GeocodeError> {
    match response.status.as_str() {
        "OK" => Ok(response
            .results
            .into_iter()
            .map(|r| Candidate::new(r.geometry.location.lat, r.geometry.location.lng))
            .collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        _ => Err(GeocodeError::Provider {
            message: response.error_message.unwrap_or_default(),
            status: response.status,
        }),
    }
}

impl Backend for GoogleMaps {
    fn id(&self) -> ProviderId {
        ProviderId::GoogleMaps
    }

    fn geocode(&self, address: &str) -> Result<Vec<Candidate>, GeocodeError> {
        let response: GoogleResponse = self
            .agent
            .get(&self.url)
            .query("address", address)
            .query("key", &self.api_key)
            .call()?
            .into_json()
            .map_err(invalid_response)?;

        google_candidates(response)
    }
}
