//! Provider chain: tries each backend in priority order.
//!
//! Flow: backend 1 → backend 2 → … → NotFound
//!
//! An attempt counts as a failure when the backend errors or returns no
//! usable candidate; the chain then moves on. The first backend with a usable
//! candidate wins and nothing after it is consulted.

use tracing::{debug, info, warn};
use ureq::Agent;

use super::providers::{Backend, GoogleMaps, Mapbox, Nominatim};
use super::types::{GeocodeResult, ProviderId};
use crate::config::Config;

/// Ordered, immutable list of backends. Holds no per-request state.
pub struct ProviderChain {
    backends: Vec<Box<dyn Backend>>,
}

impl ProviderChain {
    pub fn new(backends: Vec<Box<dyn Backend>>) -> Self {
        Self { backends }
    }

    /// Build the chain from configuration. Backends without their
    /// credential are left out entirely.
    pub fn from_config(config: &Config, agent: &Agent) -> Self {
        let mut backends: Vec<Box<dyn Backend>> = Vec::new();

        match config.mapbox_api_key() {
            Some(key) => backends.push(Box::new(Mapbox::new(
                agent.clone(),
                &config.mapbox_url,
                key,
            ))),
            None => warn!("MAPBOX_API_KEY not set, Mapbox backend disabled"),
        }

        match config.nominatim_user_agent() {
            Some(user_agent) => backends.push(Box::new(Nominatim::new(
                agent.clone(),
                &config.nominatim_url,
                user_agent,
                config.nominatim_referer().map(str::to_string),
            ))),
            None => warn!("NOMINATIM_USER_AGENT not set, Nominatim backend disabled"),
        }

        match config.google_maps_api_key() {
            Some(key) => backends.push(Box::new(GoogleMaps::new(
                agent.clone(),
                &config.google_maps_url,
                key,
            ))),
            None => warn!("GOOGLE_MAPS_GEOCODER_API_KEY not set, Google Maps backend disabled"),
        }

        Self::new(backends)
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Resolve an address. The caller guarantees `address` is non-empty.
    pub fn resolve(&self, address: &str) -> GeocodeResult {
        for backend in &self.backends {
            let provider = backend.id();
            match backend.geocode(address) {
                Ok(candidates) => match candidates.into_iter().find(|c| c.is_usable()) {
                    Some(c) => {
                        info!(
                            "Found coordinates {} latitude and {} longitude via {}",
                            c.lat, c.lon, provider
                        );
                        return GeocodeResult::Found {
                            lat: c.lat,
                            lon: c.lon,
                            provider,
                        };
                    }
                    None => debug!("{} returned no usable result, trying next backend", provider),
                },
                Err(e) => warn!("{} failed: {}, trying next backend", provider, e),
            }
        }

        info!("No coordinates found");
        GeocodeResult::NotFound
    }
}
