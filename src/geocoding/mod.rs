//! Geocoding subsystem.
//!
//! Turns free-text addresses into coordinates by asking a prioritized list
//! of external backends in turn.

pub mod chain;
pub mod providers;
pub mod types;

pub use chain::ProviderChain;
pub use providers::Backend;
pub use types::{Candidate, GeocodeError, GeocodeResult, ProviderId};
