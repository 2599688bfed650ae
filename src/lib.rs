//! Grist geocoder.
//!
//! Receives batches of Grist address records over a webhook, resolves each
//! address through a prioritized chain of geocoding backends and writes the
//! coordinates back to the table, one record at a time.

pub mod batch;
pub mod config;
pub mod geocoding;
pub mod logging;
pub mod server;

#[cfg(test)]
mod test_support;
