//! Batch resolver: geocode each record and write it back, one at a time.
//!
//! Per record: validate → resolve through the chain → update sink.
//! A failure in any step stays with that record; the loop always moves on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::record::{AddressRecord, RecordId};
use super::sink::{RecordUpdate, UpdateSink};
use crate::geocoding::{GeocodeResult, ProviderId, ProviderChain};

/// Result of geocoding one record. Latitude and longitude are either both
/// present or both absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeOutcome {
    record_id: RecordId,
    latitude: Option<f64>,
    longitude: Option<f64>,
    resolved_by: Option<ProviderId>,
}

impl GeocodeOutcome {
    pub fn new(record_id: RecordId, result: GeocodeResult) -> Self {
        match result {
            GeocodeResult::Found { lat, lon, provider } => Self {
                record_id,
                latitude: Some(lat),
                longitude: Some(lon),
                resolved_by: Some(provider),
            },
            GeocodeResult::NotFound => Self {
                record_id,
                latitude: None,
                longitude: None,
                resolved_by: None,
            },
        }
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn resolved_by(&self) -> Option<ProviderId> {
        self.resolved_by
    }

    pub fn is_found(&self) -> bool {
        self.resolved_by.is_some()
    }
}

/// What happened to one element of the inbound batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordStatus {
    Updated { outcome: GeocodeOutcome },
    UpdateFailed { outcome: GeocodeOutcome, error: String },
    Skipped { index: usize, reason: String },
}

impl RecordStatus {
    pub fn outcome(&self) -> Option<&GeocodeOutcome> {
        match self {
            Self::Updated { outcome } | Self::UpdateFailed { outcome, .. } => Some(outcome),
            Self::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub received: usize,
    pub found: usize,
    pub not_found: usize,
    pub updated: usize,
    pub update_failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    fn from_statuses(statuses: &[RecordStatus]) -> Self {
        let mut summary = Self {
            received: statuses.len(),
            ..Self::default()
        };
        for status in statuses {
            match status {
                RecordStatus::Updated { .. } => summary.updated += 1,
                RecordStatus::UpdateFailed { .. } => summary.update_failed += 1,
                RecordStatus::Skipped { .. } => summary.skipped += 1,
            }
            match status.outcome() {
                Some(o) if o.is_found() => summary.found += 1,
                Some(_) => summary.not_found += 1,
                None => {}
            }
        }
        summary
    }
}

/// Per-record account of one webhook call, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: BatchSummary,
    pub records: Vec<RecordStatus>,
}

impl BatchReport {
    /// Outcomes of every record that was geocoded, skipped ones excluded.
    pub fn outcomes(&self) -> impl Iterator<Item = &GeocodeOutcome> {
        self.records.iter().filter_map(RecordStatus::outcome)
    }
}

pub struct BatchResolver {
    chain: Arc<ProviderChain>,
    sink: Arc<dyn UpdateSink>,
}

impl BatchResolver {
    pub fn new(chain: Arc<ProviderChain>, sink: Arc<dyn UpdateSink>) -> Self {
        Self { chain, sink }
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Process every element of a decoded JSON array. Never aborts early.
    pub fn process_batch(&self, records: &[Value]) -> BatchReport {
        info!("Webhook sent {} record(s)", records.len());
        let started_at = Utc::now();

        let statuses: Vec<RecordStatus> = records
            .iter()
            .enumerate()
            .map(|(index, value)| self.process_record(index, value))
            .collect();

        let summary = BatchSummary::from_statuses(&statuses);
        info!(
            received = summary.received,
            found = summary.found,
            not_found = summary.not_found,
            updated = summary.updated,
            update_failed = summary.update_failed,
            skipped = summary.skipped,
            "Batch finished"
        );

        BatchReport {
            started_at,
            finished_at: Utc::now(),
            summary,
            records: statuses,
        }
    }

    fn process_record(&self, index: usize, value: &Value) -> RecordStatus {
        let record = match AddressRecord::parse(value) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping record at index {}: {}", index, e);
                return RecordStatus::Skipped {
                    index,
                    reason: e.to_string(),
                };
            }
        };

        let outcome = self.resolve(&record);

        match self.sink.update(&RecordUpdate::from(&outcome)) {
            Ok(()) => {
                info!("Updated record {}", record.id);
                RecordStatus::Updated { outcome }
            }
            Err(e) => {
                error!("Failed to update record {}: {}", record.id, e);
                RecordStatus::UpdateFailed {
                    outcome,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Geocode a single validated record without touching the sink.
    pub fn resolve(&self, record: &AddressRecord) -> GeocodeOutcome {
        info!("Attempting to geocode \"{}\" for record {}", record.address, record.id);
        GeocodeOutcome::new(record.id.clone(), self.chain.resolve(&record.address))
    }
}
