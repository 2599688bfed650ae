//! Batch processing of webhook payloads.

pub mod record;
pub mod resolver;
pub mod sink;

pub use record::{AddressRecord, RecordError, RecordId};
pub use resolver::{BatchReport, BatchResolver, BatchSummary, GeocodeOutcome, RecordStatus};
pub use sink::{GristSink, RecordUpdate, SinkError, UpdateSink};
