//! Update sink: writes resolved coordinates back to the Grist table.

use serde::Serialize;
use tracing::trace;
use ureq::Agent;

use super::record::RecordId;
use super::resolver::GeocodeOutcome;
use crate::config::Config;
use crate::geocoding::types::transport_message;

/// Per-record write of a geocoding outcome.
pub trait UpdateSink: Send + Sync {
    fn update(&self, update: &RecordUpdate) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<ureq::Error> for SinkError {
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

/// Grist column values. `None` clears the cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateFields {
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
}

/// One entry of the Grist `records` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordUpdate {
    pub id: RecordId,
    pub fields: CoordinateFields,
}

impl From<&GeocodeOutcome> for RecordUpdate {
    fn from(outcome: &GeocodeOutcome) -> Self {
        let coords = outcome.coordinates();
        Self {
            id: outcome.record_id().clone(),
            fields: CoordinateFields {
                latitude: coords.map(|(lat, _)| lat),
                longitude: coords.map(|(_, lon)| lon),
            },
        }
    }
}

#[derive(Serialize)]
struct UpdatePayload<'a> {
    records: [&'a RecordUpdate; 1],
}

/// Grist REST API sink, one PATCH per record.
pub struct GristSink {
    agent: Agent,
    url: String,
    access_token: String,
}

impl GristSink {
    pub fn new(
        agent: Agent,
        base_url: &str,
        access_token: impl Into<String>,
        document: &str,
        table: &str,
    ) -> Self {
        Self {
            agent,
            url: format!(
                "{}/api/docs/{}/tables/{}/records",
                base_url.trim_end_matches('/'),
                document,
                table
            ),
            access_token: access_token.into(),
        }
    }

    pub fn from_config(config: &Config, agent: Agent) -> Self {
        Self::new(
            agent,
            &config.grist_base_url,
            config.grist_access_token.clone(),
            &config.grist_document,
            &config.grist_table,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl UpdateSink for GristSink {
    fn update(&self, update: &RecordUpdate) -> Result<(), SinkError> {
        trace!("PATCH {} for record {}", self.url, update.id);
        self.agent
            .request("PATCH", &self.url)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .send_json(UpdatePayload { records: [update] })?;
        Ok(())
    }
}
