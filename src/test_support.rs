//! In-memory fakes and a local HTTP stub server shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router};
use serde_json::json;

use crate::batch::{RecordId, RecordUpdate, SinkError, UpdateSink};
use crate::geocoding::{Backend, Candidate, GeocodeError, ProviderId};

pub(crate) type Calls = Arc<Mutex<Vec<String>>>;

/// Backend answering from a fixed table; unknown addresses come back empty.
pub(crate) struct FakeBackend {
    id: ProviderId,
    known: HashMap<String, Candidate>,
    failing: bool,
    calls: Calls,
}

impl FakeBackend {
    pub(crate) fn new(id: ProviderId) -> Self {
        Self {
            id,
            known: HashMap::new(),
            failing: false,
            calls: Calls::default(),
        }
    }

    pub(crate) fn with(mut self, address: &str, lat: f64, lon: f64) -> Self {
        self.known.insert(address.to_string(), Candidate::new(lat, lon));
        self
    }

    /// Every call fails with a network error.
    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub(crate) fn calls(&self) -> Calls {
        Arc::clone(&self.calls)
    }
}

impl Backend for FakeBackend {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn geocode(&self, address: &str) -> Result<Vec<Candidate>, GeocodeError> {
        self.calls.lock().unwrap().push(address.to_string());
        if self.failing {
            return Err(GeocodeError::Network("connection refused".into()));
        }
        Ok(self.known.get(address).copied().into_iter().collect())
    }
}

/// Sink that records every update and rejects the ids it is told to.
#[derive(Default)]
pub(crate) struct RecordingSink {
    failing: HashSet<RecordId>,
    attempted: Mutex<Vec<RecordUpdate>>,
    updated: Mutex<Vec<RecordUpdate>>,
}

impl RecordingSink {
    pub(crate) fn failing_for(ids: impl IntoIterator<Item = RecordId>) -> Self {
        Self {
            failing: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn attempted(&self) -> Vec<RecordUpdate> {
        self.attempted.lock().unwrap().clone()
    }

    pub(crate) fn updates(&self) -> Vec<RecordUpdate> {
        self.updated.lock().unwrap().clone()
    }
}

impl UpdateSink for RecordingSink {
    fn update(&self, update: &RecordUpdate) -> Result<(), SinkError> {
        self.attempted.lock().unwrap().push(update.clone());
        if self.failing.contains(&update.id) {
            return Err(SinkError::Status {
                status: 400,
                body: "Invalid row id".into(),
            });
        }
        self.updated.lock().unwrap().push(update.clone());
        Ok(())
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serve a stub that answers every request with `[]` only after `delay`.
pub(crate) async fn serve_slow(delay: Duration) -> String {
    let router = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        Json(json!([]))
    });
    serve(router).await
}

pub(crate) fn test_agent() -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(Duration::from_secs(5)).build()
}
