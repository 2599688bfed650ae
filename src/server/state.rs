use crate::batch::BatchResolver;
use std::sync::Arc;

pub struct AppState {
    pub access_token: String,
    pub resolver: Arc<BatchResolver>,
}

impl AppState {
    pub fn new(access_token: impl Into<String>, resolver: BatchResolver) -> Self {
        Self {
            access_token: access_token.into(),
            resolver: Arc::new(resolver),
        }
    }
}
