//! Inbound address records and their validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Grist row id. Usually an integer, kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

/// Shape of one element of the webhook body. Other columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(default, rename = "Address")]
    address: Option<String>,
}

/// A record that passed validation and can be geocoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub id: RecordId,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("missing id")]
    MissingId,
    #[error("missing Address in record {0}")]
    MissingAddress(RecordId),
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl AddressRecord {
    /// Validate one decoded element of the inbound batch.
    ///
    /// Only an absent or `null` id is missing; `0` is a valid id. A blank
    /// string id or a blank Address counts as missing.
    pub fn parse(value: &Value) -> Result<Self, RecordError> {
        if !value.is_object() {
            return Err(RecordError::Malformed(format!("expected an object, got {}", value)));
        }
        let raw = RawRecord::deserialize(value).map_err(|e| RecordError::Malformed(e.to_string()))?;

        let id = match raw.id {
            None => return Err(RecordError::MissingId),
            Some(RecordId::Text(text)) if text.trim().is_empty() => return Err(RecordError::MissingId),
            Some(id) => id,
        };

        match raw.address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() => Ok(Self {
                id,
                address: address.to_string(),
            }),
            _ => Err(RecordError::MissingAddress(id)),
        }
    }
}
