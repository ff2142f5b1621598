//! IOC lookup types and the per-entity source seam.

pub mod intsights;
pub mod summary;

use crate::options::LookupOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use summary::{summarize, IocSummary, PayloadError, MAX_SUMMARY_TAGS};

/// An observable value to enrich.
///
/// Fields other than `value` are caller metadata and are echoed back
/// untouched in the result.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Entity {
    pub value: String,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Entity {
    /// Create an entity with no metadata.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            metadata: Map::new(),
        }
    }

    /// Attach a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Enrichment data for an entity the provider knows about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IocData {
    pub summary: IocSummary,
    /// Raw provider payload.
    pub details: Value,
}

/// Result for a single entity. `data` is `None` when the provider has nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub entity: Entity,
    pub data: Option<IocData>,
}

impl LookupResult {
    /// Interpret a provider payload for `entity`.
    ///
    /// An empty JSON object means no data. Any other object is summarized.
    pub fn from_payload(entity: Entity, payload: Value) -> Result<Self, PayloadError> {
        let is_empty = match &payload {
            Value::Object(map) => map.is_empty(),
            _ => return Err(PayloadError::NotAnObject),
        };

        let data = if is_empty {
            None
        } else {
            Some(IocData {
                summary: summarize(&payload)?,
                details: payload,
            })
        };

        Ok(Self { entity, data })
    }
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single outbound lookup.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A response arrived with a non-success status.
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// The request was sent but no response arrived.
    #[error("no response received: {0}")]
    Transport(#[source] BoxError),

    /// The request could not be built.
    #[error("failed to build request: {0}")]
    Request(#[source] BoxError),

    /// The response body could not be read or parsed.
    #[error("failed to decode response: {0}")]
    Decode(#[source] BoxError),

    /// The payload parsed but has the wrong shape.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("{0}")]
    Internal(String),
}

impl FetchError {
    pub fn kind(&self) -> LookupErrorKind {
        match self {
            FetchError::Status { .. } => LookupErrorKind::HttpStatus,
            FetchError::Transport(_) => LookupErrorKind::Transport,
            _ => LookupErrorKind::Unexpected,
        }
    }
}

/// Classification of a batch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupErrorKind {
    HttpStatus,
    Transport,
    Unexpected,
}

/// Batch-level lookup failure. Any single failed entity aborts the batch.
#[derive(Debug, thiserror::Error)]
#[error("{detail}")]
pub struct LookupError {
    pub kind: LookupErrorKind,
    pub detail: String,
    /// Value of the entity whose lookup failed.
    pub entity: String,
    #[source]
    pub cause: FetchError,
}

impl LookupError {
    pub fn new(entity: &Entity, cause: FetchError) -> Self {
        let detail = match &cause {
            FetchError::Status { status } => format!("Received unexpected HTTP status {}", status),
            FetchError::Transport(_) => "There was an HTTP error".to_string(),
            other => other.to_string(),
        };

        Self {
            kind: cause.kind(),
            detail,
            entity: entity.value.clone(),
            cause,
        }
    }

    /// Serializable form handed to the host.
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            detail: self.detail.clone(),
            kind: self.kind,
            entity: self.entity.clone(),
            cause: self.cause.to_string(),
        }
    }
}

/// JSON shape of a [`LookupError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub detail: String,
    pub kind: LookupErrorKind,
    pub entity: String,
    pub cause: String,
}

/// Source of IOC payloads, one call per entity.
#[async_trait]
pub trait IocSource: Send + Sync {
    /// Fetch the raw payload for an IOC value.
    async fn fetch(&self, value: &str, options: &LookupOptions) -> Result<Value, FetchError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_metadata_roundtrip() {
        let entity: Entity = serde_json::from_value(json!({
            "value": "8.8.8.8",
            "type": "IPv4",
            "isIP": true
        }))
        .unwrap();
        assert_eq!(entity.value, "8.8.8.8");
        assert_eq!(entity.metadata.get("type"), Some(&json!("IPv4")));

        let back = serde_json::to_value(&entity).unwrap();
        assert_eq!(back["isIP"], json!(true));
    }

    #[test]
    fn test_from_payload_empty_object() {
        let result = LookupResult::from_payload(Entity::new("evil.example"), json!({})).unwrap();
        assert!(result.data.is_none());
        assert_eq!(serde_json::to_value(&result).unwrap()["data"], Value::Null);
    }

    #[test]
    fn test_from_payload_with_data() {
        let payload = json!({ "Sources": [{}, {}], "Tags": ["phishing"] });
        let result = LookupResult::from_payload(Entity::new("evil.example"), payload.clone()).unwrap();
        let data = result.data.unwrap();
        assert_eq!(data.summary.tags(), ["Sources: 2", "phishing"]);
        assert_eq!(data.details, payload);
    }

    #[test]
    fn test_from_payload_not_object() {
        let err = LookupResult::from_payload(Entity::new("x"), json!([1, 2])).unwrap_err();
        assert_eq!(err, PayloadError::NotAnObject);
    }

    #[test]
    fn test_error_classification() {
        let entity = Entity::new("1.2.3.4");

        let err = LookupError::new(&entity, FetchError::Status { status: 500 });
        assert_eq!(err.kind, LookupErrorKind::HttpStatus);
        assert_eq!(err.detail, "Received unexpected HTTP status 500");

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = LookupError::new(&entity, FetchError::Transport(Box::new(io)));
        assert_eq!(err.kind, LookupErrorKind::Transport);
        assert_eq!(err.detail, "There was an HTTP error");

        let bad = std::io::Error::new(std::io::ErrorKind::InvalidInput, "relative URL without a base");
        let err = LookupError::new(&entity, FetchError::Request(Box::new(bad)));
        assert_eq!(err.kind, LookupErrorKind::Unexpected);
        assert_eq!(err.detail, "failed to build request: relative URL without a base");

        let err = LookupError::new(&entity, PayloadError::MissingSources.into());
        assert_eq!(err.kind, LookupErrorKind::Unexpected);
        assert_eq!(err.detail, PayloadError::MissingSources.to_string());
    }

    #[test]
    fn test_error_envelope() {
        let err = LookupError::new(&Entity::new("1.2.3.4"), FetchError::Status { status: 401 });
        let envelope = serde_json::to_value(err.envelope()).unwrap();
        assert_eq!(envelope["kind"], json!("http_status"));
        assert_eq!(envelope["entity"], json!("1.2.3.4"));
        assert_eq!(envelope["cause"], json!("HTTP status 401"));
        assert_eq!(err.to_string(), "Received unexpected HTTP status 401");
    }
}
