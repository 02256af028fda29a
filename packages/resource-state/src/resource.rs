//! The `AsyncResource` envelope and the payload shape it wraps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure recorded by the most recent fetch or returned by a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ErrorInfo {
    pub message: String,
    /// HTTP status when the failure came from a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether the remote side reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// Shape of the data held inside an envelope.
///
/// List endpoints wrap their payload in `results` and may carry paging
/// information in `meta`; single-record endpoints return the record itself.
pub trait Payload {
    /// Value stored before the first successful fetch.
    fn empty() -> Self;

    /// The `results` member, if the payload is list-shaped.
    fn results(&self) -> Option<&Self>;

    /// The `meta` member, if present.
    fn meta(&self) -> Option<&Self>;
}

impl Payload for Value {
    fn empty() -> Self {
        Value::Object(Map::new())
    }

    fn results(&self) -> Option<&Value> {
        self.get("results").filter(|results| is_truthy(results))
    }

    fn meta(&self) -> Option<&Value> {
        self.get("meta").filter(|meta| !meta.is_null())
    }
}

/// JSON truthiness: `null`, `false`, `0` and `""` do not count as a payload.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Lifecycle of one remotely sourced value.
///
/// `fetched` and `fetching` are independent: a re-fetch leaves `fetched`
/// set while `fetching` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Payload + Deserialize<'de>"))]
pub struct AsyncResource<T = Value> {
    pub fetched: bool,
    pub fetching: bool,
    pub data: T,
    pub error: Option<ErrorInfo>,
}

impl<T: Payload> Default for AsyncResource<T> {
    fn default() -> Self {
        Self {
            fetched: false,
            fetching: false,
            data: T::empty(),
            error: None,
        }
    }
}

impl<T> AsyncResource<T> {
    /// `fetched && !fetching`
    pub fn is_ready(&self) -> bool {
        self.fetched && !self.fetching
    }

    /// Envelope for a completed, successful fetch.
    pub fn loaded(data: T) -> Self {
        Self {
            fetched: true,
            fetching: false,
            data,
            error: None,
        }
    }
}

impl<T: Payload> AsyncResource<T> {
    /// Envelope for a completed, failed fetch.
    pub fn failed(error: ErrorInfo) -> Self {
        Self {
            fetched: true,
            fetching: false,
            data: T::empty(),
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_envelope_is_empty_object() {
        let resource: AsyncResource = AsyncResource::default();
        assert!(!resource.fetched);
        assert!(!resource.fetching);
        assert_eq!(resource.data, json!({}));
        assert!(resource.error.is_none());
    }

    #[test]
    fn deserializes_partial_envelopes() {
        let resource: AsyncResource =
            serde_json::from_value(json!({ "fetching": true })).unwrap();
        assert!(resource.fetching);
        assert!(!resource.fetched);
        assert_eq!(resource.data, json!({}));
    }

    #[test]
    fn deserializes_error_with_status() {
        let resource: AsyncResource = serde_json::from_value(json!({
            "fetched": true,
            "error": { "message": "Not Found", "status": 404 }
        }))
        .unwrap();
        let error = resource.error.unwrap();
        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "Not Found");
    }

    #[test]
    fn falsy_results_are_not_a_payload() {
        assert!(json!({ "results": null }).results().is_none());
        assert!(json!({ "results": 0 }).results().is_none());
        assert!(json!({ "results": "" }).results().is_none());
        assert_eq!(json!({ "results": [] }).results(), Some(&json!([])));
        assert!(json!([1, 2]).results().is_none());
    }

    #[test]
    fn readiness_requires_fetched_and_not_fetching() {
        let mut resource = AsyncResource::loaded(json!({}));
        assert!(resource.is_ready());
        resource.fetching = true;
        assert!(!resource.is_ready());
    }
}
