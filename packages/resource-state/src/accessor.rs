//! Total lookup of envelopes in the state tree.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::path::ResourcePath;
use crate::resource::{AsyncResource, ErrorInfo, Payload};
use crate::view::{wrap, ResourceView};

/// The envelope at `path`, or the default envelope
/// `{ fetched: false, fetching: false, data: {}, error: null }`.
///
/// Missing intermediate keys and nodes that are not objects both resolve to
/// the default; this never fails. Fields are read one at a time, so an
/// oddly shaped `error` still leaves `fetched` and `fetching` intact.
pub fn get_from_state(state: &Value, path: &ResourcePath) -> AsyncResource {
    let node = match path.lookup(state) {
        None | Some(Value::Null) => return AsyncResource::default(),
        Some(node) => node,
    };
    let Some(fields) = node.as_object() else {
        warn!(path = %path, "state node is not an envelope, using default");
        return AsyncResource::default();
    };

    AsyncResource {
        fetched: flag(fields, "fetched", path),
        fetching: flag(fields, "fetching", path),
        data: fields.get("data").cloned().unwrap_or_else(Value::empty),
        error: fields.get("error").and_then(error_info),
    }
}

/// Missing, null and non-boolean flags read as false.
fn flag(fields: &Map<String, Value>, name: &str, path: &ResourcePath) -> bool {
    match fields.get(name) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            warn!(path = %path, field = name, value = %other, "envelope flag is not a boolean");
            false
        }
    }
}

/// Any non-null error counts. Strings become the message; objects without a
/// usable `message` are described by their JSON text.
fn error_info(value: &Value) -> Option<ErrorInfo> {
    match value {
        Value::Null => None,
        Value::String(message) => Some(ErrorInfo::new(message.clone())),
        Value::Object(fields) => {
            if let Ok(error) = ErrorInfo::deserialize(value) {
                return Some(error);
            }
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string());
            let status = fields
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|status| u16::try_from(status).ok());
            Some(ErrorInfo { message, status })
        }
        other => Some(ErrorInfo::new(other.to_string())),
    }
}

/// `wrap(get_from_state(state, path))`
pub fn select(state: &Value, path: &ResourcePath) -> ResourceView {
    wrap(get_from_state(state, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_path_yields_default() {
        let state = json!({});
        let resource = get_from_state(&state, &ResourcePath::from("individualTraces.1"));
        assert_eq!(resource, AsyncResource::default());
    }

    #[test]
    fn missing_intermediate_on_non_object_yields_default() {
        let state = json!({ "individualTraces": 5 });
        let resource = get_from_state(&state, &ResourcePath::from("individualTraces.1.deep"));
        assert_eq!(resource, AsyncResource::default());
    }

    #[test]
    fn malformed_node_yields_default() {
        let state = json!({ "individualTraces": { "1": { "fetched": "yes" } } });
        let resource = get_from_state(&state, &ResourcePath::from("individualTraces.1"));
        assert_eq!(resource, AsyncResource::default());
    }

    #[test]
    fn string_error_keeps_envelope_ready() {
        let state = json!({
            "t": { "fetched": true, "fetching": false, "data": {}, "error": "Not Found" }
        });
        let view = select(&state, &ResourcePath::from("t"));
        assert!(view.is_ready());
        assert!(view.has_error());
        assert_eq!(view.error(), Some(&ErrorInfo::new("Not Found")));
    }

    #[test]
    fn error_object_without_message_is_described() {
        let state = json!({
            "t": { "fetched": true, "fetching": false, "error": { "status": 500 } }
        });
        let view = select(&state, &ResourcePath::from("t"));
        assert!(view.is_ready());
        assert!(view.has_error());
        let error = view.error().unwrap();
        assert_eq!(error.status, Some(500));
        assert_eq!(error.message, r#"{"status":500}"#);
    }

    #[test]
    fn out_of_range_status_is_dropped() {
        let state = json!({
            "t": { "fetched": true, "error": { "message": "teapot", "status": 70000 } }
        });
        let resource = get_from_state(&state, &ResourcePath::from("t"));
        assert!(resource.is_ready());
        assert_eq!(resource.error, Some(ErrorInfo::new("teapot")));
    }

    #[test]
    fn present_envelope_is_returned() {
        let state = json!({
            "individualTraces": {
                "1": { "fetched": true, "fetching": false, "data": { "id": 1 }, "error": null }
            }
        });
        let view = select(&state, &ResourcePath::from("individualTraces.1"));
        assert!(view.is_ready());
        assert_eq!(view.data(), Some(&json!({ "id": 1 })));
    }
}
