//! Write side of the envelope lifecycle.
//!
//! The fetch/mutate pipeline is the only writer; views never touch the tree.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::accessor::{get_from_state, select};
use crate::path::ResourcePath;
use crate::resource::{AsyncResource, ErrorInfo};
use crate::view::ResourceView;

/// Keyed state tree holding one envelope per path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceStore {
    tree: Value,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self {
            tree: Value::Object(Map::new()),
        }
    }

    /// Start from an existing tree, e.g. one restored from a snapshot.
    pub fn from_tree(tree: Value) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn snapshot(&self, path: &ResourcePath) -> AsyncResource {
        get_from_state(&self.tree, path)
    }

    pub fn view(&self, path: &ResourcePath) -> ResourceView {
        select(&self.tree, path)
    }

    /// A request went out. Prior `fetched`, `data` and `error` are kept.
    pub fn begin(&mut self, path: &ResourcePath) {
        debug!(path = %path, "fetch started");
        let envelope = self.envelope_mut(path);
        envelope.insert("fetching".into(), Value::Bool(true));
        ensure_defaults(envelope);
    }

    /// The request succeeded with `data`.
    pub fn resolve(&mut self, path: &ResourcePath, data: Value) {
        debug!(path = %path, "fetch resolved");
        let envelope = self.envelope_mut(path);
        envelope.insert("fetched".into(), Value::Bool(true));
        envelope.insert("fetching".into(), Value::Bool(false));
        envelope.insert("data".into(), data);
        envelope.insert("error".into(), Value::Null);
    }

    /// The request failed. Previously fetched data is retained.
    pub fn reject(&mut self, path: &ResourcePath, error: &ErrorInfo) {
        debug!(path = %path, error = %error, "fetch rejected");
        let envelope = self.envelope_mut(path);
        envelope.insert("fetched".into(), Value::Bool(true));
        envelope.insert("fetching".into(), Value::Bool(false));
        envelope.insert(
            "error".into(),
            json!({ "message": error.message, "status": error.status }),
        );
        ensure_defaults(envelope);
    }

    /// Edit the data of an existing envelope in place.
    ///
    /// Returns false when nothing is stored at `path`.
    pub fn update_data(&mut self, path: &ResourcePath, edit: impl FnOnce(&mut Value)) -> bool {
        let Some(data) = self.node_mut(path).and_then(|node| node.get_mut("data")) else {
            return false;
        };
        edit(data);
        true
    }

    /// Drop the envelope; later lookups see the default again.
    pub fn remove(&mut self, path: &ResourcePath) -> bool {
        let Some((last, parent)) = path.segments().split_last() else {
            return false;
        };
        let parent_path = ResourcePath::new(parent.iter().cloned());
        match self.node_mut(&parent_path) {
            Some(Value::Object(map)) => map.remove(last).is_some(),
            // Indices of later siblings must not shift.
            Some(Value::Array(items)) => {
                let slot = last.parse::<usize>().ok().and_then(|i| items.get_mut(i));
                match slot {
                    Some(slot) if !slot.is_null() => {
                        *slot = Value::Null;
                        true
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn node_mut(&mut self, path: &ResourcePath) -> Option<&mut Value> {
        path.lookup_mut(&mut self.tree)
    }

    /// Walk to `path`, replacing anything that is not an object on the way.
    fn envelope_mut(&mut self, path: &ResourcePath) -> &mut Map<String, Value> {
        let mut node = &mut self.tree;
        for segment in path.segments() {
            node = as_object(node)
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        as_object(node)
    }
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

fn ensure_defaults(envelope: &mut Map<String, Value>) {
    envelope.entry("fetched").or_insert(Value::Bool(false));
    envelope.entry("fetching").or_insert(Value::Bool(false));
    envelope
        .entry("data")
        .or_insert_with(|| Value::Object(Map::new()));
    envelope.entry("error").or_insert(Value::Null);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> ResourcePath {
        ResourcePath::new(["individualTraces", "7"])
    }

    #[test]
    fn begin_marks_fetching_on_fresh_path() {
        let mut store = ResourceStore::new();
        store.begin(&path());

        let resource = store.snapshot(&path());
        assert!(resource.fetching);
        assert!(!resource.fetched);
        assert_eq!(resource.data, json!({}));
        assert!(!store.view(&path()).is_ready());
    }

    #[test]
    fn resolve_makes_ready() {
        let mut store = ResourceStore::new();
        store.begin(&path());
        store.resolve(&path(), json!({ "id": 7 }));

        let view = store.view(&path());
        assert!(view.is_ready());
        assert!(!view.has_error());
        assert_eq!(view.data(), Some(&json!({ "id": 7 })));
    }

    #[test]
    fn refetch_hides_stale_error_until_settled() {
        let mut store = ResourceStore::new();
        store.begin(&path());
        store.reject(&path(), &ErrorInfo::new("Not Found").with_status(404));
        assert!(store.view(&path()).has_error());

        store.begin(&path());
        let view = store.view(&path());
        assert!(view.raw().fetched);
        assert!(view.raw().error.is_some());
        assert!(!view.has_error());

        store.resolve(&path(), json!({ "id": 7 }));
        assert!(!store.view(&path()).has_error());
    }

    #[test]
    fn reject_keeps_previous_data() {
        let mut store = ResourceStore::new();
        store.resolve(&path(), json!({ "id": 7 }));
        store.begin(&path());
        store.reject(&path(), &ErrorInfo::new("timeout"));

        let resource = store.snapshot(&path());
        assert_eq!(resource.data, json!({ "id": 7 }));
        assert_eq!(resource.error, Some(ErrorInfo::new("timeout")));
    }

    #[test]
    fn update_data_edits_in_place() {
        let mut store = ResourceStore::new();
        assert!(!store.update_data(&path(), |_| {}));

        store.resolve(&path(), json!({ "description": "old" }));
        assert!(store.update_data(&path(), |data| {
            data["description"] = json!("new");
        }));
        assert_eq!(store.snapshot(&path()).data, json!({ "description": "new" }));
    }

    #[test]
    fn remove_restores_default() {
        let mut store = ResourceStore::new();
        store.resolve(&path(), json!({ "id": 7 }));
        assert!(store.remove(&path()));
        assert_eq!(store.snapshot(&path()), AsyncResource::default());
        assert!(!store.remove(&path()));
    }

    #[test]
    fn default_store_matches_new() {
        assert_eq!(ResourceStore::default(), ResourceStore::new());
        assert_eq!(ResourceStore::default().tree(), &json!({}));
    }

    #[test]
    fn array_indexed_envelopes_are_writable() {
        let mut store = ResourceStore::from_tree(json!({
            "pages": [
                { "fetched": true, "fetching": false, "data": { "n": 0 }, "error": null },
                { "fetched": true, "fetching": false, "data": { "n": 1 }, "error": null }
            ]
        }));
        let first = ResourcePath::from("pages.0");
        let second = ResourcePath::from("pages.1");

        assert!(store.update_data(&first, |data| data["n"] = json!(10)));
        assert_eq!(store.snapshot(&first).data, json!({ "n": 10 }));

        assert!(store.remove(&first));
        assert_eq!(store.snapshot(&first), AsyncResource::default());
        assert_eq!(store.snapshot(&second).data, json!({ "n": 1 }));
        assert!(!store.remove(&first));
    }

    #[test]
    fn writes_replace_non_object_nodes() {
        let mut store = ResourceStore::from_tree(json!({ "individualTraces": "bogus" }));
        store.resolve(&path(), json!({ "id": 7 }));
        assert!(store.view(&path()).is_ready());
    }
}
