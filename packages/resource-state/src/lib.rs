//! # resource-state
//!
//! A uniform envelope for "a value fetched over the network that may not be
//! available yet", plus the read side used by views to query it.
//!
//! ## Lifecycle
//!
//! ```text
//!   ResourceStore::begin()      ResourceStore::resolve() / reject()
//!          │                                  │
//!          ▼                                  ▼
//!  { fetching: true } ───────────► { fetched: true, fetching: false }
//!          │                                  │
//!          └────────── get_from_state() ◄─────┘
//!                            │
//!                            ▼ wrap()
//!                      ResourceView
//!              is_ready / has_error / get_data / get_meta
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Readiness is derived** - `ready = fetched && !fetching`, never stored
//! 2. **Errors hide while fetching** - `has_error()` is false unless ready,
//!    even when a stale error from an earlier cycle is still recorded
//! 3. **Lookups are total** - a missing path yields the default envelope
//! 4. **Views are read-only** - only the store writes envelopes
//!
//! ## Example
//!
//! ```
//! use resource_state::{get_from_state, wrap, ResourcePath, ResourceStore};
//! use serde_json::json;
//!
//! let path = ResourcePath::new(["individualTraces", "42"]);
//! let mut store = ResourceStore::new();
//!
//! store.begin(&path);
//! assert!(!store.view(&path).is_ready());
//!
//! store.resolve(&path, json!({ "results": { "id": 42 } }));
//! let view = wrap(get_from_state(store.tree(), &path));
//! assert!(view.is_ready());
//! assert_eq!(view.get_data(&json!({})), &json!({ "id": 42 }));
//! ```

mod accessor;
mod path;
mod resource;
mod store;
mod view;

pub mod validate;

pub use accessor::{get_from_state, select};
pub use path::ResourcePath;
pub use resource::{AsyncResource, ErrorInfo, Payload};
pub use store::ResourceStore;
pub use view::{wrap, ResourceView};
