//! # trace-view
//!
//! Controller for the trace detail page: loads one trace through the
//! injected API, mounts its map exactly once, and runs the edit, delete and
//! export workflows behind confirmation prompts.
//!
//! ## Architecture
//!
//! ```text
//! BaseTraceApi ──writes──► ResourceStore ◄──reads── BaseTraceSelector
//!      ▲                                                   │
//!      │ fetch / update / delete                           ▼ ResourceView
//!      └──────────────── TraceViewController ◄─────────────┘
//!                          │        │
//!          MapSyncController        ├─► BaseConfirmationGateway
//!                  │                ├─► BaseNotificationSink
//!                  ▼                ├─► BaseBusyIndicator (BusyGuard)
//!       BaseMapWidgetFactory        └─► BaseNavigator / BaseLinkOpener
//! ```
//!
//! Every collaborator is a trait object handed in through
//! [`ControllerDeps`]; `test_dependencies` has recording mocks for all of
//! them.

pub mod api;
pub mod busy;
pub mod config;
pub mod controller;
pub mod export;
pub mod map_sync;
pub mod selector;
pub mod terminal;
pub mod test_dependencies;
pub mod traits;
pub mod types;

pub use api::{ApiError, HttpTraceApi};
pub use busy::{BusyGuard, CountingBusyIndicator};
pub use config::Config;
pub use controller::{
    ActionOutcome, ControllerDeps, ControllerSettings, TraceScreen, TraceViewController,
    ViewEditState, ViewPhase,
};
pub use map_sync::{MapMountState, MapSyncController, SyncOutcome};
pub use selector::{SharedStore, StoreSelector};
pub use traits::*;
