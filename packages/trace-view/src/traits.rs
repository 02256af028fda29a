// Trait definitions for the controller's collaborators
//
// These are INFRASTRUCTURE traits only - no controller logic.
// The wiring layer provides real implementations; tests inject the mocks from
// `test_dependencies`.
//
// Naming convention: Base* for trait names (e.g., BaseTraceApi, BaseNavigator)

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use resource_state::{ErrorInfo, ResourceView};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{BoundingBox, TracePatch};

// =============================================================================
// Trace API (fetch / update / delete dispatch)
// =============================================================================

#[async_trait]
pub trait BaseTraceApi: Send + Sync {
    /// Populate the trace's envelope. Always resolves; success or failure is
    /// observable only through the envelope afterwards.
    async fn fetch_trace(&self, id: &str);

    async fn update_trace(&self, id: &str, patch: TracePatch) -> Result<(), ErrorInfo>;

    async fn delete_trace(&self, id: &str) -> Result<(), ErrorInfo>;
}

// =============================================================================
// Store Selector (binds the state tree to the controller)
// =============================================================================

pub trait BaseTraceSelector: Send + Sync {
    /// Fresh view of the trace's envelope
    fn trace(&self, id: &str) -> ResourceView;

    /// Fresh view of the session user's envelope
    fn authenticated_user(&self) -> ResourceView;
}

// =============================================================================
// Confirmation Gateway (modal prompt)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmKind {
    Delete,
    Export,
    Update,
}

impl fmt::Display for ConfirmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmKind::Delete => write!(f, "delete"),
            ConfirmKind::Export => write!(f, "export"),
            ConfirmKind::Update => write!(f, "update"),
        }
    }
}

/// What the prompt is about: item type and id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmContext {
    pub item: &'static str,
    pub id: String,
}

impl ConfirmContext {
    pub fn trace(id: impl Into<String>) -> Self {
        Self {
            item: "trace",
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub result: bool,
}

impl Confirmation {
    pub const ACCEPTED: Confirmation = Confirmation { result: true };
    pub const REJECTED: Confirmation = Confirmation { result: false };
}

#[async_trait]
pub trait BaseConfirmationGateway: Send + Sync {
    /// Resolves once the user answers; never synchronously.
    async fn ask(&self, kind: ConfirmKind, context: &ConfirmContext) -> Confirmation;
}

// =============================================================================
// Notifications, busy overlay, navigation, external links
// =============================================================================

/// Transient toast messages. Fire-and-forget.
pub trait BaseNotificationSink: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Global loading overlay. Nested `show` calls must not be undone by an
/// inner `hide`; see `busy::CountingBusyIndicator`.
pub trait BaseBusyIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

pub trait BaseNavigator: Send + Sync {
    fn navigate(&self, to: &str);
}

/// Opens a URL outside the app (new window, protocol handler).
pub trait BaseLinkOpener: Send + Sync {
    fn open(&self, url: &str);
}

// =============================================================================
// Map Widget
// =============================================================================

/// Identifies the element the map renders into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle(pub String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub container: ContainerHandle,
    pub style: String,
    pub interactive: bool,
    pub compact_attribution: bool,
    pub bounds: BoundingBox,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// GeoJSON feature drawn by the layer
    pub source: Value,
}

pub type LoadCallback = Box<dyn FnOnce(&dyn MapWidget) + Send>;

/// Handle to a constructed map.
pub trait MapWidget: Send + Sync {
    /// Run `callback` once when the map finishes loading.
    fn once_loaded(&self, callback: LoadCallback);

    fn add_layer(&self, layer: MapLayer);
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map rendering is not supported in this environment")]
    Unsupported,

    #[error("map construction failed: {0}")]
    Construction(String),
}

pub trait BaseMapWidgetFactory: Send + Sync {
    /// Whether the host can render maps at all (WebGL in a browser).
    fn supported(&self) -> bool;

    fn create(&self, options: MapOptions) -> Result<Arc<dyn MapWidget>, MapError>;
}
