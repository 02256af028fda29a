//! One-time map construction driven by resource readiness.
//!
//! `sync` runs after every render. The first time the trace is ready and
//! error-free it builds the map; every later call is a no-op, so re-fetches
//! and re-renders never remount.
//!
//! ```text
//!  Unmounted ──ready──► Loading ──load event──► Mounted
//!      │
//!      └──unsupported / construction failure──► Unsupported
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use resource_state::ResourceView;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::traits::{
    BaseMapWidgetFactory, ContainerHandle, MapError, MapLayer, MapOptions, MapWidget,
};
use crate::types::Geometry;

pub const TRACE_LAYER_ID: &str = "trace";

/// Fallback text shown in place of the map.
pub const UNSUPPORTED_MESSAGE: &str = "WebGL is not supported or disabled.";

/// Monotonic: never returns to `Unmounted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapMountState {
    #[default]
    Unmounted,
    /// Constructed, waiting for the load event.
    Loading,
    Mounted,
    /// Terminal; the view shows the static fallback.
    Unsupported,
}

impl MapMountState {
    pub fn is_mounted(self) -> bool {
        self == MapMountState::Mounted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Construction already happened (or was ruled out).
    Settled,
    /// Resource not ready or errored.
    Waiting,
    /// Payload has no usable geometry yet.
    NoGeometry,
    Unsupported,
    Constructed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSettings {
    pub style: String,
    pub padding: u32,
}

pub struct MapSyncController {
    factory: Arc<dyn BaseMapWidgetFactory>,
    container: ContainerHandle,
    settings: MapSettings,
    state: Arc<Mutex<MapMountState>>,
    widget: Option<Arc<dyn MapWidget>>,
}

impl MapSyncController {
    pub fn new(
        factory: Arc<dyn BaseMapWidgetFactory>,
        container: ContainerHandle,
        settings: MapSettings,
    ) -> Self {
        Self {
            factory,
            container,
            settings,
            state: Arc::new(Mutex::new(MapMountState::Unmounted)),
            widget: None,
        }
    }

    pub fn state(&self) -> MapMountState {
        *lock(&self.state)
    }

    pub fn container(&self) -> &ContainerHandle {
        &self.container
    }

    /// False once the fallback should be rendered instead of the container.
    pub fn renders_map(&self) -> bool {
        self.state() != MapMountState::Unsupported && self.factory.supported()
    }

    pub fn sync(&mut self, view: &ResourceView) -> SyncOutcome {
        if self.state() != MapMountState::Unmounted {
            return SyncOutcome::Settled;
        }
        if !view.is_ready() || view.has_error() {
            return SyncOutcome::Waiting;
        }
        if !self.factory.supported() {
            debug!("map rendering unsupported, using fallback");
            self.set_state(MapMountState::Unsupported);
            return SyncOutcome::Unsupported;
        }

        let Some(geometry) = view.data().and_then(extract_geometry) else {
            return SyncOutcome::NoGeometry;
        };
        let Some(bounds) = geometry.bbox() else {
            warn!("trace geometry has no positions, map not constructed");
            return SyncOutcome::NoGeometry;
        };

        let options = MapOptions {
            container: self.container.clone(),
            style: self.settings.style.clone(),
            interactive: false,
            compact_attribution: false,
            bounds,
            padding: self.settings.padding,
        };

        let widget = match self.factory.create(options) {
            Ok(widget) => widget,
            Err(MapError::Unsupported) => {
                self.set_state(MapMountState::Unsupported);
                return SyncOutcome::Unsupported;
            }
            Err(e) => {
                warn!(error = %e, "map construction failed, using fallback");
                self.set_state(MapMountState::Unsupported);
                return SyncOutcome::Unsupported;
            }
        };

        self.set_state(MapMountState::Loading);

        let state = Arc::clone(&self.state);
        let layer = trace_layer(&geometry);
        widget.once_loaded(Box::new(move |map: &dyn MapWidget| {
            map.add_layer(layer);
            *lock(&state) = MapMountState::Mounted;
            debug!("trace map mounted");
        }));

        self.widget = Some(widget);
        SyncOutcome::Constructed
    }

    fn set_state(&self, next: MapMountState) {
        *lock(&self.state) = next;
    }
}

fn lock(state: &Mutex<MapMountState>) -> MutexGuard<'_, MapMountState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn extract_geometry(data: &Value) -> Option<Geometry> {
    let node = data.get("geometry")?;
    match Geometry::deserialize(node) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            warn!(error = %e, "trace geometry could not be decoded");
            None
        }
    }
}

/// Line layer drawing the trace.
pub fn trace_layer(geometry: &Geometry) -> MapLayer {
    MapLayer {
        id: TRACE_LAYER_ID.to_string(),
        kind: "line".to_string(),
        source: geometry.to_feature(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_dependencies::MockMapWidgetFactory;
    use resource_state::{wrap, AsyncResource, ErrorInfo};
    use serde_json::json;

    fn settings() -> MapSettings {
        MapSettings {
            style: "mapbox://styles/mapbox/streets-v9".into(),
            padding: 20,
        }
    }

    fn controller(factory: &Arc<MockMapWidgetFactory>) -> MapSyncController {
        MapSyncController::new(factory.clone(), ContainerHandle::new("map"), settings())
    }

    fn ready_point() -> ResourceView {
        wrap(AsyncResource::loaded(json!({
            "results": { "id": 1, "geometry": { "type": "Point", "coordinates": [1, 2] } }
        })))
    }

    #[test]
    fn constructs_once_when_ready() {
        let factory = Arc::new(MockMapWidgetFactory::new());
        let mut sync = controller(&factory);

        assert_eq!(sync.sync(&ready_point()), SyncOutcome::Constructed);
        assert_eq!(sync.state(), MapMountState::Loading);
        assert_eq!(sync.sync(&ready_point()), SyncOutcome::Settled);
        assert_eq!(factory.construction_count(), 1);

        let options = &factory.constructions()[0];
        assert!(!options.interactive);
        assert_eq!(options.style, "mapbox://styles/mapbox/streets-v9");
        assert_eq!(options.bounds.as_array(), [1.0, 2.0, 1.0, 2.0]);
        assert_eq!(options.padding, 20);
    }

    #[test]
    fn load_event_adds_layer_and_mounts() {
        let factory = Arc::new(MockMapWidgetFactory::new());
        let mut sync = controller(&factory);
        sync.sync(&ready_point());

        let widget = factory.last_widget().unwrap();
        assert!(widget.layers().is_empty());
        widget.fire_load();

        assert!(sync.state().is_mounted());
        let layers = widget.layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].id, TRACE_LAYER_ID);
        assert_eq!(layers[0].kind, "line");
        assert_eq!(
            layers[0].source["geometry"],
            json!({ "type": "Point", "coordinates": [1.0, 2.0] })
        );

        for _ in 0..3 {
            assert_eq!(sync.sync(&ready_point()), SyncOutcome::Settled);
        }
        assert_eq!(factory.construction_count(), 1);
    }

    #[test]
    fn waits_while_not_ready_or_errored() {
        let factory = Arc::new(MockMapWidgetFactory::new());
        let mut sync = controller(&factory);

        let pending = wrap(AsyncResource {
            fetched: true,
            fetching: true,
            data: json!({ "geometry": { "type": "Point", "coordinates": [1, 2] } }),
            error: None,
        });
        assert_eq!(sync.sync(&pending), SyncOutcome::Waiting);

        let failed = wrap(AsyncResource::<Value>::failed(ErrorInfo::new("Not Found")));
        assert_eq!(sync.sync(&failed), SyncOutcome::Waiting);

        assert_eq!(factory.construction_count(), 0);
        assert_eq!(sync.state(), MapMountState::Unmounted);
    }

    #[test]
    fn unsupported_environment_is_terminal() {
        let factory = Arc::new(MockMapWidgetFactory::unsupported());
        let mut sync = controller(&factory);

        assert_eq!(sync.sync(&ready_point()), SyncOutcome::Unsupported);
        assert_eq!(sync.state(), MapMountState::Unsupported);
        assert!(!sync.renders_map());
        assert_eq!(sync.sync(&ready_point()), SyncOutcome::Settled);
        assert_eq!(factory.construction_count(), 0);
    }

    #[test]
    fn missing_geometry_keeps_waiting() {
        let factory = Arc::new(MockMapWidgetFactory::new());
        let mut sync = controller(&factory);

        let bare = wrap(AsyncResource::loaded(json!({ "id": 1 })));
        assert_eq!(sync.sync(&bare), SyncOutcome::NoGeometry);
        assert_eq!(sync.state(), MapMountState::Unmounted);

        assert_eq!(sync.sync(&ready_point()), SyncOutcome::Constructed);
    }
}
