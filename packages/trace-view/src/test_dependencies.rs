// TestDependencies - mock implementations for testing
//
// Provides recording collaborators that can be injected into
// TraceViewController for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use resource_state::ErrorInfo;
use serde_json::{json, Value};

use crate::config::Config;
use crate::controller::{ControllerDeps, ControllerSettings, TraceViewController};
use crate::selector::{authenticated_user_path, lock_store, shared_store, trace_path, SharedStore, StoreSelector};
use crate::traits::{
    BaseBusyIndicator, BaseConfirmationGateway, BaseLinkOpener, BaseMapWidgetFactory,
    BaseNavigator, BaseNotificationSink, BaseTraceApi, ConfirmContext, ConfirmKind, Confirmation,
    LoadCallback, MapError, MapLayer, MapOptions, MapWidget,
};
use crate::types::TracePatch;

// =============================================================================
// Mock Trace API
// =============================================================================

/// Backs the shared store the way the HTTP adapter does, without a network.
pub struct MockTraceApi {
    store: SharedStore,
    fetch_response: Mutex<Option<Result<Value, ErrorInfo>>>,
    update_results: Mutex<VecDeque<Result<(), ErrorInfo>>>,
    delete_results: Mutex<VecDeque<Result<(), ErrorInfo>>>,
    fetch_calls: Arc<Mutex<Vec<String>>>,
    update_calls: Arc<Mutex<Vec<(String, TracePatch)>>>,
    delete_calls: Arc<Mutex<Vec<String>>>,
}

impl MockTraceApi {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            fetch_response: Mutex::new(None),
            update_results: Mutex::new(VecDeque::new()),
            delete_results: Mutex::new(VecDeque::new()),
            fetch_calls: Arc::new(Mutex::new(Vec::new())),
            update_calls: Arc::new(Mutex::new(Vec::new())),
            delete_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Payload the next fetch resolves with
    pub fn with_trace(self, data: Value) -> Self {
        *self.fetch_response.lock().unwrap() = Some(Ok(data));
        self
    }

    /// Error the next fetch rejects with
    pub fn with_fetch_error(self, error: ErrorInfo) -> Self {
        *self.fetch_response.lock().unwrap() = Some(Err(error));
        self
    }

    /// Queue a failure for the next update call
    pub fn with_update_error(self, error: ErrorInfo) -> Self {
        self.update_results.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queue a failure for the next delete call
    pub fn with_delete_error(self, error: ErrorInfo) -> Self {
        self.delete_results.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> Vec<(String, TracePatch)> {
        self.update_calls.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.delete_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseTraceApi for MockTraceApi {
    async fn fetch_trace(&self, id: &str) {
        self.fetch_calls.lock().unwrap().push(id.to_string());
        let path = trace_path(id);
        lock_store(&self.store).begin(&path);

        tokio::task::yield_now().await;

        let response = self.fetch_response.lock().unwrap().clone();
        let mut store = lock_store(&self.store);
        match response {
            Some(Ok(data)) => store.resolve(&path, data),
            Some(Err(error)) => store.reject(&path, &error),
            None => store.reject(&path, &ErrorInfo::new("Not Found").with_status(404)),
        }
    }

    async fn update_trace(&self, id: &str, patch: TracePatch) -> Result<(), ErrorInfo> {
        self.update_calls
            .lock()
            .unwrap()
            .push((id.to_string(), patch.clone()));
        tokio::task::yield_now().await;

        let result = self.update_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            lock_store(&self.store).update_data(&trace_path(id), |data| {
                crate::api::apply_patch(data, &patch)
            });
        }
        result
    }

    async fn delete_trace(&self, id: &str) -> Result<(), ErrorInfo> {
        self.delete_calls.lock().unwrap().push(id.to_string());
        tokio::task::yield_now().await;

        let result = self.delete_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            lock_store(&self.store).remove(&trace_path(id));
        }
        result
    }
}

// =============================================================================
// Mock Confirmation Gateway
// =============================================================================

pub struct MockConfirmationGateway {
    answers: Mutex<VecDeque<bool>>,
    default_answer: bool,
    asks: Arc<Mutex<Vec<(ConfirmKind, ConfirmContext)>>>,
}

impl MockConfirmationGateway {
    pub fn accepting() -> Self {
        Self::answering(true)
    }

    pub fn rejecting() -> Self {
        Self::answering(false)
    }

    fn answering(default_answer: bool) -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            default_answer,
            asks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer the next prompt with `result`, then fall back to the default
    pub fn then_answer(self, result: bool) -> Self {
        self.answers.lock().unwrap().push_back(result);
        self
    }

    pub fn asks(&self) -> Vec<ConfirmKind> {
        self.asks.lock().unwrap().iter().map(|(kind, _)| *kind).collect()
    }

    pub fn contexts(&self) -> Vec<ConfirmContext> {
        self.asks
            .lock()
            .unwrap()
            .iter()
            .map(|(_, context)| context.clone())
            .collect()
    }
}

#[async_trait]
impl BaseConfirmationGateway for MockConfirmationGateway {
    async fn ask(&self, kind: ConfirmKind, context: &ConfirmContext) -> Confirmation {
        self.asks.lock().unwrap().push((kind, context.clone()));
        // A modal never answers synchronously
        tokio::task::yield_now().await;

        let result = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_answer);
        Confirmation { result }
    }
}

// =============================================================================
// Mock Notification Sink
// =============================================================================

#[derive(Default)]
pub struct MockNotificationSink {
    infos: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl MockNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.infos.lock().unwrap().len() + self.errors.lock().unwrap().len()
    }
}

impl BaseNotificationSink for MockNotificationSink {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

// =============================================================================
// Mock Busy Indicator
// =============================================================================

#[derive(Default)]
pub struct MockBusyIndicator {
    shows: AtomicUsize,
    hides: AtomicUsize,
    visible: AtomicBool,
}

impl MockBusyIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn hides(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl BaseBusyIndicator for MockBusyIndicator {
    fn show(&self) {
        self.shows.fetch_add(1, Ordering::SeqCst);
        self.visible.store(true, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
        self.visible.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Mock Navigator / Link Opener
// =============================================================================

#[derive(Default)]
pub struct MockNavigator {
    visits: Arc<Mutex<Vec<String>>>,
}

impl MockNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl BaseNavigator for MockNavigator {
    fn navigate(&self, to: &str) {
        self.visits.lock().unwrap().push(to.to_string());
    }
}

#[derive(Default)]
pub struct MockLinkOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl MockLinkOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl BaseLinkOpener for MockLinkOpener {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

// =============================================================================
// Mock Map Widget
// =============================================================================

#[derive(Default)]
pub struct MockMapWidget {
    on_load: Mutex<Option<LoadCallback>>,
    layers: Arc<Mutex<Vec<MapLayer>>>,
}

impl MockMapWidget {
    /// Emit the load event, running the registered callback once
    pub fn fire_load(&self) {
        let callback = self.on_load.lock().unwrap().take();
        if let Some(callback) = callback {
            callback(self);
        }
    }

    pub fn layers(&self) -> Vec<MapLayer> {
        self.layers.lock().unwrap().clone()
    }
}

impl MapWidget for MockMapWidget {
    fn once_loaded(&self, callback: LoadCallback) {
        *self.on_load.lock().unwrap() = Some(callback);
    }

    fn add_layer(&self, layer: MapLayer) {
        self.layers.lock().unwrap().push(layer);
    }
}

pub struct MockMapWidgetFactory {
    supported: bool,
    constructions: Arc<Mutex<Vec<MapOptions>>>,
    widgets: Arc<Mutex<Vec<Arc<MockMapWidget>>>>,
}

impl MockMapWidgetFactory {
    pub fn new() -> Self {
        Self {
            supported: true,
            constructions: Arc::new(Mutex::new(Vec::new())),
            widgets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A host without map rendering support
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn constructions(&self) -> Vec<MapOptions> {
        self.constructions.lock().unwrap().clone()
    }

    pub fn construction_count(&self) -> usize {
        self.constructions.lock().unwrap().len()
    }

    pub fn last_widget(&self) -> Option<Arc<MockMapWidget>> {
        self.widgets.lock().unwrap().last().cloned()
    }
}

impl Default for MockMapWidgetFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseMapWidgetFactory for MockMapWidgetFactory {
    fn supported(&self) -> bool {
        self.supported
    }

    fn create(&self, options: MapOptions) -> Result<Arc<dyn MapWidget>, MapError> {
        if !self.supported {
            return Err(MapError::Unsupported);
        }
        self.constructions.lock().unwrap().push(options);
        let widget = Arc::new(MockMapWidget::default());
        self.widgets.lock().unwrap().push(Arc::clone(&widget));
        Ok(widget)
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub const TEST_API_BASE: &str = "https://api.test";

/// A trace feature owned by `owner_id`
pub fn trace_fixture(id: u64, owner_id: u64) -> Value {
    json!({
        "type": "Feature",
        "properties": {
            "id": id,
            "description": "Morning ride",
            "length": 1234.5,
            "ownerId": owner_id,
            "ownerDisplayName": "mapper",
            "recordedAt": "2019-03-05T14:02:00.000Z",
            "uploadedAt": "2019-03-06T09:00:00.000Z",
            "updatedAt": "2019-03-06T09:00:00.000Z"
        },
        "geometry": {
            "type": "LineString",
            "coordinates": [[-77.02, 38.91], [-77.05, 38.89]]
        }
    })
}

pub fn user_fixture(osm_id: u64, is_admin: bool) -> Value {
    json!({ "osmId": osm_id, "isAdmin": is_admin })
}

// =============================================================================
// Test Harness
// =============================================================================

/// All mocks wired around one shared store.
pub struct TestHarness {
    pub store: SharedStore,
    pub api: Arc<MockTraceApi>,
    pub confirm: Arc<MockConfirmationGateway>,
    pub notify: Arc<MockNotificationSink>,
    pub busy: Arc<MockBusyIndicator>,
    pub navigator: Arc<MockNavigator>,
    pub links: Arc<MockLinkOpener>,
    pub maps: Arc<MockMapWidgetFactory>,
    pub settings: ControllerSettings,
}

impl TestHarness {
    /// Harness whose fetch resolves with `trace`
    pub fn with_trace(trace: Value) -> Self {
        let store = shared_store();
        let api = MockTraceApi::new(store.clone()).with_trace(trace);
        Self::assemble(store, api)
    }

    /// Harness whose fetch rejects with `error`
    pub fn with_fetch_error(error: ErrorInfo) -> Self {
        let store = shared_store();
        let api = MockTraceApi::new(store.clone()).with_fetch_error(error);
        Self::assemble(store, api)
    }

    fn assemble(store: SharedStore, api: MockTraceApi) -> Self {
        Self {
            store,
            api: Arc::new(api),
            confirm: Arc::new(MockConfirmationGateway::accepting()),
            notify: Arc::new(MockNotificationSink::new()),
            busy: Arc::new(MockBusyIndicator::new()),
            navigator: Arc::new(MockNavigator::new()),
            links: Arc::new(MockLinkOpener::new()),
            maps: Arc::new(MockMapWidgetFactory::new()),
            settings: ControllerSettings::from(&Config::with_api_url(TEST_API_BASE)),
        }
    }

    pub fn api(mut self, api: impl FnOnce(MockTraceApi) -> MockTraceApi) -> Self {
        let current = Arc::try_unwrap(self.api).unwrap_or_else(|_| panic!("api already shared"));
        self.api = Arc::new(api(current));
        self
    }

    pub fn confirm(mut self, confirm: MockConfirmationGateway) -> Self {
        self.confirm = Arc::new(confirm);
        self
    }

    pub fn maps(mut self, maps: MockMapWidgetFactory) -> Self {
        self.maps = Arc::new(maps);
        self
    }

    pub fn confirm_updates(mut self, confirm_updates: bool) -> Self {
        self.settings.confirm_updates = confirm_updates;
        self
    }

    /// Seed the session user envelope as loaded
    pub fn signed_in(self, user: Value) -> Self {
        lock_store(&self.store).resolve(&authenticated_user_path(), user);
        self
    }

    pub fn deps(&self) -> ControllerDeps {
        ControllerDeps {
            api: self.api.clone(),
            selector: Arc::new(StoreSelector::new(self.store.clone())),
            confirm: self.confirm.clone(),
            notify: self.notify.clone(),
            busy: self.busy.clone(),
            navigator: self.navigator.clone(),
            links: self.links.clone(),
            maps: self.maps.clone(),
        }
    }

    pub fn controller(&self, trace_id: &str) -> TraceViewController {
        TraceViewController::new(trace_id, self.deps(), self.settings.clone())
    }

    /// Controller that has already completed its initial fetch
    pub async fn mounted(&self, trace_id: &str) -> TraceViewController {
        let mut controller = self.controller(trace_id);
        controller.mount().await;
        controller
    }
}
