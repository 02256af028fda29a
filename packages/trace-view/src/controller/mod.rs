//! Trace detail page controller.
//!
//! Drives the page through its lifecycle and gates every user action on
//! readiness, permission and the edit state.
//!
//! ```text
//!  Idle ──mount()──► Loading ──fetch settles──► Ready ◄──► Editing
//!                                    │            │
//!                                    ▼            └──delete ok──► Departed
//!                                 Errored
//! ```
//!
//! # Key Properties
//!
//! - **No cached payload**: every read goes through the injected selector,
//!   so the store stays the single source of truth
//! - **One action at a time**: handlers take `&mut self` across their
//!   awaits, so a second action cannot start while one is outstanding
//! - **Paired busy overlay**: mutations hold a [`BusyGuard`] for exactly
//!   the awaited call
//! - **No escaping errors**: a failed mutation becomes an error toast and
//!   an [`ActionOutcome::Failed`]

mod screen;

use std::sync::Arc;

use resource_state::ResourceView;
use tracing::{debug, error, info, warn};

use crate::busy::BusyGuard;
use crate::config::Config;
use crate::export::{gpx_url, josm_import_url};
use crate::map_sync::{MapMountState, MapSettings, MapSyncController, SyncOutcome};
use crate::traits::{
    BaseBusyIndicator, BaseConfirmationGateway, BaseLinkOpener, BaseMapWidgetFactory,
    BaseNavigator, BaseNotificationSink, BaseTraceApi, BaseTraceSelector, ConfirmContext,
    ConfirmKind, ContainerHandle,
};
use crate::types::{AuthenticatedUser, TraceFeature, TracePatch};

pub use screen::{
    ActionButton, ActionKind, DetailField, FieldValue, MapPanel, TraceDetail, TraceScreen,
    BACK_LINK,
};

pub const TRACES_INDEX: &str = "/traces";
pub const MAP_CONTAINER: &str = "trace-map";

const MSG_DELETED: &str = "Trace was successfully deleted.";
const MSG_DELETE_FAILED: &str = "An error occurred, trace was not deleted.";
const MSG_UPDATED: &str = "Trace was successfully updated.";
const MSG_UPDATE_FAILED: &str = "An error occurred, trace was not updated.";

/// Collaborators injected by the wiring layer.
#[derive(Clone)]
pub struct ControllerDeps {
    pub api: Arc<dyn BaseTraceApi>,
    pub selector: Arc<dyn BaseTraceSelector>,
    pub confirm: Arc<dyn BaseConfirmationGateway>,
    pub notify: Arc<dyn BaseNotificationSink>,
    pub busy: Arc<dyn BaseBusyIndicator>,
    pub navigator: Arc<dyn BaseNavigator>,
    pub links: Arc<dyn BaseLinkOpener>,
    pub maps: Arc<dyn BaseMapWidgetFactory>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub api_base: String,
    pub josm_port: u16,
    /// Ask before saving an edit. Deletes and exports always ask.
    pub confirm_updates: bool,
    pub map: MapSettings,
    pub map_container: ContainerHandle,
}

impl From<&Config> for ControllerSettings {
    fn from(config: &Config) -> Self {
        Self {
            api_base: config.api_url.clone(),
            josm_port: config.josm_port,
            confirm_updates: config.confirm_updates,
            map: MapSettings {
                style: config.map_style.clone(),
                padding: config.map_padding,
            },
            map_container: ContainerHandle::new(MAP_CONTAINER),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Idle,
    Loading,
    Ready,
    /// Terminal; no automatic retry.
    Errored,
    /// The trace was deleted and the page navigated away.
    Departed,
}

/// Edit buffer, local to one controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewEditState {
    pub editing: bool,
    pub pending_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// The user rejected the confirmation.
    Declined,
    /// The request failed; the user was notified.
    Failed,
    /// Not allowed in the current state.
    Ignored,
}

pub struct TraceViewController {
    trace_id: String,
    deps: ControllerDeps,
    settings: ControllerSettings,
    phase: ViewPhase,
    edit: ViewEditState,
    map: MapSyncController,
}

impl TraceViewController {
    pub fn new(
        trace_id: impl Into<String>,
        deps: ControllerDeps,
        settings: ControllerSettings,
    ) -> Self {
        let map = MapSyncController::new(
            Arc::clone(&deps.maps),
            settings.map_container.clone(),
            settings.map.clone(),
        );
        Self {
            trace_id: trace_id.into(),
            deps,
            settings,
            phase: ViewPhase::Idle,
            edit: ViewEditState::default(),
            map,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn edit_state(&self) -> &ViewEditState {
        &self.edit
    }

    pub fn map_state(&self) -> MapMountState {
        self.map.state()
    }

    pub fn has_departed(&self) -> bool {
        self.phase == ViewPhase::Departed
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Fetch the trace. Runs once; later calls return the current phase.
    pub async fn mount(&mut self) -> ViewPhase {
        if self.phase != ViewPhase::Idle {
            return self.phase;
        }

        self.phase = ViewPhase::Loading;
        debug!(trace_id = %self.trace_id, "fetching trace");
        {
            let _busy = BusyGuard::acquire(&self.deps.busy);
            self.deps.api.fetch_trace(&self.trace_id).await;
        }

        let view = self.trace();
        self.phase = if view.has_error() {
            warn!(
                trace_id = %self.trace_id,
                error = ?view.error().map(|e| e.message.as_str()),
                "trace fetch failed"
            );
            ViewPhase::Errored
        } else {
            ViewPhase::Ready
        };
        debug!(trace_id = %self.trace_id, phase = ?self.phase, "trace fetch settled");
        self.phase
    }

    pub fn render(&self) -> TraceScreen {
        let view = self.trace();
        if !view.is_ready() {
            return TraceScreen::Blank;
        }
        if view.has_error() {
            return TraceScreen::NotFound;
        }
        let feature = decode_feature(&view, &self.trace_id);

        let map = screen::map_panel(self.map.renders_map(), self.map.container());
        TraceScreen::Detail(Box::new(screen::detail(
            &feature,
            &self.edit,
            self.permitted(&feature),
            map,
        )))
    }

    /// Post-render step: mounts the map the first time the trace is ready.
    pub fn after_render(&mut self) -> SyncOutcome {
        if self.has_departed() {
            return SyncOutcome::Settled;
        }
        let view = self.trace();
        self.map.sync(&view)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Enter edit mode with the current description in the buffer.
    pub fn begin_edit(&mut self) -> ActionOutcome {
        if !self.idle() {
            return ActionOutcome::Ignored;
        }
        let Some(feature) = self.feature() else {
            return ActionOutcome::Ignored;
        };
        if !self.permitted(&feature) {
            debug!(trace_id = %self.trace_id, "edit refused, user does not own trace");
            return ActionOutcome::Ignored;
        }

        self.edit = ViewEditState {
            editing: true,
            pending_value: feature.properties.description.unwrap_or_default(),
        };
        ActionOutcome::Completed
    }

    /// Replace the edit buffer. False when not editing.
    pub fn set_pending_value(&mut self, value: impl Into<String>) -> bool {
        if !self.edit.editing {
            return false;
        }
        self.edit.pending_value = value.into();
        true
    }

    pub fn cancel_edit(&mut self) -> ActionOutcome {
        if !self.edit.editing {
            return ActionOutcome::Ignored;
        }
        self.edit = ViewEditState::default();
        ActionOutcome::Completed
    }

    /// Save the edit buffer as the trace description.
    ///
    /// On failure the controller stays in edit mode with the buffer intact.
    pub async fn submit_update(&mut self) -> ActionOutcome {
        if self.phase != ViewPhase::Ready || !self.edit.editing {
            return ActionOutcome::Ignored;
        }

        if self.settings.confirm_updates {
            let answer = self
                .deps
                .confirm
                .ask(ConfirmKind::Update, &self.confirm_context())
                .await;
            if !answer.result {
                return ActionOutcome::Declined;
            }
        }

        let patch = TracePatch::description(self.edit.pending_value.clone());
        let result = {
            let _busy = BusyGuard::acquire(&self.deps.busy);
            self.deps.api.update_trace(&self.trace_id, patch).await
        };

        match result {
            Ok(()) => {
                info!(trace_id = %self.trace_id, "trace updated");
                self.deps.notify.info(MSG_UPDATED);
                self.edit = ViewEditState::default();
                ActionOutcome::Completed
            }
            Err(e) => {
                error!(trace_id = %self.trace_id, error = %e, "trace update failed");
                self.deps.notify.error(MSG_UPDATE_FAILED);
                ActionOutcome::Failed
            }
        }
    }

    // =========================================================================
    // Delete / export / download
    // =========================================================================

    /// Delete after confirmation, then leave the page.
    pub async fn delete(&mut self) -> ActionOutcome {
        if !self.idle() {
            return ActionOutcome::Ignored;
        }
        let Some(feature) = self.feature() else {
            return ActionOutcome::Ignored;
        };
        if !self.permitted(&feature) {
            debug!(trace_id = %self.trace_id, "delete refused, user does not own trace");
            return ActionOutcome::Ignored;
        }

        let answer = self
            .deps
            .confirm
            .ask(ConfirmKind::Delete, &self.confirm_context())
            .await;
        if !answer.result {
            return ActionOutcome::Declined;
        }

        let result = {
            let _busy = BusyGuard::acquire(&self.deps.busy);
            self.deps.api.delete_trace(&self.trace_id).await
        };

        match result {
            Ok(()) => {
                info!(trace_id = %self.trace_id, "trace deleted");
                self.phase = ViewPhase::Departed;
                self.deps.navigator.navigate(TRACES_INDEX);
                self.deps.notify.info(MSG_DELETED);
                ActionOutcome::Completed
            }
            Err(e) => {
                error!(trace_id = %self.trace_id, error = %e, "trace delete failed");
                self.deps.notify.error(MSG_DELETE_FAILED);
                ActionOutcome::Failed
            }
        }
    }

    /// Hand the GPX to JOSM's remote control after confirmation.
    pub async fn export(&mut self) -> ActionOutcome {
        if !self.idle() {
            return ActionOutcome::Ignored;
        }

        let answer = self
            .deps
            .confirm
            .ask(ConfirmKind::Export, &self.confirm_context())
            .await;
        if !answer.result {
            return ActionOutcome::Declined;
        }

        let url = josm_import_url(self.settings.josm_port, &self.gpx_url());
        debug!(trace_id = %self.trace_id, url = %url, "opening JOSM import");
        self.deps.links.open(&url);
        ActionOutcome::Completed
    }

    pub fn download(&self) -> ActionOutcome {
        if !self.idle() {
            return ActionOutcome::Ignored;
        }
        self.deps.links.open(&self.gpx_url());
        ActionOutcome::Completed
    }

    pub fn gpx_url(&self) -> String {
        gpx_url(&self.settings.api_base, &self.trace_id)
    }

    /// Whether the session user may edit or delete the loaded trace.
    pub fn can_modify(&self) -> bool {
        self.feature()
            .map(|feature| self.permitted(&feature))
            .unwrap_or(false)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Ready and not editing: the action bar is enabled.
    fn idle(&self) -> bool {
        self.phase == ViewPhase::Ready && !self.edit.editing
    }

    fn trace(&self) -> ResourceView {
        self.deps.selector.trace(&self.trace_id)
    }

    /// The loaded trace; `None` until ready or after a failed fetch.
    fn feature(&self) -> Option<TraceFeature> {
        let view = self.trace();
        (view.is_ready() && !view.has_error()).then(|| decode_feature(&view, &self.trace_id))
    }

    fn permitted(&self, feature: &TraceFeature) -> bool {
        let user = match self
            .deps
            .selector
            .authenticated_user()
            .decode::<AuthenticatedUser>()
        {
            Ok(Some(user)) => user,
            Ok(None) => AuthenticatedUser::default(),
            Err(e) => {
                warn!(error = %e, "authenticated user payload could not be decoded");
                AuthenticatedUser::default()
            }
        };
        user.can_modify(feature.properties.owner_id.as_deref())
    }

    fn confirm_context(&self) -> ConfirmContext {
        ConfirmContext::trace(self.trace_id.clone())
    }
}

/// Decode a ready payload. Members that are missing or malformed fall back to
/// placeholders, and an absent id is taken from the route.
fn decode_feature(view: &ResourceView, trace_id: &str) -> TraceFeature {
    let mut feature = match view.decode::<TraceFeature>() {
        Ok(feature) => feature.unwrap_or_default(),
        Err(e) => {
            warn!(trace_id = %trace_id, error = %e, "trace payload could not be decoded");
            TraceFeature::default()
        }
    };
    if feature.properties.id.is_empty() {
        feature.properties.id = trace_id.to_string();
    }
    feature
}
