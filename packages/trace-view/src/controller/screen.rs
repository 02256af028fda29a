//! What the trace page shows for a given controller state.

use crate::controller::ViewEditState;
use crate::map_sync::UNSUPPORTED_MESSAGE;
use crate::traits::ContainerHandle;
use crate::types::{format_date_time_extended, Geometry, TraceFeature};

pub const BACK_LINK: &str = "/traces";
const OSM_PROFILE_BASE: &str = "https://www.openstreetmap.org/user";
const MISSING: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub enum TraceScreen {
    /// Still loading; nothing to show.
    Blank,
    /// The fetch failed.
    NotFound,
    Detail(Box<TraceDetail>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceDetail {
    pub title: String,
    pub back_link: &'static str,
    pub map: MapPanel,
    pub fields: Vec<DetailField>,
    /// Cancel/confirm buttons while editing
    pub edit_buttons: Vec<ActionButton>,
    pub actions: Vec<ActionButton>,
}

impl TraceDetail {
    pub fn action(&self, kind: ActionKind) -> Option<&ActionButton> {
        self.actions
            .iter()
            .chain(self.edit_buttons.iter())
            .find(|button| button.kind == kind)
    }

    pub fn field(&self, label: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .map(|field| &field.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapPanel {
    Container(ContainerHandle),
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailField {
    pub label: &'static str,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Input {
        value: String,
        placeholder: &'static str,
    },
    Profile {
        display_name: String,
        url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Delete,
    Edit,
    Export,
    Download,
    CancelEdit,
    ConfirmEdit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub kind: ActionKind,
    pub label: &'static str,
    pub enabled: bool,
}

impl ActionButton {
    fn new(kind: ActionKind, label: &'static str, enabled: bool) -> Self {
        Self {
            kind,
            label,
            enabled,
        }
    }
}

pub(super) fn map_panel(renders_map: bool, container: &ContainerHandle) -> MapPanel {
    if renders_map {
        MapPanel::Container(container.clone())
    } else {
        MapPanel::Unsupported(UNSUPPORTED_MESSAGE)
    }
}

pub(super) fn detail(
    feature: &TraceFeature,
    edit: &ViewEditState,
    can_modify: bool,
    map: MapPanel,
) -> TraceDetail {
    let trace = &feature.properties;

    let description = if edit.editing {
        FieldValue::Input {
            value: edit.pending_value.clone(),
            placeholder: "Enter a description",
        }
    } else {
        text(trace.description.clone())
    };

    let owner = match &trace.owner_display_name {
        Some(name) => FieldValue::Profile {
            display_name: name.clone(),
            url: format!("{}/{}", OSM_PROFILE_BASE, name.replace(' ', "%20")),
        },
        None => text(None),
    };

    let fields = vec![
        DetailField {
            label: "id",
            value: FieldValue::Text(trace.id.clone()),
        },
        DetailField {
            label: "Description",
            value: description,
        },
        DetailField {
            label: "Length",
            value: text(trace.length.map(|l| l.to_string())),
        },
        DetailField {
            label: "Owner",
            value: owner,
        },
        DetailField {
            label: "Start coordinate",
            value: text(feature.geometry.as_ref().and_then(Geometry::start_coordinate)),
        },
        DetailField {
            label: "Recorded at",
            value: timestamp(trace.recorded_at.as_deref()),
        },
        DetailField {
            label: "Uploaded at",
            value: timestamp(trace.uploaded_at.as_deref()),
        },
        DetailField {
            label: "Updated at",
            value: timestamp(trace.updated_at.as_deref()),
        },
    ];

    let idle = !edit.editing;
    let mut actions = Vec::with_capacity(4);
    if can_modify {
        actions.push(ActionButton::new(ActionKind::Delete, "Delete", idle));
        actions.push(ActionButton::new(ActionKind::Edit, "Edit Metadata", idle));
    }
    actions.push(ActionButton::new(ActionKind::Export, "Export to JOSM", idle));
    actions.push(ActionButton::new(ActionKind::Download, "Download", idle));

    let edit_buttons = if edit.editing {
        vec![
            ActionButton::new(ActionKind::CancelEdit, "Cancel", true),
            ActionButton::new(ActionKind::ConfirmEdit, "Confirm", true),
        ]
    } else {
        Vec::new()
    };

    TraceDetail {
        title: format!("Trace {}", trace.id),
        back_link: BACK_LINK,
        map,
        fields,
        edit_buttons,
        actions,
    }
}

fn text(value: Option<String>) -> FieldValue {
    FieldValue::Text(value.unwrap_or_else(|| MISSING.to_string()))
}

fn timestamp(value: Option<&str>) -> FieldValue {
    text(value.map(format_date_time_extended))
}
