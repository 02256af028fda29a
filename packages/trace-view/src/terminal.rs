//! Terminal implementations of the page collaborators.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::controller::{ActionButton, FieldValue, MapPanel, TraceDetail, TraceScreen};
use crate::traits::{
    BaseBusyIndicator, BaseConfirmationGateway, BaseLinkOpener, BaseMapWidgetFactory,
    BaseNavigator, BaseNotificationSink, ConfirmContext, ConfirmKind, Confirmation, MapError,
    MapOptions, MapWidget,
};

// =============================================================================
// Confirmation prompts
// =============================================================================

pub struct DialoguerConfirmation;

fn prompt_text(kind: ConfirmKind, context: &ConfirmContext) -> String {
    match kind {
        ConfirmKind::Delete => format!(
            "Are you sure you want to delete {} {}? This cannot be undone.",
            context.item, context.id
        ),
        ConfirmKind::Export => {
            "Export to JOSM? JOSM must be running with remote control enabled.".to_string()
        }
        ConfirmKind::Update => format!("Save changes to {} {}?", context.item, context.id),
    }
}

#[async_trait]
impl BaseConfirmationGateway for DialoguerConfirmation {
    async fn ask(&self, kind: ConfirmKind, context: &ConfirmContext) -> Confirmation {
        let prompt = prompt_text(kind, context);
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new().with_prompt(prompt).default(false).interact()
        })
        .await;

        match answer {
            Ok(Ok(result)) => Confirmation { result },
            Ok(Err(e)) => {
                warn!(kind = %kind, error = %e, "confirmation prompt failed");
                Confirmation::REJECTED
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "confirmation prompt task failed");
                Confirmation::REJECTED
            }
        }
    }
}

// =============================================================================
// Toasts
// =============================================================================

pub struct TerminalNotifications;

impl BaseNotificationSink for TerminalNotifications {
    fn info(&self, message: &str) {
        println!("{} {}", "✔".green(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "✘".red(), message.red());
    }
}

// =============================================================================
// Busy spinner
// =============================================================================

/// Spinner on stderr. Wrap in `CountingBusyIndicator` for nesting.
#[derive(Default)]
pub struct SpinnerBusyIndicator {
    spinner: Mutex<Option<ProgressBar>>,
}

impl BaseBusyIndicator for SpinnerBusyIndicator {
    fn show(&self) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::with_template("{spinner:.yellow} {msg}") {
            spinner.set_style(template);
        }
        spinner.set_message("Loading...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.lock().unwrap_or_else(PoisonError::into_inner) = Some(spinner);
    }

    fn hide(&self) {
        let spinner = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
    }
}

// =============================================================================
// Navigation and links
// =============================================================================

#[derive(Default)]
pub struct TerminalNavigator {
    location: Mutex<Option<String>>,
}

impl TerminalNavigator {
    pub fn location(&self) -> Option<String> {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BaseNavigator for TerminalNavigator {
    fn navigate(&self, to: &str) {
        println!("{} {}", "→".dimmed(), to);
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = Some(to.to_string());
    }
}

pub struct BrowserLinkOpener;

impl BaseLinkOpener for BrowserLinkOpener {
    fn open(&self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!(url = %url, error = %e, "failed to open link");
            eprintln!("Open manually: {}", url);
        }
    }
}

// =============================================================================
// Map
// =============================================================================

/// Terminals cannot render the map; the page shows its fallback.
pub struct HeadlessMapFactory;

impl BaseMapWidgetFactory for HeadlessMapFactory {
    fn supported(&self) -> bool {
        false
    }

    fn create(&self, _options: MapOptions) -> Result<Arc<dyn MapWidget>, MapError> {
        Err(MapError::Unsupported)
    }
}

// =============================================================================
// Screen printing
// =============================================================================

pub fn print_screen(screen: &TraceScreen) {
    match screen {
        TraceScreen::Blank => {}
        TraceScreen::NotFound => {
            println!("{}", style("Uh oh, something went wrong").red().bold());
            println!("The trace could not be found or failed to load.");
        }
        TraceScreen::Detail(detail) => print_detail(detail),
    }
}

fn print_detail(detail: &TraceDetail) {
    println!();
    println!("{}  {}", style("←").dim(), style(detail.back_link).dim());
    println!("{}", style(&detail.title).bold().underlined());

    if let MapPanel::Unsupported(message) = &detail.map {
        println!("{}", style(message).dim().italic());
    }
    println!();

    for field in &detail.fields {
        let value = match &field.value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Input { value, placeholder } if value.is_empty() => {
                format!("[{}]", style(placeholder).dim())
            }
            FieldValue::Input { value, .. } => format!("[{}]", value.yellow()),
            FieldValue::Profile { display_name, url } => {
                format!("{} ({})", display_name, style(url).dim())
            }
        };
        println!("{:>18}  {}", style(field.label).cyan(), value);
    }
    println!();

    let buttons = if detail.edit_buttons.is_empty() {
        &detail.actions
    } else {
        &detail.edit_buttons
    };
    println!("{}", format_buttons(buttons));
}

fn format_buttons(buttons: &[ActionButton]) -> String {
    buttons
        .iter()
        .map(|button| {
            if button.enabled {
                format!("[{}]", button.label)
            } else {
                format!("[{}]", button.label).dimmed().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
