//! Trace viewer - terminal front end for a single trace
//!
//! Wires the process-wide collaborators (store, HTTP API, prompts, spinner)
//! into a `TraceViewController` and drives it from a menu.
//!
//! ## Running
//!
//! ```bash
//! TRACE_API_URL=https://observe-api.example.org trace-view 42
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dialoguer::{Input, Select};
use tracing_subscriber::EnvFilter;

use trace_view::controller::{ActionKind, TraceScreen};
use trace_view::selector::shared_store;
use trace_view::terminal::{
    print_screen, BrowserLinkOpener, DialoguerConfirmation, HeadlessMapFactory,
    SpinnerBusyIndicator, TerminalNavigator, TerminalNotifications,
};
use trace_view::{
    ActionOutcome, Config, ControllerDeps, ControllerSettings, CountingBusyIndicator,
    HttpTraceApi, StoreSelector, TraceViewController,
};

#[derive(Parser)]
#[command(name = "trace-view", about = "View, edit and export a recorded trace")]
struct Cli {
    /// Trace id
    trace_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let store = shared_store();
    let api = Arc::new(HttpTraceApi::from_config(&config, store.clone()));
    let navigator = Arc::new(TerminalNavigator::default());

    let deps = ControllerDeps {
        api: api.clone(),
        selector: Arc::new(StoreSelector::new(store)),
        confirm: Arc::new(DialoguerConfirmation),
        notify: Arc::new(TerminalNotifications),
        busy: Arc::new(CountingBusyIndicator::new(SpinnerBusyIndicator::default())),
        navigator: navigator.clone(),
        links: Arc::new(BrowserLinkOpener),
        maps: Arc::new(HeadlessMapFactory),
    };

    api.fetch_authenticated_user().await;

    let mut controller =
        TraceViewController::new(cli.trace_id, deps, ControllerSettings::from(&config));
    controller.mount().await;

    loop {
        let screen = controller.render();
        print_screen(&screen);
        controller.after_render();

        let TraceScreen::Detail(detail) = screen else {
            break;
        };

        let buttons: Vec<_> = if controller.edit_state().editing {
            detail.edit_buttons.clone()
        } else {
            detail.actions.iter().filter(|b| b.enabled).cloned().collect()
        };
        let mut labels: Vec<&str> = buttons.iter().map(|b| b.label).collect();
        labels.push("Quit");

        let choice = Select::new()
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact()?;
        let Some(button) = buttons.get(choice) else {
            break;
        };

        let outcome = match button.kind {
            ActionKind::Edit => {
                let outcome = controller.begin_edit();
                if outcome == ActionOutcome::Completed {
                    let description: String = Input::new()
                        .with_prompt("Description")
                        .with_initial_text(controller.edit_state().pending_value.clone())
                        .allow_empty(true)
                        .interact_text()?;
                    controller.set_pending_value(description);
                }
                outcome
            }
            ActionKind::ConfirmEdit => controller.submit_update().await,
            ActionKind::CancelEdit => controller.cancel_edit(),
            ActionKind::Delete => controller.delete().await,
            ActionKind::Export => controller.export().await,
            ActionKind::Download => controller.download(),
        };
        tracing::debug!(action = ?button.kind, outcome = ?outcome, "action finished");

        if controller.has_departed() {
            if let Some(location) = navigator.location() {
                tracing::info!(location = %location, "left trace page");
            }
            break;
        }
    }

    Ok(())
}
