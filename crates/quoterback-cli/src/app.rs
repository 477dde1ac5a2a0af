//! Host wiring: one engine and one notification controller per invocation.

use std::sync::Arc;

use quoterback_core::{
    Config, CoreError, JsonFileStore, KeyValueStore, NotificationController, QuoteEngine,
    Scheduled,
};

use crate::dispatcher::TerminalDispatcher;

pub struct App {
    pub engine: QuoteEngine,
    pub notifier: NotificationController<TerminalDispatcher>,
}

impl App {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load_or_default();
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open_default()?);
        let catalog = Arc::new(QuoteEngine::catalog_from_config(&config));
        tracing::debug!(quotes = catalog.len(), fallback = catalog.is_fallback(), "catalog ready");

        let engine = QuoteEngine::initialize(Arc::clone(&store), catalog, &config);
        let dispatcher = TerminalDispatcher::open(store);
        let notifier = NotificationController::new(dispatcher, config.notifications);

        Ok(Self { engine, notifier })
    }

    pub fn close(self) {
        self.engine.shutdown();
    }

    /// Surface settings/favorites write failures once, as a user alert.
    pub fn report_save_failures(&mut self) {
        if let Some(e) = self.engine.settings_mut().take_persist_error() {
            eprintln!("warning: your settings could not be saved ({e})");
        }
        if let Some(e) = self.engine.favorites_mut().take_persist_error() {
            eprintln!("warning: your favorites could not be saved ({e})");
        }
    }

    /// Re-arm the quote notification after a state change and report it.
    pub fn reschedule(&mut self) {
        let outcome = self.notifier.reschedule(&self.engine);
        print_outcome(&outcome);
    }
}

pub fn print_outcome(outcome: &Result<Scheduled, CoreError>) {
    match outcome {
        Ok(scheduled) => match &scheduled.trigger {
            Some(trigger) => println!(
                "scheduled {} (quote {}): {}",
                scheduled.notification_id,
                scheduled.quote_id,
                serde_json::to_string(trigger).unwrap_or_default()
            ),
            None => println!(
                "sent {} (quote {})",
                scheduled.notification_id, scheduled.quote_id
            ),
        },
        Err(CoreError::PermissionDenied) => {
            eprintln!("notifications are disabled: permission denied")
        }
        Err(CoreError::NoQuoteAvailable) => eprintln!("no quote available, nothing scheduled"),
        Err(e) => eprintln!("warning: notification not scheduled: {e}"),
    }
}
