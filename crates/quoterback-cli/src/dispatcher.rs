//! Terminal stand-in for the platform notification service.
//!
//! Armed notifications are kept in the data directory under the
//! `dispatcher` key so they survive between invocations; immediate
//! notifications are printed.

use std::sync::Arc;

use quoterback_core::notifications::DispatchError;
use quoterback_core::{
    KeyValueStore, NotificationContent, NotificationDispatcher, PendingNotification,
    PermissionStatus, TriggerSpec,
};
use serde::{Deserialize, Serialize};

const DISPATCHER_KEY: &str = "dispatcher";

#[derive(Debug, Default, Serialize, Deserialize)]
struct DispatcherState {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    pending: Vec<PendingNotification>,
    #[serde(default)]
    channels: Vec<String>,
}

pub struct TerminalDispatcher {
    store: Arc<dyn KeyValueStore>,
    state: DispatcherState,
}

impl TerminalDispatcher {
    /// Load armed notifications. Unreadable or malformed state starts empty.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let state = match store.load(DISPATCHER_KEY) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("dispatcher record malformed, starting empty: {e}");
                DispatcherState::default()
            }),
            Ok(None) => DispatcherState::default(),
            Err(e) => {
                tracing::warn!("failed to load dispatcher state, starting empty: {e}");
                DispatcherState::default()
            }
        };
        Self { store, state }
    }

    fn save(&self) -> Result<(), DispatchError> {
        let value = serde_json::to_value(&self.state)?;
        self.store.save(DISPATCHER_KEY, &value)?;
        Ok(())
    }

    /// Remove and return the armed notification with `id`, or the first one.
    /// Repeating notifications stay armed.
    pub fn fire(&mut self, id: Option<&str>) -> Result<Option<NotificationContent>, DispatchError> {
        let index = match id {
            Some(id) => self.state.pending.iter().position(|p| p.id == id),
            None if self.state.pending.is_empty() => None,
            None => Some(0),
        };
        let Some(index) = index else {
            return Ok(None);
        };

        let repeats = self.state.pending[index]
            .trigger
            .map_or(false, |t| t.repeats());
        let content = if repeats {
            self.state.pending[index].content.clone()
        } else {
            let fired = self.state.pending.remove(index);
            self.save()?;
            fired.content
        };
        Ok(Some(content))
    }
}

impl NotificationDispatcher for TerminalDispatcher {
    fn request_permission(&mut self, channel_id: &str) -> Result<PermissionStatus, DispatchError> {
        if !self.state.channels.iter().any(|c| c == channel_id) {
            self.state.channels.push(channel_id.to_string());
            self.save()?;
        }
        Ok(PermissionStatus::Granted)
    }

    fn cancel_all(&mut self, identifier: &str) -> Result<(), DispatchError> {
        self.state
            .pending
            .retain(|p| p.identifier.as_deref() != Some(identifier));
        self.save()
    }

    fn schedule(
        &mut self,
        identifier: Option<&str>,
        content: &NotificationContent,
        trigger: Option<&TriggerSpec>,
    ) -> Result<String, DispatchError> {
        self.state.next_id += 1;
        let id = format!("local-{}", self.state.next_id);

        match trigger {
            Some(trigger) => {
                if let Some(identifier) = identifier {
                    self.state
                        .pending
                        .retain(|p| p.identifier.as_deref() != Some(identifier));
                }
                self.state.pending.push(PendingNotification {
                    id: id.clone(),
                    identifier: identifier.map(str::to_string),
                    content: content.clone(),
                    trigger: Some(*trigger),
                });
            }
            None => {
                let marker = if content.data.is_test { " (test)" } else { "" };
                println!("[{}{marker}] {}", content.title, content.body);
            }
        }
        self.save()?;
        Ok(id)
    }

    fn pending(&self) -> Result<Vec<PendingNotification>, DispatchError> {
        Ok(self.state.pending.clone())
    }
}
