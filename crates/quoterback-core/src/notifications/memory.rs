//! In-memory dispatcher that records every call.

use super::{
    DispatchError, NotificationContent, NotificationDispatcher, PendingNotification,
    PermissionStatus,
};
use crate::trigger::TriggerSpec;

/// One call made against a [`MemoryDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatcherCall {
    RequestPermission,
    CancelAll(String),
    Schedule {
        identifier: Option<String>,
        content: NotificationContent,
        trigger: Option<TriggerSpec>,
    },
}

/// Dispatcher keeping armed notifications in a list.
///
/// Immediate notifications are recorded as delivered rather than pending.
#[derive(Debug)]
pub struct MemoryDispatcher {
    permission: PermissionStatus,
    fail_schedule: bool,
    next_id: u64,
    pending: Vec<PendingNotification>,
    delivered: Vec<NotificationContent>,
    calls: Vec<DispatcherCall>,
}

impl Default for MemoryDispatcher {
    fn default() -> Self {
        Self::new(PermissionStatus::Granted)
    }
}

impl MemoryDispatcher {
    /// Dispatcher answering permission requests with `permission`.
    pub fn new(permission: PermissionStatus) -> Self {
        Self {
            permission,
            fail_schedule: false,
            next_id: 1,
            pending: Vec::new(),
            delivered: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn set_permission(&mut self, permission: PermissionStatus) {
        self.permission = permission;
    }

    /// Make every subsequent `schedule` call fail.
    pub fn set_fail_schedule(&mut self, fail: bool) {
        self.fail_schedule = fail;
    }

    pub fn calls(&self) -> &[DispatcherCall] {
        &self.calls
    }

    pub fn delivered(&self) -> &[NotificationContent] {
        &self.delivered
    }
}

impl NotificationDispatcher for MemoryDispatcher {
    fn request_permission(&mut self, _channel_id: &str) -> Result<PermissionStatus, DispatchError> {
        self.calls.push(DispatcherCall::RequestPermission);
        Ok(self.permission)
    }

    fn cancel_all(&mut self, identifier: &str) -> Result<(), DispatchError> {
        self.calls.push(DispatcherCall::CancelAll(identifier.to_string()));
        self.pending
            .retain(|p| p.identifier.as_deref() != Some(identifier));
        Ok(())
    }

    fn schedule(
        &mut self,
        identifier: Option<&str>,
        content: &NotificationContent,
        trigger: Option<&TriggerSpec>,
    ) -> Result<String, DispatchError> {
        self.calls.push(DispatcherCall::Schedule {
            identifier: identifier.map(str::to_string),
            content: content.clone(),
            trigger: trigger.copied(),
        });
        if self.fail_schedule {
            return Err("dispatcher unavailable".into());
        }

        let id = format!("notification-{}", self.next_id);
        self.next_id += 1;

        match trigger {
            Some(trigger) => {
                // Same identifier replaces what was armed before
                if let Some(identifier) = identifier {
                    self.pending
                        .retain(|p| p.identifier.as_deref() != Some(identifier));
                }
                self.pending.push(PendingNotification {
                    id: id.clone(),
                    identifier: identifier.map(str::to_string),
                    content: content.clone(),
                    trigger: Some(*trigger),
                });
            }
            None => self.delivered.push(content.clone()),
        }
        Ok(id)
    }

    fn pending(&self) -> Result<Vec<PendingNotification>, DispatchError> {
        Ok(self.pending.clone())
    }
}
