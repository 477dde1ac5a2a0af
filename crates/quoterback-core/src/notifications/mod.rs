//! Notification dispatcher boundary and lifecycle.
//!
//! The engine never delivers notifications itself. A host supplies a
//! [`NotificationDispatcher`] that arms triggers on the platform and feeds
//! delivery/tap events back into the [`NotificationController`].

mod controller;
mod memory;

pub use controller::{NotificationController, Scheduled};
pub use memory::{DispatcherCall, MemoryDispatcher};

use serde::{Deserialize, Serialize};

use crate::catalog::Quote;
use crate::trigger::TriggerSpec;

/// Error type returned by dispatcher implementations.
pub type DispatchError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Payload attached to a quote notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_test: bool,
}

/// What the user sees, plus the data echoed back on delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: NotificationData,
}

impl NotificationContent {
    pub fn for_quote(title: &str, quote: &Quote) -> Self {
        Self {
            title: title.to_string(),
            body: quote.notification_body(),
            data: NotificationData {
                quote_id: Some(quote.id.clone()),
                is_test: false,
            },
        }
    }

    pub fn quote_id(&self) -> Option<&str> {
        self.data.quote_id.as_deref()
    }
}

/// A notification currently armed in the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub id: String,
    pub identifier: Option<String>,
    pub content: NotificationContent,
    pub trigger: Option<TriggerSpec>,
}

/// Platform notification subsystem, consumed by the engine.
///
/// Calls may block for as long as the platform takes; the engine applies no
/// timeout of its own.
pub trait NotificationDispatcher {
    /// Ask the user for permission to post notifications on `channel_id`.
    fn request_permission(&mut self, channel_id: &str) -> Result<PermissionStatus, DispatchError>;

    /// Cancel every armed trigger registered under `identifier`.
    fn cancel_all(&mut self, identifier: &str) -> Result<(), DispatchError>;

    /// Arm `content` to fire at `trigger`, or immediately when `trigger` is
    /// `None`. Returns the dispatcher's id for the scheduled notification.
    fn schedule(
        &mut self,
        identifier: Option<&str>,
        content: &NotificationContent,
        trigger: Option<&TriggerSpec>,
    ) -> Result<String, DispatchError>;

    /// Notifications currently armed.
    fn pending(&self) -> Result<Vec<PendingNotification>, DispatchError>;
}
