//! # Quoterback Core Library
//!
//! Adaptive quote selection and notification scheduling. The host
//! application owns presentation and the platform notification service;
//! this crate owns everything with invariants:
//!
//! - **Storage**: JSON records behind a [`KeyValueStore`], TOML engine
//!   [`Config`]
//! - **Stores**: [`SettingsStore`], [`UsageTracker`], [`FavoritesStore`]
//! - **Selection**: filter cascade with all-or-nothing fallback, then a
//!   uniform pick among the least-used quotes ([`SelectionEngine`])
//! - **Triggers**: cadence to dispatcher trigger translation
//!   ([`TriggerScheduler`])
//! - **Lifecycle**: cancel-then-arm rescheduling, test sends and delivery
//!   handling ([`NotificationController`])
//!
//! ## Key Components
//!
//! - [`QuoteEngine`]: explicit `initialize`/`shutdown` lifecycle owning all stores
//! - [`NotificationDispatcher`]: trait the host implements for its platform

pub mod catalog;
pub mod engine;
pub mod error;
pub mod favorites;
pub mod notifications;
pub mod selection;
pub mod settings;
pub mod storage;
pub mod trigger;
pub mod usage;

pub use catalog::{Quote, QuoteCatalog};
pub use engine::QuoteEngine;
pub use error::{ConfigError, CoreError, StorageError};
pub use favorites::FavoritesStore;
pub use notifications::{
    MemoryDispatcher, NotificationContent, NotificationController, NotificationDispatcher,
    PendingNotification, PermissionStatus, Scheduled,
};
pub use selection::SelectionEngine;
pub use settings::{Cadence, Settings, SettingsPatch, SettingsStore};
pub use storage::{Config, JsonFileStore, KeyValueStore, MemoryStore};
pub use trigger::{TriggerScheduler, TriggerSpec};
pub use usage::UsageTracker;
