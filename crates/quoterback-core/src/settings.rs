//! Persisted user preferences.
//!
//! All mutations go through [`SettingsStore::update`], which merges a
//! [`SettingsPatch`] into the current state and writes the whole record
//! back under the `settings` key. A failed write leaves the in-memory
//! state in place and is kept for a one-time alert.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::{save_json, KeyValueStore, SETTINGS_KEY};

/// Theme selected when nothing valid was persisted.
pub const DEFAULT_THEME: &str = "nature";

const DEFAULT_HOUR: u32 = 9;

/// How often the quote notification repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cadence {
    #[default]
    Daily,
    EveryOtherDay,
    Weekly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::EveryOtherDay => "everyOtherDay",
            Cadence::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Cadence::Daily),
            "everyOtherDay" | "every-other-day" => Ok(Cadence::EveryOtherDay),
            "weekly" => Ok(Cadence::Weekly),
            other => Err(format!("unknown cadence: {other}")),
        }
    }
}

/// User preferences. `theme_backgrounds` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub notification_time: DateTime<Utc>,
    pub notification_cadence: Cadence,
    pub theme_backgrounds: BTreeSet<String>,
    pub notification_authors: BTreeSet<String>,
    pub notification_topics: BTreeSet<String>,
    pub notification_moods: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notification_time: local_time_today(DEFAULT_HOUR, 0).unwrap_or_else(Utc::now),
            notification_cadence: Cadence::Daily,
            theme_backgrounds: default_themes(),
            notification_authors: BTreeSet::new(),
            notification_topics: BTreeSet::new(),
            notification_moods: BTreeSet::new(),
        }
    }
}

impl Settings {
    /// Local wall-clock hour and minute of the notification time.
    pub fn notification_hour_minute(&self) -> (u32, u32) {
        let local = self.notification_time.with_timezone(&Local);
        (local.hour(), local.minute())
    }

    /// Whether any author/topic/mood filter is active.
    pub fn has_content_filters(&self) -> bool {
        !self.notification_authors.is_empty()
            || !self.notification_topics.is_empty()
            || !self.notification_moods.is_empty()
    }

    /// Merge `patch` into a copy of `self`.
    ///
    /// An empty theme set in the patch is ignored so the result always keeps
    /// at least one theme.
    pub fn merged(&self, patch: SettingsPatch) -> Settings {
        let mut next = self.clone();
        if let Some(time) = patch.notification_time {
            next.notification_time = time;
        }
        if let Some(cadence) = patch.notification_cadence {
            next.notification_cadence = cadence;
        }
        if let Some(themes) = patch.theme_backgrounds {
            if !themes.is_empty() {
                next.theme_backgrounds = themes;
            }
        }
        if let Some(authors) = patch.notification_authors {
            next.notification_authors = authors;
        }
        if let Some(topics) = patch.notification_topics {
            next.notification_topics = topics;
        }
        if let Some(moods) = patch.notification_moods {
            next.notification_moods = moods;
        }
        next
    }

    fn from_stored(stored: StoredSettings) -> Settings {
        let defaults = Settings::default();

        let notification_time = stored
            .notification_time
            .as_deref()
            .and_then(|raw| match DateTime::parse_from_rfc3339(raw) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    tracing::warn!("ignoring stored notification time {raw:?}: {e}");
                    None
                }
            })
            .unwrap_or(defaults.notification_time);

        let notification_cadence = stored
            .notification_cadence
            .as_deref()
            .and_then(|raw| match raw.parse::<Cadence>() {
                Ok(c) => Some(c),
                Err(e) => {
                    tracing::warn!("{e}, defaulting to daily");
                    None
                }
            })
            .unwrap_or_default();

        let mut theme_backgrounds = stored.theme_backgrounds.unwrap_or_default();
        if let Some(legacy) = stored.theme_background {
            if !legacy.is_empty() {
                theme_backgrounds.insert(legacy);
            }
        }
        if theme_backgrounds.is_empty() {
            theme_backgrounds = default_themes();
        }

        Settings {
            notification_time,
            notification_cadence,
            theme_backgrounds,
            notification_authors: stored.notification_authors.unwrap_or_default(),
            notification_topics: stored.notification_topics.unwrap_or_default(),
            notification_moods: stored.notification_moods.unwrap_or_default(),
        }
    }
}

/// Partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub notification_time: Option<DateTime<Utc>>,
    pub notification_cadence: Option<Cadence>,
    pub theme_backgrounds: Option<BTreeSet<String>>,
    pub notification_authors: Option<BTreeSet<String>>,
    pub notification_topics: Option<BTreeSet<String>>,
    pub notification_moods: Option<BTreeSet<String>>,
}

/// Persisted shape, lenient about missing and legacy fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    notification_time: Option<String>,
    notification_cadence: Option<String>,
    theme_backgrounds: Option<BTreeSet<String>>,
    /// Single-theme field written by older versions.
    theme_background: Option<String>,
    notification_authors: Option<BTreeSet<String>>,
    notification_topics: Option<BTreeSet<String>>,
    notification_moods: Option<BTreeSet<String>>,
}

fn default_themes() -> BTreeSet<String> {
    BTreeSet::from([DEFAULT_THEME.to_string()])
}

/// Today's date in the local time zone at `hour:minute`, as a UTC instant.
pub fn local_time_today(hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Local::now()
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

fn toggled(set: &BTreeSet<String>, value: &str) -> BTreeSet<String> {
    let mut next = set.clone();
    if !next.remove(value) {
        next.insert(value.to_string());
    }
    next
}

/// Owner of the [`Settings`] singleton.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    settings: Settings,
    persist_error: Option<StorageError>,
}

impl SettingsStore {
    /// Load persisted settings, migrating legacy fields and falling back to
    /// defaults when the record is missing or unreadable.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let settings = match store.load(SETTINGS_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<StoredSettings>(value) {
                Ok(stored) => Settings::from_stored(stored),
                Err(e) => {
                    tracing::warn!("settings record malformed, using defaults: {e}");
                    Settings::default()
                }
            },
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!("failed to load settings, using defaults: {e}");
                Settings::default()
            }
        };

        Self {
            store,
            settings,
            persist_error: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Merge `patch` into the current settings and persist the full record.
    pub fn update(&mut self, patch: SettingsPatch) -> &Settings {
        self.settings = self.settings.merged(patch);
        self.persist();
        &self.settings
    }

    pub fn set_notification_time(&mut self, time: DateTime<Utc>) -> &Settings {
        self.update(SettingsPatch {
            notification_time: Some(time),
            ..Default::default()
        })
    }

    pub fn set_notification_cadence(&mut self, cadence: Cadence) -> &Settings {
        self.update(SettingsPatch {
            notification_cadence: Some(cadence),
            ..Default::default()
        })
    }

    /// Select or deselect a theme. Deselecting the last theme does nothing.
    pub fn toggle_theme_background(&mut self, theme: &str) -> &Settings {
        let themes = &self.settings.theme_backgrounds;
        if themes.len() == 1 && themes.contains(theme) {
            tracing::debug!("keeping last theme '{theme}' selected");
            return &self.settings;
        }
        let next = toggled(themes, theme);
        self.update(SettingsPatch {
            theme_backgrounds: Some(next),
            ..Default::default()
        })
    }

    pub fn toggle_notification_author(&mut self, author: &str) -> &Settings {
        let next = toggled(&self.settings.notification_authors, author);
        self.update(SettingsPatch {
            notification_authors: Some(next),
            ..Default::default()
        })
    }

    pub fn toggle_notification_topic(&mut self, topic: &str) -> &Settings {
        let next = toggled(&self.settings.notification_topics, topic);
        self.update(SettingsPatch {
            notification_topics: Some(next),
            ..Default::default()
        })
    }

    pub fn toggle_notification_mood(&mut self, mood: &str) -> &Settings {
        let next = toggled(&self.settings.notification_moods, mood);
        self.update(SettingsPatch {
            notification_moods: Some(next),
            ..Default::default()
        })
    }

    /// Clear the author, topic and mood filters.
    pub fn clear_notification_filters(&mut self) -> &Settings {
        self.update(SettingsPatch {
            notification_authors: Some(BTreeSet::new()),
            notification_topics: Some(BTreeSet::new()),
            notification_moods: Some(BTreeSet::new()),
            ..Default::default()
        })
    }

    /// Restore every preference to its default.
    pub fn reset(&mut self) -> &Settings {
        self.settings = Settings::default();
        self.persist();
        &self.settings
    }

    /// Most recent persist failure, cleared once taken.
    pub fn take_persist_error(&mut self) -> Option<StorageError> {
        self.persist_error.take()
    }

    fn persist(&mut self) {
        if let Err(e) = save_json(self.store.as_ref(), SETTINGS_KEY, &self.settings) {
            tracing::warn!("failed to save settings: {e}");
            self.persist_error = Some(e);
        }
    }
}
