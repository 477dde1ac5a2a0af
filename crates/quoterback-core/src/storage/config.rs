//! TOML-based engine configuration.
//!
//! Host-level knobs that are not user preferences:
//! - Where to load the quote dataset from
//! - How wide the least-used selection window is
//! - Notification identifier, channel and titles
//!
//! Configuration is stored at `~/.config/quoterback/config.toml`.
//! User preferences live in the `settings` record instead, see
//! [`SettingsStore`](crate::settings::SettingsStore).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Quote dataset configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to an external JSON dataset. The bundled dataset is used when unset.
    #[serde(default)]
    pub path: Option<String>,
}

/// Selection engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_least_used_limit")]
    pub least_used_limit: usize,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_identifier")]
    pub identifier: String,
    #[serde(default = "default_channel_id")]
    pub channel_id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_test_title")]
    pub test_title: String,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/quoterback/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_least_used_limit() -> usize {
    5
}
fn default_identifier() -> String {
    "daily-quote-notification".into()
}
fn default_channel_id() -> String {
    "daily-quotes".into()
}
fn default_title() -> String {
    "Your Daily Quote".into()
}
fn default_test_title() -> String {
    "Test Notification".into()
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            least_used_limit: default_least_used_limit(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            channel_id: default_channel_id(),
            title: default_title(),
            test_title: default_test_title(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    // "none" clears optional fields; required ones reject it on decode
                    _ if value == "none" => serde_json::Value::Null,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some("none".to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Set a config value by key in memory only.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        if updated.selection.least_used_limit == 0 {
            return Err(invalid("must be at least 1".to_string()));
        }
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default configuration: {e}");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.selection.least_used_limit, 5);
        assert_eq!(parsed.notifications.identifier, "daily-quote-notification");
        assert!(parsed.catalog.path.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[notifications]\ntitle = \"Hello\"\n").unwrap();
        assert_eq!(parsed.notifications.title, "Hello");
        assert_eq!(parsed.notifications.channel_id, "daily-quotes");
        assert_eq!(parsed.selection.least_used_limit, 5);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("selection.least_used_limit").as_deref(), Some("5"));
        assert_eq!(cfg.get("notifications.test_title").as_deref(), Some("Test Notification"));
        assert_eq!(cfg.get("catalog.path").as_deref(), Some("none"));
        assert!(cfg.get("notifications.missing_key").is_none());
    }

    #[test]
    fn apply_updates_number_and_string() {
        let mut cfg = Config::default();
        cfg.apply("selection.least_used_limit", "3").unwrap();
        cfg.apply("notifications.title", "Quote of the day").unwrap();
        assert_eq!(cfg.selection.least_used_limit, 3);
        assert_eq!(cfg.notifications.title, "Quote of the day");
    }

    #[test]
    fn apply_sets_and_clears_optional_path() {
        let mut cfg = Config::default();
        cfg.apply("catalog.path", "/tmp/quotes.json").unwrap();
        assert_eq!(cfg.catalog.path.as_deref(), Some("/tmp/quotes.json"));
        cfg.apply("catalog.path", "none").unwrap();
        assert!(cfg.catalog.path.is_none());
    }

    #[test]
    fn none_is_rejected_for_required_fields() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("notifications.title", "none"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg.notifications.title, "Your Daily Quote");
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("selection.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.apply("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_invalid_number() {
        let mut cfg = Config::default();
        assert!(cfg.apply("selection.least_used_limit", "many").is_err());
        assert!(cfg.apply("selection.least_used_limit", "0").is_err());
        assert_eq!(cfg.selection.least_used_limit, 5);
    }
}
