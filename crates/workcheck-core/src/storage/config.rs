//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The daily check-in window
//! - Grace period and popups per session
//! - Notification preferences
//! - An optional fixed random seed
//! - Log retention
//!
//! Configuration is stored at `~/.config/workcheck/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::checkin::{
    CheckinPolicy, DEFAULT_GRACE_PERIOD_SECS, DEFAULT_POPUPS_PER_SESSION, MAX_GRACE_PERIOD_SECS,
};
use crate::error::{ConfigError, Result};
use crate::window::TimeWindow;

/// Session rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinConfig {
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
    #[serde(default = "default_popups_per_session")]
    pub popups_per_session: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Random source configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomConfig {
    /// Fixed seed for reproducible trigger times. Unset means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Check-in log configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Keep at most this many lines. Unset means unbounded.
    #[serde(default)]
    pub capacity: Option<usize>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/workcheck/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: TimeWindow,
    #[serde(default)]
    pub checkin: CheckinConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// Default functions
fn default_grace_period_secs() -> u64 {
    DEFAULT_GRACE_PERIOD_SECS
}
fn default_popups_per_session() -> u32 {
    DEFAULT_POPUPS_PER_SESSION
}
fn default_true() -> bool {
    true
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period_secs(),
            popups_per_session: default_popups_per_session(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: TimeWindow::default(),
            checkin: CheckinConfig::default(),
            notifications: NotificationsConfig::default(),
            random: RandomConfig::default(),
            log: LogConfig::default(),
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
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => parse_number(value)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                    // Optional settings: "none" clears, anything else is taken
                    // as a number when it looks like one.
                    serde_json::Value::Null => match value {
                        "none" | "null" | "" => serde_json::Value::Null,
                        _ => parse_number(value)
                            .unwrap_or_else(|| serde_json::Value::String(value.into())),
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of `config.toml` in the data directory.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory, validating the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid for it.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkin.grace_period_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "checkin.grace_period_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.checkin.grace_period_secs > MAX_GRACE_PERIOD_SECS {
            return Err(ConfigError::InvalidValue {
                key: "checkin.grace_period_secs".into(),
                message: format!("must be at most {MAX_GRACE_PERIOD_SECS}"),
            });
        }
        if self.checkin.popups_per_session == 0 {
            return Err(ConfigError::InvalidValue {
                key: "checkin.popups_per_session".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.log.capacity == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "log.capacity".into(),
                message: "must be greater than 0 when set".into(),
            });
        }
        Ok(())
    }

    pub fn policy(&self) -> CheckinPolicy {
        CheckinPolicy {
            grace_period_secs: self.checkin.grace_period_secs,
            popups_per_session: self.checkin.popups_per_session,
        }
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::tempdir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert!(toml_str.contains("start = \"14:45\""));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(indoc! {r#"
            [window]
            start = "09:00"
            end = "17:30"

            [random]
            seed = 42
        "#})
        .unwrap();
        assert_eq!(cfg.window, TimeWindow::parse("09:00", "17:30").unwrap());
        assert_eq!(cfg.random.seed, Some(42));
        assert_eq!(cfg.checkin.grace_period_secs, 60);
        assert_eq!(cfg.checkin.popups_per_session, 2);
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn rejects_malformed_window_in_file() {
        let result: Result<Config, _> = toml::from_str(indoc! {r#"
            [window]
            start = "9am"
            end = "17:30"
        "#});
        assert!(result.is_err());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("window.start").as_deref(), Some("14:45"));
        assert_eq!(cfg.get("checkin.grace_period_secs").as_deref(), Some("60"));
        assert_eq!(cfg.get("random.seed").as_deref(), Some("null"));
        assert!(cfg.get("window.missing_key").is_none());
    }

    #[test]
    fn apply_updates_window_and_validates() {
        let mut cfg = Config::default();
        cfg.apply("window.end", "16:00").unwrap();
        assert_eq!(cfg.get("window.end").as_deref(), Some("16:00"));

        let err = cfg.apply("window.start", "25:00").unwrap_err();
        assert!(err.to_string().contains("window.start"));
        assert_eq!(cfg.get("window.start").as_deref(), Some("14:45"));
    }

    #[test]
    fn apply_sets_and_clears_optional_seed() {
        let mut cfg = Config::default();
        cfg.apply("random.seed", "7").unwrap();
        assert_eq!(cfg.random.seed, Some(7));
        cfg.apply("random.seed", "none").unwrap();
        assert_eq!(cfg.random.seed, None);
    }

    #[test]
    fn apply_rejects_zero_cap_and_bad_types() {
        let mut cfg = Config::default();
        assert!(cfg.apply("checkin.popups_per_session", "0").is_err());
        assert!(cfg.apply("notifications.enabled", "maybe").is_err());
        assert!(cfg.apply("checkin.grace_period_secs", "soon").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn apply_rejects_oversized_grace_period() {
        let mut cfg = Config::default();
        assert!(cfg.apply("checkin.grace_period_secs", "100000000000000000").is_err());
        assert!(cfg.apply("checkin.grace_period_secs", "9000000000000").is_err());
        assert!(cfg.apply("checkin.grace_period_secs", "86401").is_err());
        assert_eq!(cfg, Config::default());

        cfg.apply("checkin.grace_period_secs", "86400").unwrap();
        assert_eq!(cfg.checkin.grace_period_secs, 86_400);
    }

    #[test]
    fn load_rejects_oversized_grace_period_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[checkin]\ngrace_period_secs = 9000000000000\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("window.nonexistent_key", "x"),
            Err(crate::CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(cfg.apply("", "x").is_err());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.apply("checkin.grace_period_secs", "90").unwrap();
        cfg.apply("log.capacity", "200").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.policy().grace_period_secs, 90);
        assert_eq!(loaded.log.capacity, Some(200));
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "window = 3").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
