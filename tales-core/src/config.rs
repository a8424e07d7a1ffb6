//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "quota": { "trialSaves": 3, "freemiumAiDailyLimit": 5, "anonymousAiDailyLimit": 3 },
//!   "app": { "simulatedLatencyMs": 0, "notificationCapacity": 32, ... }
//! }
//! ```
//! Fields this crate does not manage are preserved when saving.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::quota::{
    DEFAULT_ANONYMOUS_AI_DAILY_LIMIT, DEFAULT_FREEMIUM_AI_DAILY_LIMIT, DEFAULT_TRIAL_SAVES,
};
use crate::domain::QuotaPolicy;

const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_NOTIFICATION_CAPACITY: usize = 32;
const MAX_NOTIFICATION_CAPACITY: usize = 1024;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    quota: QuotaSettings,
    #[serde(default)]
    app: AppSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotaSettings {
    #[serde(default = "default_trial_saves")]
    trial_saves: u32,
    #[serde(default = "default_freemium_ai")]
    freemium_ai_daily_limit: u32,
    #[serde(default = "default_anonymous_ai")]
    anonymous_ai_daily_limit: u32,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            trial_saves: DEFAULT_TRIAL_SAVES,
            freemium_ai_daily_limit: DEFAULT_FREEMIUM_AI_DAILY_LIMIT,
            anonymous_ai_daily_limit: DEFAULT_ANONYMOUS_AI_DAILY_LIMIT,
        }
    }
}

fn default_trial_saves() -> u32 {
    DEFAULT_TRIAL_SAVES
}

fn default_freemium_ai() -> u32 {
    DEFAULT_FREEMIUM_AI_DAILY_LIMIT
}

fn default_anonymous_ai() -> u32 {
    DEFAULT_ANONYMOUS_AI_DAILY_LIMIT
}

fn default_notification_capacity() -> usize {
    DEFAULT_NOTIFICATION_CAPACITY
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    simulated_latency_ms: u64,
    #[serde(default = "default_notification_capacity")]
    notification_capacity: usize,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            simulated_latency_ms: 0,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            other: HashMap::new(),
        }
    }
}

/// Tales configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub quota: QuotaPolicy,
    /// Artificial delay applied by the async shim before mutations
    pub simulated_latency: Duration,
    pub notification_capacity: usize,
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quota: QuotaPolicy::default(),
            simulated_latency: Duration::ZERO,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// A missing or unparsable settings file yields defaults. The trial
    /// allotment and latency can be overridden with `TALES_TRIAL_SAVES`
    /// and `TALES_LATENCY_MS`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            match std::fs::read_to_string(&settings_path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    warn!(path = %settings_path.display(), "ignoring unparsable settings: {}", e);
                    SettingsFile::default()
                }),
                Err(e) => {
                    warn!(path = %settings_path.display(), "ignoring unreadable settings: {}", e);
                    SettingsFile::default()
                }
            }
        } else {
            SettingsFile::default()
        };

        let trial_saves = env_override("TALES_TRIAL_SAVES").unwrap_or(raw.quota.trial_saves as u64);
        let latency_ms = env_override("TALES_LATENCY_MS").unwrap_or(raw.app.simulated_latency_ms);

        Ok(Self {
            quota: QuotaPolicy {
                trial_saves: u32::try_from(trial_saves).unwrap_or(u32::MAX),
                freemium_ai_daily_limit: raw.quota.freemium_ai_daily_limit,
                anonymous_ai_daily_limit: raw.quota.anonymous_ai_daily_limit,
            },
            simulated_latency: Duration::from_millis(latency_ms),
            notification_capacity: clamp_capacity(raw.app.notification_capacity),
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory, preserving unmanaged fields
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            self._raw_settings.clone()
        };

        settings.quota = QuotaSettings {
            trial_saves: self.quota.trial_saves,
            freemium_ai_daily_limit: self.quota.freemium_ai_daily_limit,
            anonymous_ai_daily_limit: self.quota.anonymous_ai_daily_limit,
        };
        settings.app.simulated_latency_ms = self.simulated_latency.as_millis() as u64;
        settings.app.notification_capacity = self.notification_capacity;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

fn clamp_capacity(requested: usize) -> usize {
    let capacity = requested.clamp(1, MAX_NOTIFICATION_CAPACITY);
    if capacity != requested {
        warn!(requested, capacity, "notification capacity out of range");
    }
    capacity
}

fn env_override(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring non-numeric override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.quota.freemium_ai_daily_limit, 5);
        assert_eq!(config.quota.anonymous_ai_daily_limit, 3);
        assert_eq!(config.notification_capacity, 32);
    }

    #[test]
    fn test_partial_file_and_preserved_fields() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"quota":{"freemiumAiDailyLimit":7},"app":{"theme":"dark"},"plugins":{"x":1}}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        assert_eq!(config.quota.freemium_ai_daily_limit, 7);
        assert_eq!(config.quota.anonymous_ai_daily_limit, 3);

        config.notification_capacity = 8;
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(saved["app"]["theme"], "dark");
        assert_eq!(saved["app"]["notificationCapacity"], 8);
        assert_eq!(saved["plugins"]["x"], 1);
    }

    #[test]
    fn test_notification_capacity_is_clamped() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"app":{"notificationCapacity":18446744073709551615}}"#,
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.notification_capacity, MAX_NOTIFICATION_CAPACITY);

        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"app":{"notificationCapacity":0}}"#,
        )
        .unwrap();
        assert_eq!(Config::load(dir.path()).unwrap().notification_capacity, 1);
    }

    #[test]
    fn test_unreadable_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), [0xff, 0xfe, 0x00, 0x7b]).unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.quota.anonymous_ai_daily_limit, 3);

        let nested = tempdir().unwrap();
        std::fs::create_dir(nested.path().join(SETTINGS_FILE)).unwrap();
        let config = Config::load(nested.path()).unwrap();
        assert_eq!(config.notification_capacity, 32);
    }

    #[test]
    fn test_garbage_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.quota.freemium_ai_daily_limit, 5);
    }
}
