//! TOML-based application configuration.
//!
//! Stores engine tuning rather than user choices (tone and reminder time
//! live in the key-value state):
//! - Reminder horizon and active-goal cap
//! - Nuclear tone window and spacing
//! - Time zone pin for date bucketing
//! - Log level
//!
//! Configuration is stored at `~/.config/shamezone/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::clock::SystemClock;
use crate::error::ConfigError;
use crate::notify::NuclearPolicy;

/// Reminder planning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default = "default_max_active_goals")]
    pub max_active_goals: usize,
}

/// Nuclear tone configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuclearConfig {
    #[serde(default = "default_window_start_hour")]
    pub window_start_hour: u32,
    #[serde(default = "default_window_end_hour")]
    pub window_end_hour: u32,
    #[serde(default = "default_min_gap_minutes")]
    pub min_gap_minutes: u32,
    #[serde(default = "default_fires_per_day")]
    pub fires_per_day: u32,
}

/// Clock configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Minutes east of UTC. Unset means the device-local offset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/shamezone/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub nuclear: NuclearConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// Default functions
fn default_horizon_days() -> u32 {
    3
}
fn default_max_active_goals() -> usize {
    3
}
fn default_window_start_hour() -> u32 {
    7
}
fn default_window_end_hour() -> u32 {
    23
}
fn default_min_gap_minutes() -> u32 {
    30
}
fn default_fires_per_day() -> u32 {
    3
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            max_active_goals: default_max_active_goals(),
        }
    }
}

impl Default for NuclearConfig {
    fn default() -> Self {
        Self {
            window_start_hour: default_window_start_hour(),
            window_end_hour: default_window_end_hour(),
            min_gap_minutes: default_min_gap_minutes(),
            fires_per_day: default_fires_per_day(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl NuclearConfig {
    pub fn policy(&self) -> NuclearPolicy {
        NuclearPolicy {
            window_start_hour: self.window_start_hour,
            window_end_hour: self.window_end_hour,
            min_gap_minutes: self.min_gap_minutes,
            fires_per_day: self.fires_per_day,
        }
    }
}

impl ClockConfig {
    pub fn clock(&self) -> SystemClock {
        match self.utc_offset_minutes {
            Some(minutes) => SystemClock::with_offset_minutes(minutes),
            None => SystemClock::local(),
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
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => parse_number(value).ok_or_else(|| {
                        invalid(format!("cannot parse '{value}' as number"))
                    })?,
                    // Optional fields: accept a number, or clear with "none".
                    serde_json::Value::Null => match value {
                        "none" | "null" | "" => serde_json::Value::Null,
                        _ => parse_number(value)
                            .unwrap_or_else(|| serde_json::Value::String(value.into())),
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
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
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
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
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed,
    /// or if the resulting config is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Reject settings the scheduler cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.nuclear.policy().is_satisfiable() {
            return Err(ConfigError::InvalidValue {
                key: "nuclear".into(),
                message: format!(
                    "{} reminders {} minutes apart do not fit between {}:00 and {}:00",
                    self.nuclear.fires_per_day,
                    self.nuclear.min_gap_minutes,
                    self.nuclear.window_start_hour,
                    self.nuclear.window_end_hour
                ),
            });
        }
        if self.schedule.horizon_days > 30 {
            return Err(ConfigError::InvalidValue {
                key: "schedule.horizon_days".into(),
                message: "at most 30 days ahead".into(),
            });
        }
        if let Some(minutes) = self.clock.utc_offset_minutes {
            if !(-14 * 60..=14 * 60).contains(&minutes) {
                return Err(ConfigError::InvalidValue {
                    key: "clock.utc_offset_minutes".into(),
                    message: format!("{minutes} is outside -840..=840"),
                });
            }
        }
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<i64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}
