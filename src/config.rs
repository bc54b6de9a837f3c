use std::{path::PathBuf, time::Duration};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, trigger::OneShotPolicy};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// how long the scheduler waits between checks
    pub tick_interval_ms: u64,
    /// how often playing audio checks whether it was stopped
    pub poll_interval_ms: u64,
    /// how long a stopped alarm is kept from ringing again
    pub suppression_secs: u64,
    pub one_shot: OneShotPolicy,
    pub time_format: String,
    /// 0 to 100
    pub volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            poll_interval_ms: 50,
            suppression_secs: 60,
            one_shot: OneShotPolicy::Dated,
            time_format: "%I:%M %p".to_string(),
            volume: 100.0,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// if the file can't be read, isn't valid toml for a config or fails [`Config::validate`]
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// [`ConfigError::Invalid`] if an interval is zero, the loops would never sleep
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be above 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be above 0"));
        }
        Ok(())
    }

    /// like [`Config::load`] but a missing file gives the defaults
    ///
    /// # Errors
    /// if the file exists but can't be read or parsed
    pub fn load_or_default(path: PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// # Errors
    /// if the config dir or file can't be written
    pub fn save(&self, path: PathBuf) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, config)?;
        Ok(())
    }

    /// # Errors
    /// [`ConfigError::NoProjectDirs`] if there is no home directory to put it in
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "reveille")
            .ok_or(ConfigError::NoProjectDirs)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn suppression_window(&self) -> TimeDelta {
        i64::try_from(self.suppression_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = toml::from_str("one_shot = \"daily\"\nvolume = 40.0\n").unwrap();
        assert_eq!(config.one_shot, OneShotPolicy::Daily);
        assert_eq!(config.volume, 40.0);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.suppression_window(), TimeDelta::seconds(60));
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            suppression_secs: 90,
            time_format: "%H:%M".to_string(),
            ..Config::default()
        };
        config.save(path.clone()).unwrap();
        assert_eq!(Config::load(path).unwrap(), config);
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tick_interval_ms = 0\n").unwrap();
        assert!(matches!(
            Config::load(path.clone()),
            Err(ConfigError::Invalid("tick_interval_ms must be above 0"))
        ));
        std::fs::write(&path, "poll_interval_ms = 0\n").unwrap();
        assert!(matches!(
            Config::load_or_default(path.clone()),
            Err(ConfigError::Invalid("poll_interval_ms must be above 0"))
        ));
        std::fs::write(&path, "tick_interval_ms = 1\npoll_interval_ms = 1\n").unwrap();
        assert!(Config::load(path).is_ok());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn bad_policy_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "one_shot = \"weekly\"\n").unwrap();
        assert!(matches!(Config::load(path), Err(ConfigError::Parse(_))));
    }
}
