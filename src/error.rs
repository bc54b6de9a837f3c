use thiserror::Error;

/// errors returned when creating an alarm
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlarmError {
    #[error("invalid time format `{0}`, use HH:MM (24h) or HH:MM AM/PM (12h)")]
    InvalidTimeFormat(String),
    #[error("invalid repeat day {0}, days go from 0 (Monday) to 6 (Sunday)")]
    InvalidWeekday(u8),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't find a home directory for the config")]
    NoProjectDirs,
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
