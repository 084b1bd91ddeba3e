use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::errors::ShiftError;
use crate::timecode::{NegativeTimePolicy, TimeDelta, MAX_DELTA_MS};

// Application configuration module
// Settings may come from a JSON file; command line options override them.

/// File picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "csub.json";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Default shift applied when the command line does not override it
    #[serde(default)]
    pub delta: DeltaConfig,

    /// Handling of shifted timestamps that fall below zero
    #[serde(default)]
    pub negative_time: NegativeTimePolicy,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Raw delta components as written in the config file
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaConfig {
    #[serde(default)]
    pub ms: i32,
    #[serde(default)]
    pub s: i32,
    #[serde(default)]
    pub m: i32,
    #[serde(default)]
    pub h: i32,
    #[serde(default)]
    pub count: i32,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Config {
    /// Load a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ShiftError::Config(format!("{}: {}", path.display(), e)))
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .map_err(|e| ShiftError::Config(format!("{}: {}", path.display(), e)))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load the explicit config, else `csub.json` if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ShiftError> {
        let ms = i64::from(self.delta.ms);
        if !(-MAX_DELTA_MS..=MAX_DELTA_MS).contains(&ms) {
            return Err(ShiftError::DeltaOutOfRange { value: ms });
        }
        Ok(())
    }

    /// The validated delta described by this configuration
    pub fn time_delta(&self) -> Result<TimeDelta, ShiftError> {
        self.validate()?;
        let d = &self.delta;
        TimeDelta::new(d.ms, d.s, d.m, d.h, d.count)
    }
}
