//! Decode configuration with TOML, environment variable, and default sources.

use std::path::Path;
use std::{env, fmt, fs};

use serde::{Deserialize, Serialize};

// ── Errors ──────────────────────────────────────────────────────────

/// Errors produced by configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("invalid log format: {0}")]
    InvalidLogFormat(String),

    #[error("invalid environment variable value for {key}: {value}")]
    InvalidEnvVar { key: String, value: String },
}

// ── LogLevel ────────────────────────────────────────────────────────

/// Log verbosity used when the binary installs its subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(ConfigError::InvalidLogLevel(other.to_string())),
        }
    }
}

// ── LogFormat ───────────────────────────────────────────────────────

/// Output layout of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

// ── DecodeStrategy ──────────────────────────────────────────────────

/// Search strategy selected by the configured beam size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// One hypothesis per example, argmax at every step.
    Greedy,
    /// Top-`width` hypotheses per example.
    Beam { width: usize },
}

// ── DecodeConfig ────────────────────────────────────────────────────

/// Search parameters for caption decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Hypotheses kept per example. `1` selects greedy decoding.
    pub beam_size: usize,
    /// Number of timesteps every search runs.
    pub max_caption_length: usize,
    /// Examples decoded together in one step-function call.
    pub batch_size: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self { beam_size: 3, max_caption_length: 20, batch_size: 32 }
    }
}

impl DecodeConfig {
    /// Greedy when `beam_size == 1`, beam search otherwise.
    pub fn strategy(&self) -> DecodeStrategy {
        if self.beam_size > 1 {
            DecodeStrategy::Beam { width: self.beam_size }
        } else {
            DecodeStrategy::Greedy
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.beam_size == 0 {
            return Err(ConfigError::Validation("beam_size must be >= 1".into()));
        }
        if self.max_caption_length == 0 {
            return Err(ConfigError::Validation("max_caption_length must be >= 1".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Validation("batch_size must be >= 1".into()));
        }
        Ok(())
    }
}

// ── LoggingConfig ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

// ── CaptionConfig ───────────────────────────────────────────────────

/// Top-level configuration, stored as `[decode]` and `[logging]` tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CaptionConfig {
    pub decode: DecodeConfig,
    pub logging: LoggingConfig,
}

impl CaptionConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// If the file does not exist, returns `Ok(Self::default())`.
    pub fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!("Config file not found: {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Serialize to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Defaults overlaid with `CAPBEAM_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Overlay `CAPBEAM_*` environment variables onto `self`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| env::var(key).ok())
    }

    /// Overlay variables resolved through `lookup` onto `self`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CAPBEAM_BEAM_SIZE") {
            self.decode.beam_size = parse_env_usize("CAPBEAM_BEAM_SIZE", &v)?;
        }
        if let Some(v) = lookup("CAPBEAM_MAX_CAPTION_LEN") {
            self.decode.max_caption_length = parse_env_usize("CAPBEAM_MAX_CAPTION_LEN", &v)?;
        }
        if let Some(v) = lookup("CAPBEAM_BATCH_SIZE") {
            self.decode.batch_size = parse_env_usize("CAPBEAM_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("CAPBEAM_LOG_LEVEL") {
            self.logging.level = v.parse()?;
        }
        if let Some(v) = lookup("CAPBEAM_LOG_FORMAT") {
            self.logging.format = v.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decode.validate()
    }
}

fn parse_env_usize(key: &str, val: &str) -> Result<usize, ConfigError> {
    val.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvVar {
        key: key.to_string(),
        value: val.to_string(),
    })
}
