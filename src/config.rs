//! Configuration file support for cmprobe
//!
//! Reads configuration from `~/.config/cmprobe/config.json`:
//!
//! ```json
//! {
//!   "base_url": "https://staging.example.com/api",
//!   "email": "owner@example.com",
//!   "password": "...",
//!   "login_path": "/auth/login-robust",
//!   "timeout_secs": 30,
//!   "pass_threshold": 85
//! }
//! ```
//!
//! Command-line flags and `CMPROBE_*` environment variables take
//! precedence over the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::auth::{Credentials, DEFAULT_LOGIN_PATH};
use crate::cli::GlobalArgs;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PASS_THRESHOLD: f64 = 100.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine config directory. HOME environment variable not set.")]
    NoConfigDir,

    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Base URL is required (use --base-url, CMPROBE_BASE_URL or base_url in the config file)")]
    MissingBaseUrl,

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Both email and password are needed to log in; only one was provided")]
    IncompleteCredentials,

    #[error("Timeout must be at least one second")]
    InvalidTimeout,

    #[error("Pass threshold must be between 0 and 100, got {0}")]
    InvalidThreshold(f64),
}

/// Raw configuration as read from the file; every field is optional
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub login_path: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub pass_threshold: Option<f64>,
}

impl Config {
    /// Load configuration from `explicit`, or from the default path.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match config_path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            Ok(_) | Err(ConfigError::NoConfigDir) => Ok(Config::default()),
            Err(e) => Err(e),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply command-line and environment overrides
    pub fn with_overrides(mut self, args: &GlobalArgs) -> Self {
        if let Some(base_url) = &args.base_url {
            self.base_url = Some(base_url.clone());
        }
        if let Some(email) = &args.email {
            self.email = Some(email.clone());
        }
        if let Some(password) = &args.password {
            self.password = Some(password.clone());
        }
        if let Some(login_path) = &args.login_path {
            self.login_path = Some(login_path.clone());
        }
        if let Some(timeout_secs) = args.timeout_secs {
            self.timeout_secs = Some(timeout_secs);
        }
        self
    }
}

/// Validated settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    pub login_path: String,
    pub timeout: Duration,
    pub pass_threshold: f64,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let base_url = non_empty(&config.base_url).ok_or(ConfigError::MissingBaseUrl)?;
        validate_base_url(base_url)?;

        let credentials = match (non_empty(&config.email), non_empty(&config.password)) {
            (Some(email), Some(password)) => Some(Credentials {
                email: email.to_string(),
                password: password.to_string(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteCredentials),
        };

        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let pass_threshold =
            validate_threshold(config.pass_threshold.unwrap_or(DEFAULT_PASS_THRESHOLD))?;

        Ok(Settings {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            login_path: non_empty(&config.login_path)
                .unwrap_or(DEFAULT_LOGIN_PATH)
                .to_string(),
            timeout: Duration::from_secs(timeout_secs),
            pass_threshold,
        })
    }

    /// Replace the pass threshold for this run
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        self.pass_threshold = validate_threshold(threshold)?;
        Ok(self)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

fn validate_threshold(threshold: f64) -> Result<f64, ConfigError> {
    if (0.0..=100.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ConfigError::InvalidThreshold(threshold))
    }
}

/// Returns the config file path: `~/.config/cmprobe/config.json`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    // Use XDG_CONFIG_HOME if set, otherwise fall back to ~/.config
    let config_base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".config"))
                .unwrap_or_default()
        });

    if config_base.as_os_str().is_empty() {
        return Err(ConfigError::NoConfigDir);
    }

    Ok(config_base.join("cmprobe").join("config.json"))
}
