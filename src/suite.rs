//! Suites: named, ordered lists of steps
//!
//! Built-in suites cover the Claire et Marcus endpoints; user suites are
//! loaded from YAML, TOML or JSON files with the same step schema.

mod account;
mod media;
mod publishing;
mod social;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::step::Step;

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Unknown suite '{name}'. Available: {available}")]
    Unknown { name: String, available: String },

    #[error("Failed to read suite file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse suite file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported suite file {path}. Use .yaml, .yml, .toml or .json")]
    UnsupportedFormat { path: PathBuf },

    #[error("Suite file {path} has no steps")]
    Empty { path: PathBuf },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Suite {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Whether `run` without suite names includes this suite
    #[serde(default = "default_included")]
    pub default: bool,

    pub steps: Vec<Step>,
}

fn default_included() -> bool {
    true
}

impl Suite {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            default: true,
            steps: Vec::new(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    /// Leave this suite out of the default selection
    pub fn opt_in(mut self) -> Self {
        self.default = false;
        self
    }
}

/// Every built-in suite, in execution order
pub fn builtin() -> Vec<Suite> {
    vec![
        account::health(),
        account::auth(),
        account::business_profile(),
        account::notes(),
        media::content(),
        social::social(),
        media::pixabay(),
        publishing::website(),
        publishing::posts(),
    ]
}

/// Resolve suite names to built-in suites.
///
/// An empty list selects the default suites. Names are matched
/// case-insensitively and `_` is accepted for `-`.
pub fn select(names: &[String]) -> Result<Vec<Suite>, SuiteError> {
    let all = builtin();

    if names.is_empty() {
        return Ok(all.into_iter().filter(|suite| suite.default).collect());
    }

    names
        .iter()
        .map(|name| {
            let wanted = normalize_name(name);
            all.iter()
                .find(|suite| suite.name == wanted)
                .cloned()
                .ok_or_else(|| SuiteError::Unknown {
                    name: name.clone(),
                    available: all
                        .iter()
                        .map(|suite| suite.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
        })
        .collect()
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

/// Load a suite file, picking the format from its extension
pub fn load_file(path: &Path) -> Result<Suite, SuiteError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let content = std::fs::read_to_string(path).map_err(|source| SuiteError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |message: String| SuiteError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut suite: Suite = match extension.as_str() {
        "yaml" | "yml" => serde_yml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        "toml" => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        "json" => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        _ => {
            return Err(SuiteError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    if suite.steps.is_empty() {
        return Err(SuiteError::Empty {
            path: path.to_path_buf(),
        });
    }

    if suite.name.trim().is_empty() {
        suite.name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("suite")
            .to_string();
    }

    Ok(suite)
}
