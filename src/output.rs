//! JSON output for `--json` mode
//!
//! Text output is printed by the reporter and the command handlers; these
//! types are the machine-readable counterpart.

use serde::Serialize;

use crate::report::{SkippedStep, Summary, TestRecord};
use crate::suite::Suite;

/// Result of `run` and `probe`
#[derive(Debug, Serialize)]
pub struct RunOutput<'a> {
    pub records: &'a [TestRecord],
    pub skipped: &'a [SkippedStep],
    pub summary: &'a Summary,
    pub threshold: f64,
    pub passed: bool,
}

/// Result of `suites`
#[derive(Debug, Serialize)]
pub struct SuiteListResult {
    pub suites: Vec<SuiteEntry>,
}

#[derive(Debug, Serialize)]
pub struct SuiteEntry {
    pub name: String,
    pub description: String,
    pub steps: usize,
    pub default: bool,
}

impl SuiteEntry {
    pub fn from_suite(suite: &Suite) -> Self {
        Self {
            name: suite.name.clone(),
            description: suite.description.clone(),
            steps: suite.steps.len(),
            default: suite.default,
        }
    }
}

/// Result of `login`
#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Result of `config`
#[derive(Debug, Serialize)]
pub struct ConfigResult {
    pub config_path: Option<String>,
    pub config_exists: bool,
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub password_set: bool,
    pub login_path: String,
    pub timeout_secs: u64,
    pub pass_threshold: f64,
}

/// Print JSON output to stdout
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    }
}
