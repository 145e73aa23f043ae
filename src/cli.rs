use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;

use crate::check::Check;
use crate::client::Method;

/// Smoke-test the Claire et Marcus API with suites of HTTP assertions
#[derive(Parser, Debug)]
#[command(name = "cmprobe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub global: GlobalArgs,

    /// Print a JSON document instead of the console report
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Settings that override the config file
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Base URL of the API, including the /api prefix
    #[arg(long, env = "CMPROBE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Account email used to log in
    #[arg(long, env = "CMPROBE_EMAIL", global = true)]
    pub email: Option<String>,

    /// Account password used to log in
    #[arg(long, env = "CMPROBE_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Login endpoint, e.g. /auth/login-robust
    #[arg(long, env = "CMPROBE_LOGIN_PATH", global = true)]
    pub login_path: Option<String>,

    /// Default request timeout in seconds
    #[arg(
        long = "timeout",
        value_name = "SECS",
        env = "CMPROBE_TIMEOUT",
        global = true
    )]
    pub timeout_secs: Option<u64>,

    /// Config file to use instead of ~/.config/cmprobe/config.json
    #[arg(
        long = "config",
        value_name = "PATH",
        env = "CMPROBE_CONFIG",
        global = true
    )]
    pub config_path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run built-in suites and/or suite files
    Run {
        /// Built-in suites to run (default: all default suites, unless --file is given)
        suites: Vec<String>,

        /// Suite file to run (YAML, TOML or JSON); repeatable
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,

        /// Skip every remaining step after the first failure
        #[arg(long)]
        stop_on_failure: bool,

        /// Pass rate in percent required for a zero exit code
        #[arg(long, value_name = "PERCENT")]
        threshold: Option<f64>,
    },
    /// Send one request and assert on the response
    Probe {
        /// HTTP method
        method: Method,

        /// Path relative to the base URL
        path: String,

        /// Accepted status code; repeatable (default: 200)
        #[arg(long = "expect", value_name = "STATUS")]
        expect: Vec<u16>,

        /// JSON request body
        #[arg(long, value_parser = parse_json_body)]
        body: Option<Value>,

        /// Field check: `field`, `field=value` or `field~text`; repeatable
        #[arg(long = "check", value_name = "SPEC")]
        checks: Vec<CheckSpec>,

        /// Send the request without logging in
        #[arg(long)]
        no_auth: bool,
    },
    /// Log in and report the account
    Login,
    /// List the built-in suites
    Suites,
    /// Show the config file location and effective settings
    Config,
}

/// A field check given on the command line
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSpec(pub Check);

impl FromStr for CheckSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Format: <field> | <field>=<json-or-text> | <field>~<text>
        let (field, check) = match s.find(['=', '~']) {
            None => (s.trim(), None),
            Some(idx) => {
                let field = s[..idx].trim();
                let operand = &s[idx + 1..];
                let check = if s[idx..].starts_with('=') {
                    Check::equals(field, parse_literal(operand))
                } else {
                    Check::contains(field, operand)
                };
                (field, Some(check))
            }
        };

        if field.is_empty() {
            return Err(format!(
                "Invalid check '{}'. Expected: <field>, <field>=<value> or <field>~<text>",
                s
            ));
        }

        Ok(CheckSpec(check.unwrap_or_else(|| Check::present(field))))
    }
}

/// Parse a literal as JSON, falling back to a plain string
fn parse_literal(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn parse_json_body(text: &str) -> Result<Value, String> {
    serde_json::from_str(text).map_err(|e| format!("Invalid JSON body: {}", e))
}
