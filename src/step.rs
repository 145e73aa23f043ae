//! Probe steps: one request plus the expectations placed on its response

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::check::{Check, lookup, scalar_text};
use crate::client::{ApiClient, ApiRequest, Method};
use crate::error::ProbeError;
use crate::vars::Vars;

/// Accepts either a single value or a list in suite files
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    OneOrMany::deserialize(deserializer).map(Into::into)
}

/// Set of HTTP statuses a step accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSet(Vec<u16>);

impl StatusSet {
    pub fn single(status: u16) -> Self {
        Self(vec![status])
    }

    pub fn matches(&self, status: u16) -> bool {
        self.0.contains(&status)
    }

    pub fn codes(&self) -> &[u16] {
        &self.0
    }
}

impl Default for StatusSet {
    fn default() -> Self {
        Self::single(200)
    }
}

impl From<Vec<u16>> for StatusSet {
    fn from(codes: Vec<u16>) -> Self {
        if codes.is_empty() {
            Self::default()
        } else {
            Self(codes)
        }
    }
}

impl<'de> Deserialize<'de> for StatusSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        one_or_many(deserializer).map(StatusSet::from)
    }
}

impl fmt::Display for StatusSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.0.iter().map(u16::to_string).collect();
        write!(f, "{}", codes.join("|"))
    }
}

/// Lifts a value out of a response into the run's variable table.
///
/// The first path resolving to a non-empty scalar wins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Capture {
    pub name: String,
    #[serde(deserialize_with = "one_or_many")]
    pub from: Vec<String>,
}

impl Capture {
    pub fn resolve(&self, json: &Value) -> Option<String> {
        self.from
            .iter()
            .find_map(|path| {
                lookup(json, path)
                    .and_then(scalar_text)
                    .filter(|text| !text.is_empty())
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub expect: StatusSet,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub capture: Vec<Capture>,
    #[serde(default = "default_auth")]
    pub auth: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_auth() -> bool {
    true
}

impl Step {
    pub fn new(method: Method, name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            method,
            path: path.to_string(),
            expect: StatusSet::default(),
            body: None,
            checks: Vec::new(),
            capture: Vec::new(),
            auth: true,
            timeout_secs: None,
        }
    }

    pub fn get(name: &str, path: &str) -> Self {
        Self::new(Method::Get, name, path)
    }

    pub fn post(name: &str, path: &str) -> Self {
        Self::new(Method::Post, name, path)
    }

    pub fn put(name: &str, path: &str) -> Self {
        Self::new(Method::Put, name, path)
    }

    pub fn delete(name: &str, path: &str) -> Self {
        Self::new(Method::Delete, name, path)
    }

    pub fn expecting(mut self, codes: &[u16]) -> Self {
        self.expect = StatusSet::from(codes.to_vec());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn capturing(mut self, name: &str, from: &[&str]) -> Self {
        self.capture.push(Capture {
            name: name.to_string(),
            from: from.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    /// The step runs without a bearer token
    pub fn anonymous(mut self) -> Self {
        self.auth = false;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn needs_json(&self) -> bool {
        !self.capture.is_empty() || self.checks.iter().any(Check::needs_json)
    }
}

/// Outcome of a step whose status and checks all held
#[derive(Debug)]
pub struct Assertion {
    pub status: u16,
    pub elapsed: Duration,
    pub captured: Vec<(String, String)>,
}

/// Issue the step's request and assert on the response.
///
/// Templates are rendered before anything is sent, so a step that depends
/// on a missing capture fails with `ProbeError::Unresolved` without
/// touching the network.
pub fn request_and_assert(
    client: &ApiClient,
    step: &Step,
    vars: &Vars,
) -> Result<Assertion, ProbeError> {
    let path = vars.render(&step.path)?;
    let body = step
        .body
        .as_ref()
        .map(|body| vars.render_value(body))
        .transpose()?;
    let checks = step
        .checks
        .iter()
        .map(|check| check.render(vars))
        .collect::<Result<Vec<_>, _>>()?;

    let mut request = ApiRequest::new(step.method, &path);
    if let Some(body) = body {
        request = request.with_body(body);
    }
    if !step.auth {
        request = request.anonymous();
    }
    if let Some(secs) = step.timeout_secs {
        request = request.with_timeout(Duration::from_secs(secs));
    }

    let response = client.send(&request)?;

    if !step.expect.matches(response.status) {
        return Err(ProbeError::UnexpectedStatus {
            expected: step.expect.clone(),
            actual: response.status,
            body: response.snippet(),
        });
    }

    let json = if step.needs_json() {
        response.json()?
    } else {
        response.json().unwrap_or(Value::Null)
    };

    for check in &checks {
        check
            .evaluate(&json, &response.body, response.location.as_deref())
            .map_err(ProbeError::Check)?;
    }

    let mut captured = Vec::with_capacity(step.capture.len());
    for capture in &step.capture {
        let value = capture
            .resolve(&json)
            .ok_or_else(|| ProbeError::Capture {
                name: capture.name.clone(),
                tried: capture.from.join(", "),
            })?;
        captured.push((capture.name.clone(), value));
    }

    Ok(Assertion {
        status: response.status,
        elapsed: response.elapsed,
        captured,
    })
}
