//! Blocking HTTP client for the target API
//!
//! Wraps a `ureq` agent with the base URL, the default timeout and the
//! bearer token obtained at login. Non-2xx statuses are returned as
//! responses, not errors, so callers can assert on them; redirects are
//! not followed for the same reason.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use ureq::typestate::WithBody;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::ProbeError;

pub const USER_AGENT: &str = concat!("cmprobe/", env!("CARGO_PKG_VERSION"));

/// Longest slice of a response body kept for diagnostics
const SNIPPET_CHARS: usize = 300;

/// HTTP methods the probes use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Patch => write!(f, "PATCH"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(format!(
                "Unknown method '{}'. Supported: GET, POST, PUT, PATCH, DELETE",
                s
            )),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single outgoing request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub authenticated: bool,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            body: None,
            authenticated: true,
            timeout: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Send without the bearer token even when one is held
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What came back from the server
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub location: Option<String>,
    pub elapsed: Duration,
}

impl ApiResponse {
    pub fn json(&self) -> Result<Value, ProbeError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ProbeError::Decode(format!("{} (body: {})", e, self.snippet())))
    }

    /// Response text truncated for display
    pub fn snippet(&self) -> String {
        let text = self.body.trim();
        if text.chars().count() > SNIPPET_CHARS {
            let head: String = text.chars().take(SNIPPET_CHARS).collect();
            format!("{}...", head)
        } else {
            text.to_string()
        }
    }
}

pub struct ApiClient {
    agent: Agent,
    base_url: String,
    timeout: Duration,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            agent: build_agent(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach a bearer token to every authenticated request from now on
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ProbeError> {
        let url = self.url(&request.path);
        let timeout = request.timeout.unwrap_or(self.timeout);

        // Per-step timeouts get their own agent; the shared one keeps the default
        let dedicated;
        let agent = if timeout == self.timeout {
            &self.agent
        } else {
            dedicated = build_agent(timeout);
            &dedicated
        };

        debug!(method = %request.method, path = %request.path, "sending request");
        let payload = request.body.as_ref().map(Value::to_string);
        let authenticated = request.authenticated;
        let started = Instant::now();

        let result = match request.method {
            Method::Get => self.decorate(agent.get(&url), authenticated).call(),
            Method::Delete => self.decorate(agent.delete(&url), authenticated).call(),
            Method::Post => send_with_body(
                self.decorate(agent.post(&url), authenticated),
                payload.as_deref(),
            ),
            Method::Put => send_with_body(
                self.decorate(agent.put(&url), authenticated),
                payload.as_deref(),
            ),
            Method::Patch => send_with_body(
                self.decorate(agent.patch(&url), authenticated),
                payload.as_deref(),
            ),
        };

        let response = result.map_err(|e| transport_error(e, timeout))?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .into_body()
            .read_to_vec()
            .map_err(|e| transport_error(e, timeout))?;
        let elapsed = started.elapsed();

        debug!(
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "received response"
        );
        trace!(bytes = bytes.len(), "response body read");

        Ok(ApiResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            location,
            elapsed,
        })
    }

    fn decorate<B>(&self, builder: RequestBuilder<B>, authenticated: bool) -> RequestBuilder<B> {
        let builder = builder
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json");

        match (&self.token, authenticated) {
            (Some(token), true) => builder.header("Authorization", format!("Bearer {}", token)),
            _ => builder,
        }
    }
}

fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .max_redirects(0)
        .max_redirects_will_error(false)
        .build()
        .into()
}

fn send_with_body(
    builder: RequestBuilder<WithBody>,
    payload: Option<&str>,
) -> Result<ureq::http::Response<Body>, ureq::Error> {
    match payload {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .send(json),
        None => builder.send_empty(),
    }
}

fn transport_error(err: ureq::Error, timeout: Duration) -> ProbeError {
    match err {
        ureq::Error::Timeout(_) => ProbeError::Timeout { after: timeout },
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            ProbeError::Timeout { after: timeout }
        }
        ureq::Error::BadUri(uri) => ProbeError::InvalidRequest(format!("bad URI: {}", uri)),
        ureq::Error::Http(e) => ProbeError::InvalidRequest(e.to_string()),
        other => ProbeError::Connection(other.to_string()),
    }
}
