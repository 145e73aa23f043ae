//! Failure taxonomy for a single probe step

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::step::StatusSet;

/// Coarse classification of a failed step, used for hints and JSON output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Status,
    Check,
    Decode,
    Timeout,
    Connection,
    Capture,
    InvalidRequest,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Status => "status",
            FailureKind::Check => "check",
            FailureKind::Decode => "decode",
            FailureKind::Timeout => "timeout",
            FailureKind::Connection => "connection",
            FailureKind::Capture => "capture",
            FailureKind::InvalidRequest => "invalid_request",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("request timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("expected HTTP {expected}, got {actual}")]
    UnexpectedStatus {
        expected: StatusSet,
        actual: u16,
        body: String,
    },

    #[error("response is not valid JSON: {0}")]
    Decode(String),

    #[error("{0}")]
    Check(String),

    #[error("could not capture '{name}' from response (tried {tried})")]
    Capture { name: String, tried: String },

    #[error("unknown variable '${{{name}}}'")]
    Unresolved { name: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ProbeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Timeout { .. } => FailureKind::Timeout,
            ProbeError::Connection(_) => FailureKind::Connection,
            ProbeError::UnexpectedStatus { .. } => FailureKind::Status,
            ProbeError::Decode(_) => FailureKind::Decode,
            ProbeError::Check(_) => FailureKind::Check,
            ProbeError::Capture { .. } => FailureKind::Capture,
            ProbeError::Unresolved { .. } | ProbeError::InvalidRequest(_) => {
                FailureKind::InvalidRequest
            }
        }
    }

    /// HTTP status observed before the failure, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ProbeError::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    /// Raw response text worth showing next to the error
    pub fn response_text(&self) -> Option<&str> {
        match self {
            ProbeError::UnexpectedStatus { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}
