//! Remediation hints derived from how a step failed
//!
//! Hints are suggestions keyed on the failure kind and status code; they
//! say where to look, not what is wrong.

use crate::error::ProbeError;

pub fn hint(error: &ProbeError) -> Option<&'static str> {
    match error {
        ProbeError::UnexpectedStatus { actual, .. } => status_hint(*actual),
        ProbeError::Timeout { .. } => Some(
            "The server did not answer in time; raise --timeout (or timeout_secs on the step) for slow endpoints such as generation.",
        ),
        ProbeError::Connection(_) => Some(
            "The host could not be reached; check the base URL, DNS and TLS, and that the deployment is up.",
        ),
        ProbeError::Decode(_) => Some(
            "The endpoint answered with something other than JSON, often an HTML error page from a proxy or a wrong base URL.",
        ),
        ProbeError::Capture { .. } => Some(
            "The response no longer has the expected shape, or the account has no data for this step yet.",
        ),
        ProbeError::Check(_) | ProbeError::Unresolved { .. } | ProbeError::InvalidRequest(_) => {
            None
        }
    }
}

fn status_hint(status: u16) -> Option<&'static str> {
    match status {
        400 | 422 => Some("The payload was rejected; compare the request body with what the endpoint validates."),
        401 => Some("The bearer token is missing, expired or rejected; check the credentials and --login-path."),
        403 => Some("The account is authenticated but not allowed to use this endpoint."),
        404 => Some("The route was not found; make sure the base URL includes the /api prefix."),
        405 => Some("The route exists but not for this HTTP method."),
        429 => Some("The server is rate limiting; wait before running the suite again."),
        500..=599 => Some("The server failed while handling the request; check the backend logs around this time."),
        _ => None,
    }
}
