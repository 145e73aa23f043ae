//! Login against the API and extraction of the bearer token

use serde_json::{Value, json};
use std::fmt;

use crate::check::{lookup, scalar_text};
use crate::client::{ApiClient, ApiRequest, Method};
use crate::error::ProbeError;
use crate::step::StatusSet;

pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

const TOKEN_FIELDS: &[&str] = &["access_token", "token"];
const USER_ID_FIELDS: &[&str] = &["user_id", "user.id", "user.user_id"];

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Option<String>,
}

/// Exchange credentials for a bearer token.
///
/// The caller decides whether to attach the token to the client.
pub fn login(
    client: &ApiClient,
    login_path: &str,
    credentials: &Credentials,
) -> Result<Session, ProbeError> {
    let request = ApiRequest::new(Method::Post, login_path)
        .with_body(json!({
            "email": credentials.email,
            "password": credentials.password,
        }))
        .anonymous();

    let response = client.send(&request)?;
    if response.status != 200 {
        return Err(ProbeError::UnexpectedStatus {
            expected: StatusSet::single(200),
            actual: response.status,
            body: response.snippet(),
        });
    }

    parse_session(&response.json()?)
}

fn parse_session(json: &Value) -> Result<Session, ProbeError> {
    let token = TOKEN_FIELDS
        .iter()
        .filter_map(|field| json.get(field).and_then(Value::as_str))
        .find(|token| !token.is_empty())
        .ok_or_else(|| {
            ProbeError::Check(format!(
                "login response has no token (looked for {})",
                TOKEN_FIELDS.join(", ")
            ))
        })?;

    let user_id = USER_ID_FIELDS
        .iter()
        .find_map(|field| lookup(json, field).and_then(scalar_text));

    Ok(Session {
        token: token.to_string(),
        user_id,
    })
}
