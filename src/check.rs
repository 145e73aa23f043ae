//! Assertions on a response: body fields, raw text and the redirect target

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::error::ProbeError;
use crate::vars::Vars;

/// One assertion on a response.
///
/// Field paths are dotted (`user.id`, `hits.0.webformatURL`) or JSON
/// pointers (`/user/id`); the empty path is the whole document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Check {
    Present { field: String },
    NonEmpty { field: String },
    Equals { field: String, value: Value },
    Contains { field: String, text: String },
    BodyContains { text: String },
    BodyExcludes { text: String },
    LocationContains { text: String },
    LocationExcludes { text: String },
}

impl Check {
    pub fn present(field: &str) -> Self {
        Check::Present {
            field: field.to_string(),
        }
    }

    pub fn non_empty(field: &str) -> Self {
        Check::NonEmpty {
            field: field.to_string(),
        }
    }

    pub fn equals(field: &str, value: Value) -> Self {
        Check::Equals {
            field: field.to_string(),
            value,
        }
    }

    pub fn contains(field: &str, text: &str) -> Self {
        Check::Contains {
            field: field.to_string(),
            text: text.to_string(),
        }
    }

    pub fn body_contains(text: &str) -> Self {
        Check::BodyContains {
            text: text.to_string(),
        }
    }

    pub fn body_excludes(text: &str) -> Self {
        Check::BodyExcludes {
            text: text.to_string(),
        }
    }

    pub fn location_contains(text: &str) -> Self {
        Check::LocationContains {
            text: text.to_string(),
        }
    }

    pub fn location_excludes(text: &str) -> Self {
        Check::LocationExcludes {
            text: text.to_string(),
        }
    }

    /// Whether this check needs the body decoded as JSON
    pub fn needs_json(&self) -> bool {
        !matches!(
            self,
            Check::BodyContains { .. }
                | Check::BodyExcludes { .. }
                | Check::LocationContains { .. }
                | Check::LocationExcludes { .. }
        )
    }

    /// Substitute variables in the operands of the check
    pub fn render(&self, vars: &Vars) -> Result<Check, ProbeError> {
        Ok(match self {
            Check::Present { field } => Check::Present {
                field: vars.render(field)?,
            },
            Check::NonEmpty { field } => Check::NonEmpty {
                field: vars.render(field)?,
            },
            Check::Equals { field, value } => Check::Equals {
                field: vars.render(field)?,
                value: vars.render_value(value)?,
            },
            Check::Contains { field, text } => Check::Contains {
                field: vars.render(field)?,
                text: vars.render(text)?,
            },
            Check::BodyContains { text } => Check::BodyContains {
                text: vars.render(text)?,
            },
            Check::BodyExcludes { text } => Check::BodyExcludes {
                text: vars.render(text)?,
            },
            Check::LocationContains { text } => Check::LocationContains {
                text: vars.render(text)?,
            },
            Check::LocationExcludes { text } => Check::LocationExcludes {
                text: vars.render(text)?,
            },
        })
    }

    /// Evaluate against the decoded body (`json`), the raw body text and
    /// the `Location` header, if the response carried one
    pub fn evaluate(
        &self,
        json: &Value,
        raw: &str,
        location: Option<&str>,
    ) -> Result<(), String> {
        match self {
            Check::Present { field } => lookup(json, field)
                .map(|_| ())
                .ok_or_else(|| format!("field '{}' is missing", field)),
            Check::NonEmpty { field } => match lookup(json, field) {
                None => Err(format!("field '{}' is missing", field)),
                Some(value) if is_empty(value) => Err(format!("field '{}' is empty", field)),
                Some(_) => Ok(()),
            },
            Check::Equals { field, value } => match lookup(json, field) {
                None => Err(format!("field '{}' is missing", field)),
                Some(actual) if actual == value => Ok(()),
                Some(actual) => Err(format!(
                    "field '{}' is {}, expected {}",
                    field, actual, value
                )),
            },
            Check::Contains { field, text } => match lookup(json, field) {
                None => Err(format!("field '{}' is missing", field)),
                Some(Value::String(s)) if s.contains(text.as_str()) => Ok(()),
                Some(Value::Array(items))
                    if items.iter().any(|item| item.as_str() == Some(text.as_str())) =>
                {
                    Ok(())
                }
                Some(actual) => Err(format!(
                    "field '{}' ({}) does not contain '{}'",
                    field,
                    preview(actual),
                    text
                )),
            },
            Check::BodyContains { text } => {
                if raw.contains(text.as_str()) {
                    Ok(())
                } else {
                    Err(format!("response body does not contain '{}'", text))
                }
            }
            Check::BodyExcludes { text } => {
                if raw.contains(text.as_str()) {
                    Err(format!("response body still contains '{}'", text))
                } else {
                    Ok(())
                }
            }
            Check::LocationContains { text } => match location {
                None => Err("response has no Location header".to_string()),
                Some(target) if target.contains(text.as_str()) => Ok(()),
                Some(target) => Err(format!(
                    "Location '{}' does not contain '{}'",
                    target, text
                )),
            },
            Check::LocationExcludes { text } => match location {
                Some(target) if target.contains(text.as_str()) => {
                    Err(format!("Location '{}' contains '{}'", target, text))
                }
                _ => Ok(()),
            },
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Present { field } => write!(f, "{} is present", field),
            Check::NonEmpty { field } => write!(f, "{} is not empty", field),
            Check::Equals { field, value } => write!(f, "{} == {}", field, value),
            Check::Contains { field, text } => write!(f, "{} contains '{}'", field, text),
            Check::BodyContains { text } => write!(f, "body contains '{}'", text),
            Check::BodyExcludes { text } => write!(f, "body excludes '{}'", text),
            Check::LocationContains { text } => write!(f, "Location contains '{}'", text),
            Check::LocationExcludes { text } => write!(f, "Location excludes '{}'", text),
        }
    }
}

/// Convert a dotted field path into a JSON pointer
pub fn to_pointer(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        return path.to_string();
    }

    path.split('.')
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

pub fn lookup<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    json.pointer(&to_pointer(path))
}

/// Text form of a scalar JSON value; `None` for null, arrays and objects
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 60 {
        let head: String = text.chars().take(60).collect();
        format!("{}...", head)
    } else {
        text
    }
}
