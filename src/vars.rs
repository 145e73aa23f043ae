//! Run-scoped variable table and `${name}` templating
//!
//! Values captured from one response (note ids, image URLs, ...) are fed
//! into the paths, bodies and checks of later steps.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ProbeError;

#[derive(Clone, Default)]
pub struct Vars {
    values: BTreeMap<String, String>,
}

/// Lists variable names only; the table holds the login password
impl fmt::Debug for Vars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Substitute every `${name}` in `template`.
    ///
    /// A `${...}` whose content is not a valid identifier is left untouched.
    pub fn render(&self, template: &str) -> Result<String, ProbeError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };

            let name = &after[..end];
            if is_identifier(name) {
                let value = self.get(name).ok_or_else(|| ProbeError::Unresolved {
                    name: name.to_string(),
                })?;
                out.push_str(value);
            } else {
                out.push_str(&rest[start..start + 2 + end + 1]);
            }
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Render every string inside a JSON value. Object keys are kept as-is.
    pub fn render_value(&self, value: &Value) -> Result<Value, ProbeError> {
        Ok(match value {
            Value::String(s) => Value::String(self.render(s)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.render_value(item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let mut rendered = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    rendered.insert(key.clone(), self.render_value(item)?);
                }
                Value::Object(rendered)
            }
            other => other.clone(),
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
