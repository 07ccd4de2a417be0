//! User-facing notices
//!
//! Failed requests never abort the program with a raw error. They are turned
//! into a [`Notice`]: one or more short messages, a severity, and whether the
//! user should sign in again.

use serde_json::Value;

use crate::core::api::ApiError;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Success => write!(f, "success"),
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub messages: Vec<String>,
    /// The session is no longer valid; point the user at `drx login`
    pub login_hint: bool,
}

impl Notice {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            messages: vec![message.into()],
            login_hint: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    /// Translate a failed request into messages for the user
    pub fn from_api_error(error: &ApiError) -> Self {
        match error {
            ApiError::Transport(_) => {
                Self::new(Level::Error, "Could not reach server. Check the API URL and try again")
            }
            ApiError::Unauthorized { .. } => Self {
                level: Level::Warning,
                messages: vec!["User does not exist or unauthorized".to_string()],
                login_hint: true,
            },
            ApiError::BadRequest { body } => {
                let parsed = serde_json::from_str::<Value>(body).ok();
                let mut messages = Vec::new();
                let headline = parsed
                    .as_ref()
                    .and_then(|v| v.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let details = parsed.as_ref().map(field_errors).unwrap_or_default();

                match headline {
                    Some(message) => messages.push(message),
                    None if details.is_empty() && !body.trim().is_empty() => {
                        messages.push(body.trim().to_string())
                    }
                    None if details.is_empty() => messages.push("Request rejected".to_string()),
                    None => {}
                }
                messages.extend(details);
                Self {
                    level: Level::Warning,
                    messages,
                    login_hint: false,
                }
            }
            ApiError::Server { status, body } => {
                let details = serde_json::from_str::<Value>(body)
                    .map(|v| field_errors(&v))
                    .unwrap_or_default();
                let messages = if !details.is_empty() {
                    details
                } else if !body.trim().is_empty() {
                    vec![body.trim().to_string()]
                } else {
                    vec![format!("Server returned status {}", status)]
                };
                Self {
                    level: Level::Warning,
                    messages,
                    login_hint: false,
                }
            }
            ApiError::Decode(detail) => Self::new(
                Level::Error,
                format!("Unexpected response from server: {}", detail),
            ),
        }
    }
}

/// Messages of an `errors` member: an array of `{description}` objects, or an
/// object mapping field names to lists of messages
fn field_errors(body: &Value) -> Vec<String> {
    match body.get("errors") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => other
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect(),
        Some(Value::Object(fields)) => fields
            .values()
            .filter_map(|messages| match messages {
                Value::Array(list) => list.first().and_then(Value::as_str).map(str::to_string),
                Value::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
