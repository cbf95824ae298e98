use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConsoleError;

/// HTTP verbs the console can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PATCH" => Ok(HttpMethod::Patch),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(ConsoleError::InvalidParameter(format!(
                "unsupported HTTP method: {}",
                other
            ))),
        }
    }
}

/// Placeholder name -> substitution value, supplied per invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMap(BTreeMap<String, String>);

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Numbers and other displayable values are
    /// stored in their textual form.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` on top of `self`; keys in `other` win.
    pub fn merged(mut self, other: &ParameterMap) -> Self {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
        self
    }

    /// Parse a `key=value` pair as typed on the command line
    pub fn parse_pair(raw: &str) -> Result<(String, String), ConsoleError> {
        match raw.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(ConsoleError::InvalidParameter(format!(
                "expected key=value, got '{}'",
                raw
            ))),
        }
    }
}

/// A canned invocation: what the console sends when an operation is
/// triggered without operator-supplied values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleInvocation {
    pub method: HttpMethod,
    pub body: Option<serde_json::Value>,
    pub params: ParameterMap,
}

/// Static definition of one callable API endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub id: usize,
    pub path_template: String,
    pub default_method: HttpMethod,
    pub label: String,
    pub sample: SampleInvocation,
}

impl OperationDescriptor {
    /// Placeholder names in template order, duplicates included
    pub fn placeholders(&self) -> Vec<String> {
        crate::registry::placeholder_names(&self.path_template)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationStatus {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl InvocationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, InvocationStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InvocationStatus::Succeeded | InvocationStatus::Failed)
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InvocationStatus::Idle => "idle",
            InvocationStatus::Pending => "pending",
            InvocationStatus::Succeeded => "succeeded",
            InvocationStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// What the last settled invocation left behind for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Empty,
    /// Any HTTP response, whatever its status code. `body` is the
    /// response re-serialized as indented JSON.
    Response { status: u16, body: String },
    Error(String),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => Ok(()),
            Payload::Response { body, .. } => f.write_str(body),
            Payload::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Per-operation observable state.
///
/// Fields are private so the status/payload pairing can only be produced
/// through the constructors: Idle carries no payload, Succeeded carries a
/// response, Failed carries an error, and Pending keeps whatever the
/// previous settlement left so the old output stays on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationState {
    status: InvocationStatus,
    payload: Payload,
}

impl InvocationState {
    pub fn idle() -> Self {
        Self {
            status: InvocationStatus::Idle,
            payload: Payload::Empty,
        }
    }

    pub fn pending(previous: &InvocationState) -> Self {
        Self {
            status: InvocationStatus::Pending,
            payload: previous.payload.clone(),
        }
    }

    pub fn succeeded(status: u16, body: String) -> Self {
        Self {
            status: InvocationStatus::Succeeded,
            payload: Payload::Response { status, body },
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: InvocationStatus::Failed,
            payload: Payload::Error(message.into()),
        }
    }

    pub fn status(&self) -> InvocationStatus {
        self.status
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl Default for InvocationState {
    fn default() -> Self {
        Self::idle()
    }
}
