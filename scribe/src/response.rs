//! The `{success, message, data}` shape returned by the services

use scribe_core::{Envelope, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
    pub data: Json,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            success: false,
            message: String::new(),
            data: Json::Array(Vec::new()),
        }
    }
}

impl Response {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Json) -> Self {
        self.data = data;
        self
    }
}

/// Check that every `required` parameter is present.
///
/// Returns the failure response naming the missing parameters.
pub(crate) fn require(params: &[(&str, bool)]) -> Result<(), Response> {
    let missing: Vec<&str> = params
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        let message = format!("({}) required but missing!", missing.join(", "));
        tracing::error!("{}", message);
        Err(Response::fail(message))
    }
}

/// Check that at least one of `params` is present
pub(crate) fn require_either(params: &[(&str, bool)]) -> Result<(), Response> {
    if params.iter().any(|(_, present)| *present) {
        Ok(())
    } else {
        let names: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
        let message = format!("Either ({}) is required but missing!", names.join(", "));
        tracing::error!("{}", message);
        Err(Response::fail(message))
    }
}

/// Turn a failed gateway envelope into an error
pub(crate) fn ensure(envelope: Envelope) -> AuthResult<Envelope> {
    if envelope.success {
        Ok(envelope)
    } else {
        Err(AuthError::Database(envelope.message))
    }
}

/// Integer column; numeric strings are accepted too
pub(crate) fn row_i64(row: &Row, column: &str) -> Option<i64> {
    match row.get(column)? {
        Json::Number(n) => n.as_i64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn row_str<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column)?.as_str()
}
