use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientErrorKind {
    InvalidParams,
    Configuration,
    Authentication,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Configuration, "CONFIGURATION", message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Authentication, "AUTHENTICATION", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Internal, "INTERNAL", message)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hint.as_deref() {
            Some(hint) => write!(f, "{} ({})", self.message, hint),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for ClientError {}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::configuration(format!("Invalid JSON: {}", err))
    }
}
