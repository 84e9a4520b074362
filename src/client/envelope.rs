use crate::client::transport::{TransportError, TransportResponse};
use crate::constants::{pagination, transport_status};
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Raw(Bytes),
}

#[derive(Debug, Clone)]
pub struct OriginRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl OriginRequest {
    pub fn follow_up(&self, url: &str) -> OriginRequest {
        OriginRequest {
            method: Method::GET,
            url: url.to_string(),
            headers: self.headers.clone(),
            body: RequestBody::Empty,
            timeout: self.timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultEnvelope {
    pub success: bool,
    pub status_code: u16,
    pub data: Option<Value>,
    pub headers: Option<BTreeMap<String, String>>,
    pub error: Option<String>,
    pub origin: Option<OriginRequest>,
    pub raw: Option<TransportResponse>,
}

impl ResultEnvelope {
    pub fn failure(
        status_code: u16,
        error: impl Into<String>,
        origin: Option<OriginRequest>,
    ) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = format!("Request failed with status {}", status_code);
        }
        Self {
            success: false,
            status_code,
            data: None,
            headers: None,
            error: Some(error),
            origin,
            raw: None,
        }
    }

    pub fn from_transport_error(err: &TransportError, origin: OriginRequest) -> Self {
        let (status, message) = match err {
            TransportError::Timeout => (
                transport_status::TIMEOUT,
                format!("Request timeout after {:?}", origin.timeout),
            ),
            TransportError::Connect(detail) => (
                transport_status::CONNECTION,
                format!("Connection error: {}", detail),
            ),
            TransportError::Other(detail) => (
                transport_status::OTHER,
                format!("Request failed: {}", detail),
            ),
        };
        Self::failure(status, message, Some(origin))
    }

    pub fn from_response(
        response: TransportResponse,
        origin: OriginRequest,
        return_raw: bool,
    ) -> Self {
        let success = (200..300).contains(&response.status);
        if return_raw {
            let mut envelope = if success {
                Self {
                    success,
                    status_code: response.status,
                    data: None,
                    headers: Some(response.headers.clone()),
                    error: None,
                    origin: Some(origin),
                    raw: None,
                }
            } else {
                Self::failure(response.status, failure_text(&response), Some(origin))
            };
            envelope.raw = Some(response);
            return envelope;
        }
        if !success {
            return Self::failure(response.status, failure_text(&response), Some(origin));
        }
        // An undecodable body still counts as success, just without data.
        let data = if response.body.is_empty() {
            None
        } else {
            serde_json::from_slice::<Value>(&response.body).ok()
        };
        Self {
            success,
            status_code: response.status,
            data,
            headers: Some(response.headers),
            error: None,
            origin: Some(origin),
            raw: None,
        }
    }

    pub fn paginated(
        items: Vec<Value>,
        headers: Option<BTreeMap<String, String>>,
        origin: Option<OriginRequest>,
    ) -> Self {
        let mut data = serde_json::Map::new();
        data.insert(pagination::VALUE_FIELD.to_string(), Value::Array(items));
        Self {
            success: true,
            status_code: 200,
            data: Some(Value::Object(data)),
            headers,
            error: None,
            origin,
            raw: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(&name))
            .map(String::as_str)
    }

    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}

fn failure_text(response: &TransportResponse) -> String {
    let text = String::from_utf8_lossy(&response.body);
    if !text.trim().is_empty() {
        return text.into_owned();
    }
    StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
        .to_string()
}
