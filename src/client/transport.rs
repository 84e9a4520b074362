use crate::client::envelope::{OriginRequest, RequestBody};
use crate::constants::network::USER_AGENT;
use crate::errors::ClientError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout,
    Connect(String),
    Other(String),
}

impl TransportError {
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout;
        }
        if err.is_connect() {
            return TransportError::Connect(err.to_string());
        }
        TransportError::Other(err.to_string())
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &OriginRequest) -> Result<TransportResponse, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| {
                ClientError::internal(format!("Failed to build HTTP client: {}", err))
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, TransportError> {
    let mut out = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| TransportError::Other(format!("Invalid header name: {}", key)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::Other(format!("Invalid header value for {}", key)))?;
        out.insert(name, value);
    }
    Ok(out)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &OriginRequest) -> Result<TransportResponse, TransportError> {
        let mut req = self
            .client
            .request(request.method.clone(), request.url.as_str())
            .headers(to_header_map(&request.headers)?)
            .timeout(request.timeout);
        match &request.body {
            RequestBody::Empty => {}
            RequestBody::Json(value) => {
                let body = serde_json::to_vec(value)
                    .map_err(|err| TransportError::Other(err.to_string()))?;
                req = req.body(body);
            }
            RequestBody::Raw(bytes) => {
                req = req.body(bytes.clone());
            }
        }

        let response = req.send().await.map_err(|err| TransportError::classify(&err))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::classify(&err))?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
