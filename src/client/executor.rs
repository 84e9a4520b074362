use crate::client::audience::{CredentialKind, HostFamily};
use crate::client::envelope::{OriginRequest, RequestBody, ResultEnvelope};
use crate::client::transport::HttpTransport;
use crate::constants::{limits::LOG_BODY_LENGTH, network::DEFAULT_CONTENT_TYPE};
use crate::errors::ClientError;
use crate::services::config::ClientConfig;
use crate::services::logger::Logger;
use crate::services::token::TokenProvider;
use crate::utils::redact::{redact_headers, redact_text};
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub host: HostFamily,
    pub method: Method,
    pub path: String,
    pub content_type: String,
    pub payload: Option<Value>,
    pub raw_body: Option<Bytes>,
    pub query: Vec<(String, String)>,
    pub credential: CredentialKind,
    pub return_raw: bool,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(host: HostFamily, method: Method, path: impl Into<String>) -> Self {
        Self {
            host,
            method,
            path: path.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            payload: None,
            raw_body: None,
            query: Vec::new(),
            credential: CredentialKind::default(),
            return_raw: false,
            timeout: None,
        }
    }

    pub fn get(host: HostFamily, path: impl Into<String>) -> Self {
        Self::new(host, Method::GET, path)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_raw_body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        self.content_type = content_type.to_string();
        self.raw_body = Some(body.into());
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_credential(mut self, credential: CredentialKind) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn raw(mut self) -> Self {
        self.return_raw = true;
        self
    }
}

/// Issues single HTTP exchanges. Transport failures come back as failure
/// envelopes; only validation and authentication problems are `Err`.
#[derive(Clone)]
pub struct RequestExecutor {
    logger: Logger,
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenProvider>,
}

impl RequestExecutor {
    pub fn new(
        logger: Logger,
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            logger: logger.child("http"),
            config: Arc::new(config),
            transport,
            tokens,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn execute(&self, request: ApiRequest) -> Result<ResultEnvelope, ClientError> {
        if request.payload.is_some() && request.raw_body.is_some() {
            return Err(ClientError::invalid_params(
                "Cannot provide both a JSON payload and a raw body",
            )
            .with_hint("Use one or the other."));
        }
        if let Some(payload) = request.payload.as_ref() {
            if !payload.is_object() {
                return Err(ClientError::invalid_params("Payload must be a JSON object"));
            }
        }

        let url = self.build_url(&request)?;

        let token = self.tokens.token(request.host, request.credential).await?;
        if token.trim().is_empty() {
            return Err(ClientError::authentication(
                "Failed to retrieve token. Ensure that authentication is set up correctly.",
            ));
        }

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), request.content_type.clone());
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));

        let body = match (request.raw_body, request.payload) {
            (Some(bytes), _) => RequestBody::Raw(bytes),
            (None, Some(payload)) => RequestBody::Json(payload),
            (None, None) => RequestBody::Json(Value::Object(serde_json::Map::new())),
        };

        let origin = OriginRequest {
            method: request.method,
            url,
            headers,
            body,
            timeout: request.timeout.unwrap_or(self.config.timeout),
        };

        self.logger.info(
            &format!("Making {} request to {}", origin.method, origin.url),
            None,
        );
        self.logger.debug(
            "Request headers",
            Some(&serde_json::json!({ "headers": redact_headers(&origin.headers) })),
        );
        if let RequestBody::Json(payload) = &origin.body {
            if payload.as_object().is_some_and(|map| !map.is_empty()) {
                self.logger.debug(
                    "Request payload",
                    Some(&serde_json::json!({
                        "payload": redact_text(&payload.to_string(), LOG_BODY_LENGTH),
                    })),
                );
            }
        }

        Ok(self.send(origin, request.return_raw).await)
    }

    pub async fn follow(&self, origin: &OriginRequest, url: &str) -> ResultEnvelope {
        self.send(origin.follow_up(url), false).await
    }

    async fn send(&self, origin: OriginRequest, return_raw: bool) -> ResultEnvelope {
        match self.transport.send(&origin).await {
            Ok(response) => {
                self.logger.debug(
                    "Response received",
                    Some(&serde_json::json!({
                        "method": origin.method.as_str(),
                        "url": origin.url,
                        "status": response.status,
                    })),
                );
                ResultEnvelope::from_response(response, origin, return_raw)
            }
            Err(err) => {
                let envelope = ResultEnvelope::from_transport_error(&err, origin);
                self.logger.debug(
                    "Transport failure",
                    Some(&serde_json::json!({
                        "status": envelope.status_code,
                        "error": redact_text(envelope.error_text(), LOG_BODY_LENGTH),
                    })),
                );
                envelope
            }
        }
    }

    fn build_url(&self, request: &ApiRequest) -> Result<String, ClientError> {
        let base = self.config.base_url(request.host).trim_end_matches('/');
        let path = request.path.trim();
        let mut url = if path.is_empty() || path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        };
        if !request.query.is_empty() {
            let query = serde_urlencoded::to_string(&request.query).map_err(|err| {
                ClientError::invalid_params(format!("Invalid query parameters: {}", err))
            })?;
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }
}
