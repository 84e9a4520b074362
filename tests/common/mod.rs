#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use fabricops::services::config::ClientConfig;
use fabricops::services::logger::{LogLevel, Logger};
use fabricops::services::token::StaticTokenProvider;
use fabricops::{
    HttpTransport, OriginRequest, PollPolicy, RequestExecutor, TransportError, TransportResponse,
};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FABRIC_BASE: &str = "https://fabric.test/v1";
pub const POWERBI_BASE: &str = "https://powerbi.test/v1.0/myorg";
pub const TOKEN: &str = "test-token-0123456789";

/// Replays scripted responses in order and records every request.
#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<OriginRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Result<TransportResponse, TransportError>) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push(Ok(json_response(status, body)));
    }

    pub fn push_error(&self, err: TransportError) {
        self.push(Err(err));
    }

    pub fn requests(&self) -> Vec<OriginRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: &OriginRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
    }
}

pub fn json_response(status: u16, body: Value) -> TransportResponse {
    TransportResponse {
        status,
        headers: BTreeMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

pub fn text_response(status: u16, body: &str) -> TransportResponse {
    TransportResponse {
        status,
        headers: BTreeMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

pub fn accepted(location: &str) -> TransportResponse {
    let mut headers = BTreeMap::new();
    headers.insert("location".to_string(), location.to_string());
    headers.insert("retry-after".to_string(), "5".to_string());
    TransportResponse {
        status: 202,
        headers,
        body: Bytes::new(),
    }
}

pub fn status_body(status: &str) -> Value {
    serde_json::json!({ "status": status, "percentComplete": 50 })
}

pub fn quiet_logger() -> Logger {
    Logger::with_level("test", LogLevel::Error)
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        fabric_base_url: FABRIC_BASE.to_string(),
        powerbi_base_url: POWERBI_BASE.to_string(),
        timeout: Duration::from_secs(30),
        poll: PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts: 10,
        },
        max_pages: 100,
    }
}

pub fn executor_with(transport: Arc<FakeTransport>, logger: Logger) -> RequestExecutor {
    RequestExecutor::new(
        logger,
        test_config(),
        transport,
        Arc::new(StaticTokenProvider::uniform(TOKEN)),
    )
}

pub fn executor(transport: Arc<FakeTransport>) -> RequestExecutor {
    executor_with(transport, quiet_logger())
}
