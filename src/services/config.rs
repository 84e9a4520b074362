use crate::client::audience::HostFamily;
use crate::client::lro::PollPolicy;
use crate::constants::{hosts, lro, network, pagination};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub fabric_base_url: String,
    pub powerbi_base_url: String,
    pub timeout: Duration,
    pub poll: PollPolicy,
    pub max_pages: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            fabric_base_url: hosts::FABRIC_API.to_string(),
            powerbi_base_url: hosts::POWERBI_API.to_string(),
            timeout: Duration::from_millis(network::TIMEOUT_API_REQUEST_MS),
            poll: PollPolicy::default(),
            max_pages: pagination::MAX_PAGES,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(name: &str) -> Option<u64> {
    env_string(name).and_then(|v| v.parse::<u64>().ok())
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fabric_base_url: env_string("FABRICOPS_FABRIC_API_URL")
                .unwrap_or(defaults.fabric_base_url),
            powerbi_base_url: env_string("FABRICOPS_POWERBI_API_URL")
                .unwrap_or(defaults.powerbi_base_url),
            timeout: env_u64("FABRICOPS_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            poll: PollPolicy {
                interval: Duration::from_millis(
                    env_u64("FABRICOPS_LRO_INTERVAL_MS").unwrap_or(lro::POLL_INTERVAL_MS),
                ),
                max_attempts: env_u64("FABRICOPS_LRO_MAX_ATTEMPTS")
                    .filter(|n| *n > 0)
                    .map(|n| n as usize)
                    .unwrap_or(lro::MAX_ATTEMPTS),
            },
            max_pages: env_u64("FABRICOPS_MAX_PAGES")
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .unwrap_or(defaults.max_pages),
        }
    }

    pub fn base_url(&self, host: HostFamily) -> &str {
        match host {
            HostFamily::Fabric => &self.fabric_base_url,
            HostFamily::PowerBi => &self.powerbi_base_url,
        }
    }

    pub fn with_base_url(mut self, host: HostFamily, url: &str) -> Self {
        match host {
            HostFamily::Fabric => self.fabric_base_url = url.to_string(),
            HostFamily::PowerBi => self.powerbi_base_url = url.to_string(),
        }
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }
}
