use crate::client::envelope::ResultEnvelope;
use crate::client::executor::RequestExecutor;
use crate::constants::lro::{
    LOCATION_HEADER, MAX_ATTEMPTS, POLL_INTERVAL_MS, RESULT_SUFFIX, STATUS_FIELD,
};
use crate::constants::{limits::LOG_BODY_LENGTH, transport_status};
use crate::services::logger::Logger;
use crate::utils::text::body_preview;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Undefined,
}

impl OperationStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("NotStarted") => OperationStatus::NotStarted,
            Some("Running") => OperationStatus::Running,
            Some("Succeeded") => OperationStatus::Succeeded,
            Some("Failed") => OperationStatus::Failed,
            _ => OperationStatus::Undefined,
        }
    }

    pub fn from_body(body: &Value) -> Self {
        Self::parse(body.get(STATUS_FIELD).and_then(Value::as_str))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationStatus::NotStarted => "NotStarted",
            OperationStatus::Running => "Running",
            OperationStatus::Succeeded => "Succeeded",
            OperationStatus::Failed => "Failed",
            OperationStatus::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-interval polling, bounded by attempt count rather than wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: usize,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(POLL_INTERVAL_MS),
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PollOutcome {
    Passthrough(ResultEnvelope),
    Completed(ResultEnvelope),
    Failed {
        status: OperationStatus,
        attempt: usize,
        envelope: ResultEnvelope,
    },
    Errored {
        attempt: usize,
        envelope: ResultEnvelope,
    },
    TimedOut {
        attempts: usize,
        envelope: ResultEnvelope,
    },
}

impl PollOutcome {
    pub fn envelope(&self) -> &ResultEnvelope {
        match self {
            PollOutcome::Passthrough(envelope) | PollOutcome::Completed(envelope) => envelope,
            PollOutcome::Failed { envelope, .. }
            | PollOutcome::Errored { envelope, .. }
            | PollOutcome::TimedOut { envelope, .. } => envelope,
        }
    }

    pub fn into_envelope(self) -> ResultEnvelope {
        match self {
            PollOutcome::Passthrough(envelope) | PollOutcome::Completed(envelope) => envelope,
            PollOutcome::Failed { envelope, .. }
            | PollOutcome::Errored { envelope, .. }
            | PollOutcome::TimedOut { envelope, .. } => envelope,
        }
    }

    pub fn is_success(&self) -> bool {
        self.envelope().success
    }
}

#[derive(Clone)]
pub struct OperationPoller {
    logger: Logger,
    executor: RequestExecutor,
    policy: PollPolicy,
}

impl OperationPoller {
    pub fn new(executor: RequestExecutor) -> Self {
        let policy = executor.config().poll;
        Self {
            logger: executor.logger().child("lro"),
            executor,
            policy,
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub async fn poll(&self, initial: ResultEnvelope) -> ResultEnvelope {
        self.poll_outcome(initial).await.into_envelope()
    }

    pub async fn poll_outcome(&self, initial: ResultEnvelope) -> PollOutcome {
        let Some(location) = initial.header(LOCATION_HEADER).map(str::to_string) else {
            return PollOutcome::Passthrough(initial);
        };
        let Some(origin) = initial.origin.clone() else {
            return PollOutcome::Errored {
                attempt: 0,
                envelope: ResultEnvelope::failure(
                    transport_status::OTHER,
                    "Long-running operation has no originating request to poll with",
                    None,
                ),
            };
        };
        self.logger.debug(
            "Long-running operation detected",
            Some(&serde_json::json!({ "location": location })),
        );

        let attempts = self.policy.max_attempts.max(1);
        let mut last_status_code = initial.status_code;

        for attempt in 1..=attempts {
            let state = self.executor.follow(&origin, &location).await;
            if !state.success {
                let message = format!(
                    "Operation polling failed at attempt {}: {}",
                    attempt,
                    state.error_text()
                );
                return PollOutcome::Errored {
                    attempt,
                    envelope: ResultEnvelope::failure(state.status_code, message, Some(origin)),
                };
            }
            let Some(body) = state.data.as_ref() else {
                return PollOutcome::Errored {
                    attempt,
                    envelope: ResultEnvelope::failure(
                        transport_status::OTHER,
                        format!(
                            "Operation polling failed at attempt {}: status body is empty or not JSON",
                            attempt
                        ),
                        Some(origin),
                    ),
                };
            };

            let status = OperationStatus::from_body(body);
            self.logger.debug(
                "Operation state",
                Some(&serde_json::json!({ "attempt": attempt, "status": status.as_str() })),
            );

            match status {
                OperationStatus::Succeeded => {
                    let result_url =
                        format!("{}{}", location.trim_end_matches('/'), RESULT_SUFFIX);
                    let result = self.executor.follow(&origin, &result_url).await;
                    if result.success {
                        return PollOutcome::Completed(result);
                    }
                    let message = format!(
                        "Failed to get operation result: {}",
                        result.error_text()
                    );
                    return PollOutcome::Errored {
                        attempt,
                        envelope: ResultEnvelope::failure(
                            result.status_code,
                            message,
                            Some(origin),
                        ),
                    };
                }
                OperationStatus::Failed | OperationStatus::Undefined => {
                    let detail = body.to_string();
                    self.logger.warn(
                        &format!("Operation finished with status {}", status),
                        Some(&serde_json::json!({
                            "attempt": attempt,
                            "body": body_preview(detail.as_bytes(), LOG_BODY_LENGTH),
                        })),
                    );
                    let message = format!(
                        "Operation finished with status {} at attempt {}: {}",
                        status, attempt, detail
                    );
                    return PollOutcome::Failed {
                        status,
                        attempt,
                        envelope: ResultEnvelope::failure(state.status_code, message, Some(origin)),
                    };
                }
                OperationStatus::Running | OperationStatus::NotStarted => {
                    last_status_code = state.status_code;
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.interval).await;
                    }
                }
            }
        }

        self.logger.warn(
            "Long-running operation did not finish",
            Some(&serde_json::json!({ "attempts": attempts, "location": location })),
        );
        PollOutcome::TimedOut {
            attempts,
            envelope: ResultEnvelope::failure(
                last_status_code,
                format!("Max retries exceeded after {} attempts", attempts),
                Some(origin),
            ),
        }
    }
}
