use crate::client::audience::CredentialKind;
use crate::client::envelope::ResultEnvelope;
use crate::client::executor::{ApiRequest, RequestExecutor};
use crate::client::lro::OperationPoller;
use crate::client::pagination::PaginationContinuer;
use crate::constants::{limits::LOG_BODY_LENGTH, pagination::VALUE_FIELD};
use crate::errors::ClientError;
use crate::managers::endpoints::{EndpointRegistry, EndpointTemplate};
use crate::services::logger::Logger;
use crate::utils::redact::redact_text;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    fn requires_item_id(self) -> bool {
        matches!(self, Operation::Get | Operation::Update | Operation::Delete)
    }

    fn may_start_operation(self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Target {
    pub scope_id: Option<String>,
    pub item_id: Option<String>,
}

impl Target {
    pub fn new(scope_id: Option<&str>, item_id: Option<&str>) -> Self {
        Self {
            scope_id: scope_id.map(str::to_string),
            item_id: item_id.map(str::to_string),
        }
    }

    pub fn scope(scope_id: &str) -> Self {
        Self::new(Some(scope_id), None)
    }

    pub fn item(mut self, item_id: &str) -> Self {
        self.item_id = Some(item_id.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub enum DispatchResult {
    Raw(ResultEnvelope),
    Parsed(Value),
    Empty,
}

impl DispatchResult {
    pub fn into_value(self) -> Option<Value> {
        match self {
            DispatchResult::Parsed(value) => Some(value),
            DispatchResult::Raw(_) | DispatchResult::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DispatchResult::Empty)
    }
}

#[derive(Clone)]
pub struct GenericDispatcher {
    logger: Logger,
    registry: Arc<EndpointRegistry>,
    executor: RequestExecutor,
    paginator: PaginationContinuer,
    poller: OperationPoller,
    credential: CredentialKind,
}

impl GenericDispatcher {
    pub fn new(logger: Logger, registry: Arc<EndpointRegistry>, executor: RequestExecutor) -> Self {
        Self {
            logger: logger.child("dispatch"),
            registry,
            paginator: PaginationContinuer::new(executor.clone()),
            poller: OperationPoller::new(executor.clone()),
            executor,
            credential: CredentialKind::default(),
        }
    }

    pub fn with_credential(mut self, credential: CredentialKind) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_paginator(mut self, paginator: PaginationContinuer) -> Self {
        self.paginator = paginator;
        self
    }

    pub fn with_poller(mut self, poller: OperationPoller) -> Self {
        self.poller = poller;
        self
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub async fn list(&self, name: &str, scope_id: Option<&str>) -> Result<DispatchResult, ClientError> {
        self.dispatch(Operation::List, name, &Target::new(scope_id, None), None)
            .await
    }

    pub async fn get(
        &self,
        name: &str,
        scope_id: Option<&str>,
        item_id: &str,
    ) -> Result<DispatchResult, ClientError> {
        self.dispatch(Operation::Get, name, &Target::new(scope_id, Some(item_id)), None)
            .await
    }

    pub async fn create(
        &self,
        name: &str,
        scope_id: Option<&str>,
        item_id: Option<&str>,
        payload: Option<Value>,
    ) -> Result<DispatchResult, ClientError> {
        self.dispatch(Operation::Create, name, &Target::new(scope_id, item_id), payload)
            .await
    }

    pub async fn update(
        &self,
        name: &str,
        scope_id: Option<&str>,
        item_id: &str,
        payload: Option<Value>,
    ) -> Result<DispatchResult, ClientError> {
        self.dispatch(
            Operation::Update,
            name,
            &Target::new(scope_id, Some(item_id)),
            payload,
        )
        .await
    }

    pub async fn delete(
        &self,
        name: &str,
        scope_id: Option<&str>,
        item_id: &str,
    ) -> Result<DispatchResult, ClientError> {
        self.dispatch(Operation::Delete, name, &Target::new(scope_id, Some(item_id)), None)
            .await
    }

    pub async fn execute_envelope(
        &self,
        operation: Operation,
        name: &str,
        target: &Target,
        payload: Option<Value>,
    ) -> Result<ResultEnvelope, ClientError> {
        let template = self.registry.resolve(name)?;
        let response = self.send(template, operation, target, payload).await?;
        Ok(self.settle(template, operation, response).await)
    }

    pub async fn dispatch(
        &self,
        operation: Operation,
        name: &str,
        target: &Target,
        payload: Option<Value>,
    ) -> Result<DispatchResult, ClientError> {
        let template = self.registry.resolve(name)?;
        let response = self.send(template, operation, target, payload).await?;
        if template.returns_raw {
            return Ok(DispatchResult::Raw(response));
        }

        let started_operation =
            response.success && operation.may_start_operation() && response.status_code == 202;
        let settled = self.settle(template, operation, response).await;
        if !settled.success {
            self.logger.warn(
                &format!(
                    "{}: {}.",
                    settled.status_code,
                    redact_text(settled.error_text(), LOG_BODY_LENGTH)
                ),
                Some(&serde_json::json!({
                    "endpoint": name,
                    "operation": operation.as_str(),
                })),
            );
            return Ok(DispatchResult::Empty);
        }

        if operation == Operation::List && template.supports_pagination {
            let items = settled
                .data
                .and_then(|data| match data {
                    Value::Object(mut map) => map.remove(VALUE_FIELD),
                    _ => None,
                })
                .unwrap_or_else(|| Value::Array(Vec::new()));
            return Ok(DispatchResult::Parsed(items));
        }

        if operation == Operation::Delete {
            self.logger.info(
                &format!(
                    "Deleted {} with ID: {}",
                    name,
                    target.item_id.as_deref().unwrap_or("")
                ),
                None,
            );
        }

        match settled.data {
            Some(data) => Ok(DispatchResult::Parsed(data)),
            None => {
                if started_operation {
                    self.logger
                        .info("Long-running operation returned no data.", None);
                }
                Ok(DispatchResult::Empty)
            }
        }
    }

    async fn send(
        &self,
        template: &EndpointTemplate,
        operation: Operation,
        target: &Target,
        payload: Option<Value>,
    ) -> Result<ResultEnvelope, ClientError> {
        let scope_id = non_blank(target.scope_id.as_deref());
        let item_id = non_blank(target.item_id.as_deref());
        if template.requires_scope_id && scope_id.is_none() {
            return Err(ClientError::invalid_params(format!(
                "Scope ID is required for endpoint: {}",
                template.name
            ))
            .with_hint("Pass the workspace (or group) id that owns the resource."));
        }
        if operation.requires_item_id() && item_id.is_none() {
            return Err(ClientError::invalid_params(format!(
                "Item ID is required to {} endpoint: {}",
                operation.as_str(),
                template.name
            )));
        }

        let path = template.render_path(scope_id, item_id, operation == Operation::Create);
        let method = match operation {
            Operation::List | Operation::Get => template.method.clone(),
            Operation::Create => Method::POST,
            Operation::Update => Method::PATCH,
            Operation::Delete => Method::DELETE,
        };
        let payload = match operation {
            Operation::Create | Operation::Update => {
                payload.or_else(|| template.default_payload.clone())
            }
            _ => template.default_payload.clone(),
        };

        let mut request = ApiRequest::new(template.host, method, path)
            .with_content_type(&template.content_type)
            .with_credential(self.credential);
        request.query = template.default_query.clone();
        request.payload = payload;
        request.return_raw = template.returns_raw;

        self.executor.execute(request).await
    }

    async fn settle(
        &self,
        template: &EndpointTemplate,
        operation: Operation,
        response: ResultEnvelope,
    ) -> ResultEnvelope {
        if template.returns_raw || !response.success {
            return response;
        }
        if operation == Operation::List && template.supports_pagination {
            return self.paginator.continue_pages(response).await;
        }
        if operation.may_start_operation() && response.status_code == 202 {
            self.logger.debug(
                "Long-running operation detected, handling LRO...",
                None,
            );
            return self.poller.poll(response).await;
        }
        response
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
