mod common;
use common::{
    accepted, executor_with, json_response, quiet_logger, status_body, text_response, FakeTransport,
    FABRIC_BASE, POWERBI_BASE,
};

use fabricops::services::logger::{LogLevel, Logger};
use fabricops::{
    ClientErrorKind, DispatchResult, EndpointRegistry, EndpointTemplate, GenericDispatcher,
    HostFamily, Operation, OperationPoller, PaginationContinuer, PollPolicy, Target,
    TransportError,
};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn registry() -> EndpointRegistry {
    EndpointRegistry::new([
        EndpointTemplate::new("workspaces", "/workspaces").paginated(),
        EndpointTemplate::new("lakehouses", "/workspaces/{scope_id}/lakehouses").paginated(),
        EndpointTemplate::new("item_definition", "/workspaces/{scope_id}/items")
            .suffix("/getDefinition"),
        EndpointTemplate::new("capacities_plain", "/capacities"),
        EndpointTemplate::new("dataflow_export", "/groups/{scope_id}/dataflows")
            .host(HostFamily::PowerBi)
            .raw(),
        EndpointTemplate::new("filtered", "/workspaces")
            .query("type", "Lakehouse")
            .payload(json!({"source": "template"})),
    ])
    .expect("registry")
}

fn dispatcher_with(transport: &Arc<FakeTransport>, logger: Logger) -> GenericDispatcher {
    GenericDispatcher::new(
        logger.clone(),
        Arc::new(registry()),
        executor_with(transport.clone(), logger),
    )
}

fn dispatcher(transport: &Arc<FakeTransport>) -> GenericDispatcher {
    dispatcher_with(transport, quiet_logger())
}

#[tokio::test]
async fn unknown_endpoint_is_raised() {
    let transport = FakeTransport::new();
    let err = dispatcher(&transport)
        .list("lakehouse", Some("ws"))
        .await
        .expect_err("unknown endpoint");
    assert_eq!(err.kind, ClientErrorKind::Configuration);
    assert!(err.hint.unwrap_or_default().contains("lakehouses"));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn missing_scope_id_is_raised() {
    let transport = FakeTransport::new();
    let dispatcher = dispatcher(&transport);
    for scope in [None, Some("  ")] {
        let err = dispatcher
            .list("lakehouses", scope)
            .await
            .expect_err("scope required");
        assert_eq!(err.kind, ClientErrorKind::InvalidParams);
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn missing_item_id_is_raised_for_item_operations() {
    let transport = FakeTransport::new();
    let err = dispatcher(&transport)
        .execute_envelope(Operation::Delete, "lakehouses", &Target::scope("ws"), None)
        .await
        .expect_err("item id required");
    assert_eq!(err.kind, ClientErrorKind::InvalidParams);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn list_drains_pages_into_items() {
    let transport = FakeTransport::new();
    transport.push_json(200, json!({"value": [{"id": 1}], "continuationToken": "A"}));
    transport.push_json(200, json!({"value": [{"id": 2}, {"id": 3}]}));

    let result = dispatcher(&transport)
        .list("lakehouses", Some("ws-1"))
        .await
        .expect("dispatch");

    assert_eq!(
        result.into_value(),
        Some(json!([{"id": 1}, {"id": 2}, {"id": 3}]))
    );
    assert_eq!(
        transport.urls(),
        vec![
            format!("{}/workspaces/ws-1/lakehouses", FABRIC_BASE),
            format!("{}/workspaces/ws-1/lakehouses?continuationToken=A", FABRIC_BASE),
        ]
    );
}

#[tokio::test]
async fn list_without_pagination_returns_decoded_body() {
    let transport = FakeTransport::new();
    transport.push_json(200, json!({"value": [{"id": "cap"}], "continuationToken": "ignored"}));

    let result = dispatcher(&transport)
        .list("capacities_plain", None)
        .await
        .expect("dispatch");

    assert_eq!(
        result.into_value(),
        Some(json!({"value": [{"id": "cap"}], "continuationToken": "ignored"}))
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn remote_failures_collapse_to_empty_with_a_warning() {
    let transport = FakeTransport::new();
    transport.push(Ok(text_response(404, "{\"errorCode\":\"NotFound\"}")));
    transport.push(Ok(text_response(500, "boom")));
    transport.push_error(TransportError::Connect("refused".to_string()));

    let logger = Logger::with_level("test", LogLevel::Warn);
    let dispatcher = dispatcher_with(&transport, logger.clone());

    let got = dispatcher
        .get("lakehouses", Some("ws"), "missing")
        .await
        .expect("no raise");
    assert!(got.is_empty());
    let listed = dispatcher.list("workspaces", None).await.expect("no raise");
    assert!(listed.is_empty());
    let deleted = dispatcher
        .delete("lakehouses", Some("ws"), "lh-1")
        .await
        .expect("no raise");
    assert!(deleted.is_empty());

    assert_eq!(transport.call_count(), 3);
    assert_eq!(logger.stats()["warn"], 3);
}

#[tokio::test]
async fn lower_layer_keeps_the_failure_envelope() {
    let transport = FakeTransport::new();
    transport.push(Ok(text_response(404, "{\"errorCode\":\"NotFound\"}")));

    let envelope = dispatcher(&transport)
        .execute_envelope(
            Operation::Get,
            "lakehouses",
            &Target::scope("ws").item("nope"),
            None,
        )
        .await
        .expect("envelope");

    assert!(!envelope.success);
    assert_eq!(envelope.status_code, 404);
    assert!(envelope.error_text().contains("NotFound"));
}

#[tokio::test]
async fn create_polls_accepted_operation_to_its_result() {
    let transport = FakeTransport::new();
    transport.push(Ok(accepted("https://fabric.test/v1/operations/op-7")));
    transport.push_json(200, status_body("Running"));
    transport.push_json(200, status_body("Succeeded"));
    transport.push_json(200, json!({"definition": {"parts": []}}));

    let result = dispatcher(&transport)
        .create("item_definition", Some("ws"), Some("item-3"), None)
        .await
        .expect("dispatch");

    assert_eq!(result.into_value(), Some(json!({"definition": {"parts": []}})));
    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(
        requests[0].url,
        format!("{}/workspaces/ws/items/item-3/getDefinition", FABRIC_BASE)
    );
    assert_eq!(
        requests.last().map(|r| r.url.as_str()),
        Some("https://fabric.test/v1/operations/op-7/result")
    );
}

#[tokio::test]
async fn update_with_failed_operation_returns_empty() {
    let transport = FakeTransport::new();
    transport.push(Ok(accepted("https://fabric.test/v1/operations/op-8")));
    transport.push_json(200, status_body("Failed"));

    let result = dispatcher(&transport)
        .update("lakehouses", Some("ws"), "lh-1", Some(json!({"displayName": "Silver"})))
        .await
        .expect("dispatch");

    assert!(result.is_empty());
    let requests = transport.requests();
    let first = &requests[0];
    assert_eq!(first.method, Method::PATCH);
    assert_eq!(first.url, format!("{}/workspaces/ws/lakehouses/lh-1", FABRIC_BASE));
    assert_eq!(
        first.body,
        fabricops::RequestBody::Json(json!({"displayName": "Silver"}))
    );
}

#[tokio::test]
async fn operation_with_empty_result_returns_empty() {
    let transport = FakeTransport::new();
    transport.push(Ok(accepted("https://fabric.test/v1/operations/op-9")));
    transport.push_json(200, status_body("Succeeded"));
    transport.push(Ok(text_response(200, "")));

    let result = dispatcher(&transport)
        .create("lakehouses", Some("ws"), None, Some(json!({"displayName": "Gold"})))
        .await
        .expect("dispatch");

    assert!(result.is_empty());
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn create_returns_body_of_synchronous_success() {
    let transport = FakeTransport::new();
    transport.push_json(201, json!({"id": "ws-new"}));

    let result = dispatcher(&transport)
        .create("workspaces", None, None, Some(json!({"displayName": "New"})))
        .await
        .expect("dispatch");

    assert_eq!(result.into_value(), Some(json!({"id": "ws-new"})));
    assert_eq!(transport.requests()[0].url, format!("{}/workspaces", FABRIC_BASE));
}

#[tokio::test]
async fn template_query_and_default_payload_are_applied() {
    let transport = FakeTransport::new();
    transport.push_json(200, json!({"value": []}));
    transport.push_json(201, json!({"id": "x"}));
    let dispatcher = dispatcher(&transport);

    dispatcher.list("filtered", None).await.expect("list");
    dispatcher
        .create("filtered", None, None, None)
        .await
        .expect("create");

    let requests = transport.requests();
    assert_eq!(requests[0].url, format!("{}/workspaces?type=Lakehouse", FABRIC_BASE));
    assert_eq!(
        requests[1].body,
        fabricops::RequestBody::Json(json!({"source": "template"}))
    );
}

#[tokio::test]
async fn raw_endpoints_return_the_envelope_even_on_failure() {
    let transport = FakeTransport::new();
    transport.push(Ok(json_response(200, json!({"name": "flow"}))));
    transport.push(Ok(text_response(403, "forbidden")));
    let dispatcher = dispatcher(&transport);

    match dispatcher
        .get("dataflow_export", Some("grp"), "df-1")
        .await
        .expect("dispatch")
    {
        DispatchResult::Raw(envelope) => {
            assert!(envelope.success);
            let raw = envelope.raw.expect("raw response");
            assert_eq!(raw.body.as_ref(), b"{\"name\":\"flow\"}");
        }
        other => panic!("expected raw, got {:?}", other),
    }
    match dispatcher
        .get("dataflow_export", Some("grp"), "df-2")
        .await
        .expect("dispatch")
    {
        DispatchResult::Raw(envelope) => assert_eq!(envelope.status_code, 403),
        other => panic!("expected raw, got {:?}", other),
    }
    assert_eq!(
        transport.urls()[0],
        format!("{}/groups/grp/dataflows/df-1", POWERBI_BASE)
    );
}

#[tokio::test]
async fn delete_uses_delete_method_and_returns_empty() {
    let transport = FakeTransport::new();
    transport.push(Ok(text_response(200, "")));

    let result = dispatcher(&transport)
        .delete("workspaces", None, "ws-9")
        .await
        .expect("dispatch");

    assert!(result.is_empty());
    let requests = transport.requests();
    let sent = &requests[0];
    assert_eq!(sent.method, Method::DELETE);
    assert_eq!(sent.url, format!("{}/workspaces/ws-9", FABRIC_BASE));
}

#[tokio::test]
async fn app_wires_builtin_registry_to_the_transport() {
    let transport = FakeTransport::new();
    transport.push_json(200, json!({"value": [{"id": "cap-1"}]}));

    let app = fabricops::app::App::with_parts(
        quiet_logger(),
        common::test_config(),
        EndpointRegistry::builtin(),
        transport.clone(),
        Arc::new(fabricops::services::token::StaticTokenProvider::uniform(common::TOKEN)),
    );
    assert!(app.registry.get("powerbi_dataflow_export").is_some());

    let result = app.dispatcher.list("capacities", None).await.expect("dispatch");
    assert_eq!(result.into_value(), Some(json!([{"id": "cap-1"}])));
    assert_eq!(transport.urls(), vec![format!("{}/capacities", FABRIC_BASE)]);
}

#[tokio::test]
async fn custom_paginator_and_poller_bound_the_work() {
    let transport = FakeTransport::new();
    transport.push_json(200, json!({"value": [{"id": 1}], "continuationToken": "A"}));
    transport.push_json(200, json!({"value": [{"id": 2}], "continuationToken": "B"}));
    transport.push(Ok(accepted("https://fabric.test/v1/operations/op-10")));
    transport.push_json(200, status_body("Running"));
    transport.push_json(200, status_body("Running"));

    let dispatcher = dispatcher(&transport)
        .with_paginator(
            PaginationContinuer::new(common::executor(transport.clone())).with_max_pages(1),
        )
        .with_poller(
            OperationPoller::new(common::executor(transport.clone())).with_policy(PollPolicy {
                interval: Duration::from_millis(1),
                max_attempts: 2,
            }),
        );

    let listed = dispatcher.list("workspaces", None).await.expect("list");
    assert_eq!(listed.into_value(), Some(json!([{"id": 1}, {"id": 2}])));

    let created = dispatcher
        .create("lakehouses", Some("ws"), None, Some(json!({"displayName": "Slow"})))
        .await
        .expect("create");
    assert!(created.is_empty());
    assert_eq!(transport.call_count(), 5);
}
