//! End-to-end resolution over HTTP.

use super::mock_server::MockServerFixture;
use kube_guard_client::types::{AssistantChatRequest, ExecutionParams};
use kube_guard_client::{ClientConfig, ErrorKind, OpsClientBuilder, RequestDescriptor, Target};
use mockito::Matcher;

const FORECAST: &str = r#"{
    "node": "worker-1",
    "history_minutes": 240,
    "horizon_minutes": 120,
    "step": 60,
    "history": [{"ts": 1700000000, "value": 41.5}],
    "forecast": [{"ts": 1700003600, "yhat": 55.0, "yhat_lower": 50.0, "yhat_upper": 61.2}],
    "metrics": {"mae": 2.1, "mape": 0.04}
}"#;

#[tokio::test]
async fn inline_forecast_over_http() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json("GET", "/api/ai/forecast", 200, FORECAST).await;
    let client = fixture.client().unwrap();

    let resp = client
        .forecast(&RequestDescriptor::forecast(Target::NodeCpu).node("worker-1"))
        .await
        .unwrap();
    assert_eq!(resp.node.as_deref(), Some("worker-1"));
    assert_eq!(resp.peak_upper(), Some(61.2));
    mock.assert_async().await;
}

#[tokio::test]
async fn async_suggestions_are_polled_over_http() {
    let fixture = MockServerFixture::new().await;
    let submit = fixture
        .mock_json("GET", "/api/ai/suggestions", 200, r#"{"task_id": "s-1", "status": "PENDING"}"#)
        .await;
    let status = fixture
        .mock_json(
            "GET",
            "/api/tasks/s-1",
            200,
            r#"{"task_id": "s-1", "status": "DONE", "result": {
                "target": "pod_cpu", "key": "default/api-0", "suggestion_id": "sg-5",
                "suggestions": [{"severity": "critical", "title": "Scale api", "action": {"kind": "scale_deployment", "params": {"replicas": 3}}}]
            }}"#,
        )
        .await;
    let client = fixture.client().unwrap();

    let request = RequestDescriptor::suggestions(Target::PodCpu)
        .namespace("default")
        .pod("api-0");
    let resp = client.suggestions(&request).await.unwrap();
    assert_eq!(resp.suggestions.len(), 1);
    assert_eq!(resp.suggestions[0].action.params["replicas"], 3);
    submit.assert_async().await;
    status.assert_async().await;
}

#[tokio::test]
async fn execute_conflict_reads_as_expired() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json(
            "POST",
            "/api/ai/execute",
            409,
            r#"{"detail": "suggestion_id mismatch, please regenerate"}"#,
        )
        .await;
    let client = fixture.client().unwrap();

    let params = ExecutionParams::new(1, false)
        .with_suggestion_id("sg-old")
        .with_confirm_text("CONFIRM");
    let err = client
        .execute(&RequestDescriptor::execute(Target::NodeMem, params).node("worker-2"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Expired);
    assert_eq!(err.status, Some(409));
    assert!(err
        .message
        .starts_with("suggestion_id mismatch, please regenerate (request_id="));
    mock.assert_async().await;
}

#[tokio::test]
async fn query_carries_defaults_over_the_wire() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("GET", "/api/ai/forecast")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("target".into(), "node_mem".into()),
                Matcher::UrlEncoded("node".into(), "worker-1".into()),
                Matcher::UrlEncoded("history_minutes".into(), "240".into()),
                Matcher::UrlEncoded("horizon_minutes".into(), "120".into()),
                Matcher::UrlEncoded("step".into(), "60".into()),
                Matcher::UrlEncoded("async_mode".into(), "false".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(FORECAST)
            .create_async()
            .await
    };
    let client = fixture.client().unwrap();

    let request = RequestDescriptor::forecast(Target::NodeMem)
        .node("worker-1")
        .async_mode(false);
    assert!(client.forecast(&request).await.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn non_json_error_body_falls_back_to_kind_default() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_text_error("/api/ai/forecast", 502, "srv-77").await;
    let client = fixture.client().unwrap();

    let err = client
        .forecast(&RequestDescriptor::forecast(Target::NodeCpu).node("worker-1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::System);
    assert_eq!(err.status, Some(502));
    assert!(err.message.starts_with("system error (request_id="));
}

#[tokio::test]
async fn assistant_chat_posts_json() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/api/ai/assistant/chat")
            .match_body(Matcher::PartialJsonString(
                r#"{"message": "why is worker-1 hot?", "page": "forecast"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply": "CPU has been above 85% for 20 minutes."}"#)
            .create_async()
            .await
    };
    let client = fixture.client().unwrap();

    let mut request = AssistantChatRequest::new("why is worker-1 hot?");
    request.page = Some("forecast".to_string());
    let resp = client.assistant_chat(&request).await.unwrap();
    assert!(resp.reply.contains("85%"));
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_backend_is_a_system_error() {
    let client = OpsClientBuilder::new()
        .config(ClientConfig::default())
        .base_url("http://127.0.0.1:9")
        .http_timeout_secs(2)
        .build()
        .unwrap();

    let err = client
        .forecast(&RequestDescriptor::forecast(Target::NodeCpu).node("worker-1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::System);
    assert!(err.message.contains("request_id="));
}
