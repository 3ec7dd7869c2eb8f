// tests/api_http.rs
//
// In-process router tests via tower::ServiceExt::oneshot; providers are mocks.

use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use news_insights::api::{create_router, AppState};
use news_insights::config::{ProviderConfig, Secret};
use news_insights::provider::{ClientRegistry, MockProvider, MockReply};
use news_insights::store::MemoryInsightStore;
use news_insights::InsightPipeline;
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

const ONE_INSIGHT: &str = r#"Sure: [{"type":"market_trend","entity":"Oil","prediction":"Prices rise","confidence":"0.7","reasoning":"Supply cut"}]"#;

fn app_with(replies: Vec<MockReply>) -> Router {
    let mut registry = ClientRegistry::new();
    let mut providers = Vec::new();
    for (i, reply) in replies.into_iter().enumerate() {
        let name = format!("p{}", i + 1);
        registry = registry.register(name.clone(), Arc::new(MockProvider::new(reply)));
        providers.push(ProviderConfig::new(
            name.clone(),
            name,
            "mock://local",
            Secret::new("k"),
            "m",
        ));
    }
    let state = AppState::new(
        InsightPipeline::new(registry),
        providers,
        Arc::new(MemoryInsightStore::default()),
    );
    create_router(state)
}

fn post_article(json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/insights")
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .expect("failed to build request")
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_ok() {
    let app = app_with(vec![MockReply::text("[]")]);
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn success_returns_insights_and_stores_by_id() {
    let app = app_with(vec![MockReply::status(500), MockReply::text(ONE_INSIGHT)]);

    let resp = app
        .clone()
        .oneshot(post_article(
            r#"{"_id":"art-7","title":"OPEC announces cut","categories":["energy"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert_eq!(v["status"], "success");
    assert_eq!(v["provider"], "p2");
    assert_eq!(v["insights"][0]["type"], "market_trend");
    assert_eq!(v["insights"][0]["confidence"], 0.7);

    let resp = app
        .oneshot(Request::get("/insights/art-7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stored = json_body(resp).await;
    assert_eq!(stored["provider"], "p2");
    assert_eq!(stored["insights"].as_array().unwrap().len(), 1);
    assert!(stored["generated_at"].is_string());
}

#[tokio::test]
async fn exhaustion_is_bad_gateway_with_attempt_history() {
    let app = app_with(vec![MockReply::status(500), MockReply::status(429)]);

    let resp = app
        .oneshot(post_article(r#"{"title":"Quiet day"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let v = json_body(resp).await;
    assert_eq!(v["status"], "failure");
    let failures = v["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0]["provider"], "p1");
    assert_eq!(failures[0]["kind"], "unavailable");
    assert_eq!(failures[0]["stage"], "provider");
    assert_eq!(failures[0]["http_status"], 500);
    assert_eq!(failures[1]["kind"], "rate_limited");
}

#[tokio::test]
async fn empty_title_is_rejected() {
    let app = app_with(vec![MockReply::text("[]")]);
    let resp = app
        .oneshot(post_article(r#"{"title":"   "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let app = app_with(vec![MockReply::text("[]")]);
    let resp = app
        .oneshot(Request::get("/insights/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[serial_test::serial]
#[tokio::test]
async fn app_builds_in_mock_mode() {
    std::env::set_var("INSIGHT_TEST_MODE", "mock");
    let app = news_insights::app().await.expect("app() should build in mock mode");
    std::env::remove_var("INSIGHT_TEST_MODE");

    let resp = app
        .oneshot(post_article(r#"{"title":"Fed holds rates"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert_eq!(v["provider"], "mock");
    assert_eq!(v["insights"][0]["entity"], "Mock");
}
