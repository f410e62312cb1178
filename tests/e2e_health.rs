//! E2E tests for health check and basic routing

mod common;

use common::{CONFIG_KEY, TestServer};

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server.get("/health").await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new().await;

    let response = server.get("/unknown/route").await;

    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "Not Found");
}

#[tokio::test]
async fn test_metrics_requires_configuration_key() {
    let server = TestServer::new().await;

    let response = server.get("/metrics").await;
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .get(server.url("/metrics"))
        .bearer_auth("wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_metrics_accepts_configuration_key() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .bearer_auth(CONFIG_KEY)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}
