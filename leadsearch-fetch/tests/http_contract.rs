//! HTTP contract tests for the provider, ingestion and classifier clients.
//!
//! These tests run each client against a local mock server and check the
//! exact request shape and the response mapping.

use std::time::Duration;

use leadsearch_fetch::{
    FetchError, GoogleSearchBackend, HttpClient, HttpIngestClient, InferenceClassifier,
    IngestClient, SearchBackend, TextClassifier,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http() -> HttpClient {
    HttpClient::with_timeout(Duration::from_secs(5)).unwrap()
}

fn google(server: &MockServer) -> GoogleSearchBackend {
    GoogleSearchBackend::new(
        http(),
        format!("{}/customsearch/v1", server.uri()),
        "test-key",
        "test-cx",
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Search Provider
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_sends_pagination_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "test-key"))
        .and(query_param("cx", "test-cx"))
        .and(query_param("q", "rust web frameworks"))
        .and(query_param("start", "11"))
        .and(query_param("num", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"title": "Axum", "link": "https://github.com/tokio-rs/axum", "snippet": "Ergonomic"},
                {"title": "Actix", "link": "https://actix.rs", "snippet": "Fast"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = google(&server)
        .search_page("rust web frameworks", 11, 5)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].url, "https://github.com/tokio-rs/axum");
    assert_eq!(results[0].title, "Axum");
    assert_eq!(results[1].snippet, "Fast");
}

#[tokio::test]
async fn test_search_without_items_is_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "searchInformation": {"totalResults": "0"}
        })))
        .mount(&server)
        .await;

    let results = google(&server).search_page("nothing", 1, 10).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_search_drops_invalid_links() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"title": "broken", "link": "not a url", "snippet": ""},
                {"title": "missing"},
                {"title": "ok", "link": "https://example.com/ok", "snippet": "fine"}
            ]
        })))
        .mount(&server)
        .await;

    let results = google(&server).search_page("q", 1, 10).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://example.com/ok");
}

#[tokio::test]
async fn test_search_maps_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("dailyLimitExceeded"))
        .mount(&server)
        .await;

    let err = google(&server).search_page("q", 1, 10).await.unwrap_err();
    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("dailyLimitExceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_search_maps_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let err = google(&server).search_page("q", 1, 10).await.unwrap_err();
    assert!(matches!(err, FetchError::RateLimited { retry_after: Some(30) }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_search_rejects_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = google(&server).search_page("q", 1, 10).await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidResponse(_)));
}

// ────────────────────────────────────────────────────────────────────────────
// Ingestion Service
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ingest_posts_url_batch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/scrape"))
        .and(body_json(json!({
            "urls": ["https://a.example", "https://b.example", "https://a.example"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queued": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpIngestClient::new(http(), format!("{}/scrape", server.uri()));
    let urls = vec![
        "https://a.example".to_string(),
        "https://b.example".to_string(),
        "https://a.example".to_string(),
    ];

    let ack = client.submit(&urls).await.unwrap();
    assert_eq!(ack.status, 200);
    assert_eq!(ack.body, Some(json!({"queued": 3})));
}

#[tokio::test]
async fn test_ingest_accepts_non_json_ack() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_body_string("accepted"))
        .mount(&server)
        .await;

    let client = HttpIngestClient::new(http(), server.uri());
    let ack = client.submit(&["https://a.example".to_string()]).await.unwrap();
    assert_eq!(ack.status, 202);
    assert!(ack.body.is_none());
}

#[tokio::test]
async fn test_ingest_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = HttpIngestClient::new(
        HttpClient::with_timeout(Duration::from_millis(200)).unwrap(),
        server.uri(),
    );
    let err = client.submit(&["https://a.example".to_string()]).await.unwrap_err();
    assert!(err.is_transient());
}

// ────────────────────────────────────────────────────────────────────────────
// Classifier
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_classifier_sends_candidate_labels_and_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer hf-token"))
        .and(body_json(json!({
            "inputs": "tokio and async-std",
            "parameters": {"candidate_labels": ["rust async", "unrelated"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sequence": "tokio and async-std",
            "labels": ["rust async", "unrelated"],
            "scores": [0.91, 0.09]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let classifier = InferenceClassifier::new(http(), server.uri(), Some("hf-token".to_string()));
    let labels = vec!["rust async".to_string(), "unrelated".to_string()];

    let scores = classifier.classify("tokio and async-std", &labels).await.unwrap();
    assert_eq!(scores[0].label, "rust async");
    assert!((scores[0].score - 0.91).abs() < 1e-9);
}

#[tokio::test]
async fn test_classifier_maps_service_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Model is currently loading"
        })))
        .mount(&server)
        .await;

    let classifier = InferenceClassifier::new(http(), server.uri(), None);
    let err = classifier
        .classify("text", &["q".to_string(), "unrelated".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));
}
