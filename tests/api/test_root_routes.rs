// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Liveness, health and CORS tests

use crate::common::{body_json, test_app};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use tower::util::ServiceExt;

#[tokio::test]
async fn test_root_returns_liveness_message() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = test_app(None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, serde_json::json!({"message": "Server is running!"}));
}

#[tokio::test]
async fn test_health_reports_model() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = test_app(None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "fake-embedder");
    assert_eq!(body["dimension"], 4);
    assert_eq!(body["similarity_threshold"], 0.7);
    assert_eq!(body["projection_seed"], 42);
    assert_eq!(body["version"], word_vectorizer::version::VERSION_NUMBER);
    assert!(body["features"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("onnx-embeddings")));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/vectorize")
        .header("origin", "https://example.org")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = test_app(None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_header_on_simple_request() {
    let request = Request::builder()
        .uri("/")
        .header("origin", "https://example.org")
        .body(Body::empty())
        .unwrap();
    let response = test_app(None).oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_vectorize_rejects_get() {
    let request = Request::builder()
        .uri("/vectorize")
        .body(Body::empty())
        .unwrap();
    let response = test_app(None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
