// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /vectorize error-path tests

use crate::common::{body_json, test_app, vectorize_request, FAILING_WORD};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::util::ServiceExt;

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let response = test_app(None)
        .oneshot(vectorize_request(r#"{"words": ["dog", "#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_missing_words_field_is_bad_request() {
    let response = test_app(None)
        .oneshot(vectorize_request(r#"{"texts": ["dog"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/vectorize")
        .body(Body::from(r#"{"words": ["dog", "cat"]}"#))
        .unwrap();
    let response = test_app(None).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_word_limit_exceeded() {
    let response = test_app(Some(2))
        .oneshot(vectorize_request(r#"{"words": ["dog", "cat", "car"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"], json!({"field": "words"}));
}

#[tokio::test]
async fn test_embedding_failure_is_server_error() {
    let request = json!({ "words": ["dog", FAILING_WORD] }).to_string();
    let response = test_app(None)
        .oneshot(vectorize_request(&request))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "internal_error");
}

#[tokio::test]
async fn test_single_failing_word_never_reaches_model() {
    let request = json!({ "words": [FAILING_WORD] }).to_string();
    let response = test_app(None)
        .oneshot(vectorize_request(&request))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"points": [], "connections": []})
    );
}
