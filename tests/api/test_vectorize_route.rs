// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /vectorize success-path tests

use crate::common::{body_json, test_app, vectorize_request};
use axum::http::{header, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt;

async fn vectorize(body: &str) -> Value {
    let response = test_app(None)
        .oneshot(vectorize_request(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

fn point_words(body: &Value) -> Vec<String> {
    body["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["word"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_single_word_returns_empty_result() {
    let body = vectorize(r#"{"words": ["hello"]}"#).await;
    assert_eq!(body, json!({"points": [], "connections": []}));
}

#[tokio::test]
async fn test_no_words_returns_empty_result() {
    let body = vectorize(r#"{"words": []}"#).await;
    assert_eq!(body, json!({"points": [], "connections": []}));
}

#[tokio::test]
async fn test_dog_cat_connected() {
    let body = vectorize(r#"{"words": ["dog", "cat"]}"#).await;

    assert_eq!(point_words(&body), vec!["dog", "cat"]);
    let connections = body["connections"].as_array().unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0]["from"], "dog");
    assert_eq!(connections[0]["to"], "cat");
    assert!(connections[0]["similarity"].as_f64().unwrap() >= 0.7);
}

#[tokio::test]
async fn test_apple_banana_car() {
    let body = vectorize(r#"{"words": ["apple", "banana", "car"]}"#).await;

    assert_eq!(point_words(&body), vec!["apple", "banana", "car"]);
    let connections = body["connections"].as_array().unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0]["from"], "apple");
    assert_eq!(connections[0]["to"], "banana");
}

#[tokio::test]
async fn test_points_have_float_coordinates() {
    let body = vectorize(r#"{"words": ["dog", "cat", "apple", "banana", "car"]}"#).await;

    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 5);
    for point in points {
        assert!(point["x"].as_f64().unwrap().is_finite());
        assert!(point["y"].as_f64().unwrap().is_finite());
    }
}

#[tokio::test]
async fn test_connections_follow_input_order() {
    let words = ["dog", "apple", "cat", "banana", "car", "zebra", "xylophone"];
    let request = json!({ "words": words }).to_string();
    let body = vectorize(&request).await;

    let position = |w: &str| words.iter().position(|x| *x == w).unwrap();
    let pairs: Vec<(usize, usize)> = body["connections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| {
            (
                position(c["from"].as_str().unwrap()),
                position(c["to"].as_str().unwrap()),
            )
        })
        .collect();

    assert!(pairs.iter().all(|(i, j)| i < j));
    let mut sorted = pairs.clone();
    sorted.sort();
    assert_eq!(pairs, sorted);
}

#[tokio::test]
async fn test_similarities_in_range_and_rounded() {
    let body = vectorize(r#"{"words": ["dog", "cat", "apple", "banana", "car"]}"#).await;

    for connection in body["connections"].as_array().unwrap() {
        let sim = connection["similarity"].as_f64().unwrap();
        assert!((0.7..=1.0).contains(&sim), "similarity {} out of range", sim);
        assert_eq!((sim * 1000.0).round() / 1000.0, sim);
    }
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let request = r#"{"words": ["dog", "cat", "apple", "banana", "car"]}"#;
    let first = vectorize(request).await;
    let second = vectorize(request).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_response_content_type() {
    let response = test_app(None)
        .oneshot(vectorize_request(r#"{"words": ["dog", "cat"]}"#))
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json; charset=utf-8"
    );
}

#[tokio::test]
async fn test_word_limit_allows_exact_count() {
    let response = test_app(Some(2))
        .oneshot(vectorize_request(r#"{"words": ["dog", "cat"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
