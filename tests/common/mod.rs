// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared test helpers: a deterministic embedder and router setup

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use std::collections::HashMap;
use std::sync::Arc;
use word_vectorizer::{
    api::{create_app, AppState},
    embeddings::TextEmbedder,
    vectorize::Vectorizer,
};

/// Word that makes [`FakeEmbedder`] fail
pub const FAILING_WORD: &str = "__fail__";

/// Returns fixed vectors for known words and a hashed vector otherwise
pub struct FakeEmbedder {
    table: HashMap<&'static str, Vec<f32>>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        let mut table = HashMap::new();
        table.insert("dog", vec![0.9, 0.4, 0.0, 0.1]);
        table.insert("cat", vec![0.8, 0.5, 0.1, 0.1]);
        table.insert("apple", vec![0.1, 0.0, 1.0, 0.1]);
        table.insert("banana", vec![0.2, 0.1, 0.9, 0.2]);
        table.insert("car", vec![0.0, 1.0, -0.6, 0.0]);
        Self { table }
    }

    fn hashed(word: &str) -> Vec<f32> {
        let mut state = word
            .bytes()
            .fold(1469598103934665603u64, |h, b| (h ^ b as u64).wrapping_mul(1099511628211));
        (0..4)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl TextEmbedder for FakeEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                if text == FAILING_WORD {
                    return Err(anyhow!("inference failed for {}", text));
                }
                Ok(self
                    .table
                    .get(text.as_str())
                    .cloned()
                    .unwrap_or_else(|| Self::hashed(text)))
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "fake-embedder"
    }
}

pub fn test_app(max_words: Option<usize>) -> Router {
    let vectorizer = Vectorizer::new(Arc::new(FakeEmbedder::new()), 0.7, 42);
    create_app(Arc::new(AppState::new(vectorizer, max_words)))
}

pub fn vectorize_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/vectorize")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
