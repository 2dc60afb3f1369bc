// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::api::http_server::AppState;
use crate::version;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ROOT_MESSAGE: &str = "Server is running!";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub dimension: usize,
    pub similarity_threshold: f32,
    pub projection_seed: u64,
    pub version: String,
    pub features: Vec<String>,
}

/// GET / liveness check
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: ROOT_MESSAGE.to_string(),
    })
}

/// GET /health with the loaded model's details
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let embedder = state.vectorizer.embedder();
    Json(HealthResponse {
        status: "healthy".to_string(),
        model: embedder.model_name().to_string(),
        dimension: embedder.dimension(),
        similarity_threshold: state.vectorizer.similarity_threshold(),
        projection_seed: state.vectorizer.projection_seed(),
        version: version::VERSION_NUMBER.to_string(),
        features: version::FEATURES.iter().map(|f| f.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_payload() {
        let Json(body) = root_handler().await;
        assert_eq!(body.message, "Server is running!");
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"message":"Server is running!"}"#
        );
    }
}
