// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /vectorize HTTP handler

use crate::api::http_server::AppState;
use crate::api::vectorize::{VectorizeRequest, VectorizeResponse};
use crate::api::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use std::sync::Arc;
use tracing::{debug, error};

/// POST /vectorize handler
///
/// # Request Body
/// ```json
/// { "words": ["apple", "banana", "car"] }
/// ```
///
/// # Response Body
/// ```json
/// {
///   "points": [{"word": "apple", "x": 0.4, "y": 0.1}, ...],
///   "connections": [{"from": "apple", "to": "banana", "similarity": 0.83}]
/// }
/// ```
///
/// Fewer than two words return `{"points": [], "connections": []}`.
pub async fn vectorize_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VectorizeRequest>, JsonRejection>,
) -> Result<VectorizeResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    request.validate(state.max_words)?;

    debug!("Vectorize request with {} words", request.words.len());

    let graph = state
        .vectorizer
        .vectorize(&request.words)
        .await
        .map_err(|e| {
            error!("Vectorize failed for {} words: {}", request.words.len(), e);
            ApiError::from(e)
        })?;

    Ok(graph.into())
}
