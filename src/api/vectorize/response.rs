// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! VectorizeResponse type for POST /vectorize

use crate::similarity::Connection;
use crate::vectorize::{Point, WordGraph};
use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Response body for POST /vectorize
///
/// # Example
/// ```json
/// {
///   "points": [
///     {"word": "dog", "x": 0.71, "y": -0.02},
///     {"word": "cat", "x": -0.71, "y": 0.02}
///   ],
///   "connections": [
///     {"from": "dog", "to": "cat", "similarity": 0.812}
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorizeResponse {
    /// One point per input word, in input order
    pub points: Vec<Point>,

    /// Similar word pairs, ordered by input position
    pub connections: Vec<Connection>,
}

impl From<WordGraph> for VectorizeResponse {
    fn from(graph: WordGraph) -> Self {
        Self {
            points: graph.points,
            connections: graph.connections,
        }
    }
}

impl IntoResponse for VectorizeResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, JSON_UTF8)], Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response_serialization() {
        let json = serde_json::to_string(&VectorizeResponse::default()).unwrap();
        assert_eq!(json, r#"{"points":[],"connections":[]}"#);
    }

    #[test]
    fn test_from_word_graph() {
        let graph = WordGraph {
            points: vec![Point {
                word: "dog".to_string(),
                x: 1.5,
                y: -0.5,
            }],
            connections: vec![],
        };
        let response = VectorizeResponse::from(graph);
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"points":[{"word":"dog","x":1.5,"y":-0.5}],"connections":[]}"#
        );
    }

    #[test]
    fn test_content_type_header() {
        let response = VectorizeResponse::default().into_response();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            JSON_UTF8
        );
    }
}
