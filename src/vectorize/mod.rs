// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Word graph pipeline
//!
//! Embeds a word list, projects the embeddings to 2D and links every pair
//! of words whose cosine similarity reaches the configured threshold.

use crate::embeddings::TextEmbedder;
use crate::projection::{to_matrix, PcaProjector, ProjectionError, Projector};
use crate::similarity::{find_connections, Connection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Fewest words for which a layout and similarities are meaningful
pub const MIN_WORDS: usize = 2;

/// A word placed in the 2D layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub word: String,
    pub x: f64,
    pub y: f64,
}

/// Layout plus similarity edges for one word list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordGraph {
    pub points: Vec<Point>,
    pub connections: Vec<Connection>,
}

impl WordGraph {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.connections.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),

    #[error("embedder returned {actual} vectors for {expected} words")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("projection failed: {0}")]
    Projection(#[from] ProjectionError),

    #[error("layout task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Shared, read-only pipeline; one instance serves every request
#[derive(Clone)]
pub struct Vectorizer {
    embedder: Arc<dyn TextEmbedder>,
    similarity_threshold: f32,
    projection_seed: u64,
}

impl std::fmt::Debug for Vectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vectorizer")
            .field("model", &self.embedder.model_name())
            .field("similarity_threshold", &self.similarity_threshold)
            .field("projection_seed", &self.projection_seed)
            .finish()
    }
}

impl Vectorizer {
    pub fn new(embedder: Arc<dyn TextEmbedder>, similarity_threshold: f32, projection_seed: u64) -> Self {
        Self {
            embedder,
            similarity_threshold,
            projection_seed,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn TextEmbedder> {
        &self.embedder
    }

    pub fn similarity_threshold(&self) -> f32 {
        self.similarity_threshold
    }

    pub fn projection_seed(&self) -> u64 {
        self.projection_seed
    }

    /// Builds the word graph; fewer than [`MIN_WORDS`] words yield an empty graph
    pub async fn vectorize(&self, words: &[String]) -> Result<WordGraph, VectorizeError> {
        if words.len() < MIN_WORDS {
            debug!("Skipping vectorize for {} word(s)", words.len());
            return Ok(WordGraph::empty());
        }

        let embeddings = self
            .embedder
            .embed_batch(words)
            .await
            .map_err(VectorizeError::Embedding)?;
        if embeddings.len() != words.len() {
            return Err(VectorizeError::EmbeddingCountMismatch {
                expected: words.len(),
                actual: embeddings.len(),
            });
        }

        // Projection and pairwise similarity are O(n^2) CPU work
        let words = words.to_vec();
        let threshold = self.similarity_threshold;
        let seed = self.projection_seed;
        let graph =
            tokio::task::spawn_blocking(move || layout(words, &embeddings, threshold, seed))
                .await??;

        debug!(
            "Vectorized {} words into {} connections",
            graph.points.len(),
            graph.connections.len()
        );

        Ok(graph)
    }
}

/// Projects the embeddings and links similar words
fn layout(
    words: Vec<String>,
    embeddings: &[Vec<f32>],
    threshold: f32,
    seed: u64,
) -> Result<WordGraph, VectorizeError> {
    let matrix = to_matrix(embeddings)?;
    let coords = PcaProjector::new(seed).project(&matrix)?;

    let connections = find_connections(&words, embeddings, threshold);

    let points = words
        .into_iter()
        .zip(coords)
        .map(|(word, [x, y])| Point { word, x, y })
        .collect();

    Ok(WordGraph {
        points,
        connections,
    })
}
