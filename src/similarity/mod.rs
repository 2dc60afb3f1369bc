// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Pairwise cosine similarity and connection building

use serde::{Deserialize, Serialize};

/// Decimal places kept in reported similarities
pub const SIMILARITY_DECIMALS: i32 = 3;

/// Edge between two related words
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
    /// Cosine similarity rounded to [`SIMILARITY_DECIMALS`] places
    pub similarity: f64,
}

/// Cosine similarity clamped to [-1, 1]; 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Full symmetric similarity matrix
pub fn similarity_matrix(embeddings: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n = embeddings.len();
    let mut matrix = vec![vec![0.0f32; n]; n];

    for i in 0..n {
        for j in i..n {
            let sim = cosine_similarity(&embeddings[i], &embeddings[j]);
            matrix[i][j] = sim;
            matrix[j][i] = sim;
        }
    }

    matrix
}

/// Rounds to `decimals` places, exact halves to the even neighbour
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Connections for every pair `i < j` whose similarity reaches `threshold`
///
/// Pairs are emitted in ascending `(i, j)` order. The threshold is compared
/// against the unrounded similarity.
pub fn find_connections(words: &[String], embeddings: &[Vec<f32>], threshold: f32) -> Vec<Connection> {
    let matrix = similarity_matrix(embeddings);
    let n = words.len().min(matrix.len());
    let mut connections = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let sim = matrix[i][j];
            if sim >= threshold {
                connections.push(Connection {
                    from: words[i].clone(),
                    to: words[j].clone(),
                    similarity: round_to(f64::from(sim), SIMILARITY_DECIMALS),
                });
            }
        }
    }

    connections
}
