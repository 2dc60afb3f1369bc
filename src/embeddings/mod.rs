// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence Embeddings
//!
//! The vectorize pipeline only sees the [`TextEmbedder`] trait. The
//! production implementation is [`OnnxEmbeddingModel`], which runs a
//! sentence transformer export (LaBSE by default) through ONNX Runtime and
//! applies the pipeline's Dense head when one is configured.

pub mod dense;
pub mod onnx_model;
pub mod pooling;
pub mod source;

pub use dense::{DenseFiles, DenseHead, DENSE_DIR_NAME};
pub use onnx_model::OnnxEmbeddingModel;
pub use pooling::Pooling;
pub use source::{resolve_model_files, ModelFiles, ModelSource};

use anyhow::Result;
use async_trait::async_trait;

/// Produces one fixed-length vector per input text
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embeds all texts, returning vectors in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Length of every vector returned by `embed_batch`
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Inference options for [`OnnxEmbeddingModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingOptions {
    /// How token embeddings are reduced to one sentence vector
    pub pooling: Pooling,
    /// L2-normalize pooled vectors
    pub normalize: bool,
    /// Tokens kept per text; longer inputs are truncated
    pub max_length: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self {
            pooling: Pooling::Cls,
            normalize: true,
            max_length: 256,
            intra_threads: 1,
        }
    }
}
