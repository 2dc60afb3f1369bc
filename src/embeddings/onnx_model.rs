// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs a sentence transformer export (LaBSE by default) through ONNX
//! Runtime.
//!
//! Features:
//! - ONNX model loading from disk
//! - Optional CUDA acceleration (`cuda` feature) with CPU fallback
//! - Tokenization with truncation and per-batch padding
//! - CLS or mean pooling, or pass-through for already pooled exports
//! - Optional sentence-transformers Dense head applied after pooling
//! - Output dimension discovered from a validation inference at load time

use crate::embeddings::dense::DenseHead;
use crate::embeddings::pooling::l2_normalize;
use crate::embeddings::{EmbeddingOptions, ModelFiles, Pooling, TextEmbedder};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, ArrayViewD, Axis, Ix2, Ix3};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::{debug, info};

/// BERT output holding `tanh(W cls + b)`, the same head LaBSE ships as `2_Dense`
pub const POOLER_OUTPUT: &str = "pooler_output";
pub const TOKEN_OUTPUT: &str = "last_hidden_state";

/// Tokenized batch, padded to its longest sequence
struct BatchInputs {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

/// Positions of the token-level and pooled outputs in the session's output list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputLayout {
    token: usize,
    pooler: Option<usize>,
}

impl OutputLayout {
    fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let names: Vec<&str> = names.into_iter().collect();
        Self {
            token: names.iter().position(|n| *n == TOKEN_OUTPUT).unwrap_or(0),
            pooler: names.iter().position(|n| *n == POOLER_OUTPUT),
        }
    }

    /// Output to read: the export's pooler stands in for the Dense head
    /// when CLS pooling is requested and no head was loaded
    fn select(&self, pooling: Pooling, has_dense_head: bool) -> usize {
        match self.pooler {
            Some(index) if pooling == Pooling::Cls && !has_dense_head => index,
            _ => self.token,
        }
    }
}

/// ONNX-based sentence embedding model
///
/// # Thread Safety
/// The session sits behind `Arc<Mutex>` because `Session::run` needs
/// `&mut`; the model itself is otherwise read-only after loading and
/// cheap to clone.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,

    tokenizer: Arc<Tokenizer>,

    /// Model name (e.g., "sentence-transformers/LaBSE")
    model_name: String,

    /// Output dimension, discovered at load time (768 for LaBSE)
    dimension: usize,

    /// Sentence-transformers Dense module applied after pooling
    dense: Option<Arc<DenseHead>>,

    outputs: OutputLayout,

    options: EmbeddingOptions,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("dense_head", &self.dense.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the model and tokenizer from disk
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - The validation inference yields an output that is neither
    ///   `[batch, seq_len, hidden]` nor `[batch, hidden]`
    /// - The Dense head's input size does not match the pooled output
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::new(
    ///     "LaBSE",
    ///     "/models/labse/model.onnx",
    ///     "/models/labse/tokenizer.json",
    ///     None,
    ///     EmbeddingOptions::default(),
    /// ).await?;
    /// ```
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
        dense: Option<DenseHead>,
        options: EmbeddingOptions,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("Initializing ONNX embedding model {}", model_name);
        let session = build_session(model_path, options.intra_threads)?;
        let outputs = OutputLayout::from_names(session.outputs.iter().map(|o| o.name.as_str()));
        debug!("Session outputs: {:?}", outputs);

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: options.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        let mut model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: 0,
            dense: dense.map(Arc::new),
            outputs,
            options,
        };

        let validation = model
            .run_batch(&["validation test".to_string()])
            .context("Validation inference failed")?;
        model.dimension = validation.first().map(Vec::len).unwrap_or(0);
        if model.dimension == 0 {
            anyhow::bail!("Model produced an empty embedding during validation");
        }

        info!(
            "ONNX embedding model loaded: {} ({} dimensions, {} pooling, dense head: {})",
            model.model_name,
            model.dimension,
            model.options.pooling,
            model.dense.is_some()
        );

        Ok(model)
    }

    /// Loads from resolved [`ModelFiles`], including the Dense head if present
    pub async fn from_files(
        model_name: impl Into<String>,
        files: &ModelFiles,
        options: EmbeddingOptions,
    ) -> Result<Self> {
        let dense = files
            .dense
            .as_ref()
            .map(DenseHead::load)
            .transpose()
            .context("Failed to load dense head")?;
        Self::new(model_name, &files.model_path, &files.tokenizer_path, dense, options).await
    }

    fn encode_batch(&self, texts: &[String]) -> Result<BatchInputs> {
        let encodings: Vec<Encoding> = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask = Vec::with_capacity(texts.len() * max_len);
        let mut token_type_ids = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));

            input_ids.extend(std::iter::repeat(0i64).take(padding));
            attention_mask.extend(std::iter::repeat(0i64).take(padding));
            token_type_ids.extend(std::iter::repeat(0i64).take(padding));
        }

        let shape = (texts.len(), max_len);
        Ok(BatchInputs {
            input_ids: Array2::from_shape_vec(shape, input_ids)
                .context("Failed to create batch input_ids array")?,
            attention_mask: Array2::from_shape_vec(shape, attention_mask)
                .context("Failed to create batch attention_mask array")?,
            token_type_ids: Array2::from_shape_vec(shape, token_type_ids)
                .context("Failed to create batch token_type_ids array")?,
        })
    }

    /// Tokenizes, runs one inference and turns every row into a sentence embedding
    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let inputs = self.encode_batch(texts)?;
        let mask = inputs.attention_mask.clone();

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(inputs.input_ids)?,
            "attention_mask" => Value::from_array(inputs.attention_mask)?,
            "token_type_ids" => Value::from_array(inputs.token_type_ids)?
        ])?;

        let index = self
            .outputs
            .select(self.options.pooling, self.dense.is_some());
        let output = outputs[index]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let embeddings = self
            .pool_output(output, &mask)?
            .into_iter()
            .map(|pooled| {
                sentence_embedding(pooled, self.dense.as_deref(), self.options.normalize)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Embedded batch of {} texts", embeddings.len());
        Ok(embeddings)
    }

    fn pool_output(&self, output: ArrayViewD<'_, f32>, mask: &Array2<i64>) -> Result<Vec<Vec<f32>>> {
        match output.ndim() {
            // [batch, seq_len, hidden]: token embeddings
            3 => {
                let output = output
                    .into_dimensionality::<Ix3>()
                    .context("Failed to view output as rank 3")?;
                Ok(output
                    .axis_iter(Axis(0))
                    .zip(mask.axis_iter(Axis(0)))
                    .map(|(tokens, row_mask)| {
                        let row_mask: Vec<i64> = row_mask.to_vec();
                        self.options.pooling.apply(tokens, &row_mask)
                    })
                    .collect())
            }
            // [batch, hidden]: export already pooled
            2 => {
                let output = output
                    .into_dimensionality::<Ix2>()
                    .context("Failed to view output as rank 2")?;
                Ok(output.axis_iter(Axis(0)).map(|row| row.to_vec()).collect())
            }
            _ => anyhow::bail!(
                "Model outputs unexpected dimensions: {:?} (expected [batch, seq_len, hidden] or [batch, hidden])",
                output.shape()
            ),
        }
    }
}

/// Applies the Dense head (if any) then normalization to one pooled vector
fn sentence_embedding(pooled: Vec<f32>, dense: Option<&DenseHead>, normalize: bool) -> Result<Vec<f32>> {
    let mut embedding = match dense {
        Some(head) => head.apply(&pooled)?,
        None => pooled,
    };
    if normalize {
        l2_normalize(&mut embedding);
    }
    Ok(embedding)
}

#[async_trait]
impl TextEmbedder for OnnxEmbeddingModel {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Inference is CPU-bound; keep it off the async workers
        let model = self.clone();
        let texts = texts.to_vec();
        let embeddings = tokio::task::spawn_blocking(move || model.run_batch(&texts))
            .await
            .context("Embedding task panicked")??;

        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != self.dimension {
                anyhow::bail!(
                    "Unexpected embedding dimension at index {}: {} (expected {})",
                    i,
                    embedding.len(),
                    self.dimension
                );
            }
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(feature = "cuda")]
fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
    use tracing::warn;

    info!("Attempting CUDA execution provider...");
    let cuda_result = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CUDAExecutionProvider::default().build()])
        .context("Failed to set CUDA execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path);

    match cuda_result {
        Ok(session) => {
            info!("CUDA execution provider initialized");
            Ok(session)
        }
        Err(e) => {
            warn!("CUDA execution provider failed: {}", e);
            warn!("Falling back to CPU execution provider");
            Session::builder()
                .context("Failed to create session builder")?
                .with_execution_providers([CPUExecutionProvider::default().build()])
                .context("Failed to set CPU execution provider")?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .context("Failed to set optimization level")?
                .with_intra_threads(intra_threads)
                .context("Failed to set intra threads")?
                .commit_from_file(model_path)
                .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))
        }
    }
}

#[cfg(not(feature = "cuda"))]
fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    Session::builder()
        .context("Failed to create session builder")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))
}
