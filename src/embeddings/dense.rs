// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Dense projection head of a sentence-transformers pipeline
//!
//! Models such as LaBSE end with `Pooling -> Dense -> Normalize`. The Dense
//! module lives in its own folder (`2_Dense/`) next to the transformer and
//! is not part of the ONNX graph, so it is applied here after pooling:
//! `y = activation(W x + b)`.

use anyhow::{Context, Result};
use ndarray::{Array1, Array2};
use safetensors::{Dtype, SafeTensors};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Folder holding the Dense module inside a sentence-transformers repo
pub const DENSE_DIR_NAME: &str = "2_Dense";
pub const DENSE_CONFIG_FILE: &str = "config.json";
pub const DENSE_WEIGHTS_FILE: &str = "model.safetensors";

const WEIGHT_TENSOR: &str = "linear.weight";
const BIAS_TENSOR: &str = "linear.bias";

/// Activation applied after the linear layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Tanh,
    Identity,
}

impl Activation {
    /// Parses the torch class path stored in the module's `config.json`
    fn from_torch_name(name: &str) -> Result<Self> {
        match name.rsplit('.').next().unwrap_or(name) {
            "Tanh" => Ok(Activation::Tanh),
            "Identity" => Ok(Activation::Identity),
            other => anyhow::bail!("Unsupported dense activation: {}", other),
        }
    }

    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Tanh => x.tanh(),
            Activation::Identity => x,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DenseConfig {
    in_features: usize,
    out_features: usize,
    #[serde(default = "default_bias")]
    bias: bool,
    #[serde(default = "default_activation")]
    activation_function: String,
}

fn default_bias() -> bool {
    true
}

fn default_activation() -> String {
    "torch.nn.modules.activation.Tanh".to_string()
}

/// Paths to a Dense module's config and weights
#[derive(Debug, Clone, PartialEq)]
pub struct DenseFiles {
    pub config_path: PathBuf,
    pub weights_path: PathBuf,
}

impl DenseFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_path: dir.join(DENSE_CONFIG_FILE),
            weights_path: dir.join(DENSE_WEIGHTS_FILE),
        }
    }

    pub fn exist(&self) -> bool {
        self.config_path.exists() && self.weights_path.exists()
    }
}

/// Linear layer plus activation, weights stored `[out_features, in_features]`
#[derive(Debug, Clone)]
pub struct DenseHead {
    weight: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

impl DenseHead {
    pub fn new(weight: Array2<f32>, bias: Option<Array1<f32>>, activation: Activation) -> Result<Self> {
        let out_features = weight.nrows();
        let bias = bias.unwrap_or_else(|| Array1::zeros(out_features));
        if bias.len() != out_features {
            anyhow::bail!(
                "Dense bias has {} entries (expected {})",
                bias.len(),
                out_features
            );
        }
        Ok(Self {
            weight,
            bias,
            activation,
        })
    }

    /// Loads `config.json` and `model.safetensors` written by sentence-transformers
    pub fn load(files: &DenseFiles) -> Result<Self> {
        let config_bytes = fs::read(&files.config_path).with_context(|| {
            format!("Failed to read dense config {}", files.config_path.display())
        })?;
        let config: DenseConfig =
            serde_json::from_slice(&config_bytes).context("Invalid dense config.json")?;
        let activation = Activation::from_torch_name(&config.activation_function)?;

        let weight_bytes = fs::read(&files.weights_path).with_context(|| {
            format!("Failed to read dense weights {}", files.weights_path.display())
        })?;
        let tensors = SafeTensors::deserialize(&weight_bytes)
            .map_err(|e| anyhow::anyhow!("Invalid safetensors file: {}", e))?;

        let (weight_values, weight_shape) = read_tensor(&tensors, WEIGHT_TENSOR)?;
        if weight_shape != [config.out_features, config.in_features] {
            anyhow::bail!(
                "Dense weight has shape {:?} (expected [{}, {}])",
                weight_shape,
                config.out_features,
                config.in_features
            );
        }
        let weight = Array2::from_shape_vec((config.out_features, config.in_features), weight_values)
            .context("Failed to shape dense weight")?;

        let bias = if config.bias {
            let (values, shape) = read_tensor(&tensors, BIAS_TENSOR)?;
            if shape != [config.out_features] {
                anyhow::bail!(
                    "Dense bias has shape {:?} (expected [{}])",
                    shape,
                    config.out_features
                );
            }
            Some(Array1::from(values))
        } else {
            None
        };

        info!(
            "Loaded dense head {} -> {} ({:?})",
            config.in_features, config.out_features, activation
        );
        Self::new(weight, bias, activation)
    }

    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    /// `activation(W x + b)` for one pooled vector
    pub fn apply(&self, input: &[f32]) -> Result<Vec<f32>> {
        if input.len() != self.in_features() {
            anyhow::bail!(
                "Dense head expects {} inputs, got {}",
                self.in_features(),
                input.len()
            );
        }
        let x = ndarray::ArrayView1::from(input);
        let y = self.weight.dot(&x) + &self.bias;
        Ok(y.iter().map(|&v| self.activation.apply(v)).collect())
    }
}

/// Little-endian f32 tensor values plus shape
fn read_tensor(tensors: &SafeTensors<'_>, name: &str) -> Result<(Vec<f32>, Vec<usize>)> {
    let view = tensors
        .tensor(name)
        .map_err(|e| anyhow::anyhow!("Missing tensor {}: {}", name, e))?;
    if view.dtype() != Dtype::F32 {
        anyhow::bail!("Tensor {} has dtype {:?} (expected F32)", name, view.dtype());
    }
    let values = view
        .data()
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok((values, view.shape().to_vec()))
}
