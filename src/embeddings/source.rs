// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model file resolution
//!
//! Models are either read from a local directory or fetched from the
//! Hugging Face Hub into the standard HF cache. Sentence-transformers
//! repositories keep their Dense head in a sub-folder (`2_Dense` for
//! LaBSE); it is resolved alongside the ONNX export when configured.

use crate::embeddings::dense::{DenseFiles, DENSE_CONFIG_FILE, DENSE_WEIGHTS_FILE};
use anyhow::{Context, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::{Path, PathBuf};
use tracing::info;

pub const MODEL_FILE_NAME: &str = "model.onnx";
pub const TOKENIZER_FILE_NAME: &str = "tokenizer.json";

/// Where the embedding model comes from
///
/// `dense_dir` is the Dense module folder relative to the model root, or
/// `None` when the pipeline has no Dense step.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Directory containing `model.onnx` and `tokenizer.json`
    Local {
        dir: PathBuf,
        dense_dir: Option<String>,
    },
    /// Hub repository plus the ONNX file path inside it
    HuggingFace {
        repo: String,
        model_file: String,
        dense_dir: Option<String>,
    },
}

impl ModelSource {
    /// Name reported by the model (repo id or directory name)
    pub fn display_name(&self) -> String {
        match self {
            ModelSource::Local { dir, .. } => dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string()),
            ModelSource::HuggingFace { repo, .. } => repo.clone(),
        }
    }
}

/// Paths to the files needed by [`super::OnnxEmbeddingModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub dense: Option<DenseFiles>,
}

impl ModelFiles {
    /// Files in `dir`, picking up `dir/<dense_dir>` when its files exist
    pub fn in_dir(dir: &Path, dense_dir: Option<&str>) -> Self {
        let dense = dense_dir
            .map(|sub| DenseFiles::in_dir(&dir.join(sub)))
            .filter(DenseFiles::exist);
        Self {
            model_path: dir.join(MODEL_FILE_NAME),
            tokenizer_path: dir.join(TOKENIZER_FILE_NAME),
            dense,
        }
    }
}

/// Resolves a [`ModelSource`] to files on disk, downloading if needed
pub async fn resolve_model_files(source: &ModelSource) -> Result<ModelFiles> {
    match source {
        ModelSource::Local { dir, dense_dir } => {
            let files = ModelFiles::in_dir(dir, dense_dir.as_deref());
            if !files.model_path.exists() {
                anyhow::bail!("ONNX model file not found: {}", files.model_path.display());
            }
            if !files.tokenizer_path.exists() {
                anyhow::bail!(
                    "Tokenizer file not found: {}",
                    files.tokenizer_path.display()
                );
            }
            if let (Some(sub), None) = (dense_dir, &files.dense) {
                info!(
                    "No dense head under {}; using pooled outputs as-is",
                    dir.join(sub).display()
                );
            }
            Ok(files)
        }
        ModelSource::HuggingFace {
            repo,
            model_file,
            dense_dir,
        } => {
            let repo = repo.clone();
            let model_file = model_file.clone();
            let dense_dir = dense_dir.clone();
            tokio::task::spawn_blocking(move || {
                download_from_hub(&repo, &model_file, dense_dir.as_deref())
            })
            .await
            .context("Model download task panicked")?
        }
    }
}

fn download_from_hub(repo_id: &str, model_file: &str, dense_dir: Option<&str>) -> Result<ModelFiles> {
    info!("Fetching embedding model {} from Hugging Face Hub", repo_id);

    let api = Api::new().context("Failed to create Hugging Face Hub client")?;
    let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));
    let fetch = |file: &str| {
        repo.get(file)
            .with_context(|| format!("Failed to fetch {} from {}", file, repo_id))
    };

    let model_path = fetch(model_file)?;
    let tokenizer_path = fetch(TOKENIZER_FILE_NAME)?;
    let dense = match dense_dir {
        Some(sub) => Some(DenseFiles {
            config_path: fetch(&format!("{}/{}", sub, DENSE_CONFIG_FILE))?,
            weights_path: fetch(&format!("{}/{}", sub, DENSE_WEIGHTS_FILE))?,
        }),
        None => None,
    };

    info!("Model files cached at {}", model_path.display());

    Ok(ModelFiles {
        model_path,
        tokenizer_path,
        dense,
    })
}
