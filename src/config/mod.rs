// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Server configuration
//!
//! Values come from CLI flags, then environment variables (including a
//! `.env` file loaded at startup), then the defaults below.

use crate::embeddings::{EmbeddingOptions, ModelSource, Pooling, DENSE_DIR_NAME};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

/// Default listening port
pub const DEFAULT_PORT: u16 = 10000;

/// Minimum cosine similarity for two words to be connected
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Seed for the 2D projection
pub const DEFAULT_PROJECTION_SEED: u64 = 42;

/// Default embedding model on the Hugging Face Hub
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/LaBSE";

/// Path of the ONNX export inside the model repository
pub const DEFAULT_MODEL_FILE: &str = "onnx/model.onnx";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("similarity threshold must be within [-1, 1], got {0}")]
    InvalidThreshold(f32),

    #[error("embedding max length must be greater than 0")]
    InvalidMaxLength,

    #[error("embedding thread count must be greater than 0")]
    InvalidThreadCount,

    #[error("max words must be at least 2, got {0}")]
    InvalidMaxWords(usize),
}

/// Word vectorizer HTTP service
#[derive(Parser, Debug, Clone)]
#[command(name = "word-vectorizer")]
#[command(version)]
#[command(about = "Embeds word lists, projects them to 2D and links similar words", long_about = None)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Local directory holding model.onnx and tokenizer.json (skips the Hub download)
    #[arg(long, env = "EMBEDDING_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Hugging Face Hub repository to fetch the model from
    #[arg(long, env = "EMBEDDING_MODEL_REPO", default_value = DEFAULT_MODEL_REPO)]
    pub model_repo: String,

    /// ONNX file path inside the Hub repository
    #[arg(long, env = "EMBEDDING_MODEL_FILE", default_value = DEFAULT_MODEL_FILE)]
    pub model_file: String,

    /// Dense module folder inside the model repo or directory ("none" to skip)
    #[arg(long, env = "EMBEDDING_DENSE_DIR", default_value = DENSE_DIR_NAME)]
    pub dense_dir: String,

    /// Pooling applied to token embeddings (cls or mean)
    #[arg(long, env = "EMBEDDING_POOLING", default_value = "cls")]
    pub pooling: Pooling,

    /// L2-normalize sentence embeddings
    #[arg(long, env = "EMBEDDING_NORMALIZE", default_value_t = true, action = clap::ArgAction::Set)]
    pub normalize: bool,

    /// Maximum tokens per word (longer inputs are truncated)
    #[arg(long, env = "EMBEDDING_MAX_LENGTH", default_value_t = 256)]
    pub max_length: usize,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "EMBEDDING_THREADS", default_value_t = 1)]
    pub threads: usize,

    /// Minimum similarity for a connection
    #[arg(long, env = "SIMILARITY_THRESHOLD", default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    pub similarity_threshold: f32,

    /// Seed for the 2D projection
    #[arg(long, env = "PROJECTION_SEED", default_value_t = DEFAULT_PROJECTION_SEED)]
    pub projection_seed: u64,

    /// Upper bound on words per request (unlimited when unset)
    #[arg(long, env = "MAX_WORDS")]
    pub max_words: Option<usize>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub model: ModelSource,
    pub embedding: EmbeddingOptions,
    pub similarity_threshold: f32,
    pub projection_seed: u64,
    pub max_words: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            model: ModelSource::HuggingFace {
                repo: DEFAULT_MODEL_REPO.to_string(),
                model_file: DEFAULT_MODEL_FILE.to_string(),
                dense_dir: Some(DENSE_DIR_NAME.to_string()),
            },
            embedding: EmbeddingOptions::default(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            projection_seed: DEFAULT_PROJECTION_SEED,
            max_words: None,
        }
    }
}

impl ServerConfig {
    /// Loads `.env` (if present), then parses CLI flags and environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let dense_dir = match cli.dense_dir.trim() {
            "" | "none" => None,
            dir => Some(dir.to_string()),
        };
        let model = match cli.model_dir {
            Some(dir) => ModelSource::Local { dir, dense_dir },
            None => ModelSource::HuggingFace {
                repo: cli.model_repo,
                model_file: cli.model_file,
                dense_dir,
            },
        };

        let config = Self {
            host: cli.host,
            port: cli.port,
            model,
            embedding: EmbeddingOptions {
                pooling: cli.pooling,
                normalize: cli.normalize,
                max_length: cli.max_length,
                intra_threads: cli.threads,
            },
            similarity_threshold: cli.similarity_threshold,
            projection_seed: cli.projection_seed,
            max_words: cli.max_words,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::InvalidThreshold(self.similarity_threshold));
        }
        if self.embedding.max_length == 0 {
            return Err(ConfigError::InvalidMaxLength);
        }
        if self.embedding.intra_threads == 0 {
            return Err(ConfigError::InvalidThreadCount);
        }
        if let Some(max) = self.max_words {
            if max < 2 {
                return Err(ConfigError::InvalidMaxWords(max));
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
