// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use std::{env, sync::Arc};
use tracing::info;
use word_vectorizer::{
    api::{start_server, AppState},
    config::ServerConfig,
    embeddings::{resolve_model_files, OnnxEmbeddingModel, TextEmbedder},
    vectorize::Vectorizer,
    version,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load().context("Invalid configuration")?;

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("{}", version::get_version_info());

    // The model is loaded once and shared read-only by every request
    let files = resolve_model_files(&config.model)
        .await
        .context("Failed to resolve embedding model files")?;
    let model = OnnxEmbeddingModel::from_files(
        config.model.display_name(),
        &files,
        config.embedding.clone(),
    )
    .await
    .context("Failed to load embedding model")?;
    let embedder: Arc<dyn TextEmbedder> = Arc::new(model);

    info!(
        "Similarity threshold {}, projection seed {}",
        config.similarity_threshold, config.projection_seed
    );
    let vectorizer = Vectorizer::new(
        embedder,
        config.similarity_threshold,
        config.projection_seed,
    );

    let state = AppState::new(vectorizer, config.max_words);
    start_server(config.socket_addr(), state).await
}
