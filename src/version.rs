// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the word vectorizer service

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Full version string with feature description
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"), "-onnx-embeddings");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "onnx-embeddings",
    "dense-head",
    "huggingface-hub-models",
    "pca-projection",
    "cosine-connections",
    "cors",
];

/// Get version information as a formatted string
pub fn get_version_info() -> String {
    format!("Word Vectorizer {}\nFeatures: {}", VERSION, FEATURES.join(", "))
}
