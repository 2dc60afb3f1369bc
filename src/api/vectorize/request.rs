// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! VectorizeRequest type for POST /vectorize

use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Request body for POST /vectorize
///
/// # Example
/// ```json
/// { "words": ["dog", "cat", "car"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizeRequest {
    /// Words to place; order is preserved and duplicates are allowed
    pub words: Vec<String>,
}

impl VectorizeRequest {
    /// Checks the optional per-request word limit
    ///
    /// Lists shorter than two words are valid and produce an empty result.
    pub fn validate(&self, max_words: Option<usize>) -> Result<(), ApiError> {
        if let Some(max) = max_words {
            if self.words.len() > max {
                return Err(ApiError::ValidationError {
                    field: "words".to_string(),
                    message: format!(
                        "words array cannot contain more than {} items (got {})",
                        max,
                        self.words.len()
                    ),
                });
            }
        }
        Ok(())
    }
}
