// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Vectorize API Module
//!
//! POST /vectorize: embeds a word list and returns a 2D layout plus the
//! connections between similar words.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::vectorize_handler;
pub use request::VectorizeRequest;
pub use response::VectorizeResponse;
