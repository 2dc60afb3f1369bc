// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Token-to-sentence pooling

use ndarray::ArrayView2;
use std::fmt;
use std::str::FromStr;

/// Strategy for collapsing `[seq_len, hidden]` token embeddings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pooling {
    /// First ([CLS]) token, as LaBSE is trained
    Cls,
    /// Mean over tokens weighted by the attention mask
    Mean,
}

impl Pooling {
    /// Pools one sequence. `mask` holds one entry per row of `tokens`.
    pub fn apply(&self, tokens: ArrayView2<'_, f32>, mask: &[i64]) -> Vec<f32> {
        let seq_len = tokens.shape()[0];
        let hidden_dim = tokens.shape()[1];

        match self {
            Pooling::Cls => {
                if seq_len == 0 {
                    return vec![0.0; hidden_dim];
                }
                tokens.row(0).to_vec()
            }
            Pooling::Mean => {
                let mut pooled = vec![0.0f32; hidden_dim];
                let mut sum_mask = 0.0f32;

                for i in 0..seq_len {
                    let mask_value = mask.get(i).copied().unwrap_or(0) as f32;
                    if mask_value == 0.0 {
                        continue;
                    }
                    sum_mask += mask_value;
                    for (j, value) in pooled.iter_mut().enumerate() {
                        *value += tokens[[i, j]] * mask_value;
                    }
                }

                for value in &mut pooled {
                    *value /= sum_mask.max(1e-9);
                }
                pooled
            }
        }
    }
}

impl FromStr for Pooling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cls" => Ok(Pooling::Cls),
            "mean" => Ok(Pooling::Mean),
            other => Err(format!("unknown pooling '{}' (expected cls or mean)", other)),
        }
    }
}

impl fmt::Display for Pooling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pooling::Cls => write!(f, "cls"),
            Pooling::Mean => write!(f, "mean"),
        }
    }
}

/// Scales `vector` to unit length in place; zero vectors are left unchanged
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cls_takes_first_token() {
        let tokens = array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let pooled = Pooling::Cls.apply(tokens.view(), &[1, 1, 1]);
        assert_eq!(pooled, vec![1.0, 2.0]);
    }

    #[test]
    fn test_mean_ignores_padding() {
        let tokens = array![[1.0f32, 2.0], [3.0, 4.0], [100.0, 100.0]];
        let pooled = Pooling::Mean.apply(tokens.view(), &[1, 1, 0]);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn test_mean_with_empty_mask_is_zero() {
        let tokens = array![[1.0f32, 2.0]];
        let pooled = Pooling::Mean.apply(tokens.view(), &[0]);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }

    #[test]
    fn test_parse_pooling() {
        assert_eq!("CLS".parse::<Pooling>().unwrap(), Pooling::Cls);
        assert_eq!(" mean ".parse::<Pooling>().unwrap(), Pooling::Mean);
        assert!("max".parse::<Pooling>().is_err());
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0f32; 3];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
    }
}
