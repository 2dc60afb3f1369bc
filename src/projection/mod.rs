// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! 2D projection of embedding sets for visualization
//!
//! [`PcaProjector`] computes principal coordinates: rows are centred, the
//! two leading eigenpairs of the Gram matrix are found by power iteration
//! with deflation, and each row is placed at `sqrt(lambda_k) * u_k`. The
//! start vectors are drawn from a seeded RNG and each component's sign is
//! fixed, so the same input and seed always give the same layout.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Relative eigenvalue below which a component is treated as empty
const EIGEN_EPSILON: f64 = 1e-10;

const MAX_ITERATIONS: usize = 1000;
const CONVERGENCE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("projection needs at least 2 rows, got {0}")]
    TooFewRows(usize),

    #[error("embeddings have zero dimensions")]
    EmptyDimension,

    #[error("embedding {index} has {actual} dimensions (expected {expected})")]
    RaggedRows {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Reduces a set of vectors to 2D points, one per row, in row order
pub trait Projector {
    fn project(&self, data: &Array2<f32>) -> Result<Vec<[f64; 2]>, ProjectionError>;
}

/// Seeded principal-coordinates projector; build a fresh one per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcaProjector {
    seed: u64,
}

impl PcaProjector {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Projector for PcaProjector {
    fn project(&self, data: &Array2<f32>) -> Result<Vec<[f64; 2]>, ProjectionError> {
        let n = data.nrows();
        if n < 2 {
            return Err(ProjectionError::TooFewRows(n));
        }
        if data.ncols() == 0 {
            return Err(ProjectionError::EmptyDimension);
        }

        let x = data.mapv(f64::from);
        let mean = x.mean_axis(Axis(0)).ok_or(ProjectionError::TooFewRows(n))?;
        let centered = &x - &mean;
        let mut gram = centered.dot(&centered.t());

        let mut coords = vec![[0.0f64; 2]; n];
        let trace: f64 = gram.diag().sum();
        if trace <= EIGEN_EPSILON {
            return Ok(coords);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        for component in 0..2 {
            let (lambda, mut u) = power_iteration(&gram, &mut rng);
            if lambda <= EIGEN_EPSILON * trace {
                break;
            }
            fix_sign(&mut u);

            let scale = lambda.sqrt();
            for (point, value) in coords.iter_mut().zip(u.iter()) {
                point[component] = value * scale;
            }

            let column = u.view().insert_axis(Axis(1));
            gram = gram - column.dot(&column.t()) * lambda;
        }

        Ok(coords)
    }
}

/// Builds an `n x d` matrix from equally sized rows
pub fn to_matrix(rows: &[Vec<f32>]) -> Result<Array2<f32>, ProjectionError> {
    let dimension = rows.first().map(Vec::len).unwrap_or(0);
    let mut flat = Vec::with_capacity(rows.len() * dimension);
    for (index, row) in rows.iter().enumerate() {
        if row.len() != dimension {
            return Err(ProjectionError::RaggedRows {
                index,
                expected: dimension,
                actual: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((rows.len(), dimension), flat).map_err(|_| ProjectionError::EmptyDimension)
}

/// Leading eigenpair of a symmetric positive semi-definite matrix
fn power_iteration(matrix: &Array2<f64>, rng: &mut StdRng) -> (f64, Array1<f64>) {
    let n = matrix.nrows();
    let mut v: Array1<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let norm = v.dot(&v).sqrt();
    if norm == 0.0 {
        return (0.0, v);
    }
    v /= norm;

    for _ in 0..MAX_ITERATIONS {
        let mut w = matrix.dot(&v);
        let norm = w.dot(&w).sqrt();
        if norm <= EIGEN_EPSILON {
            return (0.0, v);
        }
        w /= norm;

        let delta = (&w - &v).mapv(f64::abs).fold(0.0f64, |acc, &d| acc.max(d));
        v = w;
        if delta < CONVERGENCE_TOLERANCE {
            break;
        }
    }

    let lambda = v.dot(&matrix.dot(&v));
    (lambda, v)
}

/// Makes the largest-magnitude entry positive
fn fix_sign(v: &mut Array1<f64>) {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}
