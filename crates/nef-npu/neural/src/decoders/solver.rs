// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Regularized least-squares decoder solve.
//!
//! ```text
//! sigma = regularization * max(A)
//! G     = A^T A + P * sigma^2 * I          (N x N)
//! X     = G^-1 A^T Y                        (N x M)
//! W     = X^T                               (M x N)
//! ```
//!
//! `G` is symmetric positive definite for any `sigma > 0`, so the system is
//! solved with a Cholesky factorization.

use crate::types::{NeuralError, Result};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Solved readout weights for one (population, function) pair
#[derive(Debug, Clone, PartialEq)]
pub struct Decoders {
    /// M x N
    pub weights: Array2<f64>,
    /// RMS error of the fit over the evaluation points
    pub rmse: f64,
}

impl Decoders {
    pub fn output_dimensions(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_neurons(&self) -> usize {
        self.weights.ncols()
    }

    /// `out = W * activity`
    #[inline]
    pub fn decode(&self, activity: &[f64], out: &mut [f64]) {
        debug_assert_eq!(activity.len(), self.n_neurons());
        debug_assert_eq!(out.len(), self.output_dimensions());
        for (o, row) in out.iter_mut().zip(self.weights.rows()) {
            *o = row.iter().zip(activity).map(|(w, a)| w * a).sum();
        }
    }
}

/// L2-regularized least squares (noise standard deviation given as a fraction
/// of the largest activity)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecoderSolver {
    pub regularization: f64,
}

impl Default for DecoderSolver {
    fn default() -> Self {
        Self {
            regularization: 0.1,
        }
    }
}

impl DecoderSolver {
    pub fn new(regularization: f64) -> Self {
        Self { regularization }
    }

    /// Solve for decoders mapping activities `A` (P x N) to targets `Y` (P x M)
    pub fn solve(
        &self,
        activities: ArrayView2<'_, f64>,
        targets: ArrayView2<'_, f64>,
    ) -> Result<Decoders> {
        let (p, n) = activities.dim();
        let m = targets.ncols();
        if p == 0 || n == 0 {
            return Err(NeuralError::DegenerateSolve(format!(
                "activity matrix is {} x {}",
                p, n
            )));
        }
        if targets.nrows() != p {
            return Err(NeuralError::ShapeMismatch {
                what: "decoder targets",
                expected: format!("{} rows", p),
                actual: format!("{} rows", targets.nrows()),
            });
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(NeuralError::InvalidParameters(format!(
                "regularization must be finite and >= 0, got {}",
                self.regularization
            )));
        }
        if activities.iter().chain(targets.iter()).any(|v| !v.is_finite()) {
            return Err(NeuralError::DegenerateSolve(
                "non-finite activity or target value".to_string(),
            ));
        }

        let max_activity = activities.iter().cloned().fold(0.0_f64, f64::max);
        if max_activity <= 0.0 {
            return Err(NeuralError::DegenerateSolve(
                "population is silent over every evaluation point".to_string(),
            ));
        }

        let sigma = self.regularization * max_activity;
        let mut gram = activities.t().dot(&activities);
        let ridge = p as f64 * sigma * sigma;
        for i in 0..n {
            gram[[i, i]] += ridge;
        }
        let rhs = activities.t().dot(&targets);

        let factor = cholesky(&gram)?;
        let solution = cholesky_solve(&factor, &rhs);

        let residual = &activities.dot(&solution) - &targets;
        let rmse = if m == 0 {
            0.0
        } else {
            (residual.iter().map(|r| r * r).sum::<f64>() / (p * m) as f64).sqrt()
        };

        Ok(Decoders {
            weights: solution.reversed_axes(),
            rmse,
        })
    }
}

/// Lower-triangular `L` with `G = L L^T`
fn cholesky(gram: &Array2<f64>) -> Result<Array2<f64>> {
    let k = gram.nrows();
    let mut l = Array2::<f64>::zeros((k, k));
    for i in 0..k {
        for j in 0..=i {
            let mut sum = gram[[i, j]];
            for q in 0..j {
                sum -= l[[i, q]] * l[[j, q]];
            }
            if i == j {
                if !(sum > 0.0) {
                    return Err(NeuralError::SingularSystem { pivot: i });
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Ok(l)
}

/// Solve `L L^T X = B` column by column
fn cholesky_solve(l: &Array2<f64>, rhs: &Array2<f64>) -> Array2<f64> {
    let k = l.nrows();
    let mut out = Array2::<f64>::zeros(rhs.dim());
    let mut y = vec![0.0; k];
    for col in 0..rhs.ncols() {
        // Forward: L y = b
        for i in 0..k {
            let mut sum = rhs[[i, col]];
            for j in 0..i {
                sum -= l[[i, j]] * y[j];
            }
            y[i] = sum / l[[i, i]];
        }
        // Backward: L^T x = y
        for i in (0..k).rev() {
            let mut sum = y[i];
            for j in (i + 1)..k {
                sum -= l[[j, i]] * out[[j, col]];
            }
            out[[i, col]] = sum / l[[i, i]];
        }
    }
    out
}
