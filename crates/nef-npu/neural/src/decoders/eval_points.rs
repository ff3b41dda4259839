// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Evaluation point sampling for decoder solves.

use crate::types::rng::unit_vector;
use crate::types::{NeuralError, Result};
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How many evaluation points a population gets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalPointSpec {
    pub per_dimension: usize,
    pub min_points: usize,
    pub max_points: usize,
}

impl Default for EvalPointSpec {
    fn default() -> Self {
        Self {
            per_dimension: 500,
            min_points: 750,
            max_points: 2500,
        }
    }
}

impl EvalPointSpec {
    /// `clamp(per_dimension * D, min, max)`, raised to at least `2 * N` so the
    /// least-squares system stays overdetermined
    pub fn count(&self, n_neurons: usize, dimensions: usize) -> usize {
        let base = self
            .per_dimension
            .saturating_mul(dimensions)
            .clamp(self.min_points, self.max_points.max(self.min_points));
        base.max(2 * n_neurons)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_points == 0 || self.min_points > self.max_points {
            return Err(NeuralError::InvalidParameters(format!(
                "eval points: need 0 < min ({}) <= max ({})",
                self.min_points, self.max_points
            )));
        }
        Ok(())
    }
}

/// Sample `count` points uniformly from the D-ball of the given radius (count x D)
pub fn sample_eval_points<R: Rng + ?Sized>(
    count: usize,
    dimensions: usize,
    radius: f64,
    rng: &mut R,
) -> Array2<f64> {
    let mut points = Array2::zeros((count, dimensions));
    let inv_d = 1.0 / dimensions.max(1) as f64;
    for mut row in points.rows_mut() {
        let direction = unit_vector(rng, dimensions);
        let scale = radius * rng.gen::<f64>().powf(inv_d);
        for (dst, v) in row.iter_mut().zip(direction) {
            *dst = v * scale;
        }
    }
    points
}
