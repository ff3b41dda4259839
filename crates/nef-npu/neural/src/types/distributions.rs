// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scalar distributions for per-neuron parameters (intercepts, max rates).

use super::error::{NeuralError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Distribution a per-neuron parameter is drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Distribution {
    /// Uniform over `[low, high)`
    Uniform { low: f64, high: f64 },
    /// Every neuron gets the same value
    Constant(f64),
    /// Each neuron draws one of the listed values at random
    Choice(Vec<f64>),
    /// Cycle through the listed values in order (neuron i gets `values[i % len]`)
    Cycle(Vec<f64>),
}

impl Distribution {
    pub fn uniform(low: f64, high: f64) -> Self {
        Distribution::Uniform { low, high }
    }

    /// Check the distribution is well-formed
    pub fn validate(&self) -> Result<()> {
        match self {
            Distribution::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(NeuralError::InvalidParameters(format!(
                        "uniform distribution needs finite low <= high, got [{}, {})",
                        low, high
                    )));
                }
            }
            Distribution::Constant(value) => {
                if !value.is_finite() {
                    return Err(NeuralError::InvalidParameters(format!(
                        "constant distribution value must be finite, got {}",
                        value
                    )));
                }
            }
            Distribution::Choice(values) | Distribution::Cycle(values) => {
                if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
                    return Err(NeuralError::InvalidParameters(
                        "choice/cycle distribution needs at least one finite value".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Draw `n` samples
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        self.validate()?;
        let samples = match self {
            Distribution::Uniform { low, high } => (0..n)
                .map(|_| low + (high - low) * rng.gen::<f64>())
                .collect(),
            Distribution::Constant(value) => vec![*value; n],
            Distribution::Choice(values) => (0..n)
                .map(|_| values[rng.gen_range(0..values.len())])
                .collect(),
            Distribution::Cycle(values) => (0..n).map(|i| values[i % values.len()]).collect(),
        };
        Ok(samples)
    }
}
