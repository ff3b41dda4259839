// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for neural computation

/// Error types for neuron models, tuning and decoder solving
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The requested max rate needs a negative time-to-spike
    #[error("Neuron {neuron}: max rate {max_rate} Hz is unreachable (limit {limit} Hz)")]
    UnreachableMaxRate {
        neuron: usize,
        max_rate: f64,
        limit: f64,
    },

    #[error("Neuron {neuron}: intercept {intercept} must lie in [-1, 1)")]
    InvalidIntercept { neuron: usize, intercept: f64 },

    #[error("Degenerate decoder solve: {0}")]
    DegenerateSolve(String),

    #[error("Singular system: non-positive pivot at row {pivot}")]
    SingularSystem { pivot: usize },

    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = core::result::Result<T, NeuralError>;
