// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine error types.
//!
//! Configuration errors are raised by [`ModelBuilder::build`](crate::ModelBuilder::build)
//! and name the offending entity. Numerical faults are raised while stepping and
//! carry the step index; a faulted simulator refuses to advance further.

use nef_npu_neural::NeuralError;
use nef_npu_runtime::RuntimeError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    // --- configuration errors (build time) ---
    #[error("{connection}: {what} dimension mismatch (expected {expected}, got {actual})")]
    DimensionMismatch {
        connection: String,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{referrer} references undeclared {target}")]
    DanglingReference { referrer: String, target: String },

    #[error("{probe} duplicates an existing probe on {target}")]
    DuplicateProbe { probe: String, target: String },

    #[error("Duplicate name '{name}'")]
    DuplicateName { name: String },

    #[error("Zero-delay cycle through connections [{}]", .connections.join(", "))]
    ZeroDelayCycle { connections: Vec<String> },

    #[error("{connection}: {reason}")]
    InvalidConnection { connection: String, reason: String },

    #[error("{ensemble}: {reason}")]
    InvalidEnsemble { ensemble: String, reason: String },

    #[error("{node}: {reason}")]
    InvalidNode { node: String, reason: String },

    #[error("{probe}: {reason}")]
    InvalidProbe { probe: String, reason: String },

    #[error("{ensemble}: tuning failed: {source}")]
    Tuning {
        ensemble: String,
        #[source]
        source: NeuralError,
    },

    #[error("{entity}: function returned {actual} values, declared {expected}")]
    FunctionArity {
        entity: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // --- numerical errors ---
    #[error("{ensemble}: decoder solve failed: {source}")]
    Solver {
        ensemble: String,
        #[source]
        source: NeuralError,
    },

    #[error("Numerical fault in {entity} at step {step}: {detail}")]
    NumericalFault {
        entity: String,
        step: u64,
        detail: String,
    },

    // --- run control ---
    #[error("Invalid run request: {0}")]
    InvalidRun(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl EngineError {
    /// True for errors detected while building the network
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            EngineError::Solver { .. }
                | EngineError::NumericalFault { .. }
                | EngineError::InvalidRun(_)
                | EngineError::Runtime(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
