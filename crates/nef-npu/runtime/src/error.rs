// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for runtime operations

/// Runtime errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("Capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded {
        /// Requested capacity
        requested: usize,
        /// Available capacity
        available: usize,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Models and storages handed to a step disagree in count or size
    #[error("State length mismatch for {what}: expected {expected}, got {actual}")]
    StateLengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Result type for runtime operations
pub type Result<T> = core::result::Result<T, RuntimeError>;
