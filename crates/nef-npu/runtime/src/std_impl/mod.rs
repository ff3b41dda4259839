// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NEF Runtime - Standard (Desktop/Server)
//!
//! ## Features
//! - Dynamic allocation (`Vec`)
//! - Parallel stepping across populations (Rayon)
//!
//! This module is only available when the `std` feature is enabled.

pub mod neuron_array;
pub mod runtime;

pub use neuron_array::NeuronArray;
pub use runtime::StdRuntime;

/// Runtime configuration for std platform
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Step populations concurrently
    pub parallel: bool,

    /// Number of parallel threads (0 = Rayon's global pool)
    pub num_threads: usize,

    /// Total neuron count below which stepping stays sequential
    pub parallel_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            num_threads: 0,
            parallel_threshold: 1024,
        }
    }
}
