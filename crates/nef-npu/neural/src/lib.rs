// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # NEF Neural Computation
//!
//! ALL per-population neural math in one place:
//! - **Types**: Error type, parameter distributions, seeded RNG
//! - **Models**: Neuron models (LIF, LIF-rate) behind the `NeuronModel` trait
//! - **Tuning**: Encoders, gains and biases from declared distributions
//! - **Decoders**: Evaluation points + regularized least-squares readout
//! - **Synapse**: Exponential low-pass filtering of connection signals
//!
//! Nothing in this crate knows about networks or scheduling; the engine crate
//! wires these pieces together.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod decoders;
pub mod models;
pub mod synapse;
pub mod tuning;
pub mod types;

// Re-export types
pub use types::{seeded_rng, Distribution, NefRng, NeuralError, Result};

// Re-export neuron models
pub use models::{
    LifModel, LifParameters, LifRateModel, ModelParameters, NeuronModel, NeuronStateSlices,
    NeuronType,
};

pub use decoders::{sample_eval_points, DecoderSolver, Decoders, EvalPointSpec};
pub use synapse::{LowpassFilter, Synapse};
pub use tuning::{EncoderSpec, TuningParameters, TuningSpec};
