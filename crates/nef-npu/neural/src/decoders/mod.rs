// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Decoder Solver
//!
//! Decoders are linear readout weights that turn a population's activity back
//! into a vector. They are solved once per (population, function) pair when a
//! network is built and never during stepping.

pub mod eval_points;
pub mod solver;

pub use eval_points::{sample_eval_points, EvalPointSpec};
pub use solver::{DecoderSolver, Decoders};
