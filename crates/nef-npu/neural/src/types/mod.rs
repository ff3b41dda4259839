// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neural Types Module
//!
//! Core type definitions shared by models, tuning and decoder solving.

pub mod distributions;
pub mod error;
pub mod rng;

pub use distributions::Distribution;
pub use error::{NeuralError, Result};
pub use rng::{seeded_rng, NefRng};
