// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runtime abstraction traits

pub mod runtime;

pub use crate::error::{Result, RuntimeError};
pub use runtime::{NeuronStorage, Runtime};
