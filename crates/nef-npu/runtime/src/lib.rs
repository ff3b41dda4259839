// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # NEF Runtime Abstraction
//!
//! Per-population neuron state storage and the stepping strategy.
//!
//! This crate provides:
//! - **Traits** (always available): `Runtime`, `NeuronStorage`
//! - **Std Implementation** (behind `std` feature): `StdRuntime` with
//!   optional Rayon fan-out across populations
//!
//! ## Usage
//!
//! ```rust
//! use nef_npu_runtime::{Runtime, RuntimeConfig, StdRuntime};
//! let runtime = StdRuntime::new(RuntimeConfig::default()).unwrap();
//! assert!(runtime.supports_parallel());
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod traits;

pub use traits::{NeuronStorage, Result, Runtime, RuntimeError};

// Standard library implementation (behind "std" feature)
#[cfg(feature = "std")]
pub mod std_impl;

#[cfg(feature = "std")]
pub use std_impl::{NeuronArray, RuntimeConfig, StdRuntime};
