// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runtime abstraction traits for population stepping
//!
//! ## Design Philosophy
//!
//! - **Storage Abstraction**: per-population dynamic state lives in a storage
//!   type chosen by the runtime; the engine only sees slices
//! - **Ownership**: each population's storage is owned by exactly one slot, so
//!   populations can be stepped concurrently without locking
//! - **Determinism**: stepping a population only reads its own input currents,
//!   so the result does not depend on how the runtime schedules populations

use crate::traits::Result;
use nef_npu_neural::{NeuronModel, NeuronStateSlices};

/// Runtime trait: abstracts storage implementation and stepping strategy
///
/// # Example
///
/// ```ignore
/// let runtime = StdRuntime::new(RuntimeConfig::default())?;
/// let mut storages = vec![runtime.create_neuron_storage(100)?];
/// storages[0].input_currents_mut().fill(1.5);
/// runtime.step_populations(0.001, &[NeuronType::default()], &mut storages)?;
/// ```
pub trait Runtime: Send + Sync {
    /// Neuron storage type
    type NeuronStorage: NeuronStorage;

    /// Create zeroed storage for a population of `count` neurons
    fn create_neuron_storage(&self, count: usize) -> Result<Self::NeuronStorage>;

    /// Step every population once. `models[i]` drives `storages[i]`.
    fn step_populations<M: NeuronModel>(
        &self,
        dt: f64,
        models: &[M],
        storages: &mut [Self::NeuronStorage],
    ) -> Result<()>;

    /// Platform supports parallel processing
    fn supports_parallel(&self) -> bool;

    /// Platform name for logging/debugging
    fn platform_name(&self) -> &'static str {
        "Generic Runtime"
    }
}

/// Neuron storage trait: structure-of-arrays state for one population
///
/// - Uses slice-based API for zero-copy access
/// - Mutations are explicit via `_mut()` methods
pub trait NeuronStorage: Send + Sync {
    /// Membrane voltages
    fn voltages(&self) -> &[f64];

    /// Refractory time remaining (seconds)
    fn refractory(&self) -> &[f64];

    /// Output of the last step (spikes at 1/dt, or rates)
    fn outputs(&self) -> &[f64];

    /// Input currents for the next step
    fn input_currents(&self) -> &[f64];

    fn input_currents_mut(&mut self) -> &mut [f64];

    /// Split into (read-only currents, mutable state) for a model step
    fn split_for_step(&mut self) -> (&[f64], NeuronStateSlices<'_>);

    /// Number of neurons stored
    fn count(&self) -> usize;

    /// Zero all dynamic state
    fn reset(&mut self);

    /// Index of the first non-finite input current, if any
    fn first_non_finite_current(&self) -> Option<usize> {
        self.input_currents().iter().position(|j| !j.is_finite())
    }
}
