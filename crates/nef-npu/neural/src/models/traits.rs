// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neuron Model Traits
//!
//! A neuron model is a pure function of (input current, state) -> (state, output).
//! Models also expose their steady-state rate curve, which the tuning generator
//! inverts and the decoder solver samples.

use crate::types::Result;

/// Mutable per-neuron state for one population, borrowed from runtime storage.
///
/// All slices have the population's neuron count as length.
#[derive(Debug)]
pub struct NeuronStateSlices<'a> {
    /// Membrane voltages, 0 = reset, 1 = threshold
    pub voltages: &'a mut [f64],
    /// Refractory time remaining (seconds)
    pub refractory: &'a mut [f64],
    /// Output this step (spike amplitude 1/dt, or a rate in Hz)
    pub outputs: &'a mut [f64],
}

/// Trait implemented by every neuron model
pub trait NeuronModel: Send + Sync {
    fn model_name(&self) -> &'static str;

    /// Whether `step` emits spikes (as opposed to a continuous rate)
    fn is_spiking(&self) -> bool;

    /// Steady-state firing rate (Hz) for a constant input current
    fn rate(&self, current: f64) -> f64;

    /// Per-neuron gain and bias so that each neuron fires at `max_rates[i]` when
    /// its normalized drive is 1 and sits at threshold when the drive equals
    /// `intercepts[i]`.
    fn gain_bias(&self, max_rates: &[f64], intercepts: &[f64]) -> Result<(Vec<f64>, Vec<f64>)>;

    /// Advance every neuron by `dt` with the given input currents
    fn step(&self, dt: f64, currents: &[f64], state: NeuronStateSlices<'_>);

    /// Rates for a batch of currents
    fn rates(&self, currents: &[f64], out: &mut [f64]) {
        debug_assert_eq!(currents.len(), out.len());
        for (o, &j) in out.iter_mut().zip(currents) {
            *o = self.rate(j);
        }
    }
}

/// Trait for model-specific parameters
pub trait ModelParameters {
    /// Validate the parameters, naming the offending field
    fn validate(&self) -> Result<()>;
}
