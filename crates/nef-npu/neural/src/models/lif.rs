// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # LIF (Leaky Integrate-and-Fire) Neuron Model
//!
//! The default spiking model.
//!
//! ## Model Dynamics
//!
//! ```text
//! Membrane equation (normalized, threshold = 1, reset = 0):
//!     dv/dt = (J - v) / tau_rc
//!
//! Exact update over the non-refractory part of the step (delta_t):
//!     v(t + delta_t) = J + (v(t) - J) * exp(-delta_t / tau_rc)
//!
//! Spike:
//!     if v > 1: spike, reset v = 0,
//!         refractory = tau_ref - (time elapsed since the threshold crossing)
//!
//! Steady-state rate for constant J > 1:
//!     r(J) = 1 / (tau_ref + tau_rc * ln(1 + 1 / (J - 1)))
//! ```

use super::traits::{ModelParameters, NeuronModel, NeuronStateSlices};
use crate::types::{NeuralError, Result};
use serde::{Deserialize, Serialize};

/// LIF model-specific parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifParameters {
    /// Membrane time constant (seconds)
    pub tau_rc: f64,

    /// Absolute refractory period (seconds)
    pub tau_ref: f64,
}

impl LifParameters {
    pub fn new(tau_rc: f64, tau_ref: f64) -> Self {
        Self { tau_rc, tau_ref }
    }

    /// Highest rate any LIF neuron with these parameters can reach
    pub fn max_rate_limit(&self) -> f64 {
        if self.tau_ref > 0.0 {
            1.0 / self.tau_ref
        } else {
            f64::INFINITY
        }
    }
}

impl Default for LifParameters {
    fn default() -> Self {
        Self {
            tau_rc: 0.02,
            tau_ref: 0.002,
        }
    }
}

impl ModelParameters for LifParameters {
    fn validate(&self) -> Result<()> {
        if !(self.tau_rc.is_finite() && self.tau_rc > 0.0) {
            return Err(NeuralError::InvalidParameters(format!(
                "LIF: tau_rc must be finite and > 0, got {}",
                self.tau_rc
            )));
        }
        if !(self.tau_ref.is_finite() && self.tau_ref >= 0.0) {
            return Err(NeuralError::InvalidParameters(format!(
                "LIF: tau_ref must be finite and >= 0, got {}",
                self.tau_ref
            )));
        }
        Ok(())
    }
}

/// Steady-state LIF rate for input current `j`
#[inline]
pub fn lif_rate(j: f64, params: &LifParameters) -> f64 {
    if j > 1.0 {
        1.0 / (params.tau_ref + params.tau_rc * (1.0 / (j - 1.0)).ln_1p())
    } else {
        0.0
    }
}

/// Closed-form inversion of the rate curve at (intercept -> J = 1) and (1 -> max rate)
pub(crate) fn lif_gain_bias(
    params: &LifParameters,
    max_rates: &[f64],
    intercepts: &[f64],
) -> Result<(Vec<f64>, Vec<f64>)> {
    if max_rates.len() != intercepts.len() {
        return Err(NeuralError::ShapeMismatch {
            what: "max_rates vs intercepts",
            expected: max_rates.len().to_string(),
            actual: intercepts.len().to_string(),
        });
    }

    let mut gains = Vec::with_capacity(max_rates.len());
    let mut biases = Vec::with_capacity(max_rates.len());
    for (neuron, (&max_rate, &intercept)) in max_rates.iter().zip(intercepts).enumerate() {
        if !(max_rate.is_finite() && max_rate > 0.0) {
            return Err(NeuralError::InvalidParameters(format!(
                "neuron {}: max rate must be finite and > 0, got {}",
                neuron, max_rate
            )));
        }
        if !(intercept.is_finite() && (-1.0..1.0).contains(&intercept)) {
            return Err(NeuralError::InvalidIntercept { neuron, intercept });
        }

        // Time left for integration once the refractory period is paid
        let time_to_spike = 1.0 / max_rate - params.tau_ref;
        if time_to_spike <= 0.0 {
            return Err(NeuralError::UnreachableMaxRate {
                neuron,
                max_rate,
                limit: params.max_rate_limit(),
            });
        }

        // Current that produces max_rate: J = 1 / (1 - exp(-time_to_spike / tau_rc))
        let j_max = 1.0 / -(-time_to_spike / params.tau_rc).exp_m1();
        let gain = (j_max - 1.0) / (1.0 - intercept);
        gains.push(gain);
        biases.push(1.0 - gain * intercept);
    }
    Ok((gains, biases))
}

/// LIF (Leaky Integrate-and-Fire) spiking neuron model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifModel {
    params: LifParameters,
}

impl LifModel {
    pub fn new(params: LifParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub(crate) fn from_validated(params: LifParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LifParameters {
        &self.params
    }
}

impl Default for LifModel {
    fn default() -> Self {
        Self {
            params: LifParameters::default(),
        }
    }
}

impl NeuronModel for LifModel {
    fn model_name(&self) -> &'static str {
        "Leaky Integrate-and-Fire (LIF)"
    }

    fn is_spiking(&self) -> bool {
        true
    }

    #[inline(always)]
    fn rate(&self, current: f64) -> f64 {
        lif_rate(current, &self.params)
    }

    fn gain_bias(&self, max_rates: &[f64], intercepts: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        lif_gain_bias(&self.params, max_rates, intercepts)
    }

    fn step(&self, dt: f64, currents: &[f64], state: NeuronStateSlices<'_>) {
        let NeuronStateSlices {
            voltages,
            refractory,
            outputs,
        } = state;
        debug_assert_eq!(currents.len(), voltages.len());
        debug_assert_eq!(currents.len(), refractory.len());
        debug_assert_eq!(currents.len(), outputs.len());

        let tau_rc = self.params.tau_rc;
        let tau_ref = self.params.tau_ref;
        let spike_amplitude = 1.0 / dt;

        for i in 0..currents.len() {
            let j = currents[i];

            // Only the part of the step after the refractory period integrates
            let delta_t = (dt - refractory[i]).clamp(0.0, dt);
            refractory[i] = (refractory[i] - dt).max(0.0);

            let mut v = voltages[i];
            v -= (j - v) * (-delta_t / tau_rc).exp_m1();

            if v > 1.0 {
                // Threshold crossing time, measured from the start of the step
                let t_spike = dt + tau_rc * (-(v - 1.0) / (j - 1.0)).ln_1p();
                let overshoot = dt - t_spike;
                refractory[i] = (tau_ref - overshoot).max(0.0);
                voltages[i] = 0.0;
                outputs[i] = spike_amplitude;
            } else {
                voltages[i] = v.max(0.0);
                outputs[i] = 0.0;
            }
        }
    }
}
