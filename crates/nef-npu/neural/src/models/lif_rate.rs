// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Rate-coded LIF: emits the steady-state LIF rate instead of spikes.
//!
//! Shares its rate curve and gain/bias inversion with [`LifModel`](super::LifModel),
//! so a population can be switched between spiking and rate mode without
//! changing its decoders.

use super::lif::{lif_gain_bias, lif_rate, LifParameters};
use super::traits::{ModelParameters, NeuronModel, NeuronStateSlices};
use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LifRateModel {
    params: LifParameters,
}

impl LifRateModel {
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

impl NeuronModel for LifRateModel {
    fn model_name(&self) -> &'static str {
        "LIF rate"
    }

    fn is_spiking(&self) -> bool {
        false
    }

    #[inline(always)]
    fn rate(&self, current: f64) -> f64 {
        lif_rate(current, &self.params)
    }

    fn gain_bias(&self, max_rates: &[f64], intercepts: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        lif_gain_bias(&self.params, max_rates, intercepts)
    }

    fn step(&self, _dt: f64, currents: &[f64], state: NeuronStateSlices<'_>) {
        // No membrane state: voltages and refractory stay untouched
        self.rates(currents, state.outputs);
    }
}
