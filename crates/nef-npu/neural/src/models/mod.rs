// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neuron Models
//!
//! - [`LifModel`]: spiking leaky integrate-and-fire (default)
//! - [`LifRateModel`]: the LIF rate curve emitted as a continuous output
//!
//! [`NeuronType`] is the closed set of models an ensemble can be declared with.

mod lif;
mod lif_rate;
mod traits;

pub use lif::{lif_rate, LifModel, LifParameters};
pub use lif_rate::LifRateModel;
pub use traits::{ModelParameters, NeuronModel, NeuronStateSlices};

use crate::types::Result;
use serde::{Deserialize, Serialize};

/// Neuron model selection for an ensemble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum NeuronType {
    Lif(LifParameters),
    LifRate(LifParameters),
}

impl Default for NeuronType {
    fn default() -> Self {
        NeuronType::Lif(LifParameters::default())
    }
}

impl NeuronType {
    pub fn params(&self) -> &LifParameters {
        match self {
            NeuronType::Lif(p) | NeuronType::LifRate(p) => p,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.params().validate()
    }
}

impl NeuronModel for NeuronType {
    fn model_name(&self) -> &'static str {
        match self {
            NeuronType::Lif(_) => "LIF",
            NeuronType::LifRate(_) => "LIF rate",
        }
    }

    fn is_spiking(&self) -> bool {
        matches!(self, NeuronType::Lif(_))
    }

    fn rate(&self, current: f64) -> f64 {
        lif_rate(current, self.params())
    }

    fn gain_bias(&self, max_rates: &[f64], intercepts: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        match self {
            NeuronType::Lif(p) => LifModel::new(*p)?.gain_bias(max_rates, intercepts),
            NeuronType::LifRate(p) => LifRateModel::new(*p)?.gain_bias(max_rates, intercepts),
        }
    }

    fn step(&self, dt: f64, currents: &[f64], state: NeuronStateSlices<'_>) {
        // Parameters are validated when the network is built
        match self {
            NeuronType::Lif(p) => LifModel::from_validated(*p).step(dt, currents, state),
            NeuronType::LifRate(p) => LifRateModel::from_validated(*p).step(dt, currents, state),
        }
    }
}
