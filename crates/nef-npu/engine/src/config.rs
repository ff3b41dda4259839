// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Build and run settings shared by every object in a model.

use crate::error::{EngineError, Result};
use nef_config::NefConfig;
use nef_npu_neural::{
    DecoderSolver, Distribution, EvalPointSpec, LifParameters, ModelParameters, NeuronType,
};
use nef_npu_runtime::RuntimeConfig;

/// Seed used when neither the model nor an ensemble sets one
pub const DEFAULT_SEED: u64 = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Seconds per step
    pub dt: f64,
    /// Model seed; per-ensemble seeds are derived from it in declaration order
    pub seed: u64,
    /// Defaults for ensembles that leave these unset
    pub neuron_type: NeuronType,
    pub intercepts: Distribution,
    pub max_rates: Distribution,
    pub eval_points: EvalPointSpec,
    pub solver: DecoderSolver,
    pub runtime: RuntimeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            seed: DEFAULT_SEED,
            neuron_type: NeuronType::default(),
            intercepts: Distribution::uniform(-1.0, 0.9),
            max_rates: Distribution::uniform(200.0, 400.0),
            eval_points: EvalPointSpec::default(),
            solver: DecoderSolver::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.runtime.parallel = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "dt must be finite and > 0, got {}",
                self.dt
            )));
        }
        self.neuron_type
            .validate()
            .and_then(|_| self.intercepts.validate())
            .and_then(|_| self.max_rates.validate())
            .and_then(|_| self.eval_points.validate())
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }
}

impl TryFrom<&NefConfig> for EngineConfig {
    type Error = EngineError;

    fn try_from(config: &NefConfig) -> Result<Self> {
        let params = LifParameters::new(config.neurons.tau_rc, config.neurons.tau_ref);
        params
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        let neuron_type = match config.neurons.model.as_str() {
            "lif" => NeuronType::Lif(params),
            "lif_rate" => NeuronType::LifRate(params),
            other => {
                return Err(EngineError::InvalidConfig(format!(
                    "unknown neuron model '{}'",
                    other
                )))
            }
        };

        let engine = Self {
            dt: config.simulation.dt,
            seed: config.simulation.seed.unwrap_or(DEFAULT_SEED),
            neuron_type,
            intercepts: Distribution::uniform(
                config.neurons.intercept_low,
                config.neurons.intercept_high,
            ),
            max_rates: Distribution::uniform(
                config.neurons.max_rate_low,
                config.neurons.max_rate_high,
            ),
            eval_points: EvalPointSpec {
                per_dimension: config.decoder.eval_points_per_dimension,
                min_points: config.decoder.min_eval_points,
                max_points: config.decoder.max_eval_points,
            },
            solver: DecoderSolver::new(config.decoder.regularization),
            runtime: RuntimeConfig {
                parallel: config.runtime.parallel,
                num_threads: config.runtime.num_threads,
                parallel_threshold: config.runtime.parallel_threshold,
            },
        };
        engine.validate()?;
        Ok(engine)
    }
}
