// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `nef_configuration.toml`.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NefConfig {
    pub simulation: SimulationConfig,
    pub neurons: NeuronsConfig,
    pub decoder: DecoderConfig,
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

/// Time stepping and seeding
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per step
    pub dt: f64,
    /// Model seed; `None` uses a fixed default so builds stay reproducible
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            seed: None,
        }
    }
}

/// Default neuron parameters for ensembles that do not override them
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeuronsConfig {
    /// "lif" or "lif_rate"
    pub model: String,
    pub tau_rc: f64,
    pub tau_ref: f64,
    pub max_rate_low: f64,
    pub max_rate_high: f64,
    pub intercept_low: f64,
    pub intercept_high: f64,
}

impl Default for NeuronsConfig {
    fn default() -> Self {
        Self {
            model: "lif".to_string(),
            tau_rc: 0.02,
            tau_ref: 0.002,
            max_rate_low: 200.0,
            max_rate_high: 400.0,
            intercept_low: -1.0,
            intercept_high: 0.9,
        }
    }
}

/// Decoder solver settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Noise standard deviation as a fraction of the largest activity
    pub regularization: f64,
    pub eval_points_per_dimension: usize,
    pub min_eval_points: usize,
    pub max_eval_points: usize,
    /// Reuse identity decoders across builds within one process
    pub cache: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            regularization: 0.1,
            eval_points_per_dimension: 500,
            min_eval_points: 750,
            max_eval_points: 2500,
            cache: false,
        }
    }
}

/// Stepping strategy
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub parallel: bool,
    /// 0 = Rayon's global pool
    pub num_threads: usize,
    /// Total neuron count below which stepping stays sequential
    pub parallel_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            num_threads: 0,
            parallel_threshold: 1024,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Directory for per-run log folders (requires the `file-logging` feature)
    pub log_dir: Option<String>,
    /// Run folders older than this many days are deleted
    pub retention_days: u64,
    /// Only the most recent N run folders are kept
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            retention_days: 30,
            retention_runs: 10,
        }
    }
}
