// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Synaptic filtering
//!
//! A connection carries its signal through a [`Synapse`]. `Synapse::None`
//! passes the signal through unchanged; `Synapse::Lowpass` applies a first
//! order exponential filter with time constant `tau`.

pub mod lowpass;

pub use lowpass::LowpassFilter;

use crate::types::{NeuralError, Result};
use serde::{Deserialize, Serialize};

/// Synapse model attached to a connection or probe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Synapse {
    /// No filtering (zero delay)
    #[default]
    None,
    /// First-order low-pass with time constant `tau` (seconds)
    Lowpass { tau: f64 },
}

impl Synapse {
    pub fn lowpass(tau: f64) -> Self {
        Synapse::Lowpass { tau }
    }

    /// Time constant; 0 for pass-through
    pub fn tau(&self) -> f64 {
        match self {
            Synapse::None => 0.0,
            Synapse::Lowpass { tau } => *tau,
        }
    }

    /// True when the synapse introduces no delay at all
    pub fn is_instantaneous(&self) -> bool {
        self.tau() == 0.0
    }

    pub fn validate(&self) -> Result<()> {
        let tau = self.tau();
        if !(tau.is_finite() && tau >= 0.0) {
            return Err(NeuralError::InvalidParameters(format!(
                "synapse tau must be finite and >= 0, got {}",
                tau
            )));
        }
        Ok(())
    }

    /// Allocate filter state for a signal of `size` dimensions
    pub fn build_filter(&self, dt: f64, size: usize) -> LowpassFilter {
        LowpassFilter::new(self.tau(), dt, size)
    }
}

impl From<f64> for Synapse {
    /// `0.0` maps to `Synapse::None`, anything else to a low-pass
    fn from(tau: f64) -> Self {
        if tau == 0.0 {
            Synapse::None
        } else {
            Synapse::Lowpass { tau }
        }
    }
}

impl From<Option<f64>> for Synapse {
    fn from(tau: Option<f64>) -> Self {
        tau.map(Synapse::from).unwrap_or_default()
    }
}
