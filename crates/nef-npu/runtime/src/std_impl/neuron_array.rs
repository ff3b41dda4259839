// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Standard neuron array implementation
//!
//! One `NeuronArray` per ensemble. Uses `Vec` storage; parallelism happens
//! across arrays (see `StdRuntime`), never inside one.

use crate::traits::NeuronStorage;
use nef_npu_neural::{NeuronModel, NeuronStateSlices};

/// Dynamic per-population neuron state
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronArray {
    /// Membrane voltages (0 = reset, 1 = threshold)
    pub voltages: Vec<f64>,

    /// Refractory time remaining (seconds)
    pub refractory: Vec<f64>,

    /// Output of the last step
    pub outputs: Vec<f64>,

    /// Input currents accumulated for the next step
    pub input_currents: Vec<f64>,
}

impl NeuronArray {
    pub fn new(count: usize) -> Self {
        Self {
            voltages: vec![0.0; count],
            refractory: vec![0.0; count],
            outputs: vec![0.0; count],
            input_currents: vec![0.0; count],
        }
    }

    /// Step this population with its own model
    pub fn step<M: NeuronModel + ?Sized>(&mut self, model: &M, dt: f64) {
        let (currents, state) = self.split_for_step();
        model.step(dt, currents, state);
    }

    /// Number of neurons that emitted a non-zero output last step
    pub fn active_count(&self) -> usize {
        self.outputs.iter().filter(|&&o| o > 0.0).count()
    }
}

impl NeuronStorage for NeuronArray {
    fn voltages(&self) -> &[f64] {
        &self.voltages
    }

    fn refractory(&self) -> &[f64] {
        &self.refractory
    }

    fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    fn input_currents(&self) -> &[f64] {
        &self.input_currents
    }

    fn input_currents_mut(&mut self) -> &mut [f64] {
        &mut self.input_currents
    }

    fn split_for_step(&mut self) -> (&[f64], NeuronStateSlices<'_>) {
        (
            &self.input_currents,
            NeuronStateSlices {
                voltages: &mut self.voltages,
                refractory: &mut self.refractory,
                outputs: &mut self.outputs,
            },
        )
    }

    fn count(&self) -> usize {
        self.voltages.len()
    }

    fn reset(&mut self) {
        for buf in [
            &mut self.voltages,
            &mut self.refractory,
            &mut self.outputs,
            &mut self.input_currents,
        ] {
            buf.iter_mut().for_each(|v| *v = 0.0);
        }
    }
}
