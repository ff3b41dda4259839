// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Exponential low-pass filter state.
//!
//! ```text
//! y[k] = y[k-1] + (1 - exp(-dt / tau)) * (u[k] - y[k-1])
//! ```
//!
//! The update is the zero-order-hold discretization of `tau * dy/dt = u - y`,
//! so the unit step response is `1 - exp(-t / tau)` sampled at `t = k * dt`
//! (with `y[0]` already holding the first filtered sample).

/// Per-connection (or per-probe) filter state
#[derive(Debug, Clone)]
pub struct LowpassFilter {
    /// Fraction of the gap to the input closed each step; 1.0 for pass-through
    alpha: f64,
    state: Vec<f64>,
}

impl LowpassFilter {
    pub fn new(tau: f64, dt: f64, size: usize) -> Self {
        let alpha = if tau > 0.0 {
            -(-dt / tau).exp_m1()
        } else {
            1.0
        };
        Self {
            alpha,
            state: vec![0.0; size],
        }
    }

    pub fn size(&self) -> usize {
        self.state.len()
    }

    pub fn is_passthrough(&self) -> bool {
        self.alpha == 1.0
    }

    /// Feed one input sample and return the filtered output
    #[inline]
    pub fn step(&mut self, input: &[f64]) -> &[f64] {
        debug_assert_eq!(input.len(), self.state.len());
        if self.is_passthrough() {
            self.state.copy_from_slice(input);
        } else {
            let alpha = self.alpha;
            for (y, &u) in self.state.iter_mut().zip(input) {
                *y += alpha * (u - *y);
            }
        }
        &self.state
    }

    /// Last filtered output
    pub fn output(&self) -> &[f64] {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.iter_mut().for_each(|y| *y = 0.0);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_constant_input_converges(
            u in -10.0f64..10.0,
            y0 in -10.0f64..10.0,
            warmup in 1usize..200,
            tau in 0.001f64..0.05,
        ) {
            let dt = 0.001;
            let mut f = LowpassFilter::new(tau, dt, 1);
            // Arbitrary starting state somewhere between 0 and y0
            for _ in 0..warmup {
                f.step(&[y0]);
            }
            let steps = ((20.0 * tau / dt).ceil() as usize).max(1);
            let mut gap = (f.output()[0] - u).abs();
            for _ in 0..steps {
                let y = f.step(&[u])[0];
                // Distance to the input never grows
                prop_assert!((y - u).abs() <= gap + 1e-12);
                gap = (y - u).abs();
            }
            prop_assert!(gap <= 1e-6 * u.abs().max(1.0));
        }
    }
}
