// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Desktop/server runtime: `Vec` storage, optional Rayon fan-out across
//! populations.

use super::{NeuronArray, RuntimeConfig};
use crate::traits::{Result, Runtime, RuntimeError};
use nef_npu_neural::NeuronModel;
use rayon::prelude::*;
use tracing::debug;

/// Standard runtime for desktop/server platforms
#[derive(Debug)]
pub struct StdRuntime {
    config: RuntimeConfig,
    /// Dedicated pool when a thread count is configured; otherwise the global pool
    pool: Option<rayon::ThreadPool>,
}

impl StdRuntime {
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let pool = if config.parallel && config.num_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.num_threads)
                .thread_name(|i| format!("nef-step-{}", i))
                .build()
                .map_err(|e| RuntimeError::ThreadPool(e.to_string()))?;
            debug!(
                "[NEF-RUNTIME] Created step pool with {} threads",
                config.num_threads
            );
            Some(pool)
        } else {
            None
        };
        Ok(Self { config, pool })
    }

    /// Sequential runtime (no Rayon)
    pub fn sequential() -> Self {
        Self {
            config: RuntimeConfig {
                parallel: false,
                ..RuntimeConfig::default()
            },
            pool: None,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run `op` inside the dedicated pool when there is one
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn use_parallel(&self, storages: &[NeuronArray]) -> bool {
        if !self.config.parallel || storages.len() < 2 {
            return false;
        }
        let total: usize = storages.iter().map(|s| s.voltages.len()).sum();
        total >= self.config.parallel_threshold
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self {
            config: RuntimeConfig::default(),
            pool: None,
        }
    }
}

impl Runtime for StdRuntime {
    type NeuronStorage = NeuronArray;

    fn create_neuron_storage(&self, count: usize) -> Result<NeuronArray> {
        if count == 0 {
            return Err(RuntimeError::InvalidParameters(
                "population storage needs at least one neuron".to_string(),
            ));
        }
        Ok(NeuronArray::new(count))
    }

    fn step_populations<M: NeuronModel>(
        &self,
        dt: f64,
        models: &[M],
        storages: &mut [NeuronArray],
    ) -> Result<()> {
        if models.len() != storages.len() {
            return Err(RuntimeError::StateLengthMismatch {
                what: "models vs storages",
                expected: storages.len(),
                actual: models.len(),
            });
        }

        if self.use_parallel(storages) {
            // Each population owns disjoint state; the join is the step barrier
            let mut work = || {
                storages
                    .par_iter_mut()
                    .zip(models.par_iter())
                    .for_each(|(storage, model)| storage.step(model, dt));
            };
            match &self.pool {
                Some(pool) => pool.install(work),
                None => work(),
            }
        } else {
            for (storage, model) in storages.iter_mut().zip(models) {
                storage.step(model, dt);
            }
        }
        Ok(())
    }

    fn supports_parallel(&self) -> bool {
        self.config.parallel
    }

    fn platform_name(&self) -> &'static str {
        "Desktop/Server (std)"
    }
}
