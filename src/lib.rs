// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # NEF - Neural Engineering Framework simulation
//!
//! Populations of leaky integrate-and-fire neurons represent vectors;
//! connections between them compute functions through decoders solved at
//! build time; a fixed-step simulator runs the result and records probes.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! nef = "0.1"
//! ```
//!
//! ```rust,no_run
//! use nef::prelude::*;
//!
//! let mut builder = ModelBuilder::new();
//! let input = builder.add_node(NodeConfig::constant(vec![1.0]));
//! let a = builder.add_ensemble(EnsembleConfig::new(100, 1).label("A"));
//! builder.connect(ConnectionConfig::new(input, a).synapse(0.1));
//! let probe = builder.probe(ProbeConfig::new(a).synapse(0.01));
//!
//! let mut sim = Simulator::new(builder.build()?)?;
//! sim.run(1.0)?;
//! println!("{:?}", sim.data(probe)?.last());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//! - **`observability`** (default): logging initialization and debug flags
//! - **`file-logging`**: per-run log files under `logging.log_dir`
//!
//! ## Crates
//! - [`config`]: TOML configuration with environment and CLI overrides
//! - [`neural`]: neuron models, tuning curves, decoder solver, synapses
//! - [`runtime`]: population state storage and stepping
//! - [`engine`]: network builder, simulator, probes

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod session;

pub use nef_config as config;
pub use nef_npu_engine as engine;
pub use nef_npu_neural as neural;
pub use nef_npu_runtime as runtime;

#[cfg(feature = "observability")]
pub use nef_observability as observability;

pub use session::{NefError, Result, Session};

/// Everything needed to declare, build and run a model
pub mod prelude {
    pub use crate::session::Session;
    pub use nef_config::{load_config, NefConfig};
    pub use nef_npu_engine::{
        piecewise, transform, white_noise, ConnectionConfig, ConnectionFunction,
        ConnectionSource, ConnectionTarget, DecoderCache, Distribution, EngineConfig,
        EngineError, EnsembleArray, EnsembleConfig, EnsembleId, ModelBuilder, Network,
        NeuronType, NodeConfig, NodeId, ProbeConfig, ProbeData, ProbeId, ProbeTarget, Segment,
        Simulator, Synapse, Transform,
    };
}
