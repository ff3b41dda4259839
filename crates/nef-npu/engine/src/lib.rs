// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # NEF Engine
//!
//! Compiles declared ensembles, nodes, connections and probes into an
//! immutable [`Network`] and runs it in fixed time steps.
//!
//! ## Architecture
//! - **Builder**: arenas of declarations, handle-based references, build-time
//!   validation and decoder solving ([`ModelBuilder`])
//! - **Network**: resolved, read-only topology plus decoders ([`Network`])
//! - **Simulator**: per-step scheduling, one-step decode delay for recurrence,
//!   probe recording ([`Simulator`])
//!
//! ```ignore
//! let mut builder = ModelBuilder::new();
//! let input = builder.add_node(NodeConfig::constant(vec![1.0]));
//! let a = builder.add_ensemble(EnsembleConfig::new(100, 1).label("A"));
//! builder.connect(ConnectionConfig::new(input, a).synapse(0.1));
//! let probe = builder.probe(ProbeConfig::new(a).synapse(0.01));
//!
//! let mut sim = Simulator::new(builder.build()?)?;
//! sim.run(1.0)?;
//! let decoded = sim.data(probe)?;
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod builder;
pub mod config;
pub mod decoder_cache;
pub mod error;
pub mod handles;
pub mod helpers;
pub mod network;
pub mod objects;
pub mod probes;
pub mod simulator;
pub mod templates;

pub use builder::ModelBuilder;
pub use config::EngineConfig;
pub use decoder_cache::DecoderCache;
pub use error::{EngineError, Result};
pub use handles::{ConnectionId, EnsembleId, NodeId, ProbeId};
pub use helpers::{piecewise, transform, white_noise, Segment};
pub use network::{
    BuildStats, BuiltConnection, BuiltEnsemble, BuiltNode, BuiltProbe, NamedObject, Network,
};
pub use objects::{
    ConnectionConfig, ConnectionFunction, ConnectionSource, ConnectionTarget, EnsembleConfig,
    NodeConfig, NodeKind, ProbeConfig, ProbeTarget, TimeFn, TimeInputFn, Transform,
    DEFAULT_SYNAPSE_TAU,
};
pub use probes::ProbeData;
pub use simulator::{SimulationStats, Simulator, SimulatorPhase};
pub use templates::EnsembleArray;

// Neural types callers need to declare models
pub use nef_npu_neural::{
    Decoders, Distribution, EncoderSpec, EvalPointSpec, LifParameters, NeuronType, Synapse,
};
