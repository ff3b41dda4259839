// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Built Network
//!
//! The immutable product of [`ModelBuilder::build`](crate::ModelBuilder::build):
//! resolved objects, tuning parameters, and every decoder the scheduler needs.
//! Topology never changes after this point, so a `Network` is shared read-only
//! (behind an `Arc`) by every simulator created from it.

use crate::config::EngineConfig;
use crate::handles::{ConnectionId, EnsembleId, NodeId, ProbeId};
use crate::objects::{
    ConnectionFunction, ConnectionSource, ConnectionTarget, NodeKind, ProbeTarget, Transform,
};
use ahash::AHashMap;
use nef_npu_neural::{Decoders, NeuronType, Synapse, TuningParameters};
use ndarray::Array2;

/// Population with its fixed tuning
#[derive(Debug, Clone)]
pub struct BuiltEnsemble {
    pub name: String,
    pub neuron_type: NeuronType,
    pub tuning: TuningParameters,
    pub eval_points: Array2<f64>,
    /// Seed the tuning and evaluation points were drawn from
    pub seed: u64,
    /// Index into the decoder pool; present when something reads the decoded value
    pub(crate) identity_decoders: Option<usize>,
}

impl BuiltEnsemble {
    pub fn n_neurons(&self) -> usize {
        self.tuning.n_neurons()
    }

    pub fn dimensions(&self) -> usize {
        self.tuning.dimensions()
    }
}

#[derive(Debug, Clone)]
pub struct BuiltNode {
    pub name: String,
    pub kind: NodeKind,
}

impl BuiltNode {
    pub fn size_in(&self) -> usize {
        self.kind.size_in()
    }

    pub fn size_out(&self) -> usize {
        self.kind.size_out()
    }
}

/// Source of a connection, resolved once so the step loop never re-dispatches
#[derive(Debug, Clone)]
pub(crate) enum ResolvedSource {
    /// Decoded ensemble output; the connection function is baked into the decoders
    Decoded { ensemble: usize, decoders: usize },
    Neurons { ensemble: usize },
    Node {
        node: usize,
        function: Option<ConnectionFunction>,
    },
}

#[derive(Debug, Clone)]
pub struct BuiltConnection {
    pub name: String,
    pub source: ConnectionSource,
    pub target: ConnectionTarget,
    pub transform: Transform,
    pub synapse: Synapse,
    /// Size fed into the transform (after the function)
    pub size_mid: usize,
    /// Size delivered to the target
    pub size_out: usize,
    pub(crate) resolved: ResolvedSource,
}

#[derive(Debug, Clone)]
pub struct BuiltProbe {
    pub name: String,
    pub target: ProbeTarget,
    pub synapse: Synapse,
    /// Record every `period` steps
    pub period: u64,
    pub size: usize,
}

/// Object registered under a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedObject {
    Ensemble(EnsembleId),
    Node(NodeId),
    Connection(ConnectionId),
    Probe(ProbeId),
}

/// Build summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub decoder_solves: usize,
    pub cache_hits: usize,
}

#[derive(Debug)]
pub struct Network {
    pub(crate) config: EngineConfig,
    pub(crate) ensembles: Vec<BuiltEnsemble>,
    pub(crate) nodes: Vec<BuiltNode>,
    pub(crate) connections: Vec<BuiltConnection>,
    pub(crate) probes: Vec<BuiltProbe>,
    pub(crate) decoders: Vec<Decoders>,
    pub(crate) names: AHashMap<String, NamedObject>,
    pub(crate) stats: BuildStats,
}

impl Network {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dt(&self) -> f64 {
        self.config.dt
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn build_stats(&self) -> BuildStats {
        self.stats
    }

    pub fn ensembles(&self) -> &[BuiltEnsemble] {
        &self.ensembles
    }

    pub fn nodes(&self) -> &[BuiltNode] {
        &self.nodes
    }

    pub fn connections(&self) -> &[BuiltConnection] {
        &self.connections
    }

    pub fn probes(&self) -> &[BuiltProbe] {
        &self.probes
    }

    pub fn ensemble(&self, id: EnsembleId) -> Option<&BuiltEnsemble> {
        self.ensembles.get(id.index())
    }

    pub fn node(&self, id: NodeId) -> Option<&BuiltNode> {
        self.nodes.get(id.index())
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&BuiltConnection> {
        self.connections.get(id.index())
    }

    pub fn probe(&self, id: ProbeId) -> Option<&BuiltProbe> {
        self.probes.get(id.index())
    }

    /// Identity decoders of an ensemble, if anything reads its decoded value
    pub fn identity_decoders(&self, id: EnsembleId) -> Option<&Decoders> {
        self.ensemble(id)
            .and_then(|e| e.identity_decoders)
            .map(|i| &self.decoders[i])
    }

    /// Decoders used by a connection out of an ensemble's decoded output
    pub fn connection_decoders(&self, id: ConnectionId) -> Option<&Decoders> {
        match self.connection(id)?.resolved {
            ResolvedSource::Decoded { decoders, .. } => Some(&self.decoders[decoders]),
            _ => None,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<NamedObject> {
        self.names.get(name).copied()
    }

    pub fn ensemble_by_name(&self, name: &str) -> Option<EnsembleId> {
        match self.lookup(name)? {
            NamedObject::Ensemble(id) => Some(id),
            _ => None,
        }
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        match self.lookup(name)? {
            NamedObject::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn connection_by_name(&self, name: &str) -> Option<ConnectionId> {
        match self.lookup(name)? {
            NamedObject::Connection(id) => Some(id),
            _ => None,
        }
    }

    pub fn probe_by_name(&self, name: &str) -> Option<ProbeId> {
        match self.lookup(name)? {
            NamedObject::Probe(id) => Some(id),
            _ => None,
        }
    }

    pub fn total_neurons(&self) -> usize {
        self.ensembles.iter().map(|e| e.n_neurons()).sum()
    }
}
