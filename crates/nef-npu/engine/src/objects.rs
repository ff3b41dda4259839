// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Model Declarations
//!
//! Plain declaration structs handed to [`ModelBuilder`](crate::ModelBuilder).
//! Nothing here is validated until the network is built.

use crate::handles::{ConnectionId, EnsembleId, NodeId};
use nef_npu_neural::{Distribution, EncoderSpec, EvalPointSpec, NeuronType, Synapse};
use ndarray::Array2;
use std::fmt;
use std::sync::Arc;

/// Output of a node as a function of simulated time
pub type TimeFn = Arc<dyn Fn(f64) -> Vec<f64> + Send + Sync>;

/// Output of a node as a function of simulated time and its input vector
pub type TimeInputFn = Arc<dyn Fn(f64, &[f64]) -> Vec<f64> + Send + Sync>;

// ═══════════════════════════════════════════════════════════
// Ensembles
// ═══════════════════════════════════════════════════════════

/// Declared ensemble. Unset options fall back to the builder's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    pub n_neurons: usize,
    pub dimensions: usize,
    pub radius: f64,
    pub neuron_type: Option<NeuronType>,
    pub encoders: EncoderSpec,
    pub intercepts: Option<Distribution>,
    pub max_rates: Option<Distribution>,
    pub eval_points: Option<EvalPointSpec>,
    /// Overrides the per-ensemble seed derived from the model seed
    pub seed: Option<u64>,
    pub label: Option<String>,
}

impl EnsembleConfig {
    pub fn new(n_neurons: usize, dimensions: usize) -> Self {
        Self {
            n_neurons,
            dimensions,
            radius: 1.0,
            neuron_type: None,
            encoders: EncoderSpec::UniformHypersphere,
            intercepts: None,
            max_rates: None,
            eval_points: None,
            seed: None,
            label: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn neuron_type(mut self, neuron_type: NeuronType) -> Self {
        self.neuron_type = Some(neuron_type);
        self
    }

    pub fn encoders(mut self, encoders: Array2<f64>) -> Self {
        self.encoders = EncoderSpec::Explicit(encoders);
        self
    }

    pub fn intercepts(mut self, intercepts: Distribution) -> Self {
        self.intercepts = Some(intercepts);
        self
    }

    pub fn max_rates(mut self, max_rates: Distribution) -> Self {
        self.max_rates = Some(max_rates);
        self
    }

    pub fn eval_points(mut self, eval_points: EvalPointSpec) -> Self {
        self.eval_points = Some(eval_points);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// ═══════════════════════════════════════════════════════════
// Nodes
// ═══════════════════════════════════════════════════════════

/// What a node computes each step
#[derive(Clone)]
pub enum NodeKind {
    /// Fixed output vector
    Constant(Vec<f64>),
    /// `f(t)`
    Time { size_out: usize, f: TimeFn },
    /// `f(t, x)` where `x` is the input accumulated during the previous step
    TimeInput {
        size_in: usize,
        size_out: usize,
        f: TimeInputFn,
    },
    /// Emits its previous-step input unchanged
    Passthrough { size: usize },
}

impl NodeKind {
    pub fn size_in(&self) -> usize {
        match self {
            NodeKind::Constant(_) | NodeKind::Time { .. } => 0,
            NodeKind::TimeInput { size_in, .. } => *size_in,
            NodeKind::Passthrough { size } => *size,
        }
    }

    pub fn size_out(&self) -> usize {
        match self {
            NodeKind::Constant(values) => values.len(),
            NodeKind::Time { size_out, .. } | NodeKind::TimeInput { size_out, .. } => *size_out,
            NodeKind::Passthrough { size } => *size,
        }
    }

    /// Evaluate at time `t` with the given input (empty for source nodes)
    pub(crate) fn evaluate(&self, t: f64, input: &[f64], out: &mut Vec<f64>) {
        match self {
            NodeKind::Constant(values) => {
                out.clear();
                out.extend_from_slice(values);
            }
            NodeKind::Time { f, .. } => *out = f(t),
            NodeKind::TimeInput { f, .. } => *out = f(t, input),
            NodeKind::Passthrough { .. } => {
                out.clear();
                out.extend_from_slice(input);
            }
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Constant(values) => f.debug_tuple("Constant").field(values).finish(),
            NodeKind::Time { size_out, .. } => {
                f.debug_struct("Time").field("size_out", size_out).finish_non_exhaustive()
            }
            NodeKind::TimeInput {
                size_in, size_out, ..
            } => f
                .debug_struct("TimeInput")
                .field("size_in", size_in)
                .field("size_out", size_out)
                .finish_non_exhaustive(),
            NodeKind::Passthrough { size } => {
                f.debug_struct("Passthrough").field("size", size).finish()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub kind: NodeKind,
    pub label: Option<String>,
}

impl NodeConfig {
    pub fn constant(values: impl Into<Vec<f64>>) -> Self {
        Self {
            kind: NodeKind::Constant(values.into()),
            label: None,
        }
    }

    pub fn function<F>(size_out: usize, f: F) -> Self
    where
        F: Fn(f64) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::from_time_fn(size_out, Arc::new(f))
    }

    /// Wrap a shared time function (e.g. one from [`crate::helpers`])
    pub fn from_time_fn(size_out: usize, f: TimeFn) -> Self {
        Self {
            kind: NodeKind::Time { size_out, f },
            label: None,
        }
    }

    pub fn with_input<F>(size_in: usize, size_out: usize, f: F) -> Self
    where
        F: Fn(f64, &[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Self {
            kind: NodeKind::TimeInput {
                size_in,
                size_out,
                f: Arc::new(f),
            },
            label: None,
        }
    }

    pub fn passthrough(size: usize) -> Self {
        Self {
            kind: NodeKind::Passthrough { size },
            label: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

// ═══════════════════════════════════════════════════════════
// Connections
// ═══════════════════════════════════════════════════════════

/// Where a connection reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionSource {
    /// Decoded vector of an ensemble (one step stale)
    EnsembleOutput(EnsembleId),
    /// Raw per-neuron output of an ensemble (one step stale)
    EnsembleNeurons(EnsembleId),
    /// Node output for this step
    NodeOutput(NodeId),
}

/// Where a connection writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionTarget {
    /// Represented-vector input of an ensemble (goes through the encoders)
    EnsembleInput(EnsembleId),
    /// Direct per-neuron current, scaled by each neuron's gain
    EnsembleNeurons(EnsembleId),
    /// Node input vector
    NodeInput(NodeId),
}

impl From<EnsembleId> for ConnectionSource {
    fn from(id: EnsembleId) -> Self {
        ConnectionSource::EnsembleOutput(id)
    }
}

impl From<NodeId> for ConnectionSource {
    fn from(id: NodeId) -> Self {
        ConnectionSource::NodeOutput(id)
    }
}

impl From<EnsembleId> for ConnectionTarget {
    fn from(id: EnsembleId) -> Self {
        ConnectionTarget::EnsembleInput(id)
    }
}

impl From<NodeId> for ConnectionTarget {
    fn from(id: NodeId) -> Self {
        ConnectionTarget::NodeInput(id)
    }
}

/// A vector function with a declared output size.
///
/// Connections that share the same `ConnectionFunction` (same `Arc`) out of the
/// same ensemble share one decoder solve.
#[derive(Clone)]
pub struct ConnectionFunction {
    size_out: usize,
    f: Arc<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>,
}

impl ConnectionFunction {
    pub fn new<F>(size_out: usize, f: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Self {
            size_out,
            f: Arc::new(f),
        }
    }

    pub fn size_out(&self) -> usize {
        self.size_out
    }

    #[inline]
    pub fn call(&self, x: &[f64]) -> Vec<f64> {
        (self.f)(x)
    }

    pub fn same_function(&self, other: &ConnectionFunction) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl fmt::Debug for ConnectionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionFunction")
            .field("size_out", &self.size_out)
            .finish_non_exhaustive()
    }
}

/// Linear map applied after the optional function
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Transform {
    #[default]
    Identity,
    Scalar(f64),
    /// `size_out x size_in`
    Matrix(Array2<f64>),
}

impl Transform {
    /// Input size the transform expects, given the size it will be fed
    pub fn size_in(&self, fed: usize) -> usize {
        match self {
            Transform::Identity | Transform::Scalar(_) => fed,
            Transform::Matrix(m) => m.ncols(),
        }
    }

    pub fn size_out(&self, fed: usize) -> usize {
        match self {
            Transform::Identity | Transform::Scalar(_) => fed,
            Transform::Matrix(m) => m.nrows(),
        }
    }

    #[inline]
    pub(crate) fn apply(&self, input: &[f64], out: &mut [f64]) {
        match self {
            Transform::Identity => out.copy_from_slice(input),
            Transform::Scalar(w) => {
                for (o, &x) in out.iter_mut().zip(input) {
                    *o = w * x;
                }
            }
            Transform::Matrix(m) => {
                for (o, row) in out.iter_mut().zip(m.rows()) {
                    *o = row.iter().zip(input).map(|(w, x)| w * x).sum();
                }
            }
        }
    }
}

impl From<f64> for Transform {
    fn from(w: f64) -> Self {
        Transform::Scalar(w)
    }
}

impl From<Array2<f64>> for Transform {
    fn from(m: Array2<f64>) -> Self {
        Transform::Matrix(m)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub source: ConnectionSource,
    pub target: ConnectionTarget,
    pub function: Option<ConnectionFunction>,
    pub transform: Transform,
    pub synapse: Synapse,
    pub label: Option<String>,
}

impl ConnectionConfig {
    /// Identity connection with the default (5 ms) low-pass synapse
    pub fn new(source: impl Into<ConnectionSource>, target: impl Into<ConnectionTarget>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            function: None,
            transform: Transform::Identity,
            synapse: Synapse::lowpass(DEFAULT_SYNAPSE_TAU),
            label: None,
        }
    }

    pub fn function(mut self, function: ConnectionFunction) -> Self {
        self.function = Some(function);
        self
    }

    pub fn transform(mut self, transform: impl Into<Transform>) -> Self {
        self.transform = transform.into();
        self
    }

    /// `0.0` (or `Synapse::None`) connects without filtering
    pub fn synapse(mut self, synapse: impl Into<Synapse>) -> Self {
        self.synapse = synapse.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Default post-synaptic time constant for connections
pub const DEFAULT_SYNAPSE_TAU: f64 = 0.005;

// ═══════════════════════════════════════════════════════════
// Probes
// ═══════════════════════════════════════════════════════════

/// Signal a probe records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeTarget {
    /// Decoded vector of an ensemble (identity decoders, this step's spikes)
    EnsembleDecoded(EnsembleId),
    EnsembleSpikes(EnsembleId),
    EnsembleVoltages(EnsembleId),
    NodeOutput(NodeId),
    /// Filtered, transformed output of a connection
    ConnectionOutput(ConnectionId),
}

impl From<EnsembleId> for ProbeTarget {
    fn from(id: EnsembleId) -> Self {
        ProbeTarget::EnsembleDecoded(id)
    }
}

impl From<NodeId> for ProbeTarget {
    fn from(id: NodeId) -> Self {
        ProbeTarget::NodeOutput(id)
    }
}

impl From<ConnectionId> for ProbeTarget {
    fn from(id: ConnectionId) -> Self {
        ProbeTarget::ConnectionOutput(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub target: ProbeTarget,
    pub synapse: Synapse,
    /// Record every `sample_every` seconds (a multiple of dt); `None` = every step
    pub sample_every: Option<f64>,
    pub label: Option<String>,
}

impl ProbeConfig {
    /// Unfiltered probe sampled every step
    pub fn new(target: impl Into<ProbeTarget>) -> Self {
        Self {
            target: target.into(),
            synapse: Synapse::None,
            sample_every: None,
            label: None,
        }
    }

    pub fn synapse(mut self, synapse: impl Into<Synapse>) -> Self {
        self.synapse = synapse.into();
        self
    }

    pub fn sample_every(mut self, seconds: f64) -> Self {
        self.sample_every = Some(seconds);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_transform_sizes_and_apply() {
        let m = Transform::Matrix(array![[1.0, 0.0], [0.0, 2.0], [1.0, 1.0]]);
        assert_eq!(m.size_in(5), 2);
        assert_eq!(m.size_out(5), 3);
        let mut out = vec![0.0; 3];
        m.apply(&[3.0, 4.0], &mut out);
        assert_eq!(out, vec![3.0, 8.0, 7.0]);

        let s = Transform::Scalar(0.5);
        let mut out = vec![0.0; 2];
        s.apply(&[2.0, -4.0], &mut out);
        assert_eq!(out, vec![1.0, -2.0]);
    }

    #[test]
    fn test_node_kind_sizes() {
        assert_eq!(NodeConfig::constant(vec![1.0, 2.0]).kind.size_out(), 2);
        assert_eq!(NodeConfig::constant(vec![1.0]).kind.size_in(), 0);
        let p = NodeConfig::passthrough(3).kind;
        assert_eq!((p.size_in(), p.size_out()), (3, 3));
        let n = NodeConfig::with_input(2, 1, |_, x| vec![x[0] * x[1]]).kind;
        assert_eq!((n.size_in(), n.size_out()), (2, 1));
    }

    #[test]
    fn test_function_identity_is_by_pointer() {
        let f = ConnectionFunction::new(1, |x| vec![x[0] * x[0]]);
        let g = ConnectionFunction::new(1, |x| vec![x[0] * x[0]]);
        assert!(f.same_function(&f.clone()));
        assert!(!f.same_function(&g));
        assert_eq!(f.call(&[3.0]), vec![9.0]);
    }

    #[test]
    fn test_synapse_conversion() {
        let c = ConnectionConfig::new(EnsembleId(0), EnsembleId(1)).synapse(0.0);
        assert_eq!(c.synapse, Synapse::None);
        let c = c.synapse(0.1);
        assert_eq!(c.synapse, Synapse::lowpass(0.1));
    }
}
