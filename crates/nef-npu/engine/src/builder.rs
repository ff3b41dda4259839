// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Network Graph Builder
//!
//! Declarations go into arenas and come back as handles. Nothing is validated
//! until [`ModelBuilder::build`], which runs in a fixed order:
//!
//! 1. unique names
//! 2. nodes (sizes, function arity at t = 0)
//! 3. ensembles (per-ensemble seeds, tuning, evaluation points)
//! 4. connections (references, dimensions, decoder jobs)
//! 5. probes (references, duplicates, sampling period)
//! 6. zero-delay cycles
//! 7. decoder solves (parallel, results kept in declaration order)

use crate::config::EngineConfig;
use crate::decoder_cache::DecoderCache;
use crate::error::{EngineError, Result};
use crate::handles::{ConnectionId, EnsembleId, NodeId, ProbeId};
use crate::network::{
    BuildStats, BuiltConnection, BuiltEnsemble, BuiltNode, BuiltProbe, NamedObject, Network,
    ResolvedSource,
};
use crate::objects::{
    ConnectionConfig, ConnectionFunction, ConnectionSource, ConnectionTarget, EnsembleConfig,
    NodeConfig, NodeKind, ProbeConfig, ProbeTarget, Transform,
};
use ahash::AHashMap;
use nef_config::NefConfig;
use nef_npu_neural::{sample_eval_points, seeded_rng, Decoders, TuningParameters, TuningSpec};
use ndarray::Array2;
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

/// Relative tolerance for `sample_every` being a whole number of steps
const PERIOD_TOLERANCE: f64 = 1e-6;

/// Collects declarations and compiles them into a [`Network`]
#[derive(Debug, Default)]
pub struct ModelBuilder {
    config: EngineConfig,
    ensembles: Vec<EnsembleConfig>,
    nodes: Vec<NodeConfig>,
    connections: Vec<ConnectionConfig>,
    probes: Vec<ProbeConfig>,
}

/// One decoder solve: an ensemble and the function its decoders approximate
struct DecoderJob {
    ensemble: usize,
    function: Option<ConnectionFunction>,
    /// Entity named in arity errors
    requested_by: String,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Builder configured from a loaded configuration file
    pub fn from_config(config: &NefConfig) -> Result<Self> {
        Ok(Self::with_config(EngineConfig::try_from(config)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn add_ensemble(&mut self, config: EnsembleConfig) -> EnsembleId {
        self.ensembles.push(config);
        EnsembleId::from_index(self.ensembles.len() - 1)
    }

    pub fn add_node(&mut self, config: NodeConfig) -> NodeId {
        self.nodes.push(config);
        NodeId::from_index(self.nodes.len() - 1)
    }

    pub fn connect(&mut self, config: ConnectionConfig) -> ConnectionId {
        self.connections.push(config);
        ConnectionId::from_index(self.connections.len() - 1)
    }

    pub fn probe(&mut self, config: ProbeConfig) -> ProbeId {
        self.probes.push(config);
        ProbeId::from_index(self.probes.len() - 1)
    }

    /// Declared ensemble configuration (before build)
    pub fn ensemble_config(&self, id: EnsembleId) -> Option<&EnsembleConfig> {
        self.ensembles.get(id.index())
    }

    pub fn node_config(&self, id: NodeId) -> Option<&NodeConfig> {
        self.nodes.get(id.index())
    }

    pub fn ensemble_by_name(&self, name: &str) -> Option<EnsembleId> {
        self.ensembles
            .iter()
            .position(|e| e.label.as_deref() == Some(name))
            .map(EnsembleId::from_index)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.label.as_deref() == Some(name))
            .map(NodeId::from_index)
    }

    pub fn build(self) -> Result<Network> {
        self.build_inner(None)
    }

    /// Build, reusing identity decoders from `cache` and filling it with new ones
    pub fn build_with_cache(self, cache: &DecoderCache) -> Result<Network> {
        self.build_inner(Some(cache))
    }

    fn build_inner(self, cache: Option<&DecoderCache>) -> Result<Network> {
        self.config.validate()?;
        let dt = self.config.dt;

        let names = self.collect_names()?;
        let nodes = self.build_nodes()?;
        let mut ensembles = self.build_ensembles()?;

        let mut jobs: Vec<DecoderJob> = Vec::new();
        let connections = self.build_connections(&ensembles, &nodes, &mut jobs)?;
        let probes = self.build_probes(&ensembles, &nodes, &connections, &mut jobs, dt)?;
        self.check_zero_delay_cycles(&connections)?;

        let (decoders, cache_hits) = self.solve_decoders(&ensembles, &jobs, cache)?;
        for (index, job) in jobs.iter().enumerate() {
            if job.function.is_none() {
                ensembles[job.ensemble].identity_decoders = Some(index);
            }
        }

        let stats = BuildStats {
            decoder_solves: jobs.len() - cache_hits,
            cache_hits,
        };
        info!(
            "[NEF-BUILD] Built network: {} ensembles ({} neurons), {} nodes, {} connections, {} probes; {} decoder solves, {} cache hits",
            ensembles.len(),
            ensembles.iter().map(|e| e.n_neurons()).sum::<usize>(),
            nodes.len(),
            connections.len(),
            probes.len(),
            stats.decoder_solves,
            stats.cache_hits
        );

        Ok(Network {
            config: self.config,
            ensembles,
            nodes,
            connections,
            probes,
            decoders,
            names,
            stats,
        })
    }

    // ─── naming ─────────────────────────────────────────────

    fn ensemble_name(&self, index: usize) -> String {
        display_name(
            self.ensembles[index].label.as_deref(),
            EnsembleId::from_index(index),
        )
    }

    fn node_name(&self, index: usize) -> String {
        display_name(self.nodes[index].label.as_deref(), NodeId::from_index(index))
    }

    fn connection_name(&self, index: usize) -> String {
        display_name(
            self.connections[index].label.as_deref(),
            ConnectionId::from_index(index),
        )
    }

    fn probe_name(&self, index: usize) -> String {
        display_name(self.probes[index].label.as_deref(), ProbeId::from_index(index))
    }

    fn collect_names(&self) -> Result<AHashMap<String, NamedObject>> {
        let mut names = AHashMap::new();
        let labelled = self
            .ensembles
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                e.label
                    .as_ref()
                    .map(|l| (l, NamedObject::Ensemble(EnsembleId::from_index(i))))
            })
            .chain(self.nodes.iter().enumerate().filter_map(|(i, n)| {
                n.label
                    .as_ref()
                    .map(|l| (l, NamedObject::Node(NodeId::from_index(i))))
            }))
            .chain(self.connections.iter().enumerate().filter_map(|(i, c)| {
                c.label
                    .as_ref()
                    .map(|l| (l, NamedObject::Connection(ConnectionId::from_index(i))))
            }))
            .chain(self.probes.iter().enumerate().filter_map(|(i, p)| {
                p.label
                    .as_ref()
                    .map(|l| (l, NamedObject::Probe(ProbeId::from_index(i))))
            }));
        for (label, object) in labelled {
            if names.insert(label.clone(), object).is_some() {
                return Err(EngineError::DuplicateName { name: label.clone() });
            }
        }
        Ok(names)
    }

    // ─── nodes ──────────────────────────────────────────────

    fn build_nodes(&self) -> Result<Vec<BuiltNode>> {
        let mut built = Vec::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            let name = self.node_name(index);
            let size_out = node.kind.size_out();
            if size_out == 0 {
                return Err(EngineError::InvalidNode {
                    node: name,
                    reason: "output size must be at least 1".to_string(),
                });
            }
            match &node.kind {
                NodeKind::Constant(values) => {
                    if values.iter().any(|v| !v.is_finite()) {
                        return Err(EngineError::InvalidNode {
                            node: name,
                            reason: "constant output must be finite".to_string(),
                        });
                    }
                }
                NodeKind::Time { f, .. } => check_arity(&name, size_out, f(0.0).len())?,
                NodeKind::TimeInput { size_in, f, .. } => {
                    if *size_in == 0 {
                        return Err(EngineError::InvalidNode {
                            node: name,
                            reason: "input size must be at least 1".to_string(),
                        });
                    }
                    check_arity(&name, size_out, f(0.0, &vec![0.0; *size_in]).len())?;
                }
                NodeKind::Passthrough { .. } => {}
            }
            built.push(BuiltNode {
                name,
                kind: node.kind.clone(),
            });
        }
        Ok(built)
    }

    // ─── ensembles ──────────────────────────────────────────

    fn build_ensembles(&self) -> Result<Vec<BuiltEnsemble>> {
        let mut seed_rng = seeded_rng(self.config.seed);
        let mut built = Vec::with_capacity(self.ensembles.len());

        for (index, ens) in self.ensembles.iter().enumerate() {
            let name = self.ensemble_name(index);
            // Always draw so an override never shifts the seeds of later ensembles
            let drawn: u64 = seed_rng.gen();
            let seed = ens.seed.unwrap_or(drawn);

            let invalid = |reason: String| EngineError::InvalidEnsemble {
                ensemble: name.clone(),
                reason,
            };
            if ens.n_neurons == 0 || ens.dimensions == 0 {
                return Err(invalid(format!(
                    "needs at least one neuron and one dimension (got {} x {})",
                    ens.n_neurons, ens.dimensions
                )));
            }

            let neuron_type = ens.neuron_type.unwrap_or(self.config.neuron_type);
            neuron_type.validate().map_err(|e| invalid(e.to_string()))?;
            let eval_spec = ens.eval_points.unwrap_or(self.config.eval_points);
            eval_spec.validate().map_err(|e| invalid(e.to_string()))?;

            let spec = TuningSpec {
                n_neurons: ens.n_neurons,
                dimensions: ens.dimensions,
                radius: ens.radius,
                encoders: ens.encoders.clone(),
                intercepts: ens
                    .intercepts
                    .clone()
                    .unwrap_or_else(|| self.config.intercepts.clone()),
                max_rates: ens
                    .max_rates
                    .clone()
                    .unwrap_or_else(|| self.config.max_rates.clone()),
            };

            let mut rng = seeded_rng(seed);
            let tuning = TuningParameters::generate(&spec, &neuron_type, &mut rng).map_err(
                |source| EngineError::Tuning {
                    ensemble: name.clone(),
                    source,
                },
            )?;
            let count = eval_spec.count(ens.n_neurons, ens.dimensions);
            let eval_points = sample_eval_points(count, ens.dimensions, ens.radius, &mut rng);

            debug!(
                "[NEF-BUILD] {}: {} neurons, {}D, radius {}, seed {}, {} eval points",
                name, ens.n_neurons, ens.dimensions, ens.radius, seed, count
            );
            built.push(BuiltEnsemble {
                name,
                neuron_type,
                tuning,
                eval_points,
                seed,
                identity_decoders: None,
            });
        }
        Ok(built)
    }

    // ─── connections ────────────────────────────────────────

    fn build_connections(
        &self,
        ensembles: &[BuiltEnsemble],
        nodes: &[BuiltNode],
        jobs: &mut Vec<DecoderJob>,
    ) -> Result<Vec<BuiltConnection>> {
        let mut built = Vec::with_capacity(self.connections.len());

        for (index, conn) in self.connections.iter().enumerate() {
            let name = self.connection_name(index);
            let dangling = |target: String| EngineError::DanglingReference {
                referrer: name.clone(),
                target,
            };
            let invalid = |reason: &str| EngineError::InvalidConnection {
                connection: name.clone(),
                reason: reason.to_string(),
            };

            if let Some(function) = &conn.function {
                if function.size_out() == 0 {
                    return Err(invalid("function output size must be at least 1"));
                }
            }
            conn.synapse
                .validate()
                .map_err(|e| invalid(&e.to_string()))?;

            // Source: resolve, find the size fed to the transform
            let (resolved, size_mid) = match conn.source {
                ConnectionSource::EnsembleOutput(id) => {
                    let ens = ensembles
                        .get(id.index())
                        .ok_or_else(|| dangling(id.to_string()))?;
                    let size_mid = conn
                        .function
                        .as_ref()
                        .map_or(ens.dimensions(), |f| f.size_out());
                    let decoders = decoder_job(jobs, id.index(), conn.function.as_ref(), &name);
                    (
                        ResolvedSource::Decoded {
                            ensemble: id.index(),
                            decoders,
                        },
                        size_mid,
                    )
                }
                ConnectionSource::EnsembleNeurons(id) => {
                    let ens = ensembles
                        .get(id.index())
                        .ok_or_else(|| dangling(id.to_string()))?;
                    if conn.function.is_some() {
                        return Err(invalid(
                            "a function cannot be applied to raw neuron output",
                        ));
                    }
                    (
                        ResolvedSource::Neurons {
                            ensemble: id.index(),
                        },
                        ens.n_neurons(),
                    )
                }
                ConnectionSource::NodeOutput(id) => {
                    let node = nodes
                        .get(id.index())
                        .ok_or_else(|| dangling(id.to_string()))?;
                    let size_mid = match &conn.function {
                        Some(function) => {
                            let probe = function.call(&vec![0.0; node.size_out()]);
                            check_arity(&name, function.size_out(), probe.len())?;
                            function.size_out()
                        }
                        None => node.size_out(),
                    };
                    (
                        ResolvedSource::Node {
                            node: id.index(),
                            function: conn.function.clone(),
                        },
                        size_mid,
                    )
                }
            };

            let transform_in = conn.transform.size_in(size_mid);
            if transform_in != size_mid {
                return Err(EngineError::DimensionMismatch {
                    connection: name,
                    what: "transform input",
                    expected: size_mid,
                    actual: transform_in,
                });
            }
            if let Transform::Scalar(w) = conn.transform {
                if !w.is_finite() {
                    return Err(invalid("transform must be finite"));
                }
            }
            if let Transform::Matrix(m) = &conn.transform {
                if m.iter().any(|w| !w.is_finite()) {
                    return Err(invalid("transform must be finite"));
                }
            }
            let size_out = conn.transform.size_out(size_mid);

            // Target
            let expected = match conn.target {
                ConnectionTarget::EnsembleInput(id) => {
                    ensembles
                        .get(id.index())
                        .ok_or_else(|| dangling(id.to_string()))?
                        .dimensions()
                }
                ConnectionTarget::EnsembleNeurons(id) => {
                    ensembles
                        .get(id.index())
                        .ok_or_else(|| dangling(id.to_string()))?
                        .n_neurons()
                }
                ConnectionTarget::NodeInput(id) => {
                    let node = nodes
                        .get(id.index())
                        .ok_or_else(|| dangling(id.to_string()))?;
                    if node.size_in() == 0 {
                        return Err(invalid(&format!("{} takes no input", node.name)));
                    }
                    node.size_in()
                }
            };
            if size_out != expected {
                return Err(EngineError::DimensionMismatch {
                    connection: name,
                    what: "target input",
                    expected,
                    actual: size_out,
                });
            }

            built.push(BuiltConnection {
                name,
                source: conn.source,
                target: conn.target,
                transform: conn.transform.clone(),
                synapse: conn.synapse,
                size_mid,
                size_out,
                resolved,
            });
        }
        Ok(built)
    }

    // ─── probes ─────────────────────────────────────────────

    fn build_probes(
        &self,
        ensembles: &[BuiltEnsemble],
        nodes: &[BuiltNode],
        connections: &[BuiltConnection],
        jobs: &mut Vec<DecoderJob>,
        dt: f64,
    ) -> Result<Vec<BuiltProbe>> {
        let mut built = Vec::with_capacity(self.probes.len());
        let mut seen: AHashMap<ProbeTarget, String> = AHashMap::new();

        for (index, probe) in self.probes.iter().enumerate() {
            let name = self.probe_name(index);
            let dangling = |target: String| EngineError::DanglingReference {
                referrer: name.clone(),
                target,
            };
            let invalid = |reason: String| EngineError::InvalidProbe {
                probe: name.clone(),
                reason,
            };

            let size = match probe.target {
                ProbeTarget::EnsembleDecoded(id) => {
                    let ens = ensembles
                        .get(id.index())
                        .ok_or_else(|| dangling(id.to_string()))?;
                    decoder_job(jobs, id.index(), None, &name);
                    ens.dimensions()
                }
                ProbeTarget::EnsembleSpikes(id) | ProbeTarget::EnsembleVoltages(id) => ensembles
                    .get(id.index())
                    .ok_or_else(|| dangling(id.to_string()))?
                    .n_neurons(),
                ProbeTarget::NodeOutput(id) => nodes
                    .get(id.index())
                    .ok_or_else(|| dangling(id.to_string()))?
                    .size_out(),
                ProbeTarget::ConnectionOutput(id) => connections
                    .get(id.index())
                    .ok_or_else(|| dangling(id.to_string()))?
                    .size_out,
            };

            if let Some(first) = seen.get(&probe.target) {
                return Err(EngineError::DuplicateProbe {
                    probe: name,
                    target: format!("{:?} (already probed by {})", probe.target, first),
                });
            }
            seen.insert(probe.target, name.clone());

            probe
                .synapse
                .validate()
                .map_err(|e| invalid(e.to_string()))?;

            let period = match probe.sample_every {
                None => 1,
                Some(seconds) => {
                    let ratio = seconds / dt;
                    let period = ratio.round();
                    if !(ratio.is_finite() && period >= 1.0)
                        || (ratio - period).abs() > PERIOD_TOLERANCE * ratio
                    {
                        return Err(invalid(format!(
                            "sample_every {} is not a positive multiple of dt {}",
                            seconds, dt
                        )));
                    }
                    period as u64
                }
            };

            built.push(BuiltProbe {
                name,
                target: probe.target,
                synapse: probe.synapse,
                period,
                size,
            });
        }
        Ok(built)
    }

    // ─── cycles ─────────────────────────────────────────────

    /// Reject cycles made entirely of unfiltered connections (self-loops included)
    fn check_zero_delay_cycles(&self, connections: &[BuiltConnection]) -> Result<()> {
        let n_ens = self.ensembles.len();
        let vertex_of_source = |s: ConnectionSource| match s {
            ConnectionSource::EnsembleOutput(id) | ConnectionSource::EnsembleNeurons(id) => {
                id.index()
            }
            ConnectionSource::NodeOutput(id) => n_ens + id.index(),
        };
        let vertex_of_target = |t: ConnectionTarget| match t {
            ConnectionTarget::EnsembleInput(id) | ConnectionTarget::EnsembleNeurons(id) => {
                id.index()
            }
            ConnectionTarget::NodeInput(id) => n_ens + id.index(),
        };

        let vertex_count = n_ens + self.nodes.len();
        let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); vertex_count];
        for (index, conn) in connections.iter().enumerate() {
            if conn.synapse.is_instantaneous() {
                adjacency[vertex_of_source(conn.source)]
                    .push((vertex_of_target(conn.target), index));
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnPath,
            Done,
        }
        let mut marks = vec![Mark::Unvisited; vertex_count];
        // (vertex, next edge to try, edge used to enter the vertex)
        let mut stack: Vec<(usize, usize, Option<usize>)> = Vec::new();

        for start in 0..vertex_count {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            marks[start] = Mark::OnPath;
            stack.push((start, 0, None));

            while let Some(top) = stack.last_mut() {
                let vertex = top.0;
                if let Some(&(to, edge)) = adjacency[vertex].get(top.1) {
                    top.1 += 1;
                    match marks[to] {
                        Mark::Unvisited => {
                            marks[to] = Mark::OnPath;
                            stack.push((to, 0, Some(edge)));
                        }
                        Mark::OnPath => {
                            // Edges from `to` back around to `vertex`, then the closing edge
                            let from = stack
                                .iter()
                                .position(|&(v, _, _)| v == to)
                                .unwrap_or(0);
                            let mut cycle: Vec<String> = stack[from + 1..]
                                .iter()
                                .filter_map(|&(_, _, e)| e)
                                .map(|e| connections[e].name.clone())
                                .collect();
                            cycle.push(connections[edge].name.clone());
                            return Err(EngineError::ZeroDelayCycle { connections: cycle });
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[vertex] = Mark::Done;
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    // ─── decoders ───────────────────────────────────────────

    fn solve_decoders(
        &self,
        ensembles: &[BuiltEnsemble],
        jobs: &[DecoderJob],
        cache: Option<&DecoderCache>,
    ) -> Result<(Vec<Decoders>, usize)> {
        let solver = self.config.solver;
        let solve_one = |job: &DecoderJob| -> Result<(Decoders, bool)> {
            let ens = &ensembles[job.ensemble];
            let key = match (&job.function, cache) {
                (None, Some(cache)) => {
                    let key = DecoderCache::fingerprint(
                        &ens.neuron_type,
                        &ens.tuning,
                        &ens.eval_points,
                        &solver,
                    );
                    if let Some(hit) = cache.get(key) {
                        return Ok((hit, true));
                    }
                    Some(key)
                }
                _ => None,
            };

            let activities = ens.tuning.activities(&ens.neuron_type, ens.eval_points.view());
            let targets = match &job.function {
                None => ens.eval_points.clone(),
                Some(function) => evaluate_function(function, &ens.eval_points, &job.requested_by)?,
            };
            let decoders = solver
                .solve(activities.view(), targets.view())
                .map_err(|source| EngineError::Solver {
                    ensemble: ens.name.clone(),
                    source,
                })?;
            debug!(
                "[NEF-DECODER] {} ({}): {} x {} decoders, rmse {:.5}",
                ens.name,
                if job.function.is_some() {
                    job.requested_by.as_str()
                } else {
                    "identity"
                },
                decoders.output_dimensions(),
                decoders.n_neurons(),
                decoders.rmse
            );
            if let (Some(cache), Some(key)) = (cache, key) {
                cache.insert(key, decoders.clone());
            }
            Ok((decoders, false))
        };

        // Results are gathered in job order so the reported error is deterministic
        let results: Vec<Result<(Decoders, bool)>> = if self.config.runtime.parallel {
            jobs.par_iter().map(solve_one).collect()
        } else {
            jobs.iter().map(solve_one).collect()
        };

        let mut decoders = Vec::with_capacity(results.len());
        let mut hits = 0;
        for result in results {
            let (d, hit) = result?;
            hits += usize::from(hit);
            decoders.push(d);
        }
        Ok((decoders, hits))
    }
}

/// Index of the job for `(ensemble, function)`, adding it when new
fn decoder_job(
    jobs: &mut Vec<DecoderJob>,
    ensemble: usize,
    function: Option<&ConnectionFunction>,
    requested_by: &str,
) -> usize {
    let existing = jobs.iter().position(|job| {
        job.ensemble == ensemble
            && match (&job.function, function) {
                (None, None) => true,
                (Some(a), Some(b)) => a.same_function(b),
                _ => false,
            }
    });
    existing.unwrap_or_else(|| {
        jobs.push(DecoderJob {
            ensemble,
            function: function.cloned(),
            requested_by: requested_by.to_string(),
        });
        jobs.len() - 1
    })
}

/// Targets `f(x)` for every evaluation point (P x M)
fn evaluate_function(
    function: &ConnectionFunction,
    eval_points: &Array2<f64>,
    entity: &str,
) -> Result<Array2<f64>> {
    let m = function.size_out();
    let mut targets = Array2::zeros((eval_points.nrows(), m));
    for (point, mut row) in eval_points.rows().into_iter().zip(targets.rows_mut()) {
        let x: Vec<f64> = point.to_vec();
        let y = function.call(&x);
        check_arity(entity, m, y.len())?;
        for (dst, v) in row.iter_mut().zip(y) {
            *dst = v;
        }
    }
    if targets.iter().any(|v| !v.is_finite()) {
        return Err(EngineError::InvalidConnection {
            connection: entity.to_string(),
            reason: "function is not finite over the evaluation points".to_string(),
        });
    }
    Ok(targets)
}

fn check_arity(entity: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(EngineError::FunctionArity {
            entity: entity.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn display_name(label: Option<&str>, handle: impl std::fmt::Display) -> String {
    match label {
        Some(label) => format!("{} '{}'", handle, label),
        None => handle.to_string(),
    }
}
