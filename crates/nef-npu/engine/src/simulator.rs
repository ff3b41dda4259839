// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Scheduler / Simulator
//!
//! Fixed-step execution of a built [`Network`]. Step `k` runs at `t = k * dt`:
//!
//! 1. **Nodes**: evaluate every node (inputs accumulated during step `k - 1`)
//! 2. **Connections**: source value, function, transform, synapse; then sum
//!    into target accumulators in declaration order. Decoded ensemble output
//!    uses the spikes of step `k - 1`, which is what makes recurrent graphs
//!    well-defined.
//! 3. **Ensembles**: build input currents and step every neuron model
//! 4. **Probes**: filter the post-update signals and record on their period
//!
//! Phase 2 and the neuron update of phase 3 fan out across Rayon workers when
//! the runtime is parallel. Per-connection results are reduced sequentially in
//! a fixed order, so parallel and sequential runs produce identical output.

use crate::error::{EngineError, Result};
use crate::handles::ProbeId;
use crate::network::{BuiltConnection, Network, ResolvedSource};
use crate::objects::{ConnectionTarget, ProbeTarget};
use crate::probes::{ProbeData, ProbeRecorder};
use nef_npu_neural::{LowpassFilter, NeuronModel, NeuronType};
use nef_npu_runtime::{NeuronArray, NeuronStorage, Runtime, StdRuntime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, error, info, trace};

/// Slack when converting a duration into a whole number of steps
const STEP_ROUNDING_SLACK: f64 = 1e-9;

/// Runtime-gated per-step tracing.
/// Enable with:
/// - NEF_TRACE_STEPS=1
/// Optional filter:
/// - NEF_TRACE_ENSEMBLE=<name substring>
struct StepTraceCfg {
    enabled: bool,
    ensemble_filter: Option<String>,
}

fn step_trace_cfg() -> &'static StepTraceCfg {
    static CFG: OnceLock<StepTraceCfg> = OnceLock::new();
    CFG.get_or_init(|| {
        let enabled = std::env::var("NEF_TRACE_STEPS")
            .ok()
            .as_deref()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let ensemble_filter = std::env::var("NEF_TRACE_ENSEMBLE").ok();

        StepTraceCfg {
            enabled,
            ensemble_filter,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorPhase {
    /// Network finalized, no simulation state allocated
    Built,
    /// State allocated, time advancing
    Running,
}

/// Simulator performance statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub total_steps: u64,
    pub total_spikes: u64,
    pub total_step_time_us: u64,
}

impl SimulationStats {
    /// Get average spikes per step
    pub fn avg_spikes_per_step(&self) -> f64 {
        if self.total_steps == 0 {
            0.0
        } else {
            self.total_spikes as f64 / self.total_steps as f64
        }
    }

    /// Get average wall time per step (microseconds)
    pub fn avg_step_time_us(&self) -> f64 {
        if self.total_steps == 0 {
            0.0
        } else {
            self.total_step_time_us as f64 / self.total_steps as f64
        }
    }
}

/// Scratch and filter state owned by one connection
#[derive(Debug)]
struct ConnectionState {
    filter: LowpassFilter,
    /// Decoded or function output fed to the transform
    source: Vec<f64>,
    transformed: Vec<f64>,
}

/// Everything that changes while the simulation runs
#[derive(Debug)]
struct SimulationState {
    models: Vec<NeuronType>,
    storages: Vec<NeuronArray>,
    /// Represented-vector input per ensemble (D)
    ensemble_input: Vec<Vec<f64>>,
    /// Direct per-neuron input per ensemble (N)
    neuron_input: Vec<Vec<f64>>,
    node_output: Vec<Vec<f64>>,
    /// Node inputs accumulated last step (read this step)
    node_input_prev: Vec<Vec<f64>>,
    /// Node inputs being accumulated this step
    node_input_next: Vec<Vec<f64>>,
    connections: Vec<ConnectionState>,
    probe_scratch: Vec<f64>,
}

impl SimulationState {
    fn allocate(network: &Network, runtime: &StdRuntime) -> Result<Self> {
        let dt = network.dt();
        let storages = network
            .ensembles
            .iter()
            .map(|e| runtime.create_neuron_storage(e.n_neurons()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            models: network.ensembles.iter().map(|e| e.neuron_type).collect(),
            storages,
            ensemble_input: network
                .ensembles
                .iter()
                .map(|e| vec![0.0; e.dimensions()])
                .collect(),
            neuron_input: network
                .ensembles
                .iter()
                .map(|e| vec![0.0; e.n_neurons()])
                .collect(),
            node_output: network
                .nodes
                .iter()
                .map(|n| vec![0.0; n.size_out()])
                .collect(),
            node_input_prev: network
                .nodes
                .iter()
                .map(|n| vec![0.0; n.size_in()])
                .collect(),
            node_input_next: network
                .nodes
                .iter()
                .map(|n| vec![0.0; n.size_in()])
                .collect(),
            connections: network
                .connections
                .iter()
                .map(|c| ConnectionState {
                    filter: c.synapse.build_filter(dt, c.size_out),
                    source: vec![0.0; c.size_mid],
                    transformed: vec![0.0; c.size_out],
                })
                .collect(),
            probe_scratch: Vec::new(),
        })
    }
}

/// Executes a built network in fixed `dt` increments
#[derive(Debug)]
pub struct Simulator {
    network: Arc<Network>,
    runtime: StdRuntime,
    phase: SimulatorPhase,
    state: Option<SimulationState>,
    recorders: Vec<ProbeRecorder>,
    /// Time of every completed step
    time: Vec<f64>,
    /// Index of every completed step
    steps: Vec<u64>,
    step: u64,
    fault: Option<EngineError>,
    stats: SimulationStats,
}

impl Simulator {
    pub fn new(network: Network) -> Result<Self> {
        Self::from_shared(Arc::new(network))
    }

    /// Simulator over a network shared with other simulators
    pub fn from_shared(network: Arc<Network>) -> Result<Self> {
        let runtime = StdRuntime::new(network.config().runtime.clone())?;
        let dt = network.dt();
        let recorders = network
            .probes
            .iter()
            .map(|p| ProbeRecorder::new(p.synapse, p.period, dt, p.size))
            .collect();
        Ok(Self {
            network,
            runtime,
            phase: SimulatorPhase::Built,
            state: None,
            recorders,
            time: Vec::new(),
            steps: Vec::new(),
            step: 0,
            fault: None,
            stats: SimulationStats::default(),
        })
    }

    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    pub fn phase(&self) -> SimulatorPhase {
        self.phase
    }

    pub fn dt(&self) -> f64 {
        self.network.dt()
    }

    /// Simulated time of every completed step (`[0, dt, 2dt, ...]`)
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Index of every completed step
    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    /// Number of completed steps
    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    /// The fault that halted the run, if any
    pub fn fault(&self) -> Option<&EngineError> {
        self.fault.as_ref()
    }

    pub fn data(&self, probe: ProbeId) -> Result<&ProbeData> {
        self.recorders
            .get(probe.index())
            .map(ProbeRecorder::data)
            .ok_or_else(|| EngineError::DanglingReference {
                referrer: "simulator data request".to_string(),
                target: probe.to_string(),
            })
    }

    /// Probes sampled on the same steps, joined dimension-wise
    pub fn concat_data(&self, probes: &[ProbeId]) -> Result<ProbeData> {
        let parts = probes
            .iter()
            .map(|&p| self.data(p))
            .collect::<Result<Vec<_>>>()?;
        ProbeData::concat(&parts)
    }

    /// Advance until simulated time reaches `duration` seconds from now
    pub fn run(&mut self, duration: f64) -> Result<()> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(EngineError::InvalidRun(format!(
                "duration must be finite and >= 0, got {}",
                duration
            )));
        }
        let n = (duration / self.dt() + STEP_ROUNDING_SLACK).floor() as u64;
        let start = Instant::now();
        self.run_steps(n)?;
        info!(
            "[NEF-SIM] Ran {} steps ({}s simulated) in {:.3}s wall time",
            n,
            duration,
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    pub fn run_steps(&mut self, n: u64) -> Result<()> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Advance one step. A faulted simulator keeps returning its fault.
    pub fn step(&mut self) -> Result<()> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        if self.state.is_none() {
            self.state = Some(SimulationState::allocate(&self.network, &self.runtime)?);
            self.phase = SimulatorPhase::Running;
            debug!(
                "[NEF-SIM] Built -> Running: {} neurons, {} connections, {} probes, runtime {}",
                self.network.total_neurons(),
                self.network.connections.len(),
                self.network.probes.len(),
                self.runtime.platform_name()
            );
        }

        let start = Instant::now();
        match self.advance() {
            Ok(spikes) => {
                let t = self.step as f64 * self.dt();
                self.time.push(t);
                self.steps.push(self.step);
                self.step += 1;
                self.stats.total_steps += 1;
                self.stats.total_spikes += spikes;
                self.stats.total_step_time_us += start.elapsed().as_micros() as u64;
                Ok(())
            }
            Err(e) => {
                error!("[NEF-SIM] Halting at step {}: {}", self.step, e);
                self.fault = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Drop all simulation state and recorded data; the network is kept
    pub fn reset(&mut self) {
        self.state = None;
        self.phase = SimulatorPhase::Built;
        self.recorders.iter_mut().for_each(ProbeRecorder::reset);
        self.time.clear();
        self.steps.clear();
        self.step = 0;
        self.fault = None;
        self.stats = SimulationStats::default();
    }

    /// One scheduler tick; returns the number of spikes emitted
    fn advance(&mut self) -> Result<u64> {
        let network: &Network = &self.network;
        let step = self.step;
        let dt = network.dt();
        let t = step as f64 * dt;
        let Some(state) = self.state.as_mut() else {
            return Err(EngineError::InvalidRun(
                "simulation state not allocated".to_string(),
            ));
        };

        // 1. Nodes
        for (index, node) in network.nodes.iter().enumerate() {
            let out = &mut state.node_output[index];
            node.kind.evaluate(t, &state.node_input_prev[index], out);
            if out.len() != node.size_out() {
                return Err(EngineError::FunctionArity {
                    entity: node.name.clone(),
                    expected: node.size_out(),
                    actual: out.len(),
                });
            }
            if let Some(i) = out.iter().position(|v| !v.is_finite()) {
                return Err(EngineError::NumericalFault {
                    entity: node.name.clone(),
                    step,
                    detail: format!("non-finite output in dimension {}", i),
                });
            }
        }

        // 2. Connections
        let parallel = self.runtime.config().parallel && network.connections.len() > 1;
        {
            let storages = &state.storages;
            let node_output = &state.node_output;
            let conn_states = &mut state.connections;
            let results: Vec<Result<()>> = if parallel {
                self.runtime.install(|| {
                    conn_states
                        .par_iter_mut()
                        .zip(network.connections.par_iter())
                        .map(|(cs, conn)| {
                            compute_connection(network, conn, cs, storages, node_output)
                        })
                        .collect()
                })
            } else {
                conn_states
                    .iter_mut()
                    .zip(&network.connections)
                    .map(|(cs, conn)| compute_connection(network, conn, cs, storages, node_output))
                    .collect()
            };
            results.into_iter().collect::<Result<()>>()?;
        }

        state.ensemble_input.iter_mut().for_each(|v| v.fill(0.0));
        state.neuron_input.iter_mut().for_each(|v| v.fill(0.0));
        state.node_input_next.iter_mut().for_each(|v| v.fill(0.0));
        for (conn, cs) in network.connections.iter().zip(&state.connections) {
            let out = cs.filter.output();
            if let Some(i) = out.iter().position(|v| !v.is_finite()) {
                return Err(EngineError::NumericalFault {
                    entity: conn.name.clone(),
                    step,
                    detail: format!("non-finite output in dimension {}", i),
                });
            }
            let acc = match conn.target {
                ConnectionTarget::EnsembleInput(id) => &mut state.ensemble_input[id.index()],
                ConnectionTarget::EnsembleNeurons(id) => &mut state.neuron_input[id.index()],
                ConnectionTarget::NodeInput(id) => &mut state.node_input_next[id.index()],
            };
            for (a, v) in acc.iter_mut().zip(out) {
                *a += v;
            }
        }
        std::mem::swap(&mut state.node_input_prev, &mut state.node_input_next);

        // 3. Ensembles
        for (index, ens) in network.ensembles.iter().enumerate() {
            let storage = &mut state.storages[index];
            let currents = storage.input_currents_mut();
            ens.tuning.currents(&state.ensemble_input[index], currents);
            for ((j, gain), direct) in currents
                .iter_mut()
                .zip(&ens.tuning.gains)
                .zip(&state.neuron_input[index])
            {
                *j += gain * direct;
            }
            if let Some(i) = storage.first_non_finite_current() {
                return Err(EngineError::NumericalFault {
                    entity: ens.name.clone(),
                    step,
                    detail: format!("non-finite input current at neuron {}", i),
                });
            }
        }
        self.runtime
            .step_populations(dt, &state.models, &mut state.storages)?;

        let mut spikes = 0u64;
        let trace_cfg = step_trace_cfg();
        for (ens, (model, storage)) in network
            .ensembles
            .iter()
            .zip(state.models.iter().zip(&state.storages))
        {
            if !model.is_spiking() {
                continue;
            }
            let fired = storage.active_count() as u64;
            spikes += fired;
            if trace_cfg.enabled
                && trace_cfg
                    .ensemble_filter
                    .as_deref()
                    .map_or(true, |f| ens.name.contains(f))
            {
                let mean_v =
                    storage.voltages().iter().sum::<f64>() / storage.count().max(1) as f64;
                trace!(
                    "[NEF-SIM] step {} t={:.4} {}: {} spikes, mean v {:.4}",
                    step,
                    t,
                    ens.name,
                    fired,
                    mean_v
                );
            }
        }

        // 4. Probes
        for (probe, recorder) in network.probes.iter().zip(self.recorders.iter_mut()) {
            let signal: &[f64] = match probe.target {
                ProbeTarget::EnsembleDecoded(id) => {
                    let Some(decoders) = network.identity_decoders(id) else {
                        continue;
                    };
                    state.probe_scratch.resize(decoders.output_dimensions(), 0.0);
                    decoders.decode(
                        state.storages[id.index()].outputs(),
                        &mut state.probe_scratch,
                    );
                    &state.probe_scratch
                }
                ProbeTarget::EnsembleSpikes(id) => state.storages[id.index()].outputs(),
                ProbeTarget::EnsembleVoltages(id) => state.storages[id.index()].voltages(),
                ProbeTarget::NodeOutput(id) => &state.node_output[id.index()],
                ProbeTarget::ConnectionOutput(id) => state.connections[id.index()].filter.output(),
            };
            recorder.observe(step, t, signal);
        }

        Ok(spikes)
    }
}

/// Source value, function, transform and synapse for one connection
fn compute_connection(
    network: &Network,
    conn: &BuiltConnection,
    state: &mut ConnectionState,
    storages: &[NeuronArray],
    node_output: &[Vec<f64>],
) -> Result<()> {
    let source: &[f64] = match &conn.resolved {
        ResolvedSource::Decoded { ensemble, decoders } => {
            network.decoders[*decoders].decode(storages[*ensemble].outputs(), &mut state.source);
            &state.source
        }
        ResolvedSource::Neurons { ensemble } => storages[*ensemble].outputs(),
        ResolvedSource::Node { node, function } => match function {
            None => &node_output[*node],
            Some(function) => {
                let y = function.call(&node_output[*node]);
                if y.len() != conn.size_mid {
                    return Err(EngineError::FunctionArity {
                        entity: conn.name.clone(),
                        expected: conn.size_mid,
                        actual: y.len(),
                    });
                }
                state.source = y;
                &state.source
            }
        },
    };
    conn.transform.apply(source, &mut state.transformed);
    state.filter.step(&state.transformed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_averages() {
        let stats = SimulationStats {
            total_steps: 4,
            total_spikes: 10,
            total_step_time_us: 8,
        };
        assert_eq!(stats.avg_spikes_per_step(), 2.5);
        assert_eq!(stats.avg_step_time_us(), 2.0);
        assert_eq!(SimulationStats::default().avg_spikes_per_step(), 0.0);
    }
}
