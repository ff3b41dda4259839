// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # End-to-End Scenarios
//!
//! Whole-network behavior: first-order step response, a controlled
//! integrator with a recurrent product, and parallel/sequential agreement.

use nef_npu_engine::*;
use ndarray::array;

fn mean_around(data: &ProbeData, dimension: usize, step: usize, half_width: usize) -> f64 {
    let column = data.column(dimension);
    let window = &column[step - half_width..step + half_width];
    window.iter().sum::<f64>() / window.len() as f64
}

#[test]
fn test_constant_input_first_order_response() {
    let mut builder = ModelBuilder::with_config(EngineConfig::default().with_seed(11));
    let input = builder.add_node(NodeConfig::constant(vec![1.0]).label("one"));
    let a = builder.add_ensemble(EnsembleConfig::new(100, 1).label("A"));
    builder.connect(ConnectionConfig::new(input, a).transform(1.0).synapse(0.1));
    let probe = builder.probe(ProbeConfig::new(a).synapse(0.01));

    let mut sim = Simulator::new(builder.build().unwrap()).unwrap();
    sim.run(1.0).unwrap();
    let data = sim.data(probe).unwrap();
    assert_eq!(data.len(), 1000);

    // One time constant in: roughly 1 - 1/e of the way there
    let early = mean_around(data, 0, 100, 5);
    assert!((0.4..0.8).contains(&early), "value at t=0.1: {}", early);

    let late = data.column(0)[900..].iter().sum::<f64>() / 100.0;
    assert!((late - 1.0).abs() < 0.15, "settled value: {}", late);
    assert!(late > early);
}

#[test]
fn test_controlled_integrator_ramps_and_holds() {
    let tau = 0.1;
    let mut builder = ModelBuilder::with_config(EngineConfig::default().with_seed(7));

    let stimulus = piecewise(&[(0.0, vec![0.0]), (0.2, vec![5.0]), (0.3, vec![0.0])]).unwrap();
    let input = builder.add_node(NodeConfig::from_time_fn(1, stimulus).label("input"));
    let control = builder.add_node(NodeConfig::constant(vec![1.0]).label("control"));
    let a = builder.add_ensemble(EnsembleConfig::new(400, 2).radius(1.5).label("integrator"));

    builder.connect(
        ConnectionConfig::new(input, a)
            .transform(array![[tau], [0.0]])
            .synapse(tau),
    );
    builder.connect(
        ConnectionConfig::new(control, a)
            .transform(array![[0.0], [1.0]])
            .synapse(0.005),
    );
    builder.connect(
        ConnectionConfig::new(a, a)
            .function(ConnectionFunction::new(1, |x| vec![x[0] * x[1]]))
            .transform(array![[1.0], [0.0]])
            .synapse(tau)
            .label("recurrent"),
    );
    let probe = builder.probe(ProbeConfig::new(a).synapse(0.02));

    let mut sim = Simulator::new(builder.build().unwrap()).unwrap();
    sim.run(0.6).unwrap();
    let data = sim.data(probe).unwrap();

    let before = mean_around(data, 0, 180, 5);
    let middle = mean_around(data, 0, 250, 5);
    let end_of_step = mean_around(data, 0, 300, 5);
    let after = mean_around(data, 0, 550, 5);

    assert!(before.abs() < 0.15, "drift before input: {}", before);
    // Integrates 5 * 0.1 = 0.5 over the step, roughly linearly
    assert!((0.3..0.7).contains(&end_of_step), "end of step: {}", end_of_step);
    assert!((0.1..0.4).contains(&middle), "mid step: {}", middle);
    assert!(middle < end_of_step);
    // Holds once the input is gone
    assert!((after - end_of_step).abs() < 0.2, "held {} -> {}", end_of_step, after);
    // Control dimension tracks its constant input
    let control_dim = mean_around(data, 1, 400, 20);
    assert!((control_dim - 1.0).abs() < 0.2, "control: {}", control_dim);
}

#[test]
fn test_integrator_unit_step_ramps_at_inverse_tau() {
    let tau = 0.1;
    let mut builder = ModelBuilder::with_config(EngineConfig::default().with_seed(19));

    let stimulus = piecewise(&[(0.0, vec![0.0]), (0.2, vec![1.0]), (0.3, vec![0.0])]).unwrap();
    let input = builder.add_node(NodeConfig::from_time_fn(1, stimulus).label("unit step"));
    let control = builder.add_node(NodeConfig::constant(vec![1.0]).label("control"));
    let a = builder.add_ensemble(EnsembleConfig::new(400, 2).radius(1.5).label("integrator"));

    builder.connect(
        ConnectionConfig::new(input, a)
            .transform(array![[1.0], [0.0]])
            .synapse(tau),
    );
    builder.connect(
        ConnectionConfig::new(control, a)
            .transform(array![[0.0], [1.0]])
            .synapse(0.005),
    );
    builder.connect(
        ConnectionConfig::new(a, a)
            .function(ConnectionFunction::new(1, |x| vec![x[0] * x[1]]))
            .transform(array![[1.0], [0.0]])
            .synapse(tau),
    );
    let probe = builder.probe(ProbeConfig::new(a).synapse(0.02));

    let mut sim = Simulator::new(builder.build().unwrap()).unwrap();
    sim.run(0.6).unwrap();
    let data = sim.data(probe).unwrap();

    // tau * dx/dt = u, so a unit input climbs at 1/tau = 10 per second
    let early = mean_around(data, 0, 240, 5);
    let late = mean_around(data, 0, 290, 5);
    let slope = (late - early) / 0.05;
    assert!((5.0..15.0).contains(&slope), "ramp rate {} per second", slope);

    // 0.1 s at 10/s lands near 1.0 once the probe filter catches up
    let reached = mean_around(data, 0, 350, 5);
    assert!((0.7..1.3).contains(&reached), "reached {}", reached);
    let after = mean_around(data, 0, 550, 5);
    assert!((after - reached).abs() < 0.3, "held {} -> {}", reached, after);
}

#[test]
fn test_recurrent_loop_runs_in_bounded_steps() {
    let mut builder = ModelBuilder::with_config(EngineConfig::default().with_seed(3));
    let a = builder.add_ensemble(EnsembleConfig::new(40, 1));
    let b = builder.add_ensemble(EnsembleConfig::new(40, 1));
    let relay = builder.add_node(NodeConfig::passthrough(1));
    builder.connect(ConnectionConfig::new(a, relay).synapse(0.0));
    builder.connect(ConnectionConfig::new(relay, b).synapse(0.0));
    builder.connect(ConnectionConfig::new(b, a).synapse(0.05).transform(-0.5));
    let probe = builder.probe(ProbeConfig::new(b));

    let mut sim = Simulator::new(builder.build().unwrap()).unwrap();
    sim.run_steps(250).unwrap();
    sim.run_steps(250).unwrap();
    assert_eq!(sim.step_count(), 500);
    assert_eq!(sim.data(probe).unwrap().len(), 500);
    assert!(sim
        .data(probe)
        .unwrap()
        .samples
        .iter()
        .all(|s| s[0].is_finite()));
}

fn mixed_network(config: EngineConfig) -> (Network, Vec<ProbeId>) {
    let mut builder = ModelBuilder::with_config(config);
    let noise = white_noise(1.0, 5.0, 0.4, 9, 2).unwrap();
    let input = builder.add_node(NodeConfig::from_time_fn(2, noise));
    let a = builder.add_ensemble(EnsembleConfig::new(80, 2));
    let b = builder.add_ensemble(EnsembleConfig::new(60, 1));
    let c = builder.add_ensemble(
        EnsembleConfig::new(50, 1).neuron_type(NeuronType::LifRate(LifParameters::default())),
    );
    builder.connect(ConnectionConfig::new(input, a));
    builder.connect(
        ConnectionConfig::new(a, b).function(ConnectionFunction::new(1, |x| vec![x[0] * x[1]])),
    );
    builder.connect(ConnectionConfig::new(b, c).transform(0.8));
    builder.connect(ConnectionConfig::new(c, c).synapse(0.05).transform(0.5));
    builder.connect(
        ConnectionConfig::new(ConnectionSource::EnsembleNeurons(b), ConnectionTarget::EnsembleNeurons(c))
            .transform(ndarray::Array2::from_elem((50, 60), -1e-4)),
    );
    let probes = vec![
        builder.probe(ProbeConfig::new(a).synapse(0.01)),
        builder.probe(ProbeConfig::new(ProbeTarget::EnsembleSpikes(b))),
        builder.probe(ProbeConfig::new(ProbeTarget::EnsembleVoltages(c))),
        builder.probe(ProbeConfig::new(c).sample_every(0.005)),
    ];
    (builder.build().unwrap(), probes)
}

#[test]
fn test_parallel_and_sequential_runs_identical() {
    let mut parallel_config = EngineConfig::default().with_seed(21);
    parallel_config.runtime.num_threads = 3;
    parallel_config.runtime.parallel_threshold = 0;
    let sequential_config = EngineConfig::default().with_seed(21).sequential();

    let (net_p, probes) = mixed_network(parallel_config);
    let (net_s, _) = mixed_network(sequential_config);
    let mut sim_p = Simulator::new(net_p).unwrap();
    let mut sim_s = Simulator::new(net_s).unwrap();
    sim_p.run(0.3).unwrap();
    sim_s.run(0.3).unwrap();

    for probe in probes {
        assert_eq!(sim_p.data(probe).unwrap(), sim_s.data(probe).unwrap());
    }
    assert_eq!(sim_p.stats().total_spikes, sim_s.stats().total_spikes);
}

#[test]
fn test_ensemble_array_represents_concatenated_vector() {
    let target = [0.5, -0.3, 0.2];
    let mut builder = ModelBuilder::with_config(EngineConfig::default().with_seed(5));
    let input = builder.add_node(NodeConfig::constant(target.to_vec()));
    let array = EnsembleArray::new(
        &mut builder,
        "array",
        150,
        3,
        1,
        EnsembleConfig::new(1, 1),
    )
    .unwrap();
    assert_eq!(array.dimensions(), 3);
    array
        .connect_from(&mut builder, input, Transform::Identity, 0.005)
        .unwrap();
    let probes = array.probe(&mut builder, 0.03, None);

    let mut sim = Simulator::new(builder.build().unwrap()).unwrap();
    sim.run(0.5).unwrap();
    let data = sim.concat_data(&probes).unwrap();
    assert_eq!(data.dimensions, 3);
    for (d, expected) in target.iter().enumerate() {
        let settled = data.column(d)[300..].iter().sum::<f64>() / 200.0;
        assert!((settled - expected).abs() < 0.1, "dim {}: {}", d, settled);
    }
}
