// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Build Validation Tests
//!
//! Every configuration error is raised by `build()` and names the offending
//! object.

use nef_npu_engine::*;
use ndarray::{array, Array2};

fn single_ensemble() -> (ModelBuilder, EnsembleId) {
    let mut builder = ModelBuilder::with_config(EngineConfig::default().with_seed(1));
    let a = builder.add_ensemble(EnsembleConfig::new(30, 1).label("A"));
    (builder, a)
}

#[test]
fn test_target_dimension_mismatch_names_connection() {
    let (mut builder, a) = single_ensemble();
    let input = builder.add_node(NodeConfig::constant(vec![1.0, 2.0]));
    builder.connect(ConnectionConfig::new(input, a).label("input->A"));

    let err = builder.build().unwrap_err();
    match &err {
        EngineError::DimensionMismatch {
            connection,
            what,
            expected,
            actual,
        } => {
            assert!(connection.contains("input->A"));
            assert_eq!(*what, "target input");
            assert_eq!((*expected, *actual), (1, 2));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.is_configuration_error());
}

#[test]
fn test_transform_input_mismatch() {
    let (mut builder, a) = single_ensemble();
    let input = builder.add_node(NodeConfig::constant(vec![1.0, 2.0]));
    builder.connect(ConnectionConfig::new(input, a).transform(array![[1.0, 0.0, 0.0]]));
    assert!(matches!(
        builder.build(),
        Err(EngineError::DimensionMismatch {
            what: "transform input",
            expected: 2,
            actual: 3,
            ..
        })
    ));
}

#[test]
fn test_dangling_reference() {
    let mut other = ModelBuilder::new();
    other.add_ensemble(EnsembleConfig::new(10, 1));
    let foreign = other.add_ensemble(EnsembleConfig::new(10, 1));

    let (mut builder, _a) = single_ensemble();
    builder.probe(ProbeConfig::new(foreign).label("lost"));
    match builder.build() {
        Err(EngineError::DanglingReference { referrer, target }) => {
            assert!(referrer.contains("lost"));
            assert_eq!(target, "ensemble #1");
        }
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_duplicate_probe() {
    let (mut builder, a) = single_ensemble();
    builder.probe(ProbeConfig::new(a));
    builder.probe(ProbeConfig::new(a).synapse(0.01));
    assert!(matches!(
        builder.build(),
        Err(EngineError::DuplicateProbe { .. })
    ));
}

#[test]
fn test_different_signals_of_one_ensemble_are_not_duplicates() {
    let (mut builder, a) = single_ensemble();
    builder.probe(ProbeConfig::new(a));
    builder.probe(ProbeConfig::new(ProbeTarget::EnsembleSpikes(a)));
    builder.probe(ProbeConfig::new(ProbeTarget::EnsembleVoltages(a)));
    assert!(builder.build().is_ok());
}

#[test]
fn test_duplicate_name() {
    let (mut builder, _a) = single_ensemble();
    builder.add_node(NodeConfig::constant(vec![0.0]).label("A"));
    assert!(matches!(
        builder.build(),
        Err(EngineError::DuplicateName { name }) if name == "A"
    ));
}

#[test]
fn test_zero_delay_cycle_rejected() {
    let mut builder = ModelBuilder::new();
    let a = builder.add_ensemble(EnsembleConfig::new(20, 1));
    let b = builder.add_ensemble(EnsembleConfig::new(20, 1));
    builder.connect(ConnectionConfig::new(a, b).synapse(0.0).label("a->b"));
    builder.connect(ConnectionConfig::new(b, a).synapse(0.0).label("b->a"));

    match builder.build() {
        Err(EngineError::ZeroDelayCycle { connections }) => {
            assert_eq!(connections.len(), 2);
            assert!(connections.iter().any(|c| c.contains("a->b")));
            assert!(connections.iter().any(|c| c.contains("b->a")));
        }
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unfiltered_self_loop_rejected() {
    let (mut builder, a) = single_ensemble();
    builder.connect(ConnectionConfig::new(a, a).synapse(0.0));
    assert!(matches!(
        builder.build(),
        Err(EngineError::ZeroDelayCycle { connections }) if connections.len() == 1
    ));
}

#[test]
fn test_cycle_with_one_filtered_edge_accepted() {
    let mut builder = ModelBuilder::new();
    let a = builder.add_ensemble(EnsembleConfig::new(20, 1));
    let b = builder.add_ensemble(EnsembleConfig::new(20, 1));
    let relay = builder.add_node(NodeConfig::passthrough(1));
    builder.connect(ConnectionConfig::new(a, relay).synapse(0.0));
    builder.connect(ConnectionConfig::new(relay, b).synapse(0.0));
    builder.connect(ConnectionConfig::new(b, a).synapse(0.01));
    assert!(builder.build().is_ok());
}

#[test]
fn test_unreachable_max_rate() {
    let mut builder = ModelBuilder::new();
    builder.add_ensemble(
        EnsembleConfig::new(10, 1)
            .label("fast")
            .max_rates(Distribution::Constant(1000.0)),
    );
    match builder.build() {
        Err(EngineError::Tuning { ensemble, .. }) => assert!(ensemble.contains("fast")),
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_empty_ensemble_rejected() {
    let mut builder = ModelBuilder::new();
    builder.add_ensemble(EnsembleConfig::new(0, 1));
    assert!(matches!(
        builder.build(),
        Err(EngineError::InvalidEnsemble { .. })
    ));

    let mut builder = ModelBuilder::new();
    builder.add_ensemble(EnsembleConfig::new(5, 0));
    assert!(matches!(
        builder.build(),
        Err(EngineError::InvalidEnsemble { .. })
    ));
}

#[test]
fn test_explicit_encoder_shape_checked() {
    let mut builder = ModelBuilder::new();
    builder.add_ensemble(EnsembleConfig::new(4, 2).encoders(Array2::ones((3, 2))));
    assert!(matches!(builder.build(), Err(EngineError::Tuning { .. })));
}

#[test]
fn test_function_on_neurons_rejected() {
    let (mut builder, a) = single_ensemble();
    let b = builder.add_ensemble(EnsembleConfig::new(30, 1));
    builder.connect(
        ConnectionConfig::new(ConnectionSource::EnsembleNeurons(a), b)
            .function(ConnectionFunction::new(1, |x| vec![x[0]])),
    );
    assert!(matches!(
        builder.build(),
        Err(EngineError::InvalidConnection { .. })
    ));
}

#[test]
fn test_function_arity_checked_on_eval_points() {
    let (mut builder, a) = single_ensemble();
    let b = builder.add_ensemble(EnsembleConfig::new(30, 2));
    builder.connect(
        ConnectionConfig::new(a, b)
            .function(ConnectionFunction::new(2, |x| vec![x[0]]))
            .label("short"),
    );
    match builder.build() {
        Err(EngineError::FunctionArity {
            entity,
            expected,
            actual,
        }) => {
            assert!(entity.contains("short"));
            assert_eq!((expected, actual), (2, 1));
        }
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_node_arity_checked() {
    let mut builder = ModelBuilder::new();
    builder.add_node(NodeConfig::function(2, |_| vec![1.0]));
    assert!(matches!(
        builder.build(),
        Err(EngineError::FunctionArity {
            expected: 2,
            actual: 1,
            ..
        })
    ));
}

#[test]
fn test_connection_into_source_node_rejected() {
    let (mut builder, a) = single_ensemble();
    let constant = builder.add_node(NodeConfig::constant(vec![0.0]));
    builder.connect(ConnectionConfig::new(a, constant));
    assert!(matches!(
        builder.build(),
        Err(EngineError::InvalidConnection { .. })
    ));
}

#[test]
fn test_sample_every_must_be_multiple_of_dt() {
    let (mut builder, a) = single_ensemble();
    builder.probe(ProbeConfig::new(a).sample_every(0.0015));
    assert!(matches!(
        builder.build(),
        Err(EngineError::InvalidProbe { .. })
    ));
}

#[test]
fn test_shared_function_solved_once() {
    let (mut builder, a) = single_ensemble();
    let b = builder.add_ensemble(EnsembleConfig::new(30, 1));
    let c = builder.add_ensemble(EnsembleConfig::new(30, 1));
    let square = ConnectionFunction::new(1, |x| vec![x[0] * x[0]]);
    builder.connect(ConnectionConfig::new(a, b).function(square.clone()));
    builder.connect(ConnectionConfig::new(a, c).function(square));
    builder.connect(ConnectionConfig::new(a, c));

    let network = builder.build().unwrap();
    assert_eq!(network.build_stats().decoder_solves, 2);
    assert!(network.identity_decoders(a).is_some());
    assert!(network.identity_decoders(b).is_none());
}

#[test]
fn test_named_lookup_after_build() {
    let (mut builder, a) = single_ensemble();
    let input = builder.add_node(NodeConfig::constant(vec![0.5]).label("stim"));
    assert_eq!(builder.ensemble_by_name("A"), Some(a));

    let network = builder.build().unwrap();
    assert_eq!(network.ensemble_by_name("A"), Some(a));
    assert_eq!(network.node_by_name("stim"), Some(input));
    assert_eq!(network.node_by_name("A"), None);
    assert_eq!(network.lookup("missing"), None);
}

#[test]
fn test_invalid_dt_rejected() {
    let builder = ModelBuilder::with_config(EngineConfig::default().with_dt(-0.001));
    assert!(matches!(
        builder.build(),
        Err(EngineError::InvalidConfig(_))
    ));
}
