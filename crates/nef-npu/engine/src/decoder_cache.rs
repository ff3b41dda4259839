// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory cache of identity decoders, shared across builds.
//!
//! Keyed by a fingerprint of everything the solve depends on: neuron model,
//! tuning parameters, evaluation points and regularization. Decoders for
//! user functions are never cached since closures cannot be fingerprinted.

use ahash::RandomState;
use nef_npu_neural::{DecoderSolver, Decoders, NeuronType, TuningParameters};
use ndarray::Array2;
use ahash::AHashMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

// Fixed seeds keep fingerprints stable for the life of the process
const FINGERPRINT_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

#[derive(Debug, Default)]
pub struct DecoderCache {
    entries: Mutex<AHashMap<u64, Decoders>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DecoderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fingerprint(
        neuron_type: &NeuronType,
        tuning: &TuningParameters,
        eval_points: &Array2<f64>,
        solver: &DecoderSolver,
    ) -> u64 {
        let state = RandomState::with_seeds(
            FINGERPRINT_SEEDS[0],
            FINGERPRINT_SEEDS[1],
            FINGERPRINT_SEEDS[2],
            FINGERPRINT_SEEDS[3],
        );
        let mut hasher = state.build_hasher();

        let (tag, params) = match neuron_type {
            NeuronType::Lif(p) => (0u8, p),
            NeuronType::LifRate(p) => (1u8, p),
        };
        tag.hash(&mut hasher);
        hash_f64s(&mut hasher, [params.tau_rc, params.tau_ref]);
        tuning.encoders.dim().hash(&mut hasher);
        hash_f64s(&mut hasher, tuning.encoders.iter().copied());
        hash_f64s(&mut hasher, tuning.gains.iter().copied());
        hash_f64s(&mut hasher, tuning.biases.iter().copied());
        hash_f64s(&mut hasher, [tuning.radius, solver.regularization]);
        eval_points.dim().hash(&mut hasher);
        hash_f64s(&mut hasher, eval_points.iter().copied());
        hasher.finish()
    }

    pub fn get(&self, key: u64) -> Option<Decoders> {
        let found = self.lock().get(&key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn insert(&self, key: u64, decoders: Decoders) {
        self.lock().insert(key, decoders);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AHashMap<u64, Decoders>> {
        // Entries are written whole; a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn hash_f64s<H: Hasher>(hasher: &mut H, values: impl IntoIterator<Item = f64>) {
    for v in values {
        v.to_bits().hash(hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nef_npu_neural::{seeded_rng, sample_eval_points, TuningSpec};

    fn population(seed: u64) -> (TuningParameters, Array2<f64>) {
        let mut rng = seeded_rng(seed);
        let tuning =
            TuningParameters::generate(&TuningSpec::new(20, 1), &NeuronType::default(), &mut rng)
                .unwrap();
        let points = sample_eval_points(100, 1, 1.0, &mut rng);
        (tuning, points)
    }

    #[test]
    fn test_fingerprint_tracks_inputs() {
        let (t1, p1) = population(1);
        let (t2, p2) = population(2);
        let solver = DecoderSolver::default();
        let lif = NeuronType::default();
        let a = DecoderCache::fingerprint(&lif, &t1, &p1, &solver);
        assert_eq!(a, DecoderCache::fingerprint(&lif, &t1, &p1, &solver));
        assert_ne!(a, DecoderCache::fingerprint(&lif, &t2, &p2, &solver));
        assert_ne!(
            a,
            DecoderCache::fingerprint(&lif, &t1, &p1, &DecoderSolver::new(0.05))
        );
    }

    #[test]
    fn test_hits_and_misses_counted() {
        let cache = DecoderCache::new();
        let decoders = Decoders {
            weights: Array2::zeros((1, 3)),
            rmse: 0.0,
        };
        assert!(cache.get(7).is_none());
        cache.insert(7, decoders.clone());
        assert_eq!(cache.get(7), Some(decoders));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
        assert_eq!(cache.len(), 1);
    }
}
