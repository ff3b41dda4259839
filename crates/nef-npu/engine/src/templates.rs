// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Ensemble Arrays
//!
//! An [`EnsembleArray`] represents one long vector with several small
//! ensembles, each covering a contiguous block of `dims_per_ensemble`
//! dimensions. Connections into, out of and between arrays are split into
//! per-block connections; blocks of a transform that are all zero are skipped.

use crate::builder::ModelBuilder;
use crate::error::{EngineError, Result};
use crate::handles::{ConnectionId, EnsembleId, ProbeId};
use crate::objects::{
    ConnectionConfig, ConnectionFunction, ConnectionSource, EnsembleConfig, ProbeConfig, Transform,
};
use nef_npu_neural::Synapse;
use ndarray::{s, Array2};

#[derive(Debug, Clone)]
pub struct EnsembleArray {
    label: String,
    ensembles: Vec<EnsembleId>,
    dims_per_ensemble: usize,
}

impl EnsembleArray {
    /// Declare `n_ensembles` ensembles sharing `n_neurons` (sizes differ by at
    /// most one). `template` supplies everything except size and label; a
    /// template seed `s` gives sub-ensemble `i` the seed `s + i`.
    pub fn new(
        builder: &mut ModelBuilder,
        label: impl Into<String>,
        n_neurons: usize,
        n_ensembles: usize,
        dims_per_ensemble: usize,
        template: EnsembleConfig,
    ) -> Result<Self> {
        let label = label.into();
        if n_ensembles == 0 || dims_per_ensemble == 0 || n_neurons < n_ensembles {
            return Err(EngineError::InvalidEnsemble {
                ensemble: label,
                reason: format!(
                    "cannot split {} neurons into {} ensembles of {} dimensions",
                    n_neurons, n_ensembles, dims_per_ensemble
                ),
            });
        }

        let base = n_neurons / n_ensembles;
        let extra = n_neurons % n_ensembles;
        let ensembles = (0..n_ensembles)
            .map(|i| {
                let mut config = template.clone();
                config.n_neurons = base + usize::from(i < extra);
                config.dimensions = dims_per_ensemble;
                config.label = Some(format!("{}[{}]", label, i));
                config.seed = template.seed.map(|s| s.wrapping_add(i as u64));
                builder.add_ensemble(config)
            })
            .collect();

        Ok(Self {
            label,
            ensembles,
            dims_per_ensemble,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn ensembles(&self) -> &[EnsembleId] {
        &self.ensembles
    }

    pub fn n_ensembles(&self) -> usize {
        self.ensembles.len()
    }

    pub fn dims_per_ensemble(&self) -> usize {
        self.dims_per_ensemble
    }

    /// Total represented dimensions
    pub fn dimensions(&self) -> usize {
        self.ensembles.len() * self.dims_per_ensemble
    }

    /// Connect a full-width source (node or ensemble) into the array
    pub fn connect_from(
        &self,
        builder: &mut ModelBuilder,
        source: impl Into<ConnectionSource>,
        transform: impl Into<Transform>,
        synapse: impl Into<Synapse>,
    ) -> Result<Vec<ConnectionId>> {
        let source = source.into();
        let synapse = synapse.into();
        let full = self.full_matrix(transform.into(), self.dimensions())?;
        let d = self.dims_per_ensemble;

        let mut ids = Vec::with_capacity(self.ensembles.len());
        for (i, &ens) in self.ensembles.iter().enumerate() {
            let block = full.slice(s![i * d..(i + 1) * d, ..]).to_owned();
            if block.iter().all(|&w| w == 0.0) {
                continue;
            }
            ids.push(
                builder.connect(
                    ConnectionConfig::new(source, ens)
                        .transform(block)
                        .synapse(synapse)
                        .label(format!("{}<-in[{}]", self.label, i)),
                ),
            );
        }
        Ok(ids)
    }

    /// Connect every block of this array to every block of `other`.
    ///
    /// The source vector is the concatenation of each sub-ensemble's decoded
    /// output (or `function` of it); `transform` maps it onto `other`.
    pub fn connect_to(
        &self,
        builder: &mut ModelBuilder,
        other: &EnsembleArray,
        transform: impl Into<Transform>,
        function: Option<ConnectionFunction>,
        synapse: impl Into<Synapse>,
    ) -> Result<Vec<ConnectionId>> {
        let synapse = synapse.into();
        let m = function
            .as_ref()
            .map_or(self.dims_per_ensemble, |f| f.size_out());
        let src_width = m * self.ensembles.len();
        let full = other.full_matrix(transform.into(), src_width)?;
        if full.ncols() != src_width {
            return Err(EngineError::DimensionMismatch {
                connection: format!("{}->{}", self.label, other.label),
                what: "ensemble array transform input",
                expected: src_width,
                actual: full.ncols(),
            });
        }

        let d = other.dims_per_ensemble;
        let mut ids = Vec::new();
        for (i, &post) in other.ensembles.iter().enumerate() {
            for (j, &pre) in self.ensembles.iter().enumerate() {
                let block = full
                    .slice(s![i * d..(i + 1) * d, j * m..(j + 1) * m])
                    .to_owned();
                if block.iter().all(|&w| w == 0.0) {
                    continue;
                }
                let mut config = ConnectionConfig::new(pre, post)
                    .transform(block)
                    .synapse(synapse)
                    .label(format!("{}[{}]->{}[{}]", self.label, j, other.label, i));
                if let Some(f) = &function {
                    config = config.function(f.clone());
                }
                ids.push(builder.connect(config));
            }
        }
        Ok(ids)
    }

    /// One decoded-output probe per sub-ensemble, in block order
    pub fn probe(
        &self,
        builder: &mut ModelBuilder,
        synapse: impl Into<Synapse>,
        sample_every: Option<f64>,
    ) -> Vec<ProbeId> {
        let synapse = synapse.into();
        self.ensembles
            .iter()
            .enumerate()
            .map(|(i, &ens)| {
                let mut config = ProbeConfig::new(ens)
                    .synapse(synapse)
                    .label(format!("{}[{}].decoded", self.label, i));
                config.sample_every = sample_every;
                builder.probe(config)
            })
            .collect()
    }

    /// Expand a transform to an explicit `dimensions() x width` matrix
    fn full_matrix(&self, transform: Transform, width: usize) -> Result<Array2<f64>> {
        let rows = self.dimensions();
        let matrix = match transform {
            Transform::Identity => Array2::eye(width),
            Transform::Scalar(w) => Array2::eye(width) * w,
            Transform::Matrix(m) => m,
        };
        if matrix.nrows() != rows {
            return Err(EngineError::DimensionMismatch {
                connection: format!("into {}", self.label),
                what: "ensemble array transform output",
                expected: rows,
                actual: matrix.nrows(),
            });
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neuron_partitioning() {
        let mut builder = ModelBuilder::new();
        let even =
            EnsembleArray::new(&mut builder, "even", 10, 5, 1, EnsembleConfig::new(1, 1)).unwrap();
        for &id in even.ensembles() {
            assert_eq!(builder.ensemble_config(id).unwrap().n_neurons, 2);
        }

        let odd =
            EnsembleArray::new(&mut builder, "odd", 19, 4, 2, EnsembleConfig::new(1, 1)).unwrap();
        let mut sizes: Vec<usize> = odd
            .ensembles()
            .iter()
            .map(|&id| builder.ensemble_config(id).unwrap().n_neurons)
            .collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![4, 5, 5, 5]);
        assert_eq!(odd.dimensions(), 8);
        assert_eq!(builder.ensemble_by_name("odd[3]"), Some(odd.ensembles()[3]));
    }

    #[test]
    fn test_too_few_neurons_rejected() {
        let mut builder = ModelBuilder::new();
        assert!(EnsembleArray::new(&mut builder, "a", 2, 3, 1, EnsembleConfig::new(1, 1)).is_err());
    }

    #[test]
    fn test_zero_blocks_skipped() {
        let mut builder = ModelBuilder::new();
        let a = EnsembleArray::new(&mut builder, "a", 60, 3, 1, EnsembleConfig::new(1, 1)).unwrap();
        let b = EnsembleArray::new(&mut builder, "b", 60, 3, 1, EnsembleConfig::new(1, 1)).unwrap();
        // Permutation: only 3 of the 9 blocks are non-zero
        let perm = ndarray::array![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
        let ids = a.connect_to(&mut builder, &b, perm, None, 0.005).unwrap();
        assert_eq!(ids.len(), 3);

        let identity = a.connect_to(&mut builder, &b, Transform::Identity, None, 0.005).unwrap();
        assert_eq!(identity.len(), 3);
    }

    #[test]
    fn test_transform_shape_checked() {
        let mut builder = ModelBuilder::new();
        let a = EnsembleArray::new(&mut builder, "a", 20, 2, 1, EnsembleConfig::new(1, 1)).unwrap();
        let b = EnsembleArray::new(&mut builder, "b", 30, 3, 1, EnsembleConfig::new(1, 1)).unwrap();
        // Identity 2 -> 3 cannot work
        assert!(a.connect_to(&mut builder, &b, Transform::Identity, None, 0.005).is_err());
    }
}
