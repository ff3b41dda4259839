// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Tuning Parameter Generator
//!
//! Assigns every neuron of a population an encoder, gain and bias from the
//! population's declared distributions. A neuron with encoder `e`, gain `a`
//! and bias `b` receives
//!
//! ```text
//! J = a * (e . x / radius) + b
//! ```
//!
//! and is tuned so that `J` reaches threshold when `e . x = intercept * radius`
//! and the model fires at `max_rate` when `e . x = radius`.

use crate::models::NeuronModel;
use crate::types::rng::unit_vector;
use crate::types::{Distribution, NeuralError, Result};
use ndarray::{Array2, ArrayView2, Axis};
use rand::Rng;

/// How encoders are chosen
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EncoderSpec {
    /// Random unit vectors, uniform on the D-sphere
    #[default]
    UniformHypersphere,
    /// Explicit N x D matrix; rows are normalized to unit length
    Explicit(Array2<f64>),
}

/// Declared (pre-build) description of a population's tuning
#[derive(Debug, Clone, PartialEq)]
pub struct TuningSpec {
    pub n_neurons: usize,
    pub dimensions: usize,
    pub radius: f64,
    pub encoders: EncoderSpec,
    pub intercepts: Distribution,
    pub max_rates: Distribution,
}

impl TuningSpec {
    pub fn new(n_neurons: usize, dimensions: usize) -> Self {
        Self {
            n_neurons,
            dimensions,
            radius: 1.0,
            encoders: EncoderSpec::UniformHypersphere,
            intercepts: Distribution::uniform(-1.0, 0.9),
            max_rates: Distribution::uniform(200.0, 400.0),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_neurons == 0 {
            return Err(NeuralError::InvalidParameters(
                "a population needs at least one neuron".to_string(),
            ));
        }
        if self.dimensions == 0 {
            return Err(NeuralError::InvalidParameters(
                "a population needs at least one dimension".to_string(),
            ));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(NeuralError::InvalidParameters(format!(
                "radius must be finite and > 0, got {}",
                self.radius
            )));
        }
        if let EncoderSpec::Explicit(encoders) = &self.encoders {
            let expected = (self.n_neurons, self.dimensions);
            if encoders.dim() != expected {
                return Err(NeuralError::ShapeMismatch {
                    what: "encoders",
                    expected: format!("{:?}", expected),
                    actual: format!("{:?}", encoders.dim()),
                });
            }
        }
        self.intercepts.validate()?;
        self.max_rates.validate()?;
        Ok(())
    }
}

/// Fixed per-neuron parameters of a built population
#[derive(Debug, Clone, PartialEq)]
pub struct TuningParameters {
    /// Unit encoders, N x D
    pub encoders: Array2<f64>,
    pub gains: Vec<f64>,
    pub biases: Vec<f64>,
    pub intercepts: Vec<f64>,
    pub max_rates: Vec<f64>,
    pub radius: f64,
}

impl TuningParameters {
    /// Draw encoders, intercepts and max rates, then invert the model's rate
    /// curve for gains and biases.
    ///
    /// Draw order is fixed (encoders, intercepts, max rates) so a given RNG
    /// state always yields the same population.
    pub fn generate<M, R>(spec: &TuningSpec, model: &M, rng: &mut R) -> Result<Self>
    where
        M: NeuronModel + ?Sized,
        R: Rng + ?Sized,
    {
        spec.validate()?;
        let n = spec.n_neurons;
        let d = spec.dimensions;

        let encoders = match &spec.encoders {
            EncoderSpec::UniformHypersphere => {
                let mut encoders = Array2::zeros((n, d));
                for mut row in encoders.axis_iter_mut(Axis(0)) {
                    for (dst, v) in row.iter_mut().zip(unit_vector(rng, d)) {
                        *dst = v;
                    }
                }
                encoders
            }
            EncoderSpec::Explicit(explicit) => normalize_rows(explicit.view())?,
        };

        let intercepts = spec.intercepts.sample(n, rng)?;
        let max_rates = spec.max_rates.sample(n, rng)?;
        let (gains, biases) = model.gain_bias(&max_rates, &intercepts)?;

        Ok(Self {
            encoders,
            gains,
            biases,
            intercepts,
            max_rates,
            radius: spec.radius,
        })
    }

    pub fn n_neurons(&self) -> usize {
        self.encoders.nrows()
    }

    pub fn dimensions(&self) -> usize {
        self.encoders.ncols()
    }

    /// Input currents for one represented vector `x` (length D)
    pub fn currents(&self, x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(x.len(), self.dimensions());
        debug_assert_eq!(out.len(), self.n_neurons());
        let inv_radius = 1.0 / self.radius;
        for (i, row) in self.encoders.axis_iter(Axis(0)).enumerate() {
            let drive: f64 = row.iter().zip(x).map(|(e, xi)| e * xi).sum::<f64>() * inv_radius;
            out[i] = self.gains[i] * drive + self.biases[i];
        }
    }

    /// Steady-state activity matrix A (P x N) for evaluation points (P x D)
    pub fn activities<M: NeuronModel + ?Sized>(
        &self,
        model: &M,
        points: ArrayView2<'_, f64>,
    ) -> Array2<f64> {
        let mut drive = points.dot(&self.encoders.t());
        drive.mapv_inplace(|v| v / self.radius);
        for mut row in drive.axis_iter_mut(Axis(0)) {
            for (i, v) in row.iter_mut().enumerate() {
                *v = model.rate(self.gains[i] * *v + self.biases[i]);
            }
        }
        drive
    }
}

fn normalize_rows(encoders: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let mut out = encoders.to_owned();
    for (i, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if !(norm.is_finite() && norm > 0.0) {
            return Err(NeuralError::InvalidParameters(format!(
                "encoder row {} has zero or non-finite length",
                i
            )));
        }
        row.mapv_inplace(|v| v / norm);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LifModel;
    use crate::types::seeded_rng;
    use ndarray::array;

    #[test]
    fn test_generated_population_shapes() {
        let spec = TuningSpec::new(40, 3);
        let tuning =
            TuningParameters::generate(&spec, &LifModel::default(), &mut seeded_rng(1)).unwrap();
        assert_eq!(tuning.encoders.dim(), (40, 3));
        assert_eq!(tuning.gains.len(), 40);
        assert_eq!(tuning.biases.len(), 40);
        for row in tuning.encoders.axis_iter(Axis(0)) {
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_same_seed_same_population() {
        let spec = TuningSpec::new(25, 2);
        let model = LifModel::default();
        let a = TuningParameters::generate(&spec, &model, &mut seeded_rng(9)).unwrap();
        let b = TuningParameters::generate(&spec, &model, &mut seeded_rng(9)).unwrap();
        let c = TuningParameters::generate(&spec, &model, &mut seeded_rng(10)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.encoders, c.encoders);
    }

    #[test]
    fn test_operating_points_respect_radius() {
        let mut spec = TuningSpec::new(10, 1);
        spec.radius = 2.5;
        spec.encoders = EncoderSpec::Explicit(Array2::from_elem((10, 1), 1.0));
        let model = LifModel::default();
        let tuning = TuningParameters::generate(&spec, &model, &mut seeded_rng(4)).unwrap();

        let mut currents = vec![0.0; 10];
        tuning.currents(&[2.5], &mut currents);
        for i in 0..10 {
            let rate = model.rate(currents[i]);
            assert!((rate - tuning.max_rates[i]).abs() < 1e-6 * tuning.max_rates[i]);
        }
        for i in 0..10 {
            tuning.currents(&[tuning.intercepts[i] * 2.5], &mut currents);
            assert!((currents[i] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_explicit_encoders_normalized() {
        let mut spec = TuningSpec::new(2, 2);
        spec.encoders = EncoderSpec::Explicit(array![[3.0, 4.0], [0.0, -2.0]]);
        let tuning =
            TuningParameters::generate(&spec, &LifModel::default(), &mut seeded_rng(0)).unwrap();
        assert!((tuning.encoders[[0, 0]] - 0.6).abs() < 1e-12);
        assert!((tuning.encoders[[0, 1]] - 0.8).abs() < 1e-12);
        assert!((tuning.encoders[[1, 1]] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_encoder_shape_checked() {
        let mut spec = TuningSpec::new(3, 2);
        spec.encoders = EncoderSpec::Explicit(Array2::ones((2, 2)));
        let err = TuningParameters::generate(&spec, &LifModel::default(), &mut seeded_rng(0))
            .unwrap_err();
        assert!(matches!(err, NeuralError::ShapeMismatch { what: "encoders", .. }));
    }

    #[test]
    fn test_zero_encoder_row_rejected() {
        let mut spec = TuningSpec::new(2, 2);
        spec.encoders = EncoderSpec::Explicit(array![[1.0, 0.0], [0.0, 0.0]]);
        assert!(TuningParameters::generate(&spec, &LifModel::default(), &mut seeded_rng(0)).is_err());
    }

    #[test]
    fn test_empty_population_rejected() {
        let model = LifModel::default();
        assert!(TuningParameters::generate(&TuningSpec::new(0, 1), &model, &mut seeded_rng(0)).is_err());
        assert!(TuningParameters::generate(&TuningSpec::new(5, 0), &model, &mut seeded_rng(0)).is_err());
    }

    #[test]
    fn test_unreachable_rate_surfaces() {
        let mut spec = TuningSpec::new(4, 1);
        spec.max_rates = Distribution::Constant(1000.0);
        let err = TuningParameters::generate(&spec, &LifModel::default(), &mut seeded_rng(0))
            .unwrap_err();
        assert!(matches!(err, NeuralError::UnreachableMaxRate { .. }));
    }

    #[test]
    fn test_activities_match_pointwise_rates() {
        let spec = TuningSpec::new(8, 2);
        let model = LifModel::default();
        let tuning = TuningParameters::generate(&spec, &model, &mut seeded_rng(2)).unwrap();
        let points = array![[0.1, -0.3], [0.7, 0.2]];
        let a = tuning.activities(&model, points.view());
        assert_eq!(a.dim(), (2, 8));
        let mut currents = vec![0.0; 8];
        for p in 0..2 {
            tuning.currents(&[points[[p, 0]], points[[p, 1]]], &mut currents);
            for i in 0..8 {
                assert!((a[[p, i]] - model.rate(currents[i])).abs() < 1e-9);
            }
        }
    }
}
