// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Input and routing helpers: piecewise-constant signals, band-limited noise,
//! and sparse routing transforms.

use crate::error::{EngineError, Result};
use crate::objects::TimeFn;
use nef_npu_neural::seeded_rng;
use ndarray::Array2;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

/// Slack for `key <= t` so keys land on the step they name despite rounding
const KEY_SLACK: f64 = 1e-9;

/// Value held by one piecewise segment: a constant vector or a function of time
#[derive(Clone)]
pub enum Segment {
    Constant(Vec<f64>),
    Function(TimeFn),
}

impl Segment {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(f64) -> Vec<f64> + Send + Sync + 'static,
    {
        Segment::Function(Arc::new(f))
    }

    /// Output length; functions are sized by their value at `t = 0`
    fn len(&self) -> usize {
        match self {
            Segment::Constant(value) => value.len(),
            Segment::Function(f) => f(0.0).len(),
        }
    }

    fn value(&self, t: f64) -> Vec<f64> {
        match self {
            Segment::Constant(value) => value.clone(),
            Segment::Function(f) => f(t),
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Segment::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<Vec<f64>> for Segment {
    fn from(value: Vec<f64>) -> Self {
        Segment::Constant(value)
    }
}

impl From<f64> for Segment {
    fn from(value: f64) -> Self {
        Segment::Constant(vec![value])
    }
}

impl From<TimeFn> for Segment {
    fn from(f: TimeFn) -> Self {
        Segment::Function(f)
    }
}

/// Piecewise vector function of time.
///
/// Each `(time, segment)` pair starts a segment that holds a constant or
/// follows a function of `t`; the output is zeros before the first key. Keys
/// may be given in any order. All segments must share one length.
///
/// ```ignore
/// let f = piecewise(&[(0.2, vec![1.0]), (0.3, vec![0.0])])?;
/// assert_eq!(f(0.25), vec![1.0]);
///
/// let g = piecewise(&[(0.0, Segment::function(|t| vec![t.sin()])), (0.5, Segment::from(0.0))])?;
/// ```
pub fn piecewise<S>(data: &[(f64, S)]) -> Result<TimeFn>
where
    S: Clone + Into<Segment>,
{
    let segments: Vec<(f64, Segment)> = data
        .iter()
        .map(|(time, segment)| (*time, segment.clone().into()))
        .collect();
    let Some((_, first)) = segments.first() else {
        return Err(EngineError::InvalidConfig(
            "piecewise needs at least one (time, value) pair".to_string(),
        ));
    };
    let length = first.len();
    if length == 0 {
        return Err(EngineError::InvalidConfig(
            "piecewise values must have at least one dimension".to_string(),
        ));
    }
    for (time, segment) in &segments {
        if !time.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "piecewise key {} is not a finite time",
                time
            )));
        }
        let actual = segment.len();
        if actual != length {
            return Err(EngineError::InvalidConfig(format!(
                "piecewise value at t={} has {} items instead of {}",
                time, actual, length
            )));
        }
    }

    let mut ordered = segments;
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
    let zeros = vec![0.0; length];

    Ok(Arc::new(move |t: f64| {
        ordered
            .iter()
            .take_while(|(key, _)| *key <= t + KEY_SLACK)
            .last()
            .map_or_else(|| zeros.clone(), |(_, segment)| segment.value(t))
    }))
}

/// Seeded band-limited noise: a sum of sinusoids at multiples of `step_hz` up
/// to `high_hz`, with amplitudes uniform in `[0, 1)` and uniform phases, scaled so every
/// dimension has the requested RMS.
pub fn white_noise(
    step_hz: f64,
    high_hz: f64,
    rms: f64,
    seed: u64,
    dimensions: usize,
) -> Result<TimeFn> {
    if !(step_hz.is_finite() && step_hz > 0.0 && high_hz.is_finite() && high_hz >= step_hz) {
        return Err(EngineError::InvalidConfig(format!(
            "white noise needs 0 < step ({}) <= high ({})",
            step_hz, high_hz
        )));
    }
    if !(rms.is_finite() && rms >= 0.0) || dimensions == 0 {
        return Err(EngineError::InvalidConfig(format!(
            "white noise needs rms >= 0 and at least one dimension (rms {}, {} dims)",
            rms, dimensions
        )));
    }

    let n_freqs = (high_hz / step_hz + KEY_SLACK).floor() as usize;
    let mut rng = seeded_rng(seed);
    // (angular frequency, amplitude, phase) per component, per dimension
    let components: Vec<Vec<(f64, f64, f64)>> = (0..dimensions)
        .map(|_| {
            let raw: Vec<(f64, f64, f64)> = (1..=n_freqs)
                .map(|k| {
                    let omega = 2.0 * core::f64::consts::PI * step_hz * k as f64;
                    let amplitude = rng.gen::<f64>();
                    let phase = 2.0 * core::f64::consts::PI * rng.gen::<f64>();
                    (omega, amplitude, phase)
                })
                .collect();
            // RMS of a sum of sinusoids at distinct frequencies
            let power: f64 = raw.iter().map(|(_, a, _)| a * a / 2.0).sum();
            let scale = if power > 0.0 { rms / power.sqrt() } else { 0.0 };
            raw.into_iter()
                .map(|(omega, a, phase)| (omega, a * scale, phase))
                .collect()
        })
        .collect();

    Ok(Arc::new(move |t: f64| {
        components
            .iter()
            .map(|dim| {
                dim.iter()
                    .map(|(omega, a, phase)| a * (omega * t + phase).sin())
                    .sum()
            })
            .collect()
    }))
}

/// `post_dims x pre_dims` routing matrix with `weight` at
/// `[index_post[i], index_pre[i]]`. Missing index lists default to
/// `0..dims`; pairs beyond the shorter list are ignored.
pub fn transform(
    pre_dims: usize,
    post_dims: usize,
    weight: f64,
    index_pre: Option<&[usize]>,
    index_post: Option<&[usize]>,
) -> Result<Array2<f64>> {
    let all_pre: Vec<usize> = (0..pre_dims).collect();
    let all_post: Vec<usize> = (0..post_dims).collect();
    let index_pre = index_pre.unwrap_or(&all_pre);
    let index_post = index_post.unwrap_or(&all_post);

    let mut matrix = Array2::zeros((post_dims, pre_dims));
    for (&pre, &post) in index_pre.iter().zip(index_post) {
        if pre >= pre_dims || post >= post_dims {
            return Err(EngineError::InvalidConfig(format!(
                "transform index ({} -> {}) outside {} x {}",
                pre, post, pre_dims, post_dims
            )));
        }
        matrix[[post, pre]] = weight;
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_piecewise_segments() {
        let f = piecewise(&[(0.75, vec![-1.0]), (0.5, vec![1.0]), (1.0, vec![0.0])]).unwrap();
        assert_eq!(f(0.2), vec![0.0]);
        assert_eq!(f(0.5), vec![1.0]);
        assert_eq!(f(0.58), vec![1.0]);
        assert_eq!(f(0.8), vec![-1.0]);
        assert_eq!(f(100.0), vec![0.0]);
    }

    #[test]
    fn test_piecewise_key_on_step_boundary() {
        let f = piecewise(&[(0.0, vec![0.0]), (0.2, vec![1.0])]).unwrap();
        assert_eq!(f(200.0 * 0.001), vec![1.0]);
        assert_eq!(f(199.0 * 0.001), vec![0.0]);
    }

    #[test]
    fn test_piecewise_lengths_checked() {
        assert!(piecewise(&[(0.0, vec![1.0, 0.0]), (0.5, vec![1.0])]).is_err());
        assert!(piecewise::<Vec<f64>>(&[]).is_err());
    }

    #[test]
    fn test_piecewise_function_segments() {
        let f = piecewise(&[
            (0.0, Segment::function(|t: f64| vec![t.sin()])),
            (0.5, Segment::function(|t: f64| vec![t.cos()])),
        ])
        .unwrap();
        assert!((f(0.499)[0] - 0.499_f64.sin()).abs() < 1e-12);
        assert!((f(0.5)[0] - 0.5_f64.cos()).abs() < 1e-12);
        assert_eq!(f(-1.0), vec![0.0]);
    }

    #[test]
    fn test_piecewise_mixes_constants_and_functions() {
        let f = piecewise(&[
            (0.0, Segment::from(vec![1.0, 2.0])),
            (1.0, Segment::function(|t: f64| vec![t, -t])),
        ])
        .unwrap();
        assert_eq!(f(0.5), vec![1.0, 2.0]);
        assert_eq!(f(2.0), vec![2.0, -2.0]);
    }

    #[test]
    fn test_piecewise_function_length_checked_at_zero() {
        let err = piecewise(&[
            (0.0, Segment::from(0.0)),
            (0.5, Segment::function(|t: f64| vec![t, t])),
        ])
        .err().unwrap();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_white_noise_uses_uniform_amplitudes() {
        // Rebuild the signal from the same stream: (amplitude, phase) per component
        let mut rng = seeded_rng(9);
        let draws: Vec<(f64, f64)> = (0..3).map(|_| (rng.gen::<f64>(), rng.gen::<f64>())).collect();
        let power: f64 = draws.iter().map(|(a, _)| a * a / 2.0).sum();
        let scale = 0.3 / power.sqrt();
        let expected = |t: f64| -> f64 {
            draws
                .iter()
                .enumerate()
                .map(|(k, (a, p))| {
                    let omega = 2.0 * core::f64::consts::PI * 2.0 * (k + 1) as f64;
                    a * scale * (omega * t + 2.0 * core::f64::consts::PI * p).sin()
                })
                .sum()
        };

        let f = white_noise(2.0, 6.0, 0.3, 9, 1).unwrap();
        for t in [0.0, 0.037, 0.25, 0.9] {
            assert!((f(t)[0] - expected(t)).abs() < 1e-12, "t={}", t);
        }
    }

    #[test]
    fn test_white_noise_rms_and_determinism() {
        let f = white_noise(1.0, 20.0, 0.5, 3, 2).unwrap();
        let g = white_noise(1.0, 20.0, 0.5, 3, 2).unwrap();
        assert_eq!(f(0.123), g(0.123));

        // One full period of the lowest component
        let samples: Vec<Vec<f64>> = (0..10_000).map(|i| f(i as f64 * 1e-4)).collect();
        for d in 0..2 {
            let rms = (samples.iter().map(|s| s[d] * s[d]).sum::<f64>() / 10_000.0).sqrt();
            assert!((rms - 0.5).abs() < 0.01, "dim {} rms={}", d, rms);
        }
    }

    #[test]
    fn test_transform_routing() {
        let t = transform(2, 3, 1.0, Some(&[0, 1]), Some(&[0, 1])).unwrap();
        assert_eq!(t, array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]);

        let t = transform(3, 1, 0.5, Some(&[2]), Some(&[0])).unwrap();
        assert_eq!(t, array![[0.0, 0.0, 0.5]]);

        assert!(transform(2, 2, 1.0, Some(&[5]), None).is_err());
    }
}
