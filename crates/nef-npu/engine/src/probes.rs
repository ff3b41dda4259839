// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Probe Recorder
//!
//! A probe filters its tapped signal every step (so the filter sees the full
//! signal even when sampling is sparse) and stores a sample on steps whose
//! index is a multiple of its period.

use crate::error::{EngineError, Result};
use nef_npu_neural::{LowpassFilter, Synapse};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Recorded time series of one probe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeData {
    /// Simulated time of each sample (seconds)
    pub time: Vec<f64>,
    /// Step index of each sample
    pub steps: Vec<u64>,
    /// One vector per sample
    pub samples: Vec<Vec<f64>>,
    pub dimensions: usize,
}

impl ProbeData {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&[f64]> {
        self.samples.last().map(Vec::as_slice)
    }

    /// Samples as a (len x dimensions) matrix
    pub fn as_array(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.len(), self.dimensions));
        for (mut row, sample) in out.rows_mut().into_iter().zip(&self.samples) {
            for (dst, v) in row.iter_mut().zip(sample) {
                *dst = *v;
            }
        }
        out
    }

    /// One dimension over time
    pub fn column(&self, dimension: usize) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.get(dimension).copied().unwrap_or(f64::NAN))
            .collect()
    }

    /// Side-by-side concatenation of probes sampled on the same steps
    pub fn concat(parts: &[&ProbeData]) -> Result<ProbeData> {
        let Some(first) = parts.first() else {
            return Ok(ProbeData::default());
        };
        if parts.iter().any(|p| p.steps != first.steps) {
            return Err(EngineError::InvalidProbe {
                probe: "concatenation".to_string(),
                reason: "probes were not sampled on the same steps".to_string(),
            });
        }
        let dimensions = parts.iter().map(|p| p.dimensions).sum();
        let samples = (0..first.len())
            .map(|i| {
                parts
                    .iter()
                    .flat_map(|p| p.samples[i].iter().copied())
                    .collect()
            })
            .collect();
        Ok(ProbeData {
            time: first.time.clone(),
            steps: first.steps.clone(),
            samples,
            dimensions,
        })
    }

    fn clear(&mut self) {
        self.time.clear();
        self.steps.clear();
        self.samples.clear();
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProbeRecorder {
    period: u64,
    filter: LowpassFilter,
    data: ProbeData,
}

impl ProbeRecorder {
    pub(crate) fn new(synapse: Synapse, period: u64, dt: f64, size: usize) -> Self {
        Self {
            period: period.max(1),
            filter: synapse.build_filter(dt, size),
            data: ProbeData::new(size),
        }
    }

    /// Feed this step's signal; store it when the step falls on the period
    pub(crate) fn observe(&mut self, step: u64, t: f64, signal: &[f64]) {
        let filtered = self.filter.step(signal);
        if step % self.period == 0 {
            self.data.time.push(t);
            self.data.steps.push(step);
            self.data.samples.push(filtered.to_vec());
        }
    }

    pub(crate) fn data(&self) -> &ProbeData {
        &self.data
    }

    pub(crate) fn reset(&mut self) {
        self.filter.reset();
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_and_filtering() {
        let mut recorder = ProbeRecorder::new(Synapse::lowpass(0.01), 3, 0.001, 1);
        for step in 0..10 {
            recorder.observe(step, step as f64 * 0.001, &[1.0]);
        }
        let data = recorder.data();
        assert_eq!(data.steps, vec![0, 3, 6, 9]);
        assert_eq!(data.len(), 4);
        // Filtered signal keeps rising between stored samples
        let values = data.column(0);
        assert!(values.windows(2).all(|w| w[1] > w[0]));
        assert!(values[3] < 1.0);
    }

    #[test]
    fn test_concat_side_by_side() {
        let mut a = ProbeRecorder::new(Synapse::None, 1, 0.001, 1);
        let mut b = ProbeRecorder::new(Synapse::None, 1, 0.001, 2);
        for step in 0..3 {
            a.observe(step, 0.0, &[1.0]);
            b.observe(step, 0.0, &[2.0, 3.0]);
        }
        let joined = ProbeData::concat(&[a.data(), b.data()]).unwrap();
        assert_eq!(joined.dimensions, 3);
        assert_eq!(joined.samples[2], vec![1.0, 2.0, 3.0]);
        assert_eq!(joined.as_array().dim(), (3, 3));
    }

    #[test]
    fn test_data_serializes() {
        let mut recorder = ProbeRecorder::new(Synapse::None, 1, 0.001, 2);
        recorder.observe(0, 0.0, &[0.5, -0.5]);
        let json = serde_json::to_string(recorder.data()).unwrap();
        let back: ProbeData = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, recorder.data());
    }

    #[test]
    fn test_concat_rejects_misaligned() {
        let mut a = ProbeRecorder::new(Synapse::None, 1, 0.001, 1);
        let mut b = ProbeRecorder::new(Synapse::None, 2, 0.001, 1);
        for step in 0..4 {
            a.observe(step, 0.0, &[0.0]);
            b.observe(step, 0.0, &[0.0]);
        }
        assert!(ProbeData::concat(&[a.data(), b.data()]).is_err());
    }
}
