// FlowLink - Pulse flow telemetry over LoRa
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fixed-capacity statistics window.
//!
//! The buffer is allocated once at construction and never grows. A push into
//! a full window is refused instead of overwriting samples already counted
//! for the epoch.

use crate::codec::StatisticsRecord;
use crate::error::WindowError;
use crate::sampler::FlowSample;

/// Per-epoch accumulator of flow-rate samples.
#[derive(Debug, Clone)]
pub struct StatisticsWindow {
    /// Sample storage; entries at or beyond `count` are stale.
    rates: Box<[f32]>,
    /// Next write position.
    cursor: usize,
    /// Valid entries, saturating at capacity.
    count: usize,
}

impl StatisticsWindow {
    /// Create an empty window holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            rates: vec![0.0; capacity].into_boxed_slice(),
            cursor: 0,
            count: 0,
        }
    }

    /// Append a sample's rate.
    pub fn push(&mut self, sample: FlowSample) -> Result<(), WindowError> {
        let capacity = self.capacity();
        if self.count >= capacity {
            return Err(WindowError::Full { capacity });
        }

        self.rates[self.cursor] = sample.rate;
        self.cursor = (self.cursor + 1) % capacity;
        self.count += 1;
        Ok(())
    }

    /// Maximum number of samples per epoch
    pub fn capacity(&self) -> usize {
        self.rates.len()
    }

    /// Samples collected so far this epoch
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when no sample has been pushed since the last reset
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Valid samples of the current epoch.
    pub fn samples(&self) -> &[f32] {
        &self.rates[..self.count]
    }

    /// Population mean and standard deviation of the current epoch.
    pub fn summary(&self) -> Option<(f32, f32)> {
        let samples = self.samples();
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().map(|&x| x as f64).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|&x| {
                let diff = x as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;

        Some((mean as f32, variance.sqrt() as f32))
    }

    /// Close the epoch.
    ///
    /// Returns `None` when no samples were pushed; that epoch must not be
    /// transmitted. The window is empty afterwards in both cases.
    pub fn build_and_reset(&mut self, end_timestamp_ms: u32) -> Option<StatisticsRecord> {
        let record = self
            .summary()
            .map(|(mean, stddev)| StatisticsRecord::new(end_timestamp_ms, mean, stddev));
        self.clear();
        record
    }

    /// Discard every sample without building a record
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.count = 0;
    }
}
