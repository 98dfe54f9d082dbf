//! Instantaneous flow rate from a drained pulse count
//!
//! One [`FlowSample`] per sampling tick. With pulses in the tick the rate is
//! `pulses / calibration * ticks_per_minute`. Without pulses the previous
//! rate is held until the stall timeout passes, so a sparse pulse train at
//! low flow does not flicker to zero between pulses.

use crate::config::NodeConfig;
use crate::pulse::PulseDrain;

/// Flow rate captured at one sampling tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSample {
    /// Volume units per minute
    pub rate: f32,
    /// Tick timestamp (ms)
    pub captured_at_ms: u32,
}

/// Converts per-tick pulse counts into flow rate
#[derive(Debug, Clone)]
pub struct FlowSampler {
    calibration_factor: f32,
    ticks_per_minute: f32,
    flow_timeout_ms: u32,
    rate: f32,
    total_volume: f64,
}

impl FlowSampler {
    /// Create a sampler with zero rate and zero accumulated volume
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            calibration_factor: config.calibration_factor,
            ticks_per_minute: config.ticks_per_minute(),
            flow_timeout_ms: config.flow_timeout_ms,
            rate: 0.0,
            total_volume: 0.0,
        }
    }

    /// Turn one tick's drain into a sample
    pub fn sample(&mut self, drain: PulseDrain, captured_at_ms: u32) -> FlowSample {
        if drain.count > 0 {
            let volume = drain.count as f32 / self.calibration_factor;
            self.rate = volume * self.ticks_per_minute;
            self.total_volume += volume as f64;
        } else if drain.since_last_edge_ms > self.flow_timeout_ms {
            self.rate = 0.0;
        }

        FlowSample {
            rate: self.rate,
            captured_at_ms,
        }
    }

    /// Rate reported by the most recent tick
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Volume measured since start, in calibration units
    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    /// True while a non-zero rate is being reported
    pub fn is_flowing(&self) -> bool {
        self.rate > 0.0
    }
}
