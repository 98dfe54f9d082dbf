//! Node configuration
//!
//! All tunables are startup constants. The defaults reproduce the deployed
//! flowmeter: a 10 ms debounce floor, 50 ms sampling ticks, 1 s epochs and a
//! YF-S201 style sensor at 7.5 pulses per litre.

use crate::error::ConfigError;
use crate::recovery::RetryStrategy;
use std::time::Duration;

/// Minimum spacing between two accepted edges (ms)
pub const DEFAULT_DEBOUNCE_FLOOR_MS: u32 = 10;
/// Sampling tick interval (ms)
pub const DEFAULT_TICK_INTERVAL_MS: u32 = 50;
/// No pulses for longer than this means the flow has stopped (ms)
pub const DEFAULT_FLOW_TIMEOUT_MS: u32 = 3000;
/// Statistics epoch length (ms)
pub const DEFAULT_EPOCH_MS: u32 = 1000;
/// Statistics window capacity (samples)
pub const DEFAULT_WINDOW_CAPACITY: usize = 200;
/// Pulses per volume unit
pub const DEFAULT_CALIBRATION_FACTOR: f32 = 7.5;
/// Delay between radio initialisation attempts at startup
pub const DEFAULT_LINK_INIT_DELAY: Duration = Duration::from_millis(500);

/// Sender node configuration
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Debounce floor in milliseconds
    pub debounce_floor_ms: u32,
    /// Sampling tick interval in milliseconds
    pub tick_interval_ms: u32,
    /// Stall timeout in milliseconds
    pub flow_timeout_ms: u32,
    /// Epoch length in milliseconds
    pub epoch_ms: u32,
    /// Number of samples the statistics window holds
    pub window_capacity: usize,
    /// Sensor pulses per volume unit
    pub calibration_factor: f32,
    /// Retry policy for radio initialisation at startup
    pub link_init_retry: RetryStrategy,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            debounce_floor_ms: DEFAULT_DEBOUNCE_FLOOR_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            flow_timeout_ms: DEFAULT_FLOW_TIMEOUT_MS,
            epoch_ms: DEFAULT_EPOCH_MS,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            calibration_factor: DEFAULT_CALIBRATION_FACTOR,
            // Effectively unbounded
            link_init_retry: RetryStrategy::fixed(u32::MAX, DEFAULT_LINK_INIT_DELAY),
        }
    }
}

impl NodeConfig {
    /// Create a configuration for a sensor with a different calibration factor
    pub fn with_calibration(calibration_factor: f32) -> Self {
        Self {
            calibration_factor,
            ..Default::default()
        }
    }

    /// Create a configuration with custom tick and epoch intervals
    ///
    /// The window is sized to exactly one epoch of ticks.
    pub fn with_intervals(tick_interval_ms: u32, epoch_ms: u32) -> Self {
        let ticks = if tick_interval_ms == 0 {
            DEFAULT_WINDOW_CAPACITY
        } else {
            (epoch_ms / tick_interval_ms).max(1) as usize
        };
        Self {
            tick_interval_ms,
            epoch_ms,
            window_capacity: ticks,
            ..Default::default()
        }
    }

    /// Sampling ticks per minute, the rate scale factor
    pub fn ticks_per_minute(&self) -> f32 {
        60_000.0 / self.tick_interval_ms as f32
    }

    /// Number of ticks that fit into one epoch
    pub fn ticks_per_epoch(&self) -> usize {
        if self.tick_interval_ms == 0 {
            return 0;
        }
        (self.epoch_ms / self.tick_interval_ms) as usize
    }

    /// Check the invariants the sampler and window rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "tick_interval_ms",
            });
        }
        if self.epoch_ms == 0 {
            return Err(ConfigError::ZeroInterval { name: "epoch_ms" });
        }
        if self.window_capacity == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "window_capacity",
            });
        }
        if !self.calibration_factor.is_finite() || self.calibration_factor <= 0.0 {
            return Err(ConfigError::InvalidCalibration(self.calibration_factor));
        }
        let ticks = self.ticks_per_epoch();
        if ticks > self.window_capacity {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.window_capacity,
                ticks,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_config_default() {
        let config = NodeConfig::default();
        assert_eq!(config.debounce_floor_ms, 10);
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.flow_timeout_ms, 3000);
        assert_eq!(config.epoch_ms, 1000);
        assert_eq!(config.window_capacity, 200);
        assert_eq!(config.calibration_factor, 7.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ticks_per_minute() {
        let config = NodeConfig::default();
        assert_eq!(config.ticks_per_minute(), 1200.0);
        assert_eq!(config.ticks_per_epoch(), 20);
    }

    #[test]
    fn test_with_intervals_sizes_window() {
        let config = NodeConfig::with_intervals(100, 2000);
        assert_eq!(config.window_capacity, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_tick() {
        let config = NodeConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval {
                name: "tick_interval_ms"
            })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_calibration() {
        let config = NodeConfig::with_calibration(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCalibration(_))
        ));

        let config = NodeConfig::with_calibration(f32::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_undersized_window() {
        let config = NodeConfig {
            window_capacity: 10,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::CapacityTooSmall {
                capacity: 10,
                ticks: 20
            })
        );
    }
}
