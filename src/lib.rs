//! # FlowLink - pulse flow telemetry over an unreliable radio link
//!
//! A flowmeter node counts sensor pulses, turns them into a flow rate every
//! sampling tick, and once per epoch sends the mean and standard deviation
//! of those rates as a fixed 12-byte frame. A gateway node (see the
//! `flowlink-gateway` crate) decodes the frame and forwards it.
//!
//! ## Quick Start
//!
//! ```rust
//! use flowlink::{FlowSampler, NodeConfig, PulseCounter, StatisticsRecord, StatisticsWindow};
//!
//! let config = NodeConfig::default();
//! let counter = PulseCounter::new(0, config.debounce_floor_ms);
//! let mut sampler = FlowSampler::new(&config);
//! let mut window = StatisticsWindow::new(config.window_capacity);
//!
//! // Interrupt handler side
//! for t in (10..=150).step_by(10) {
//!     counter.on_edge(t);
//! }
//!
//! // Main loop side, once per 50 ms tick
//! let sample = sampler.sample(counter.drain(150), 150);
//! window.push(sample).unwrap();
//!
//! // Once per epoch
//! let record = window.build_and_reset(1000).unwrap();
//! let frame = record.encode();
//! assert_eq!(frame.as_bytes().len(), 12);
//!
//! // Gateway side
//! let decoded = StatisticsRecord::decode(frame.as_ref()).unwrap();
//! assert_eq!(decoded, record);
//! ```
//!
//! ## Modules
//!
//! - [`pulse`]: Debounced, interrupt-safe pulse counting
//! - [`sampler`]: Pulse count to flow rate, stall detection
//! - [`window`]: Fixed-capacity per-epoch statistics
//! - [`codec`]: The 12-byte wire frame
//! - [`radio`]: Radio link abstraction and in-memory links
//! - [`sender`]: The flowmeter node main loop
//! - [`recovery`]: Bounded retry policies
//! - [`clock`]: Millisecond time source
//! - [`config`]: Node configuration

// Modules
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod pulse;
pub mod radio;
pub mod recovery;
pub mod sampler;
pub mod sender;
pub mod window;

// Re-exports for convenient access
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{StatisticsRecord, TelemetryFrame, FRAME_SIZE};
pub use config::NodeConfig;
pub use error::{ConfigError, DecodeError, FlowError, LinkError, Result, WindowError};
pub use pulse::{PulseCounter, PulseDrain};
pub use radio::{Datagram, LinkMetrics, LossyRadio, MemoryRadio, RadioConfig, RadioLink, RadioPair};
pub use recovery::{with_retry_counted, RetryExhausted, RetryResult, RetryStrategy};
pub use sampler::{FlowSample, FlowSampler};
pub use sender::{EpochOutcome, PollReport, SenderNode, SenderStats};
pub use window::StatisticsWindow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_basic_pipeline() {
        let config = NodeConfig::default();
        let counter = PulseCounter::new(0, config.debounce_floor_ms);
        let mut sampler = FlowSampler::new(&config);
        let mut window = StatisticsWindow::new(config.window_capacity);

        for t in (10..=150).step_by(10) {
            counter.on_edge(t);
        }
        let sample = sampler.sample(counter.drain(150), 150);
        window.push(sample).unwrap();

        let record = window.build_and_reset(1000).unwrap();
        assert!((record.mean - 2400.0).abs() < 0.001);

        let decoded = StatisticsRecord::decode(record.encode().as_ref()).unwrap();
        assert_eq!(decoded, record);
    }
}
