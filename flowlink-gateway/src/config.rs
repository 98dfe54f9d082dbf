// FlowLink Gateway - LoRa receiver and collector forwarding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for FlowLink Gateway

use crate::error::GatewayError;
use flowlink::{RadioConfig, RetryStrategy};
use std::time::Duration;

/// Bytes read from one radio datagram; anything beyond is discarded
pub const RECEIVE_BUFFER_SIZE: usize = 32;

/// Gateway-level configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Collector endpoint receiving the JSON POST
    pub collector_url: String,

    /// TCP connect timeout (default: 10 s)
    pub connect_timeout: Duration,

    /// Response timeout (default: 15 s)
    pub response_timeout: Duration,

    /// Pause between dropping a stale association and rejoining (default: 1 s)
    pub reconnect_settle: Duration,

    /// Status polls after a rejoin (default: 10 polls, 500 ms apart)
    pub reconnect_retry: RetryStrategy,

    /// Association polling at startup
    pub startup_retry: RetryStrategy,

    /// Bytes kept from each datagram (default: 32)
    pub receive_buffer_size: usize,

    /// Radio parameters
    pub radio: RadioConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            collector_url: String::new(),
            connect_timeout: Duration::from_secs(10),
            response_timeout: Duration::from_secs(15),
            reconnect_settle: Duration::from_secs(1),
            reconnect_retry: RetryStrategy::fixed(10, Duration::from_millis(500)),
            startup_retry: RetryStrategy::fixed(u32::MAX, Duration::from_millis(500)),
            receive_buffer_size: RECEIVE_BUFFER_SIZE,
            radio: RadioConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a configuration for a collector endpoint
    pub fn with_collector(url: impl Into<String>) -> Self {
        Self {
            collector_url: url.into(),
            ..Default::default()
        }
    }

    /// Configuration that never sleeps; for simulation and tests
    pub fn without_delays(url: impl Into<String>) -> Self {
        Self {
            reconnect_settle: Duration::ZERO,
            reconnect_retry: RetryStrategy::fixed(10, Duration::ZERO),
            startup_retry: RetryStrategy::fixed(10, Duration::ZERO),
            ..Self::with_collector(url)
        }
    }

    /// Check the collector URL and buffer size
    pub fn validate(&self) -> Result<(), GatewayError> {
        if !(self.collector_url.starts_with("http://") || self.collector_url.starts_with("https://"))
        {
            return Err(GatewayError::InvalidConfig(format!(
                "collector URL must be http(s): {:?}",
                self.collector_url
            )));
        }
        if self.receive_buffer_size < flowlink::FRAME_SIZE {
            return Err(GatewayError::InvalidConfig(format!(
                "receive buffer of {} bytes cannot hold a {}-byte frame",
                self.receive_buffer_size,
                flowlink::FRAME_SIZE
            )));
        }
        Ok(())
    }
}
