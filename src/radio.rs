// FlowLink - Pulse flow telemetry over LoRa
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.


//! Radio link abstraction
//!
//! The radio is an unreliable point-to-point datagram transport. No ordering,
//! delivery or deduplication guarantees hold across datagrams. Hardware
//! drivers implement [`RadioLink`]; [`MemoryRadio`], [`RadioPair`] and
//! [`LossyRadio`] stand in for it in simulation and tests.

use crate::error::LinkError;
use std::collections::VecDeque;

/// Largest datagram the link carries (LoRa packet limit)
pub const MAX_DATAGRAM_SIZE: usize = 255;

/// Radio parameters shared by sender and gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioConfig {
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    /// Sync word; nodes with different words ignore each other
    pub sync_word: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 433_000_000,
            sync_word: 0xF3,
        }
    }
}

/// A received datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Raw payload bytes
    pub payload: Vec<u8>,
    /// Received signal strength (dBm); diagnostic only
    pub rssi: i16,
}

/// Statistics about link usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMetrics {
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Datagrams sent
    pub datagrams_sent: u64,
    /// Datagrams received
    pub datagrams_received: u64,
    /// Datagrams the link swallowed
    pub datagrams_lost: u64,
}

/// Trait for radio links
pub trait RadioLink {
    /// Bring the radio up
    fn begin(&mut self, config: &RadioConfig) -> Result<(), LinkError>;

    /// Transmit one datagram
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError>;

    /// Non-blocking poll for a received datagram
    fn receive(&mut self) -> Option<Datagram>;

    /// Link usage counters
    fn metrics(&self) -> LinkMetrics;
}

/// In-memory radio for simulation and tests
#[derive(Debug)]
pub struct MemoryRadio {
    tx_queue: VecDeque<Vec<u8>>,
    rx_queue: VecDeque<Datagram>,
    config: Option<RadioConfig>,
    /// Number of `begin` calls that fail before the radio comes up
    failing_begins: u32,
    metrics: LinkMetrics,
}

impl MemoryRadio {
    /// Create a radio that initialises on the first `begin`
    pub fn new() -> Self {
        Self {
            tx_queue: VecDeque::new(),
            rx_queue: VecDeque::new(),
            config: None,
            failing_begins: 0,
            metrics: LinkMetrics::default(),
        }
    }

    /// Create a radio whose first `failures` initialisation attempts fail
    pub fn with_failing_begins(failures: u32) -> Self {
        Self {
            failing_begins: failures,
            ..Self::new()
        }
    }

    /// True once `begin` has succeeded
    pub fn is_initialised(&self) -> bool {
        self.config.is_some()
    }

    /// Configuration the radio was brought up with
    pub fn config(&self) -> Option<&RadioConfig> {
        self.config.as_ref()
    }

    /// Queue a datagram as if it had arrived over the air
    pub fn push_incoming(&mut self, payload: Vec<u8>, rssi: i16) {
        self.rx_queue.push_back(Datagram { payload, rssi });
    }

    /// Take the oldest transmitted datagram
    pub fn pop_outgoing(&mut self) -> Option<Vec<u8>> {
        self.tx_queue.pop_front()
    }

    pub fn pending_outgoing(&self) -> usize {
        self.tx_queue.len()
    }

    pub fn pending_incoming(&self) -> usize {
        self.rx_queue.len()
    }

    /// Deliver everything transmitted here to `other`'s receive queue
    pub fn transfer_to(&mut self, other: &mut MemoryRadio, rssi: i16) {
        while let Some(payload) = self.tx_queue.pop_front() {
            other.push_incoming(payload, rssi);
        }
    }
}

impl Default for MemoryRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioLink for MemoryRadio {
    fn begin(&mut self, config: &RadioConfig) -> Result<(), LinkError> {
        if self.failing_begins > 0 {
            self.failing_begins -= 1;
            return Err(LinkError::Unavailable {
                reason: "radio did not answer".to_string(),
            });
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        if !self.is_initialised() {
            return Err(LinkError::Unavailable {
                reason: "radio not initialised".to_string(),
            });
        }
        if payload.len() > MAX_DATAGRAM_SIZE {
            return Err(LinkError::TooLarge {
                size: payload.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }

        self.tx_queue.push_back(payload.to_vec());
        self.metrics.bytes_sent += payload.len() as u64;
        self.metrics.datagrams_sent += 1;
        Ok(())
    }

    fn receive(&mut self) -> Option<Datagram> {
        let datagram = self.rx_queue.pop_front()?;
        self.metrics.bytes_received += datagram.payload.len() as u64;
        self.metrics.datagrams_received += 1;
        Some(datagram)
    }

    fn metrics(&self) -> LinkMetrics {
        self.metrics.clone()
    }
}

/// A sender radio and a gateway radio sharing the air
#[derive(Debug, Default)]
pub struct RadioPair {
    /// Sensor-side radio
    pub sender: MemoryRadio,
    /// Gateway-side radio
    pub receiver: MemoryRadio,
}

impl RadioPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate propagation of everything the sender transmitted
    pub fn transfer(&mut self, rssi: i16) {
        self.sender.transfer_to(&mut self.receiver, rssi);
    }
}

/// Radio that silently drops a fraction of transmitted datagrams
#[derive(Debug)]
pub struct LossyRadio {
    inner: MemoryRadio,
    loss_rate: f32,
    rng_state: u64,
}

impl LossyRadio {
    /// Create a new lossy radio with given loss rate (0.0-1.0)
    pub fn new(loss_rate: f32) -> Self {
        Self::wrap(MemoryRadio::new(), loss_rate)
    }

    /// Add loss to an existing in-memory radio
    pub fn wrap(inner: MemoryRadio, loss_rate: f32) -> Self {
        Self {
            inner,
            loss_rate: loss_rate.clamp(0.0, 1.0),
            rng_state: 12345,
        }
    }

    pub fn inner(&self) -> &MemoryRadio {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut MemoryRadio {
        &mut self.inner
    }

    /// Simple PRNG for deterministic testing
    fn next_random(&mut self) -> f32 {
        self.rng_state = self.rng_state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.rng_state >> 16) & 0x7fff) as f32 / 32767.0
    }
}

impl RadioLink for LossyRadio {
    fn begin(&mut self, config: &RadioConfig) -> Result<(), LinkError> {
        self.inner.begin(config)
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        if !self.inner.is_initialised() {
            return self.inner.send(payload);
        }
        // The sender cannot tell a lost datagram from a delivered one
        if self.next_random() < self.loss_rate {
            self.inner.metrics.bytes_sent += payload.len() as u64;
            self.inner.metrics.datagrams_sent += 1;
            self.inner.metrics.datagrams_lost += 1;
            return Ok(());
        }
        self.inner.send(payload)
    }

    fn receive(&mut self) -> Option<Datagram> {
        self.inner.receive()
    }

    fn metrics(&self) -> LinkMetrics {
        self.inner.metrics()
    }
}
