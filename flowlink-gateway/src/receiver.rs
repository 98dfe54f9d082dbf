// FlowLink Gateway - LoRa receiver and collector forwarding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Gateway main loop
//!
//! [`ReceiverNode`] polls the radio, validates each datagram as a frame and
//! hands valid records to the [`ForwardingClient`]. Frames are independent:
//! a rejected or undeliverable one never affects the next.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::forwarder::{ForwardOutcome, ForwardingClient};
use crate::network::{join_network, NetworkAssociation};
use crate::quality::DataQuality;
use crate::transport::CollectorTransport;
use chrono::{DateTime, Utc};
use flowlink::recovery::with_retry_counted;
use flowlink::{DecodeError, FlowError, RadioLink, StatisticsRecord};
use log::{debug, error, info, warn};

/// What became of one received datagram
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Not a valid frame; nothing was forwarded
    Rejected(DecodeError),
    /// Decoded and handed to the forwarder
    Forwarded {
        record: StatisticsRecord,
        quality: DataQuality,
        outcome: ForwardOutcome,
    },
}

/// Report for one received datagram
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveReport {
    /// Length of the datagram as received
    pub length: usize,
    /// Signal strength reported by the radio
    pub rssi: i16,
    /// When the gateway accepted the datagram
    pub received_at: DateTime<Utc>,
    pub disposition: Disposition,
}

/// Receiver counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Datagrams taken off the radio
    pub frames_received: u64,
    /// Datagrams that failed frame validation
    pub frames_rejected: u64,
    /// Records the collector accepted with a 2xx
    pub forwarded: u64,
    /// Records answered with a 3xx (also delivered)
    pub redirected: u64,
    /// Records dropped because the uplink was down
    pub dropped: u64,
    /// Records lost to request failures or error statuses
    pub failed: u64,
}

impl ReceiverStats {
    /// Records counted as delivered
    pub fn delivered(&self) -> u64 {
        self.forwarded + self.redirected
    }
}

/// Gateway node: radio in, collector out
#[derive(Debug)]
pub struct ReceiverNode<R, N, T> {
    radio: R,
    forwarder: ForwardingClient<N, T>,
    stats: ReceiverStats,
}

impl<R, N, T> ReceiverNode<R, N, T>
where
    R: RadioLink,
    N: NetworkAssociation,
    T: CollectorTransport,
{
    pub fn new(radio: R, forwarder: ForwardingClient<N, T>) -> Self {
        Self {
            radio,
            forwarder,
            stats: ReceiverStats::default(),
        }
    }

    /// Bring up the radio, then the uplink
    ///
    /// Both waits run under `startup_retry`. Failing either is fatal.
    pub fn start(&mut self) -> Result<()> {
        let config = self.forwarder.config();
        let radio = &mut self.radio;
        let radio_config = &config.radio;
        match with_retry_counted(&config.startup_retry, || radio.begin(radio_config)) {
            Ok(done) => info!(
                "Radio up at {} Hz, sync word 0x{:02X} ({} attempt(s))",
                radio_config.frequency_hz, radio_config.sync_word, done.attempts
            ),
            Err(exhausted) => {
                error!(
                    "Radio unavailable after {} attempt(s): {}",
                    exhausted.attempts, exhausted.error
                );
                return Err(GatewayError::Flow(FlowError::Link(exhausted.error)));
            }
        }

        let strategy = self.forwarder.config().startup_retry.clone();
        if let Err(e) = join_network(self.forwarder.network_mut(), &strategy) {
            error!("Uplink unavailable at startup: {}", e);
            return Err(e);
        }
        info!(
            "Gateway ready, forwarding to {}",
            self.forwarder.config().collector_url
        );
        Ok(())
    }

    /// Handle at most one datagram; `None` if the radio had nothing
    pub fn poll_once(&mut self) -> Option<ReceiveReport> {
        let datagram = self.radio.receive()?;
        let received_at = Utc::now();
        let length = datagram.payload.len();
        self.stats.frames_received += 1;

        let limit = self.config().receive_buffer_size;
        let kept = &datagram.payload[..length.min(limit)];
        info!(
            "Received {} bytes at {} (RSSI {} dBm)",
            length,
            received_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            datagram.rssi
        );
        if kept.len() < length {
            debug!("Datagram truncated to {} bytes", kept.len());
        }

        let disposition = match StatisticsRecord::decode(kept) {
            Err(e) => {
                warn!("Frame rejected: {}", e);
                self.stats.frames_rejected += 1;
                Disposition::Rejected(e)
            }
            Ok(record) => {
                let quality = DataQuality::assess(&record);
                info!("Decoded {} [{}]", record, quality);
                let outcome = self.forwarder.forward(&record);
                self.count(&outcome);
                Disposition::Forwarded {
                    record,
                    quality,
                    outcome,
                }
            }
        };

        Some(ReceiveReport {
            length,
            rssi: datagram.rssi,
            received_at,
            disposition,
        })
    }

    /// Handle everything the radio has queued
    pub fn drain(&mut self) -> Vec<ReceiveReport> {
        std::iter::from_fn(|| self.poll_once()).collect()
    }

    fn count(&mut self, outcome: &ForwardOutcome) {
        match outcome {
            ForwardOutcome::Delivered { .. } => self.stats.forwarded += 1,
            ForwardOutcome::Redirected { .. } => self.stats.redirected += 1,
            ForwardOutcome::Dropped { .. } => self.stats.dropped += 1,
            ForwardOutcome::HttpStatus { .. } | ForwardOutcome::Failed(_) => {
                self.stats.failed += 1
            }
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        self.forwarder.config()
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn forwarder(&self) -> &ForwardingClient<N, T> {
        &self.forwarder
    }

    pub fn forwarder_mut(&mut self) -> &mut ForwardingClient<N, T> {
        &mut self.forwarder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryFailure;
    use crate::network::SimulatedNetwork;
    use crate::transport::CollectorResponse;
    use flowlink::{MemoryRadio, FRAME_SIZE};

    struct Accepting;

    impl CollectorTransport for Accepting {
        fn post_json(
            &self,
            _body: &str,
        ) -> std::result::Result<CollectorResponse, DeliveryFailure> {
            Ok(CollectorResponse::new(200, ""))
        }
    }

    fn node(radio: MemoryRadio) -> ReceiverNode<MemoryRadio, SimulatedNetwork, Accepting> {
        let forwarder = ForwardingClient::with_transport(
            GatewayConfig::without_delays("http://collector.local/exec"),
            SimulatedNetwork::comes_up_after(1),
            Accepting,
        );
        ReceiverNode::new(radio, forwarder)
    }

    #[test]
    fn test_start_brings_up_radio_and_network() {
        let mut node = node(MemoryRadio::with_failing_begins(2));
        node.start().unwrap();
        assert!(node.radio().is_initialised());
        assert_eq!(node.forwarder().network().joins(), 1);
    }

    #[test]
    fn test_start_fails_without_radio() {
        // without_delays allows 10 retries, so 11 attempts in total
        let mut node = node(MemoryRadio::with_failing_begins(20));
        assert!(matches!(
            node.start(),
            Err(GatewayError::Flow(FlowError::Link(_)))
        ));
    }

    #[test]
    fn test_idle_radio() {
        let mut node = node(MemoryRadio::new());
        assert!(node.poll_once().is_none());
        assert_eq!(node.stats(), &ReceiverStats::default());
    }

    #[test]
    fn test_valid_frame_is_forwarded() {
        let mut radio = MemoryRadio::new();
        let record = StatisticsRecord::new(1000, 2.5, 0.1);
        radio.push_incoming(record.encode().into_bytes().to_vec(), -70);
        let mut node = node(radio);
        node.start().unwrap();

        let report = node.poll_once().unwrap();
        assert_eq!(report.length, FRAME_SIZE);
        assert_eq!(report.rssi, -70);
        assert_eq!(
            report.disposition,
            Disposition::Forwarded {
                record,
                quality: DataQuality::Good,
                outcome: ForwardOutcome::Delivered { status: 200 },
            }
        );
        assert_eq!(node.stats().forwarded, 1);
    }

    #[test]
    fn test_oversized_datagram_is_truncated_then_rejected() {
        let mut radio = MemoryRadio::new();
        radio.push_incoming(vec![0u8; 40], -90);
        let mut node = node(radio);

        let report = node.poll_once().unwrap();
        assert_eq!(report.length, 40);
        assert_eq!(
            report.disposition,
            Disposition::Rejected(DecodeError::InvalidLength {
                expected: FRAME_SIZE,
                actual: 32
            })
        );
        assert_eq!(node.stats().frames_rejected, 1);
    }

    #[test]
    fn test_drain_handles_every_datagram() {
        let mut radio = MemoryRadio::new();
        for t in 0..3u32 {
            let frame = StatisticsRecord::new(t * 1000, 1.0, 0.0).encode();
            radio.push_incoming(frame.into_bytes().to_vec(), -60);
        }
        let mut node = node(radio);
        node.start().unwrap();

        assert_eq!(node.drain().len(), 3);
        assert_eq!(node.stats().frames_received, 3);
        assert_eq!(node.stats().delivered(), 3);
    }
}
