// FlowLink Gateway - LoRa receiver and collector forwarding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # FlowLink Gateway - LoRa receiver and collector forwarding
//!
//! This crate is the receiving half of FlowLink. It takes 12-byte frames
//! off the radio, validates and decodes them, and forwards each record to
//! an HTTP collector as a small JSON document.
//!
//! ## Overview
//!
//! Every frame is an independent unit of work. A malformed frame is
//! rejected, a record that meets a dead uplink is dropped after a bounded
//! rejoin, and a failed POST is reported and forgotten. Nothing is queued
//! and nothing short of a dead radio at startup stops the gateway.
//!
//! ## Quick Start
//!
//! ```rust
//! use flowlink::{MemoryRadio, StatisticsRecord};
//! use flowlink_gateway::{
//!     CollectorResponse, CollectorTransport, DeliveryFailure, Disposition, ForwardingClient,
//!     GatewayConfig, ReceiverNode, SimulatedNetwork,
//! };
//!
//! // Any collector will do; this one accepts everything
//! struct Accepting;
//! impl CollectorTransport for Accepting {
//!     fn post_json(&self, _body: &str) -> Result<CollectorResponse, DeliveryFailure> {
//!         Ok(CollectorResponse::new(200, ""))
//!     }
//! }
//!
//! let config = GatewayConfig::without_delays("http://collector.local/exec");
//! let forwarder = ForwardingClient::with_transport(config, SimulatedNetwork::up(), Accepting);
//!
//! let mut radio = MemoryRadio::new();
//! let frame = StatisticsRecord::new(1000, 2.5, 0.1).encode();
//! radio.push_incoming(frame.into_bytes().to_vec(), -72);
//!
//! let mut gateway = ReceiverNode::new(radio, forwarder);
//! gateway.start().unwrap();
//!
//! let report = gateway.poll_once().unwrap();
//! assert!(matches!(report.disposition, Disposition::Forwarded { .. }));
//! assert_eq!(gateway.stats().forwarded, 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! RadioLink ──receive──► ReceiverNode ──decode──► StatisticsRecord
//!                                                       │
//!                                                       ▼
//!                          NetworkAssociation ◄── ForwardingClient
//!                                                       │ JSON POST
//!                                                       ▼
//!                                               CollectorTransport
//! ```

mod config;
mod error;
mod forwarder;
mod network;
mod payload;
mod quality;
mod receiver;
mod transport;

// Public API
pub use config::{GatewayConfig, RECEIVE_BUFFER_SIZE};
pub use error::{DeliveryFailure, FailureReport, GatewayError, Result};
pub use forwarder::{ForwardOutcome, ForwardingClient};
pub use network::{ensure_associated, join_network, Association, NetworkAssociation, SimulatedNetwork};
pub use payload::CollectorPayload;
pub use quality::{DataQuality, HIGH_FLOW_THRESHOLD};
pub use receiver::{Disposition, ReceiveReport, ReceiverNode, ReceiverStats};
pub use transport::{classify_io, CollectorResponse, CollectorTransport, HttpTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
