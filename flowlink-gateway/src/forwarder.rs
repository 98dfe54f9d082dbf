// FlowLink Gateway - LoRa receiver and collector forwarding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Record forwarding to the collector
//!
//! One record, one attempt. [`ForwardingClient::forward`] makes sure the
//! uplink is associated (bounded rejoin), posts the JSON payload once and
//! classifies what came back. Nothing here is fatal and nothing is queued:
//! a record that cannot be delivered is reported and forgotten.

use crate::config::GatewayConfig;
use crate::error::{DeliveryFailure, FailureReport, GatewayError};
use crate::network::{ensure_associated, Association, NetworkAssociation};
use crate::payload::CollectorPayload;
use crate::transport::{CollectorTransport, HttpTransport};
use flowlink::StatisticsRecord;
use log::{info, warn};

/// How a forwarding attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// 2xx from the collector
    Delivered { status: u16 },
    /// 3xx; treated as delivered but the endpoint is probably misconfigured
    Redirected {
        status: u16,
        location: Option<String>,
    },
    /// The collector answered with an error status
    HttpStatus { status: u16 },
    /// The request did not complete
    Failed(DeliveryFailure),
    /// The uplink could not be restored; the POST was never attempted
    Dropped { retries: u32 },
}

impl ForwardOutcome {
    /// True for outcomes counted as delivered (2xx and 3xx)
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. } | Self::Redirected { .. })
    }
}

/// Forwards decoded records to the collector
#[derive(Debug)]
pub struct ForwardingClient<N, T> {
    config: GatewayConfig,
    network: N,
    transport: T,
}

impl<N: NetworkAssociation> ForwardingClient<N, HttpTransport> {
    /// Client posting over HTTP(S) to `config.collector_url`
    pub fn http(config: GatewayConfig, network: N) -> Result<Self, GatewayError> {
        config.validate()?;
        let transport = HttpTransport::new(&config);
        Ok(Self::with_transport(config, network, transport))
    }
}

impl<N: NetworkAssociation, T: CollectorTransport> ForwardingClient<N, T> {
    /// Client posting through any [`CollectorTransport`]
    pub fn with_transport(config: GatewayConfig, network: N, transport: T) -> Self {
        Self {
            config,
            network,
            transport,
        }
    }

    /// Deliver one record
    pub fn forward(&mut self, record: &StatisticsRecord) -> ForwardOutcome {
        match ensure_associated(
            &mut self.network,
            self.config.reconnect_settle,
            &self.config.reconnect_retry,
        ) {
            Ok(Association::Up) => {}
            Ok(Association::Restored { polls }) => {
                info!("Uplink restored after {} poll(s), forwarding", polls);
            }
            Err(GatewayError::AssociationLost { retries }) => {
                warn!("Record {} dropped: uplink unavailable", record);
                return ForwardOutcome::Dropped { retries };
            }
            Err(e) => {
                warn!("Record {} dropped: {}", record, e);
                return ForwardOutcome::Dropped {
                    retries: self.config.reconnect_retry.max_retries(),
                };
            }
        }

        let body = match CollectorPayload::from(record).to_json() {
            Ok(body) => body,
            Err(e) => {
                warn!("Record {} dropped: {}", record, e);
                return ForwardOutcome::Failed(DeliveryFailure::Encoding);
            }
        };
        info!("Forwarding payload: {}", body);

        match self.transport.post_json(&body) {
            Ok(response) => classify_status(response.status, response.location, &response.body),
            Err(failure) => {
                warn!("Forwarding failed: {}", FailureReport(&failure));
                ForwardOutcome::Failed(failure)
            }
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

fn classify_status(status: u16, location: Option<String>, body: &str) -> ForwardOutcome {
    match status {
        200..=299 => {
            info!("Collector accepted record (HTTP {})", status);
            if !body.is_empty() {
                info!("Collector response: {}", body);
            }
            ForwardOutcome::Delivered { status }
        }
        300..=399 => {
            match &location {
                Some(target) => warn!(
                    "Collector answered with redirect {} to {}; check the collector URL",
                    status, target
                ),
                None => warn!(
                    "Collector answered with redirect {} without Location; check the collector URL",
                    status
                ),
            }
            ForwardOutcome::Redirected { status, location }
        }
        _ => {
            warn!("Collector rejected record: HTTP {}", status);
            ForwardOutcome::HttpStatus { status }
        }
    }
}
