// FlowLink Gateway - LoRa receiver and collector forwarding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Collector transport
//!
//! One blocking JSON POST per call. [`HttpTransport`] is the production
//! implementation on a `ureq` agent; the trait exists so the forwarding
//! policy can be exercised without a network.

use crate::config::GatewayConfig;
use crate::error::DeliveryFailure;
use std::error::Error as _;
use std::io;

/// What the collector answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body (may be empty)
    pub body: String,
    /// `Location` header, present on redirects
    pub location: Option<String>,
}

impl CollectorResponse {
    /// Create a response with no `Location` header
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            location: None,
        }
    }

    /// Create a body-less redirect pointing at `location`
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            body: String::new(),
            location: Some(location.into()),
        }
    }
}

/// Single-shot JSON POST to the collector
pub trait CollectorTransport {
    /// Send `body` once. Any HTTP status is a response; only failures to
    /// complete the exchange are errors.
    fn post_json(&self, body: &str) -> Result<CollectorResponse, DeliveryFailure>;
}

/// Blocking HTTP(S) transport
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    url: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").field("url", &self.url).finish()
    }
}

impl HttpTransport {
    /// Create a transport for `config.collector_url`
    ///
    /// Redirects are never followed: a 3xx comes back as the response so
    /// the forwarder can flag it.
    pub fn new(config: &GatewayConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.response_timeout)
            .timeout_write(config.response_timeout)
            .redirects(0)
            .build();
        Self {
            agent,
            url: config.collector_url.clone(),
        }
    }

    /// Collector URL every POST goes to
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CollectorTransport for HttpTransport {
    fn post_json(&self, body: &str) -> Result<CollectorResponse, DeliveryFailure> {
        let result = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(body);

        let response = match result {
            Ok(response) => response,
            // 4xx/5xx still completed the exchange
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => return Err(classify_transport(&transport)),
        };

        let status = response.status();
        let location = response.header("Location").map(str::to_string);
        let body = response
            .into_string()
            .map_err(|e| classify_io(e.kind()))?;

        Ok(CollectorResponse {
            status,
            body,
            location,
        })
    }
}

/// Map a transport-level failure onto the fixed failure set
fn classify_transport(transport: &ureq::Transport) -> DeliveryFailure {
    use ureq::ErrorKind;

    match transport.kind() {
        ErrorKind::ConnectionFailed => classify_connect(io_source(transport)),
        ErrorKind::Dns => DeliveryFailure::NoRemoteServer,
        ErrorKind::InvalidUrl | ErrorKind::UnknownScheme | ErrorKind::InsecureRequestHttpsOnly => {
            DeliveryFailure::NotConnected
        }
        ErrorKind::BadStatus | ErrorKind::BadHeader => DeliveryFailure::NoStream,
        ErrorKind::Io => io_source(transport)
            .map(classify_io)
            .unwrap_or(DeliveryFailure::StreamWrite),
        _ => DeliveryFailure::Unknown,
    }
}

fn io_source(transport: &ureq::Transport) -> Option<io::ErrorKind> {
    transport
        .source()
        .and_then(|source| source.downcast_ref::<io::Error>())
        .map(io::Error::kind)
}

/// A failed connect is a refusal unless the socket says it timed out
fn classify_connect(source: Option<io::ErrorKind>) -> DeliveryFailure {
    match source.map(classify_io) {
        Some(DeliveryFailure::ReadTimeout) => DeliveryFailure::ReadTimeout,
        _ => DeliveryFailure::ConnectionRefused,
    }
}

/// Map an I/O error kind onto the fixed failure set
pub fn classify_io(kind: io::ErrorKind) -> DeliveryFailure {
    match kind {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => DeliveryFailure::ReadTimeout,
        io::ErrorKind::ConnectionRefused => DeliveryFailure::ConnectionRefused,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::UnexpectedEof => DeliveryFailure::ConnectionLost,
        io::ErrorKind::NotConnected => DeliveryFailure::NotConnected,
        io::ErrorKind::BrokenPipe | io::ErrorKind::WriteZero => DeliveryFailure::StreamWrite,
        io::ErrorKind::OutOfMemory => DeliveryFailure::InsufficientMemory,
        io::ErrorKind::InvalidData => DeliveryFailure::Encoding,
        _ => DeliveryFailure::Unknown,
    }
}
