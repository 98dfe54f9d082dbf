// FlowLink Gateway - LoRa receiver and collector forwarding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for FlowLink Gateway

use std::fmt;
use thiserror::Error;

/// Main error type for Gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Frame or link error from the shared core
    #[error("Link error: {0}")]
    Flow(#[from] flowlink::FlowError),

    /// Network association could not be (re-)established
    #[error("Network association lost after {retries} retries")]
    AssociationLost { retries: u32 },

    /// Collector request failed
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryFailure),

    /// Payload could not be serialised
    #[error("Payload serialisation failed: {0}")]
    Payload(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for Gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Request-level delivery failures
///
/// The set is closed: every transport failure maps onto one of these.
/// Each variant also maps to the negative code the ESP32 Arduino
/// `HTTPClient` reports, so logs stay comparable with firmware gateways.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryFailure {
    #[error("connection refused")]
    ConnectionRefused,
    #[error("send header failed")]
    SendHeaderFailed,
    #[error("send payload failed")]
    SendPayloadFailed,
    #[error("not connected")]
    NotConnected,
    #[error("connection lost")]
    ConnectionLost,
    #[error("no stream")]
    NoStream,
    #[error("no HTTP server")]
    NoRemoteServer,
    #[error("insufficient memory")]
    InsufficientMemory,
    #[error("encoding error")]
    Encoding,
    #[error("stream write failed")]
    StreamWrite,
    #[error("read timeout")]
    ReadTimeout,
    #[error("unknown HTTP error")]
    Unknown,
}

impl DeliveryFailure {
    /// All variants, in code order
    pub const ALL: [DeliveryFailure; 12] = [
        Self::ConnectionRefused,
        Self::SendHeaderFailed,
        Self::SendPayloadFailed,
        Self::NotConnected,
        Self::ConnectionLost,
        Self::NoStream,
        Self::NoRemoteServer,
        Self::InsufficientMemory,
        Self::Encoding,
        Self::StreamWrite,
        Self::ReadTimeout,
        Self::Unknown,
    ];

    /// Legacy client error code (-1 ..= -11, `Unknown` is 0)
    pub fn code(&self) -> i32 {
        match self {
            Self::ConnectionRefused => -1,
            Self::SendHeaderFailed => -2,
            Self::SendPayloadFailed => -3,
            Self::NotConnected => -4,
            Self::ConnectionLost => -5,
            Self::NoStream => -6,
            Self::NoRemoteServer => -7,
            Self::InsufficientMemory => -8,
            Self::Encoding => -9,
            Self::StreamWrite => -10,
            Self::ReadTimeout => -11,
            Self::Unknown => 0,
        }
    }

    /// Classify a legacy client error code
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => Self::ConnectionRefused,
            -2 => Self::SendHeaderFailed,
            -3 => Self::SendPayloadFailed,
            -4 => Self::NotConnected,
            -5 => Self::ConnectionLost,
            -6 => Self::NoStream,
            -7 => Self::NoRemoteServer,
            -8 => Self::InsufficientMemory,
            -9 => Self::Encoding,
            -10 => Self::StreamWrite,
            -11 => Self::ReadTimeout,
            _ => Self::Unknown,
        }
    }

    /// Operator hint appended to the failure log line
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ReadTimeout => Some("check internet connection and collector URL"),
            Self::NoRemoteServer => Some("check collector host name"),
            _ => None,
        }
    }
}

/// Wrapper printing a failure the way operators grep for it
pub struct FailureReport<'a>(pub &'a DeliveryFailure);

impl fmt::Display for FailureReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP error code {}: {}", self.0.code(), self.0)?;
        if let Some(hint) = self.0.hint() {
            write!(f, " - {}", hint)?;
        }
        Ok(())
    }
}
