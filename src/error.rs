//! Error types for FlowLink
//!
//! This module defines all error types used by the sender side and the
//! shared codec.

use thiserror::Error;

/// Result type alias for FlowLink operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Main error type for FlowLink operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Decoding error
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// Statistics window error
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Radio link error
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors during frame decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame is not exactly the expected size
    #[error("Invalid frame length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors raised by the statistics window
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// More samples were pushed in one epoch than the window can hold
    #[error("Window full: capacity {capacity} samples reached")]
    Full { capacity: usize },
}

/// Errors related to the radio link
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Radio not initialised or not present
    #[error("Radio unavailable: {reason}")]
    Unavailable { reason: String },

    /// Radio failed to transmit the datagram
    #[error("Transmission failed: {reason}")]
    SendFailed { reason: String },

    /// Datagram larger than the link accepts
    #[error("Datagram too large: {size} bytes exceeds maximum {max}")]
    TooLarge { size: usize, max: usize },
}

/// Invalid node configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// An interval that must be positive is zero
    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },

    /// Calibration factor must be finite and positive
    #[error("Invalid calibration factor: {0}")]
    InvalidCalibration(f32),

    /// One epoch produces more ticks than the window can hold
    #[error("Window capacity {capacity} is below {ticks} ticks per epoch")]
    CapacityTooSmall { capacity: usize, ticks: usize },
}
