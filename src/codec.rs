//! Telemetry wire frame
//!
//! One statistics record per radio datagram, 12 bytes, no header:
//!
//! ```text
//! [timestamp: u32] [mean: f32] [stddev: f32]
//! ```
//!
//! Fields use the platform's native byte order. Sender and gateway must
//! share it; nothing on the wire says which order was used.

use crate::error::DecodeError;
use std::fmt;

/// Frame size in bytes
pub const FRAME_SIZE: usize = 12;

const TIMESTAMP_OFFSET: usize = 0;
const MEAN_OFFSET: usize = 4;
const STDDEV_OFFSET: usize = 8;

/// One epoch of flow statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticsRecord {
    /// Sender clock at the end of the epoch (ms)
    pub timestamp: u32,
    /// Mean flow rate
    pub mean: f32,
    /// Population standard deviation of the flow rate
    pub stddev: f32,
}

impl StatisticsRecord {
    /// Create a record from an epoch timestamp and its rate statistics
    pub fn new(timestamp: u32, mean: f32, stddev: f32) -> Self {
        Self {
            timestamp,
            mean,
            stddev,
        }
    }

    /// Encode into a wire frame
    pub fn encode(&self) -> TelemetryFrame {
        TelemetryFrame::from(self)
    }

    /// Decode a received datagram
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        TelemetryFrame::from_slice(bytes).map(|frame| frame.record())
    }
}

impl fmt::Display for StatisticsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={} mean={:.3} stddev={:.3}",
            self.timestamp, self.mean, self.stddev
        )
    }
}

/// Encoded statistics record, exactly [`FRAME_SIZE`] bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryFrame([u8; FRAME_SIZE]);

impl TelemetryFrame {
    /// Validate a received datagram
    ///
    /// Anything but exactly [`FRAME_SIZE`] bytes is rejected before any
    /// field is read.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let raw: [u8; FRAME_SIZE] = bytes.try_into().map_err(|_| DecodeError::InvalidLength {
            expected: FRAME_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; FRAME_SIZE] {
        self.0
    }

    /// Reinterpret the three fixed-offset fields
    pub fn record(&self) -> StatisticsRecord {
        StatisticsRecord {
            timestamp: u32::from_ne_bytes(self.field(TIMESTAMP_OFFSET)),
            mean: f32::from_ne_bytes(self.field(MEAN_OFFSET)),
            stddev: f32::from_ne_bytes(self.field(STDDEV_OFFSET)),
        }
    }

    fn field(&self, offset: usize) -> [u8; 4] {
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.0[offset..offset + 4]);
        out
    }
}

impl From<&StatisticsRecord> for TelemetryFrame {
    fn from(record: &StatisticsRecord) -> Self {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[TIMESTAMP_OFFSET..MEAN_OFFSET].copy_from_slice(&record.timestamp.to_ne_bytes());
        bytes[MEAN_OFFSET..STDDEV_OFFSET].copy_from_slice(&record.mean.to_ne_bytes());
        bytes[STDDEV_OFFSET..FRAME_SIZE].copy_from_slice(&record.stddev.to_ne_bytes());
        Self(bytes)
    }
}

impl AsRef<[u8]> for TelemetryFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame(timestamp: u32, mean: f32, stddev: f32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FRAME_SIZE);
        bytes.extend_from_slice(&timestamp.to_ne_bytes());
        bytes.extend_from_slice(&mean.to_ne_bytes());
        bytes.extend_from_slice(&stddev.to_ne_bytes());
        bytes
    }

    #[test]
    fn test_encode_layout() {
        let frame = StatisticsRecord::new(1000, 2.5, 0.1).encode();
        assert_eq!(frame.as_bytes().as_slice(), raw_frame(1000, 2.5, 0.1));
    }

    #[test]
    fn test_decode_known_frame() {
        let record = StatisticsRecord::decode(&raw_frame(1000, 2.5, 0.1)).unwrap();
        assert_eq!(record.timestamp, 1000);
        assert_eq!(record.mean, 2.5);
        assert_eq!(record.stddev, 0.1);
    }

    #[test]
    fn test_roundtrip_extremes() {
        for record in [
            StatisticsRecord::new(0, 0.0, 0.0),
            StatisticsRecord::new(u32::MAX, 2400.0, 1199.5),
            StatisticsRecord::new(123_456, f32::MIN_POSITIVE, f32::MAX),
        ] {
            let decoded = StatisticsRecord::decode(record.encode().as_ref()).unwrap();
            assert_eq!(decoded, record);
        }
    }

    #[test]
    fn test_nan_survives_bit_exact() {
        let frame = StatisticsRecord::new(1, f32::NAN, 0.0).encode();
        let decoded = frame.record();
        assert!(decoded.mean.is_nan());
    }

    #[test]
    fn test_reject_short_frame() {
        let result = StatisticsRecord::decode(&[0u8; 10]);
        assert_eq!(
            result,
            Err(DecodeError::InvalidLength {
                expected: 12,
                actual: 10
            })
        );
    }

    #[test]
    fn test_reject_any_other_length() {
        let bytes = [0xAAu8; 32];
        for len in (0..=32).filter(|&len| len != FRAME_SIZE) {
            assert!(StatisticsRecord::decode(&bytes[..len]).is_err());
        }
        assert!(StatisticsRecord::decode(&bytes[..FRAME_SIZE]).is_ok());
    }

    #[test]
    fn test_display() {
        let record = StatisticsRecord::new(1000, 2.5, 0.1);
        assert_eq!(record.to_string(), "t=1000 mean=2.500 stddev=0.100");
    }
}
