// FlowLink Gateway - LoRa receiver and collector forwarding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Collector payload.

use crate::error::GatewayError;
use flowlink::StatisticsRecord;
use serde::{Deserialize, Serialize};

/// Body of the collector POST. The key names are the collector's contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectorPayload {
    /// Sender clock at the end of the epoch.
    pub timestamp: u32,
    /// Mean flow rate over the epoch.
    pub avg_flow_rate: f32,
    /// Standard deviation of the flow rate.
    pub std_flow_rate: f32,
}

impl CollectorPayload {
    pub fn to_json(&self) -> Result<String, GatewayError> {
        serde_json::to_string(self).map_err(|e| GatewayError::Payload(e.to_string()))
    }
}

impl From<&StatisticsRecord> for CollectorPayload {
    fn from(record: &StatisticsRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            avg_flow_rate: record.mean,
            std_flow_rate: record.stddev,
        }
    }
}
