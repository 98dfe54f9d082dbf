// FlowLink Gateway - LoRa receiver and collector forwarding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Plausibility grading of received records.
//!
//! The grade only feeds the receive log. Records are forwarded whatever
//! their grade; the collector applies the same rules on its side.

use flowlink::StatisticsRecord;
use std::fmt;

/// Mean flow above which a record is flagged (volume units per minute).
pub const HIGH_FLOW_THRESHOLD: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataQuality {
    Good,
    /// Mean or standard deviation is NaN.
    InvalidNumbers,
    NegativeValues,
    /// Mean above [`HIGH_FLOW_THRESHOLD`].
    HighFlowWarning,
    /// Standard deviation larger than a positive mean.
    HighVariation,
}

impl DataQuality {
    /// Grade a record; the first matching rule wins.
    pub fn assess(record: &StatisticsRecord) -> Self {
        let (mean, stddev) = (record.mean, record.stddev);
        if mean.is_nan() || stddev.is_nan() {
            Self::InvalidNumbers
        } else if mean < 0.0 || stddev < 0.0 {
            Self::NegativeValues
        } else if mean > HIGH_FLOW_THRESHOLD {
            Self::HighFlowWarning
        } else if stddev > mean && mean > 0.0 {
            Self::HighVariation
        } else {
            Self::Good
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Good => "Good",
            Self::InvalidNumbers => "Invalid_Numbers",
            Self::NegativeValues => "Negative_Values",
            Self::HighFlowWarning => "High_Flow_Warning",
            Self::HighVariation => "High_Variation",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(mean: f32, stddev: f32) -> DataQuality {
        DataQuality::assess(&StatisticsRecord::new(0, mean, stddev))
    }

    #[test]
    fn test_grades() {
        assert_eq!(grade(2.456, 0.123), DataQuality::Good);
        assert_eq!(grade(0.0, 0.0), DataQuality::Good);
        assert_eq!(grade(f32::NAN, 0.0), DataQuality::InvalidNumbers);
        assert_eq!(grade(1.0, -0.5), DataQuality::NegativeValues);
        assert_eq!(grade(150.0, 1.0), DataQuality::HighFlowWarning);
        assert_eq!(grade(2.0, 3.0), DataQuality::HighVariation);
    }

    #[test]
    fn test_rule_order() {
        // High flow is reported before high variation
        assert_eq!(grade(2400.0, 5000.0), DataQuality::HighFlowWarning);
        // Zero mean never counts as high variation
        assert_eq!(grade(0.0, 1.0), DataQuality::Good);
    }

    #[test]
    fn test_labels() {
        assert_eq!(DataQuality::HighFlowWarning.to_string(), "High_Flow_Warning");
        assert!(DataQuality::Good.is_good());
    }
}
