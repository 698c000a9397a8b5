//! Read-only boundary input types handed to detector plugins.
//!
//! The waveform/SOH supplier produces these; the engine never mutates them
//! and never fetches them itself.

use crate::mask::QcMaskType;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use wqc_common::{ChannelId, SegmentId};

/// An acquired block of ordered waveform samples on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSegment {
    pub id: SegmentId,
    pub channel_id: ChannelId,
    /// Display name, e.g. "ASAR/SHZ segment".
    pub name: String,
    /// Time of the first sample.
    pub start: DateTime<Utc>,
    pub sample_rate_hz: f64,
    pub samples: Vec<f64>,
}

impl ChannelSegment {
    /// Nominal spacing between adjacent samples.
    pub fn sample_period(&self) -> Duration {
        Duration::nanoseconds((1e9 / self.sample_rate_hz).round() as i64)
    }

    /// Time of the sample at `index`.
    pub fn time_of_sample(&self, index: usize) -> DateTime<Utc> {
        self.start + Duration::nanoseconds((index as f64 / self.sample_rate_hz * 1e9).round() as i64)
    }

    /// Time of the last sample. Equals `start` for a single-sample segment.
    pub fn end(&self) -> DateTime<Utc> {
        self.time_of_sample(self.samples.len().saturating_sub(1))
    }
}

/// State-of-health status kinds that can warrant a QC mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SohStatusType {
    Clipped,
    CalibrationUnderway,
    DeadSensorChannel,
    ZeroedData,
    MainPowerFailure,
    GpsReceiverOff,
}

impl SohStatusType {
    /// The QC mask type raised when this status is set.
    pub fn mask_type(self) -> QcMaskType {
        match self {
            SohStatusType::Clipped
            | SohStatusType::DeadSensorChannel
            | SohStatusType::ZeroedData => QcMaskType::SensorProblem,
            SohStatusType::CalibrationUnderway => QcMaskType::Calibration,
            SohStatusType::MainPowerFailure => QcMaskType::StationProblem,
            SohStatusType::GpsReceiverOff => QcMaskType::Timing,
        }
    }
}

impl fmt::Display for SohStatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SohStatusType::Clipped => "clipped",
            SohStatusType::CalibrationUnderway => "calibration_underway",
            SohStatusType::DeadSensorChannel => "dead_sensor_channel",
            SohStatusType::ZeroedData => "zeroed_data",
            SohStatusType::MainPowerFailure => "main_power_failure",
            SohStatusType::GpsReceiverOff => "gps_receiver_off",
        };
        write!(f, "{}", s)
    }
}

/// One span of a status bit being set or clear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SohStatusInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// True when the status condition is present during this span.
    pub set: bool,
}

/// The history of one SOH status bit on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSohStatus {
    pub channel_id: ChannelId,
    pub status_type: SohStatusType,
    /// Contiguous, time-ordered intervals.
    pub intervals: Vec<SohStatusInterval>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn segment(start: i64, rate: f64, n: usize) -> ChannelSegment {
        ChannelSegment {
            id: SegmentId::new(),
            channel_id: ChannelId::new(),
            name: "test segment".to_string(),
            start: t(start),
            sample_rate_hz: rate,
            samples: vec![0.0; n],
        }
    }

    #[test]
    fn end_time_spans_samples() {
        // 40 samples at 20 Hz: last sample sits 39/20 = 1.95s after start.
        let seg = segment(100, 20.0, 40);
        assert_eq!(seg.end(), t(100) + Duration::milliseconds(1950));
    }

    #[test]
    fn single_sample_segment_ends_at_start() {
        let seg = segment(100, 20.0, 1);
        assert_eq!(seg.end(), seg.start);
    }

    #[test]
    fn sample_period_inverts_rate() {
        let seg = segment(0, 40.0, 2);
        assert_eq!(seg.sample_period(), Duration::milliseconds(25));
    }

    #[test]
    fn soh_status_maps_to_mask_type() {
        assert_eq!(
            SohStatusType::Clipped.mask_type(),
            QcMaskType::SensorProblem
        );
        assert_eq!(
            SohStatusType::GpsReceiverOff.mask_type(),
            QcMaskType::Timing
        );
    }
}
