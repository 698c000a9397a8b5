//! QC classification enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a QC finding: which subsystem raised it and at what level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcMaskCategory {
    /// Manually raised by an analyst.
    AnalystDefined,
    /// Produced by automated channel processing (the detector plugins).
    ChannelProcessing,
    /// Data authentication findings.
    DataAuthentication,
    /// Derived from station state-of-health statuses.
    StationSoh,
    /// Signal-quality findings on the waveform itself.
    WaveformQuality,
    /// Terminal rejection state. Only valid on rejected versions.
    Rejected,
}

impl QcMaskCategory {
    /// Whether `qc_type` is a legal type for a version in this category.
    ///
    /// `Rejected` admits no type at all; the remaining categories each admit
    /// the types their producing subsystem can raise.
    pub fn allows(self, qc_type: QcMaskType) -> bool {
        use QcMaskType::*;
        match self {
            QcMaskCategory::AnalystDefined => true,
            QcMaskCategory::ChannelProcessing | QcMaskCategory::WaveformQuality => matches!(
                qc_type,
                RepairableGap | LongGap | RepeatedAdjacentAmplitudeValue | Spike
            ),
            QcMaskCategory::DataAuthentication => true,
            QcMaskCategory::StationSoh => matches!(
                qc_type,
                SensorProblem | StationProblem | Calibration | Timing
            ),
            QcMaskCategory::Rejected => false,
        }
    }
}

impl fmt::Display for QcMaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QcMaskCategory::AnalystDefined => "ANALYST_DEFINED",
            QcMaskCategory::ChannelProcessing => "CHANNEL_PROCESSING",
            QcMaskCategory::DataAuthentication => "DATA_AUTHENTICATION",
            QcMaskCategory::StationSoh => "STATION_SOH",
            QcMaskCategory::WaveformQuality => "WAVEFORM_QUALITY",
            QcMaskCategory::Rejected => "REJECTED",
        };
        write!(f, "{}", s)
    }
}

/// Specific kind of QC finding within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcMaskType {
    /// Instrument-level fault on the sensor.
    SensorProblem,
    /// Station-level fault (power, telemetry).
    StationProblem,
    /// Calibration underway; data not representative.
    Calibration,
    /// Timing-quality problem (e.g. GPS receiver off).
    Timing,
    /// Data hole short enough to interpolate across.
    RepairableGap,
    /// Data hole too long to repair.
    LongGap,
    /// Run of adjacent samples stuck at one amplitude.
    RepeatedAdjacentAmplitudeValue,
    /// Isolated sample wildly out of line with its neighborhood.
    Spike,
}

impl fmt::Display for QcMaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QcMaskType::SensorProblem => "SENSOR_PROBLEM",
            QcMaskType::StationProblem => "STATION_PROBLEM",
            QcMaskType::Calibration => "CALIBRATION",
            QcMaskType::Timing => "TIMING",
            QcMaskType::RepairableGap => "REPAIRABLE_GAP",
            QcMaskType::LongGap => "LONG_GAP",
            QcMaskType::RepeatedAdjacentAmplitudeValue => "REPEATED_ADJACENT_AMPLITUDE_VALUE",
            QcMaskType::Spike => "SPIKE",
        };
        write!(f, "{}", s)
    }
}
