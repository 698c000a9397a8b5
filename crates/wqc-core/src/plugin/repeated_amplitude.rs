//! Repeated-amplitude detector: masks runs of samples stuck at one value.

use super::{covered_by_existing, PluginState, PluginVersion, WaveformQcPlugin};
use crate::mask::{QcMask, QcMaskCategory, QcMaskType};
use crate::waveform::{ChannelSegment, ChannelSohStatus};
use tracing::debug;
use wqc_common::{CreationInfoId, Error, Result};
use wqc_config::PluginConfiguration;

const PLUGIN_NAME: &str = "waveformRepeatedAmplitudeQcPlugin";
const VERSION: PluginVersion = PluginVersion {
    major: 1,
    minor: 0,
    patch: 0,
};
const KNOWN_KEYS: &[&str] = &["min_series_length", "max_delta"];
const RATIONALE: &str = "System created repeated adjacent amplitude mask";

#[derive(Debug)]
struct RepeatedAmplitudeParams {
    /// Minimum run length, in samples, to raise a mask.
    min_series_length: usize,
    /// A run continues while samples stay within this delta of its first
    /// sample. Zero means exact repetition only.
    max_delta: f64,
}

/// Detects runs of at least `min_series_length` adjacent samples whose
/// values all sit within `max_delta` of the run's first sample, producing
/// [`QcMaskType::RepeatedAdjacentAmplitudeValue`] masks.
#[derive(Debug)]
pub struct RepeatedAmplitudeQcPlugin {
    state: PluginState<RepeatedAmplitudeParams>,
}

impl RepeatedAmplitudeQcPlugin {
    pub fn new() -> Self {
        RepeatedAmplitudeQcPlugin {
            state: PluginState::Uninitialized,
        }
    }
}

impl Default for RepeatedAmplitudeQcPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveformQcPlugin for RepeatedAmplitudeQcPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn version(&self) -> PluginVersion {
        VERSION
    }

    fn initialize(&mut self, config: PluginConfiguration) -> Result<()> {
        config.ensure_only_known_keys(PLUGIN_NAME, KNOWN_KEYS)?;
        let min_series_length = config.require_u64("min_series_length")? as usize;
        if min_series_length < 2 {
            return Err(Error::Config(
                "key `min_series_length` must be at least 2".to_string(),
            ));
        }
        let max_delta = config.require_f64("max_delta")?;
        if !max_delta.is_finite() || max_delta < 0.0 {
            return Err(Error::Config(format!(
                "key `max_delta` must be finite and non-negative, got {max_delta}"
            )));
        }
        self.state.bind(
            PLUGIN_NAME,
            RepeatedAmplitudeParams {
                min_series_length,
                max_delta,
            },
        )
    }

    fn generate_masks(
        &self,
        segments: &[ChannelSegment],
        _soh_statuses: &[ChannelSohStatus],
        existing_masks: &[QcMask],
        creation_info_id: CreationInfoId,
    ) -> Result<Vec<QcMask>> {
        let params = self.state.ready(PLUGIN_NAME)?;

        let mut masks = Vec::new();
        for segment in segments {
            let samples = &segment.samples;
            let mut run_start = 0;
            while run_start < samples.len() {
                let anchor = samples[run_start];
                let mut run_end = run_start + 1;
                while run_end < samples.len()
                    && (samples[run_end] - anchor).abs() <= params.max_delta
                {
                    run_end += 1;
                }
                let run_len = run_end - run_start;
                if run_len >= params.min_series_length {
                    let start = segment.time_of_sample(run_start);
                    let end = segment.time_of_sample(run_end - 1);
                    if !covered_by_existing(
                        existing_masks,
                        QcMaskType::RepeatedAdjacentAmplitudeValue,
                        start,
                        end,
                    ) {
                        masks.push(QcMask::create(
                            segment.channel_id,
                            Vec::new(),
                            vec![segment.id],
                            QcMaskCategory::WaveformQuality,
                            QcMaskType::RepeatedAdjacentAmplitudeValue,
                            RATIONALE,
                            start,
                            end,
                            creation_info_id,
                        )?);
                    }
                }
                run_start = run_end;
            }
        }
        debug!(plugin = PLUGIN_NAME, masks = masks.len(), "generated candidate masks");
        Ok(masks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use wqc_common::{ChannelId, SegmentId};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn segment(samples: Vec<f64>) -> ChannelSegment {
        ChannelSegment {
            id: SegmentId::new(),
            channel_id: ChannelId::new(),
            name: "seg".to_string(),
            start: t(0),
            sample_rate_hz: 1.0,
            samples,
        }
    }

    fn initialized(min_series_length: u64, max_delta: f64) -> RepeatedAmplitudeQcPlugin {
        let mut plugin = RepeatedAmplitudeQcPlugin::new();
        plugin
            .initialize(
                PluginConfiguration::empty()
                    .with("min_series_length", min_series_length)
                    .with("max_delta", max_delta),
            )
            .unwrap();
        plugin
    }

    #[test]
    fn min_series_length_below_two_is_rejected() {
        let mut plugin = RepeatedAmplitudeQcPlugin::new();
        let err = plugin
            .initialize(
                PluginConfiguration::empty()
                    .with("min_series_length", 1)
                    .with("max_delta", 0.0),
            )
            .unwrap_err();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn exact_repetition_run_is_masked() {
        let seg = segment(vec![1.0, 2.0, 5.0, 5.0, 5.0, 5.0, 3.0]);
        let plugin = initialized(4, 0.0);
        let masks = plugin
            .generate_masks(&[seg], &[], &[], CreationInfoId::new())
            .unwrap();
        assert_eq!(masks.len(), 1);
        let v = masks[0].current_version();
        assert_eq!(v.qc_type, Some(QcMaskType::RepeatedAdjacentAmplitudeValue));
        // Samples 2..=5 at 1 Hz.
        assert_eq!(v.span(), Some((t(2), t(5))));
    }

    #[test]
    fn run_shorter_than_minimum_is_ignored() {
        let seg = segment(vec![5.0, 5.0, 5.0, 1.0, 2.0]);
        let plugin = initialized(4, 0.0);
        let masks = plugin
            .generate_masks(&[seg], &[], &[], CreationInfoId::new())
            .unwrap();
        assert!(masks.is_empty());
    }

    #[test]
    fn tolerance_extends_the_run() {
        // Values drift by 0.01 around the anchor; within max_delta 0.05.
        let seg = segment(vec![1.0, 1.01, 0.99, 1.02, 7.0]);
        let plugin = initialized(4, 0.05);
        let masks = plugin
            .generate_masks(&[seg], &[], &[], CreationInfoId::new())
            .unwrap();
        assert_eq!(masks.len(), 1);
        assert_eq!(masks[0].current_version().span(), Some((t(0), t(3))));
    }

    #[test]
    fn two_separate_runs_yield_two_masks() {
        let seg = segment(vec![5.0, 5.0, 1.0, 2.0, 9.0, 9.0, 9.0]);
        let plugin = initialized(2, 0.0);
        let masks = plugin
            .generate_masks(&[seg], &[], &[], CreationInfoId::new())
            .unwrap();
        assert_eq!(masks.len(), 2);
    }

    #[test]
    fn covered_run_is_not_re_raised() {
        let seg = segment(vec![5.0, 5.0, 5.0, 5.0]);
        let existing = QcMask::create(
            seg.channel_id,
            Vec::new(),
            Vec::new(),
            QcMaskCategory::WaveformQuality,
            QcMaskType::RepeatedAdjacentAmplitudeValue,
            RATIONALE,
            t(0),
            t(3),
            CreationInfoId::new(),
        )
        .unwrap();
        let plugin = initialized(2, 0.0);
        let masks = plugin
            .generate_masks(&[seg], &[], &[existing], CreationInfoId::new())
            .unwrap();
        assert!(masks.is_empty());
    }
}
