//! Spike detector: masks isolated samples far outside their neighborhood.

use super::{covered_by_existing, PluginState, PluginVersion, WaveformQcPlugin};
use crate::mask::{QcMask, QcMaskCategory, QcMaskType};
use crate::waveform::{ChannelSegment, ChannelSohStatus};
use tracing::debug;
use wqc_common::{CreationInfoId, Error, Result};
use wqc_config::PluginConfiguration;

const PLUGIN_NAME: &str = "waveformSpikeQcPlugin";
const VERSION: PluginVersion = PluginVersion {
    major: 1,
    minor: 0,
    patch: 0,
};
const KNOWN_KEYS: &[&str] = &[
    "rms_lead_sample_count",
    "rms_lag_sample_count",
    "rms_amplitude_ratio_threshold",
];
const RATIONALE: &str = "System created spike mask";

#[derive(Debug)]
struct SpikeParams {
    lead: usize,
    lag: usize,
    /// A sample is a spike when its magnitude exceeds this multiple of the
    /// RMS of its lead/lag window (the sample itself excluded).
    ratio_threshold: f64,
}

/// Detects single-sample spikes by comparing each interior sample's
/// magnitude against the RMS of its surrounding window, producing
/// zero-length [`QcMaskType::Spike`] masks at the offending instants.
#[derive(Debug)]
pub struct SpikeQcPlugin {
    state: PluginState<SpikeParams>,
}

impl SpikeQcPlugin {
    pub fn new() -> Self {
        SpikeQcPlugin {
            state: PluginState::Uninitialized,
        }
    }
}

impl Default for SpikeQcPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveformQcPlugin for SpikeQcPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn version(&self) -> PluginVersion {
        VERSION
    }

    fn initialize(&mut self, config: PluginConfiguration) -> Result<()> {
        config.ensure_only_known_keys(PLUGIN_NAME, KNOWN_KEYS)?;
        let lead = config.require_u64("rms_lead_sample_count")? as usize;
        let lag = config.require_u64("rms_lag_sample_count")? as usize;
        if lead == 0 && lag == 0 {
            return Err(Error::Config(
                "spike detection requires a non-empty lead or lag window".to_string(),
            ));
        }
        let ratio_threshold = config.require_f64("rms_amplitude_ratio_threshold")?;
        if !ratio_threshold.is_finite() || ratio_threshold <= 0.0 {
            return Err(Error::Config(format!(
                "key `rms_amplitude_ratio_threshold` must be positive, got {ratio_threshold}"
            )));
        }
        self.state.bind(
            PLUGIN_NAME,
            SpikeParams {
                lead,
                lag,
                ratio_threshold,
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
            if samples.len() <= params.lead + params.lag {
                continue;
            }
            for i in params.lead..samples.len() - params.lag {
                let window = samples[i - params.lead..i]
                    .iter()
                    .chain(&samples[i + 1..=i + params.lag]);
                let (mut sum_sq, mut count) = (0.0f64, 0usize);
                for value in window {
                    sum_sq += value * value;
                    count += 1;
                }
                let rms = (sum_sq / count as f64).sqrt();
                if rms <= 0.0 || samples[i].abs() <= params.ratio_threshold * rms {
                    continue;
                }
                let at = segment.time_of_sample(i);
                if covered_by_existing(existing_masks, QcMaskType::Spike, at, at) {
                    continue;
                }
                masks.push(QcMask::create(
                    segment.channel_id,
                    Vec::new(),
                    vec![segment.id],
                    QcMaskCategory::WaveformQuality,
                    QcMaskType::Spike,
                    RATIONALE,
                    at,
                    at,
                    creation_info_id,
                )?);
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

    fn initialized(lead: u64, lag: u64, ratio: f64) -> SpikeQcPlugin {
        let mut plugin = SpikeQcPlugin::new();
        plugin
            .initialize(
                PluginConfiguration::empty()
                    .with("rms_lead_sample_count", lead)
                    .with("rms_lag_sample_count", lag)
                    .with("rms_amplitude_ratio_threshold", ratio),
            )
            .unwrap();
        plugin
    }

    #[test]
    fn empty_window_config_is_rejected() {
        let mut plugin = SpikeQcPlugin::new();
        let err = plugin
            .initialize(
                PluginConfiguration::empty()
                    .with("rms_lead_sample_count", 0)
                    .with("rms_lag_sample_count", 0)
                    .with("rms_amplitude_ratio_threshold", 4.0),
            )
            .unwrap_err();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn outlier_sample_is_masked_at_its_instant() {
        let mut samples = vec![1.0; 9];
        samples[4] = 50.0;
        let plugin = initialized(2, 2, 4.0);
        let masks = plugin
            .generate_masks(&[segment(samples)], &[], &[], CreationInfoId::new())
            .unwrap();
        assert_eq!(masks.len(), 1);
        let v = masks[0].current_version();
        assert_eq!(v.qc_type, Some(QcMaskType::Spike));
        assert_eq!(v.span(), Some((t(4), t(4))));
    }

    #[test]
    fn steady_signal_produces_no_masks() {
        let plugin = initialized(2, 2, 4.0);
        let masks = plugin
            .generate_masks(
                &[segment(vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0])],
                &[],
                &[],
                CreationInfoId::new(),
            )
            .unwrap();
        assert!(masks.is_empty());
    }

    #[test]
    fn segment_shorter_than_window_is_skipped() {
        let plugin = initialized(3, 3, 4.0);
        let masks = plugin
            .generate_masks(&[segment(vec![1.0, 100.0, 1.0])], &[], &[], CreationInfoId::new())
            .unwrap();
        assert!(masks.is_empty());
    }

    #[test]
    fn all_zero_window_cannot_flag_spikes() {
        // RMS of zeros is zero; the ratio test is undefined there and the
        // sample is skipped rather than divided by zero.
        let plugin = initialized(1, 1, 4.0);
        let masks = plugin
            .generate_masks(&[segment(vec![0.0, 3.0, 0.0])], &[], &[], CreationInfoId::new())
            .unwrap();
        assert!(masks.is_empty());
    }

    #[test]
    fn covered_spike_is_not_re_raised() {
        let mut samples = vec![1.0; 9];
        samples[4] = 50.0;
        let seg = segment(samples);
        let existing = QcMask::create(
            seg.channel_id,
            Vec::new(),
            Vec::new(),
            QcMaskCategory::WaveformQuality,
            QcMaskType::Spike,
            RATIONALE,
            t(4),
            t(4),
            CreationInfoId::new(),
        )
        .unwrap();
        let plugin = initialized(2, 2, 4.0);
        let masks = plugin
            .generate_masks(&[seg], &[], &[existing], CreationInfoId::new())
            .unwrap();
        assert!(masks.is_empty());
    }
}
