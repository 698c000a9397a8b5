//! Gap detector: masks holes in the acquired sample timeline.

use super::{covered_by_existing, PluginState, PluginVersion, WaveformQcPlugin};
use crate::mask::{QcMask, QcMaskCategory, QcMaskType};
use crate::waveform::{ChannelSegment, ChannelSohStatus};
use chrono::Duration;
use std::collections::BTreeMap;
use tracing::debug;
use wqc_common::{ChannelId, CreationInfoId, Result};
use wqc_config::PluginConfiguration;

const PLUGIN_NAME: &str = "waveformGapQcPlugin";
const VERSION: PluginVersion = PluginVersion {
    major: 1,
    minor: 0,
    patch: 0,
};
const KNOWN_KEYS: &[&str] = &["min_long_gap_length_secs"];
const RATIONALE: &str = "System created gap mask";

#[derive(Debug)]
struct GapParams {
    /// Gaps at most this long are repairable; longer ones are long gaps.
    min_long_gap_length: Duration,
}

/// Detects holes between consecutive segments on a channel.
///
/// A hole longer than one nominal sample period is a gap. Gaps no longer
/// than `min_long_gap_length_secs` become [`QcMaskType::RepairableGap`]
/// masks, longer ones [`QcMaskType::LongGap`].
#[derive(Debug)]
pub struct GapQcPlugin {
    state: PluginState<GapParams>,
}

impl GapQcPlugin {
    pub fn new() -> Self {
        GapQcPlugin {
            state: PluginState::Uninitialized,
        }
    }
}

impl Default for GapQcPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveformQcPlugin for GapQcPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn version(&self) -> PluginVersion {
        VERSION
    }

    fn initialize(&mut self, config: PluginConfiguration) -> Result<()> {
        config.ensure_only_known_keys(PLUGIN_NAME, KNOWN_KEYS)?;
        let params = GapParams {
            min_long_gap_length: config.require_duration_secs("min_long_gap_length_secs")?,
        };
        self.state.bind(PLUGIN_NAME, params)
    }

    fn generate_masks(
        &self,
        segments: &[ChannelSegment],
        _soh_statuses: &[ChannelSohStatus],
        existing_masks: &[QcMask],
        creation_info_id: CreationInfoId,
    ) -> Result<Vec<QcMask>> {
        let params = self.state.ready(PLUGIN_NAME)?;

        let mut by_channel: BTreeMap<ChannelId, Vec<&ChannelSegment>> = BTreeMap::new();
        for segment in segments.iter().filter(|s| !s.samples.is_empty()) {
            by_channel.entry(segment.channel_id).or_default().push(segment);
        }

        let mut masks = Vec::new();
        for (channel_id, mut channel_segments) in by_channel {
            channel_segments.sort_by_key(|s| s.start);
            for pair in channel_segments.windows(2) {
                let (before, after) = (pair[0], pair[1]);
                let hole = after.start - before.end();
                // Up to one sample period between segments is continuous data.
                if hole <= before.sample_period() {
                    continue;
                }
                let qc_type = if hole <= params.min_long_gap_length {
                    QcMaskType::RepairableGap
                } else {
                    QcMaskType::LongGap
                };
                if covered_by_existing(existing_masks, qc_type, before.end(), after.start) {
                    continue;
                }
                masks.push(QcMask::create(
                    channel_id,
                    Vec::new(),
                    vec![before.id, after.id],
                    QcMaskCategory::WaveformQuality,
                    qc_type,
                    RATIONALE,
                    before.end(),
                    after.start,
                    creation_info_id,
                )?);
            }
        }
        debug!(plugin = PLUGIN_NAME, masks = masks.len(), "generated candidate masks");
        Ok(masks)
    }
}
