//! Channel SOH detector: masks intervals where a state-of-health bit is set.

use super::{covered_by_existing, PluginState, PluginVersion, WaveformQcPlugin};
use crate::mask::{QcMask, QcMaskCategory};
use crate::waveform::{ChannelSegment, ChannelSohStatus, SohStatusType};
use std::collections::HashSet;
use tracing::debug;
use wqc_common::{CreationInfoId, Error, Result};
use wqc_config::PluginConfiguration;

const PLUGIN_NAME: &str = "channelSohQcPlugin";
const VERSION: PluginVersion = PluginVersion {
    major: 1,
    minor: 0,
    patch: 0,
};
const KNOWN_KEYS: &[&str] = &["excluded_status_types"];

#[derive(Debug)]
struct SohParams {
    excluded: HashSet<SohStatusType>,
}

/// Turns set state-of-health status intervals into `StationSoh` masks of the
/// type each status maps to, skipping statuses the configuration excludes
/// and intervals the stored history already covers.
#[derive(Debug)]
pub struct ChannelSohQcPlugin {
    state: PluginState<SohParams>,
}

impl ChannelSohQcPlugin {
    pub fn new() -> Self {
        ChannelSohQcPlugin {
            state: PluginState::Uninitialized,
        }
    }
}

impl Default for ChannelSohQcPlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_status_type(name: &str) -> Result<SohStatusType> {
    match name {
        "clipped" => Ok(SohStatusType::Clipped),
        "calibration_underway" => Ok(SohStatusType::CalibrationUnderway),
        "dead_sensor_channel" => Ok(SohStatusType::DeadSensorChannel),
        "zeroed_data" => Ok(SohStatusType::ZeroedData),
        "main_power_failure" => Ok(SohStatusType::MainPowerFailure),
        "gps_receiver_off" => Ok(SohStatusType::GpsReceiverOff),
        other => Err(Error::Config(format!(
            "unknown SOH status type `{other}` in `excluded_status_types`"
        ))),
    }
}

impl WaveformQcPlugin for ChannelSohQcPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn version(&self) -> PluginVersion {
        VERSION
    }

    fn initialize(&mut self, config: PluginConfiguration) -> Result<()> {
        config.ensure_only_known_keys(PLUGIN_NAME, KNOWN_KEYS)?;
        let excluded = config
            .opt_str_array("excluded_status_types")?
            .iter()
            .map(|name| parse_status_type(name))
            .collect::<Result<HashSet<_>>>()?;
        self.state.bind(PLUGIN_NAME, SohParams { excluded })
    }

    fn generate_masks(
        &self,
        _segments: &[ChannelSegment],
        soh_statuses: &[ChannelSohStatus],
        existing_masks: &[QcMask],
        creation_info_id: CreationInfoId,
    ) -> Result<Vec<QcMask>> {
        let params = self.state.ready(PLUGIN_NAME)?;

        let mut masks = Vec::new();
        for status in soh_statuses {
            if params.excluded.contains(&status.status_type) {
                continue;
            }
            let qc_type = status.status_type.mask_type();
            for interval in status.intervals.iter().filter(|iv| iv.set) {
                if covered_by_existing(existing_masks, qc_type, interval.start, interval.end) {
                    continue;
                }
                masks.push(QcMask::create(
                    status.channel_id,
                    Vec::new(),
                    Vec::new(),
                    QcMaskCategory::StationSoh,
                    qc_type,
                    format!("System created: {}", status.status_type),
                    interval.start,
                    interval.end,
                    creation_info_id,
                )?);
            }
        }
        debug!(plugin = PLUGIN_NAME, masks = masks.len(), "generated candidate masks");
        Ok(masks)
    }
}
