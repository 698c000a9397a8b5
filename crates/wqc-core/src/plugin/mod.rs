//! Detector plugin contract and lifecycle.
//!
//! Each detector implements [`WaveformQcPlugin`]: it consumes channel
//! segments, state-of-health statuses, and pre-existing masks, and produces
//! candidate new masks that have not yet been merged. Plugins are registered
//! by name in a [`PluginRegistry`] and configured exactly once through
//! [`WaveformQcPlugin::initialize`].
//!
//! # Lifecycle
//!
//! `initialize` is a one-time state transition, modeled by the internal
//! [`PluginState`] machine rather than a nullable field. Calling it twice,
//! or generating masks before it, fails with an invalid-state error; the
//! instance is not recoverable for reconfiguration — construct a new one.
//! The caller establishes the initialize-before-generate ordering by
//! construction order; there is no internal locking.

pub mod gap;
pub mod registry;
pub mod repeated_amplitude;
pub mod soh;
pub mod spike;

pub use gap::GapQcPlugin;
pub use registry::PluginRegistry;
pub use repeated_amplitude::RepeatedAmplitudeQcPlugin;
pub use soh::ChannelSohQcPlugin;
pub use spike::SpikeQcPlugin;

use crate::mask::QcMask;
use crate::waveform::{ChannelSegment, ChannelSohStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use wqc_common::{CreationInfoId, Error, Result};
use wqc_config::PluginConfiguration;

/// Semantic version of a plugin implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PluginVersion {
    pub fn from(major: u32, minor: u32, patch: u32) -> Self {
        PluginVersion {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Capability contract shared by all QC detector variants.
pub trait WaveformQcPlugin: Send {
    /// Stable identifier used for registry lookup and configuration keying.
    fn name(&self) -> &'static str;

    /// Implementation version.
    fn version(&self) -> PluginVersion;

    /// Bind algorithm parameters. Must be called exactly once, before any
    /// call to [`generate_masks`](Self::generate_masks).
    fn initialize(&mut self, config: PluginConfiguration) -> Result<()>;

    /// Produce candidate new masks (version 1, no parents, not yet merged).
    ///
    /// Inputs are read-only; `existing_masks` is never mutated and only
    /// consulted to suppress duplicates. Fails with an invalid-state error
    /// if the plugin was never initialized.
    fn generate_masks(
        &self,
        segments: &[ChannelSegment],
        soh_statuses: &[ChannelSohStatus],
        existing_masks: &[QcMask],
        creation_info_id: CreationInfoId,
    ) -> Result<Vec<QcMask>>;
}

/// One-shot initialization state machine shared by the detector plugins.
///
/// The only legal transition is `Uninitialized → Ready`; both illegal moves
/// (re-binding, use before binding) surface as [`Error::InvalidState`].
#[derive(Debug)]
pub(crate) enum PluginState<T> {
    Uninitialized,
    Ready(T),
}

impl<T> PluginState<T> {
    /// Transition to `Ready`, consuming the bound parameters.
    pub(crate) fn bind(&mut self, plugin: &str, params: T) -> Result<()> {
        match self {
            PluginState::Uninitialized => {
                *self = PluginState::Ready(params);
                Ok(())
            }
            PluginState::Ready(_) => Err(Error::InvalidState(format!(
                "{plugin} cannot be initialized twice"
            ))),
        }
    }

    /// Bound parameters, or an invalid-state error before `bind`.
    pub(crate) fn ready(&self, plugin: &str) -> Result<&T> {
        match self {
            PluginState::Ready(params) => Ok(params),
            PluginState::Uninitialized => Err(Error::InvalidState(format!(
                "{plugin} cannot be used before it is initialized"
            ))),
        }
    }
}

/// Whether a non-rejected existing mask of the same type already covers the
/// candidate span. Detectors use this to avoid re-raising findings the
/// stored history already records.
pub(crate) fn covered_by_existing(
    existing: &[QcMask],
    qc_type: crate::mask::QcMaskType,
    start: chrono::DateTime<chrono::Utc>,
    end: chrono::DateTime<chrono::Utc>,
) -> bool {
    existing.iter().any(|mask| {
        let v = mask.current_version();
        !v.rejected
            && v.qc_type == Some(qc_type)
            && v.span().is_some_and(|(s, e)| s <= start && end <= e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_version_displays_as_semver() {
        assert_eq!(PluginVersion::from(1, 0, 3).to_string(), "1.0.3");
    }

    #[test]
    fn bind_then_ready() {
        let mut state = PluginState::Uninitialized;
        state.bind("testPlugin", 7u32).unwrap();
        assert_eq!(*state.ready("testPlugin").unwrap(), 7);
    }

    #[test]
    fn ready_before_bind_is_invalid_state() {
        let state: PluginState<u32> = PluginState::Uninitialized;
        let err = state.ready("testPlugin").unwrap_err();
        assert_eq!(err.code(), 30);
    }

    #[test]
    fn double_bind_is_invalid_state_and_keeps_first_binding() {
        let mut state = PluginState::Uninitialized;
        state.bind("testPlugin", 7u32).unwrap();
        let err = state.bind("testPlugin", 9u32).unwrap_err();
        assert_eq!(err.code(), 30);
        // The first binding remains in effect.
        assert_eq!(*state.ready("testPlugin").unwrap(), 7);
    }
}
