//! Waveform QC mask engine.
//!
//! The engine reconciles quality-control annotations ("masks") over channel
//! waveform data. It has three parts:
//!
//! - [`mask`] — the versioned QcMask aggregate: an append-only history of
//!   immutable versions with a derived current version.
//! - [`plugin`] — the detector contract and registry. Each detector consumes
//!   channel segments, state-of-health statuses, and pre-existing masks and
//!   produces candidate new masks.
//! - [`merge`] — the merge algorithm that reconciles candidate masks against
//!   previously stored masks on a channel and returns exactly the set the
//!   caller must persist.
//!
//! The engine is synchronous and side-effect-free: it never touches durable
//! storage, performs no I/O, and leaves retry policy to the orchestrating
//! caller. Callers must serialize merges per (channel, category, type,
//! rationale) key; the engine assumes a consistent snapshot of existing
//! masks per invocation.

pub mod mask;
pub mod merge;
pub mod plugin;
pub mod waveform;

pub use mask::{QcMask, QcMaskCategory, QcMaskType, QcMaskVersion, QcMaskVersionReference};
pub use merge::merge;
pub use plugin::{PluginRegistry, PluginVersion, WaveformQcPlugin};
pub use waveform::{ChannelSegment, ChannelSohStatus, SohStatusInterval, SohStatusType};
