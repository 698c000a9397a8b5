//! Waveform QC plugin configuration.
//!
//! This crate provides:
//! - [`PluginConfiguration`]: the resolved key/value view a plugin consumes
//!   exactly once at `initialize` time
//! - [`RegistryConfiguration`]: the plugin-name → configuration map the
//!   orchestrating service hands to the engine
//!
//! Resolution of files, environment, and defaults happens upstream; the
//! engine only ever sees the resolved view.

pub mod configuration;

pub use configuration::{PluginConfiguration, RegistryConfiguration};
