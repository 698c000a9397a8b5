//! Name-keyed registry of detector plugin instances.

use super::WaveformQcPlugin;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Maps plugin name to instance. Holds opaque trait objects only; no QC or
/// merge logic lives here.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<&'static str, Box<dyn WaveformQcPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its own name. A name collision overwrites the
    /// previous instance — last writer wins, by design, so an orchestrator
    /// can swap a detector implementation without a separate removal step.
    pub fn register(&mut self, plugin: Box<dyn WaveformQcPlugin>) {
        let name = plugin.name();
        if self.plugins.insert(name, plugin).is_some() {
            warn!(plugin = name, "replaced previously registered plugin");
        } else {
            debug!(plugin = name, "registered plugin");
        }
    }

    /// Look up a plugin by name. Absent is an empty result, not an error.
    pub fn lookup(&self, name: &str) -> Option<&dyn WaveformQcPlugin> {
        self.plugins.get(name).map(|plugin| &**plugin)
    }

    /// Mutable lookup, needed to drive `initialize`.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut (dyn WaveformQcPlugin + '_)> {
        match self.plugins.get_mut(name) {
            Some(plugin) => Some(&mut **plugin),
            None => None,
        }
    }

    /// Registered plugin names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
