//! Resolved plugin configuration views.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use wqc_common::{Error, Result};

/// Opaque key/value configuration handed to a plugin at `initialize` time.
///
/// Recognized keys are plugin-specific; a plugin validates the keys it was
/// given against the set it understands and rejects the rest, so a typo in
/// an upstream configuration file fails loudly instead of silently falling
/// back to a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginConfiguration {
    values: BTreeMap<String, Value>,
}

impl PluginConfiguration {
    /// Empty configuration (every getter will report a missing key).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from an already-resolved key/value map.
    pub fn from_map(values: BTreeMap<String, Value>) -> Self {
        PluginConfiguration { values }
    }

    /// Parse a configuration from a JSON object string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style insertion, mostly for tests and defaults.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// All keys present in this configuration.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Required floating-point parameter.
    pub fn require_f64(&self, key: &str) -> Result<f64> {
        self.require(key)?
            .as_f64()
            .ok_or_else(|| Error::Config(format!("key `{key}` must be a number")))
    }

    /// Required non-negative integer parameter.
    pub fn require_u64(&self, key: &str) -> Result<u64> {
        self.require(key)?
            .as_u64()
            .ok_or_else(|| Error::Config(format!("key `{key}` must be a non-negative integer")))
    }

    /// Required duration parameter, expressed in (possibly fractional) seconds.
    pub fn require_duration_secs(&self, key: &str) -> Result<Duration> {
        let secs = self.require_f64(key)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(Error::Config(format!(
                "key `{key}` must be a finite non-negative number of seconds, got {secs}"
            )));
        }
        Ok(Duration::nanoseconds((secs * 1e9).round() as i64))
    }

    /// Optional string-array parameter; absent means empty.
    pub fn opt_str_array(&self, key: &str) -> Result<Vec<String>> {
        match self.values.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        Error::Config(format!("key `{key}` must be an array of strings"))
                    })
                })
                .collect(),
            Some(_) => Err(Error::Config(format!(
                "key `{key}` must be an array of strings"
            ))),
        }
    }

    /// Reject keys outside the plugin's recognized set.
    pub fn ensure_only_known_keys(&self, plugin: &str, known: &[&str]) -> Result<()> {
        for key in self.values.keys() {
            if !known.contains(&key.as_str()) {
                return Err(Error::UnknownConfigKey {
                    plugin: plugin.to_string(),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    fn require(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| Error::Config(format!("missing required key `{key}`")))
    }
}

/// Plugin-name → configuration map for a whole registry.
///
/// This is the shape the orchestrating service produces after resolving its
/// configuration sources; each plugin consumes exactly its own entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryConfiguration {
    plugins: BTreeMap<String, PluginConfiguration>,
}

impl RegistryConfiguration {
    /// Parse from a JSON object keyed by plugin name.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Insert or replace the configuration for one plugin.
    pub fn insert(&mut self, plugin: &str, config: PluginConfiguration) {
        self.plugins.insert(plugin.to_string(), config);
    }

    /// Configuration for a plugin, if one was supplied.
    pub fn get(&self, plugin: &str) -> Option<&PluginConfiguration> {
        self.plugins.get(plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_f64_reads_numbers() {
        let config = PluginConfiguration::empty().with("max_delta", 0.5);
        assert_eq!(config.require_f64("max_delta").unwrap(), 0.5);
    }

    #[test]
    fn missing_key_is_config_error() {
        let config = PluginConfiguration::empty();
        let err = config.require_f64("max_delta").unwrap_err();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn wrong_type_is_config_error() {
        let config = PluginConfiguration::empty().with("max_delta", "half");
        assert!(config.require_f64("max_delta").is_err());
    }

    #[test]
    fn duration_secs_handles_fractions() {
        let config = PluginConfiguration::empty().with("min_long_gap_length_secs", 1.5);
        let d = config.require_duration_secs("min_long_gap_length_secs").unwrap();
        assert_eq!(d, Duration::milliseconds(1500));
    }

    #[test]
    fn negative_duration_rejected() {
        let config = PluginConfiguration::empty().with("min_long_gap_length_secs", -1.0);
        assert!(config.require_duration_secs("min_long_gap_length_secs").is_err());
    }

    #[test]
    fn unknown_key_names_plugin_and_key() {
        let config = PluginConfiguration::empty().with("max_deltaa", 0.5);
        let err = config
            .ensure_only_known_keys("waveformSpikeQcPlugin", &["max_delta"])
            .unwrap_err();
        assert_eq!(err.code(), 11);
        assert!(err.to_string().contains("max_deltaa"));
    }

    #[test]
    fn from_json_round_trip() {
        let config = PluginConfiguration::from_json_str(
            r#"{"min_series_length": 5, "max_delta": 0.001}"#,
        )
        .unwrap();
        assert_eq!(config.require_u64("min_series_length").unwrap(), 5);
        assert_eq!(config.require_f64("max_delta").unwrap(), 0.001);
    }

    #[test]
    fn registry_configuration_keyed_by_plugin_name() {
        let mut registry = RegistryConfiguration::default();
        registry.insert(
            "waveformGapQcPlugin",
            PluginConfiguration::empty().with("min_long_gap_length_secs", 2.0),
        );
        assert!(registry.get("waveformGapQcPlugin").is_some());
        assert!(registry.get("waveformSpikeQcPlugin").is_none());
    }

    #[test]
    fn opt_str_array_defaults_empty() {
        let config = PluginConfiguration::empty();
        assert!(config.opt_str_array("excluded_status_types").unwrap().is_empty());

        let config = PluginConfiguration::empty()
            .with("excluded_status_types", json!(["clipped", "zeroed"]));
        assert_eq!(
            config.opt_str_array("excluded_status_types").unwrap(),
            vec!["clipped", "zeroed"]
        );
    }
}
