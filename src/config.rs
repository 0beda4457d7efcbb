use crate::ledger::monitor::DEFAULT_MONITOR_BUFFER;
use crate::runtime::defaults::{DefaultValueGenerator, DefaultValues};
use crate::{MockError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Conventional configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".mock-dispatch.toml";

/// Per-mock configuration, passed by value to every mock that uses it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MockConfig {
    #[serde(default)]
    pub behavior: MockBehavior,
    /// Fallback-value policy; attached at runtime, never serialized
    #[serde(skip)]
    pub default_values: DefaultValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockBehavior {
    /// Raise `NotSetup` for unconfigured members instead of returning defaults
    #[serde(default)]
    pub throw_when_not_setup: bool,
    /// Call the base implementation when a setup defers the decision
    #[serde(default)]
    pub call_base_class: bool,
    /// Capacity of the live feed of monitor sessions
    #[serde(default = "default_monitor_buffer")]
    pub monitor_buffer: usize,
}

fn default_monitor_buffer() -> usize {
    DEFAULT_MONITOR_BUFFER
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            throw_when_not_setup: false,
            call_base_class: false,
            monitor_buffer: DEFAULT_MONITOR_BUFFER,
        }
    }
}

impl MockConfig {
    /// Lenient configuration: unconfigured members return generated defaults.
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Strict configuration: unconfigured members raise `NotSetup`.
    pub fn strict() -> Self {
        let mut config = Self::default();
        config.behavior.throw_when_not_setup = true;
        config
    }

    pub fn with_call_base_class(mut self, call_base_class: bool) -> Self {
        self.behavior.call_base_class = call_base_class;
        self
    }

    pub fn with_default_values<G: DefaultValueGenerator + 'static>(mut self, generator: G) -> Self {
        self.default_values = DefaultValues::new(generator);
        self
    }

    pub fn is_strict(&self) -> bool {
        self.behavior.throw_when_not_setup
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| MockError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Load configuration from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(MockConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            MockError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            MockError::Config(format!(
                "Failed to parse TOML config from {:?}: {}",
                path, e
            ))
        })
    }

    /// Load configuration, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load mock config: {}. Using defaults.", e);
                MockConfig::default()
            }
        }
    }
}
