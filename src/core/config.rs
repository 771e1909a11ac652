//! Serializable logger configuration
//!
//! ```
//! use bitmask_logger::core::LoggerConfig;
//!
//! let config = LoggerConfig::from_json(r#"{
//!     "name": "app",
//!     "custom_levels": ["audit"],
//!     "enabled": ["warning", "error", "audit"],
//!     "output_format": "logfmt"
//! }"#).unwrap();
//!
//! let logger = config.builder().build().unwrap();
//! assert!(logger.is_enabled(logger.level("audit").unwrap()));
//! ```

use super::error::Result;
use super::formatter::OutputFormat;
use super::logger::LoggerBuilder;
use super::registry::{CollisionPolicy, Registry};
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfig {
    pub name: String,

    /// Levels appended after the standard eight, in bit order
    #[serde(default)]
    pub custom_levels: Vec<String>,

    /// Enabled level names; every level when absent
    #[serde(default)]
    pub enabled: Option<Vec<String>>,

    #[serde(default)]
    pub timestamp_format: TimestampFormat,

    #[serde(default)]
    pub output_format: OutputFormat,

    #[serde(default)]
    pub collision_policy: CollisionPolicy,
}

impl LoggerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            custom_levels: Vec::new(),
            enabled: None,
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
            collision_policy: CollisionPolicy::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builder carrying this configuration, for a standalone logger
    pub fn builder(&self) -> LoggerBuilder {
        let builder = LoggerBuilder::new(self.name.clone())
            .custom_levels(self.custom_levels.iter().cloned())
            .timestamp_format(self.timestamp_format.clone())
            .output_format(self.output_format.clone())
            .collision_policy(self.collision_policy);

        match &self.enabled {
            Some(names) => builder.enabled_levels(names.iter().cloned()),
            None => builder,
        }
    }

    /// Builder carrying this configuration, registered in `registry`
    pub fn builder_in(&self, registry: &Arc<Registry>) -> LoggerBuilder {
        self.builder().registry(Arc::clone(registry))
    }
}
