use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::access::AccessCategoryTable;
use crate::classifier::Thresholds;
use crate::error::ConfigError;

/// Controller settings. Every field has a default, so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub pacing_micros: u64,
    pub egress_interface: String,
    pub reply_port: u16,
    pub queue_limit: Option<usize>,
    pub thresholds: Thresholds,
    pub access_table: AccessCategoryTable,
    pub report_interval_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pacing_micros: 1000,
            egress_interface: "wlan0".to_string(),
            reply_port: 9,
            queue_limit: None,
            thresholds: Thresholds::default(),
            access_table: AccessCategoryTable::default(),
            report_interval_secs: 1,
        }
    }
}

impl ControllerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pacing_micros == 0 {
            return Err(ConfigError::ZeroPacing);
        }
        self.thresholds.validate()?;
        self.access_table.validate()
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_micros(self.pacing_micros)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs.max(1))
    }
}
