use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tier::PriorityTier;

// ==========================================
// EDCA parameter set for one access category
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// AIFSN, in slots.
    pub arbitration_spacing: u32,
    pub cw_min: u32,
    pub cw_max: u32,
    /// A-MPDU size in bytes.
    pub aggregation_size: u32,
    pub txop_limit_micros: u32,
}

impl AccessConfig {
    pub const fn new(
        arbitration_spacing: u32,
        cw_min: u32,
        cw_max: u32,
        aggregation_size: u32,
        txop_limit_micros: u32,
    ) -> Self {
        Self {
            arbitration_spacing,
            cw_min,
            cw_max,
            aggregation_size,
            txop_limit_micros,
        }
    }
}

/// Static tier -> access parameters lookup. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessCategoryTable {
    pub high: AccessConfig,
    pub medium: AccessConfig,
    pub low: AccessConfig,
}

impl Default for AccessCategoryTable {
    fn default() -> Self {
        Self {
            high: AccessConfig::new(2, 15, 1023, 8192, 320),
            medium: AccessConfig::new(2, 15, 1023, 16384, 640),
            low: AccessConfig::new(3, 15, 1023, 32768, 960),
        }
    }
}

impl AccessCategoryTable {
    pub fn get(&self, tier: PriorityTier) -> &AccessConfig {
        match tier {
            PriorityTier::High => &self.high,
            PriorityTier::Medium => &self.medium,
            PriorityTier::Low => &self.low,
        }
    }

    /// Every tier must have `cw_min < cw_max`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for tier in PriorityTier::ALL {
            let config = self.get(tier);
            if config.cw_min >= config.cw_max {
                return Err(ConfigError::InvalidContentionWindow {
                    tier,
                    cw_min: config.cw_min,
                    cw_max: config.cw_max,
                });
            }
        }
        Ok(())
    }
}
