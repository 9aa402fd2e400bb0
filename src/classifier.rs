use serde::{Deserialize, Serialize};

use crate::access::{AccessCategoryTable, AccessConfig};
use crate::error::ConfigError;
use crate::tier::PriorityTier;

/// Marking thresholds. `marking > high_above` is HIGH,
/// `medium_from <= marking <= high_above` is MEDIUM, anything else LOW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub high_above: u8,
    pub medium_from: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_above: 190,
            medium_from: 128,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.medium_from > self.high_above {
            return Err(ConfigError::InvalidThresholds {
                medium_from: self.medium_from,
                high_above: self.high_above,
            });
        }
        Ok(())
    }
}

/// Pure marking -> (tier, access parameters) mapping.
#[derive(Debug, Clone)]
pub struct Classifier {
    thresholds: Thresholds,
    table: AccessCategoryTable,
}

impl Classifier {
    pub fn new(thresholds: Thresholds, table: AccessCategoryTable) -> Self {
        Self { thresholds, table }
    }

    pub fn tier_of(&self, marking: u8) -> PriorityTier {
        if marking > self.thresholds.high_above {
            PriorityTier::High
        } else if marking >= self.thresholds.medium_from {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }

    pub fn classify(&self, marking: u8) -> (PriorityTier, AccessConfig) {
        let tier = self.tier_of(marking);
        (tier, *self.table.get(tier))
    }

    pub fn table(&self) -> &AccessCategoryTable {
        &self.table
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Thresholds::default(), AccessCategoryTable::default())
    }
}
