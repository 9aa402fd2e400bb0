use std::fmt;

use serde::{Deserialize, Serialize};

/// Priority class derived from a packet's marking.
///
/// Variants are declared low-to-high so the derived `Ord` gives
/// `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityTier {
    Low,
    Medium,
    High,
}

impl PriorityTier {
    /// Drain order: highest tier first.
    pub const ALL: [PriorityTier; 3] = [PriorityTier::High, PriorityTier::Medium, PriorityTier::Low];

    pub fn label(self) -> &'static str {
        match self {
            PriorityTier::High => "HIGH",
            PriorityTier::Medium => "MEDIUM",
            PriorityTier::Low => "LOW",
        }
    }

    /// 802.11e access category this tier is transmitted on.
    pub fn access_category(self) -> &'static str {
        match self {
            PriorityTier::High => "VO",
            PriorityTier::Medium => "VI",
            PriorityTier::Low => "BE",
        }
    }

    /// Dense index for per-tier arrays, in drain order.
    pub(crate) fn index(self) -> usize {
        match self {
            PriorityTier::High => 0,
            PriorityTier::Medium => 1,
            PriorityTier::Low => 2,
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
