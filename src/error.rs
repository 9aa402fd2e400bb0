use std::io;

use thiserror::Error;

use crate::tier::PriorityTier;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{tier} tier has cw_min {cw_min} >= cw_max {cw_max}")]
    InvalidContentionWindow {
        tier: PriorityTier,
        cw_min: u32,
        cw_max: u32,
    },

    #[error("medium threshold {medium_from} is above high threshold {high_above}")]
    InvalidThresholds { medium_from: u8, high_above: u8 },

    #[error("pacing interval must be non-zero")]
    ZeroPacing,
}

/// Outcome of asking the host for an access-category capable device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("interface {0} not found")]
    NotFound(String),

    #[error("interface {0} does not support access-category configuration")]
    NotAccessCapable(String),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}
