//! ToS-driven QoS classification and strict-priority scheduling.

pub mod access;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod entry;
pub mod error;
pub mod host;
pub mod ipv4;
pub mod live;
pub mod metrics;
pub mod qdisc;
pub mod report;
pub mod scheduler;
pub mod sim;
pub mod tier;

pub use access::{AccessCategoryTable, AccessConfig};
pub use cache::{ClassificationCache, ClassificationRecord};
pub use classifier::{Classifier, Thresholds};
pub use config::ControllerConfig;
pub use controller::QosController;
pub use entry::QueueEntry;
pub use error::{ConfigError, DeviceError, ReportError};
pub use host::{AccessDevice, Host, TimerEvent};
pub use metrics::{MetricsAggregator, MetricsSnapshot, TierMetrics};
pub use qdisc::PriorityQueueSet;
pub use scheduler::{Scheduler, SchedulerState};
pub use tier::PriorityTier;
