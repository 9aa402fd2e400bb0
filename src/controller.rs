use std::net::Ipv4Addr;
use std::time::Duration;

use log::{debug, warn};

use crate::cache::{ClassificationCache, ClassificationRecord};
use crate::classifier::Classifier;
use crate::config::ControllerConfig;
use crate::entry::QueueEntry;
use crate::host::{Host, TimerEvent};
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::qdisc::PriorityQueueSet;
use crate::scheduler::{Scheduler, SchedulerState};

// ==========================================
// Ingress -> classify -> queue -> paced drain
// ==========================================
pub struct QosController<T> {
    classifier: Classifier,
    cache: ClassificationCache,
    queues: PriorityQueueSet<T>,
    scheduler: Scheduler,
    metrics: MetricsAggregator,
    started_at: Duration,
    next_seq: u64,
}

impl<T: 'static> QosController<T> {
    /// `started_at` is the host time metrics throughput is measured from.
    pub fn new(config: &ControllerConfig, started_at: Duration) -> Self {
        Self {
            classifier: Classifier::new(config.thresholds, config.access_table.clone()),
            cache: ClassificationCache::new(),
            queues: PriorityQueueSet::new(config.queue_limit),
            scheduler: Scheduler::new(
                config.pacing(),
                config.egress_interface.clone(),
                config.reply_port,
            ),
            metrics: MetricsAggregator::new(),
            started_at,
            next_seq: 0,
        }
    }
}

impl<T> QosController<T> {
    /// Ingress entry point.
    pub fn on_packet_arrived<H: Host<T>>(
        &mut self,
        host: &mut H,
        marking: u8,
        source: Ipv4Addr,
        payload: T,
        byte_size: usize,
    ) -> ClassificationRecord {
        let record = self
            .cache
            .resolve_for_source(source, marking, &self.classifier);
        self.metrics.on_receive(record.tier, byte_size);

        let entry = QueueEntry {
            marking,
            payload,
            source,
            byte_size,
            arrival: host.now(),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        debug!(
            "queued {} bytes from {} (ToS 0x{:02x}) in {}",
            byte_size, source, marking, record.tier
        );

        if let Err(dropped) = self.queues.enqueue(record.tier, entry) {
            // The victim may be an older entry of the same tier
            warn!(
                "{} queue full, dropped packet from {} (ToS 0x{:02x})",
                record.tier, dropped.source, dropped.marking
            );
            self.metrics.on_drop(record.tier);
            host.discard(dropped.payload);
        }

        if !self.queues.is_empty() {
            self.scheduler.wake::<T, H>(host);
        }
        record
    }

    pub fn on_timer<H: Host<T>>(&mut self, host: &mut H, event: TimerEvent) {
        match event {
            TimerEvent::DrainStep => {
                self.scheduler.drain_step(
                    host,
                    &mut self.queues,
                    self.classifier.table(),
                    &mut self.metrics,
                );
            }
        }
    }

    pub fn snapshot_metrics(&self, now: Duration) -> MetricsSnapshot {
        self.metrics
            .snapshot(now.saturating_sub(self.started_at), self.cache.flows_per_tier())
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn queue_depths(&self) -> [usize; 3] {
        self.queues.depths()
    }

    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}
