use std::net::SocketAddrV4;
use std::time::Duration;

use log::{debug, error, trace};

use crate::access::AccessCategoryTable;
use crate::entry::QueueEntry;
use crate::host::{Host, TimerEvent};
use crate::metrics::MetricsAggregator;
use crate::qdisc::PriorityQueueSet;
use crate::tier::PriorityTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Draining,
}

/// Paced drain loop.
///
/// While `Draining` exactly one `DrainStep` timer is outstanding; each step
/// forwards one packet and re-arms the timer only if work remains. `Idle`
/// means no timer is pending and the next enqueue must wake the loop.
#[derive(Debug)]
pub struct Scheduler {
    state: SchedulerState,
    pacing: Duration,
    interface: String,
    reply_port: u16,
}

impl Scheduler {
    pub fn new(pacing: Duration, interface: impl Into<String>, reply_port: u16) -> Self {
        Self {
            state: SchedulerState::Idle,
            pacing,
            interface: interface.into(),
            reply_port,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Arms the drain timer if the loop is idle. Returns true when it did.
    pub fn wake<T, H: Host<T>>(&mut self, host: &mut H) -> bool {
        if self.state == SchedulerState::Draining {
            return false;
        }
        self.state = SchedulerState::Draining;
        host.schedule_after(self.pacing, TimerEvent::DrainStep);
        true
    }

    /// One dequeue-configure-forward-account iteration.
    ///
    /// Returns the tier of the forwarded packet, or `None` if the queues were
    /// empty and the loop went idle.
    pub fn drain_step<T, H: Host<T>>(
        &mut self,
        host: &mut H,
        queues: &mut PriorityQueueSet<T>,
        table: &AccessCategoryTable,
        metrics: &mut MetricsAggregator,
    ) -> Option<PriorityTier> {
        if self.state == SchedulerState::Idle {
            trace!("drain step fired while idle, ignoring");
            return None;
        }

        let [high, medium, low] = queues.depths();
        trace!("queues HIGH {} MEDIUM {} LOW {}", high, medium, low);

        let Some((tier, entry)) = queues.dequeue_next() else {
            self.state = SchedulerState::Idle;
            return None;
        };

        self.forward(host, tier, entry, table, metrics);

        if queues.is_empty() {
            self.state = SchedulerState::Idle;
        } else {
            host.schedule_after(self.pacing, TimerEvent::DrainStep);
        }
        Some(tier)
    }

    fn forward<T, H: Host<T>>(
        &self,
        host: &mut H,
        tier: PriorityTier,
        entry: QueueEntry<T>,
        table: &AccessCategoryTable,
        metrics: &mut MetricsAggregator,
    ) {
        let access = table.get(tier);

        // An interface without access-category support still gets the packet,
        // just without the tier's contention parameters.
        match host.access_device(&self.interface) {
            Ok(device) => device.apply(tier, access),
            Err(err) => error!("cannot configure {} for {}: {}", tier.access_category(), tier, err),
        }

        let QueueEntry {
            marking,
            payload,
            source,
            byte_size,
            arrival,
            ..
        } = entry;

        let destination = SocketAddrV4::new(source, self.reply_port);
        host.send_to(destination, payload, marking);

        let latency = host.now().saturating_sub(arrival);
        let latency_ms = latency.as_secs_f64() * 1000.0;
        metrics.on_send(tier, byte_size, latency_ms);

        debug!(
            "sent to {} | ToS 0x{:02x} | {} bytes | latency {:.3} ms | TXOP {} us",
            destination, marking, byte_size, latency_ms, access.txop_limit_micros
        );
    }
}
