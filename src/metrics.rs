use std::time::Duration;

use crate::tier::PriorityTier;

/// Running per-tier counters. Derived figures are computed on read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TierMetrics {
    pub packets_received: u64,
    pub packets_sent: u64,
    pub packets_dropped: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub cumulative_latency_ms: f64,
    pub cumulative_jitter_ms: f64,
}

impl TierMetrics {
    /// Kbps over `elapsed` (1 Kbit = 1024 bits).
    pub fn throughput_kbps(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes_sent as f64 * 8.0 / secs / 1024.0
    }

    pub fn avg_latency_ms(&self) -> f64 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        self.cumulative_latency_ms / self.packets_sent as f64
    }

    pub fn avg_jitter_ms(&self) -> f64 {
        if self.packets_sent <= 1 {
            return 0.0;
        }
        self.cumulative_jitter_ms / (self.packets_sent - 1) as f64
    }
}

/// Point-in-time copy of every tier's counters.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub elapsed: Duration,
    pub tiers: [TierMetrics; 3],
    /// Distinct sources per tier.
    pub flows: [usize; 3],
}

impl MetricsSnapshot {
    pub fn tier(&self, tier: PriorityTier) -> &TierMetrics {
        &self.tiers[tier.index()]
    }

    pub fn flows(&self, tier: PriorityTier) -> usize {
        self.flows[tier.index()]
    }

    /// Tiers in drain order with their counters.
    pub fn iter(&self) -> impl Iterator<Item = (PriorityTier, &TierMetrics)> {
        PriorityTier::ALL
            .into_iter()
            .map(move |tier| (tier, self.tier(tier)))
    }

    pub fn throughput_kbps(&self, tier: PriorityTier) -> f64 {
        self.tier(tier).throughput_kbps(self.elapsed)
    }
}

// ==========================================
// Per-tier aggregation, never reset during a run
// ==========================================
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    tiers: [TierMetrics; 3],
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_receive(&mut self, tier: PriorityTier, byte_size: usize) {
        let stat = &mut self.tiers[tier.index()];
        stat.packets_received += 1;
        stat.bytes_received += byte_size as u64;
    }

    /// Jitter is the distance between this latency and the tier's average
    /// latency over the packets sent before it.
    pub fn on_send(&mut self, tier: PriorityTier, byte_size: usize, latency_ms: f64) {
        let stat = &mut self.tiers[tier.index()];
        stat.packets_sent += 1;
        stat.bytes_sent += byte_size as u64;

        if stat.packets_sent > 1 {
            let previous_avg = stat.cumulative_latency_ms / (stat.packets_sent - 1) as f64;
            stat.cumulative_jitter_ms += (latency_ms - previous_avg).abs();
        }
        stat.cumulative_latency_ms += latency_ms;
    }

    pub fn on_drop(&mut self, tier: PriorityTier) {
        self.tiers[tier.index()].packets_dropped += 1;
    }

    pub fn tier(&self, tier: PriorityTier) -> &TierMetrics {
        &self.tiers[tier.index()]
    }

    pub fn snapshot(&self, elapsed: Duration, flows: [usize; 3]) -> MetricsSnapshot {
        MetricsSnapshot {
            elapsed,
            tiers: self.tiers,
            flows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn send_counters_and_averages() {
        let mut agg = MetricsAggregator::new();
        for (size, latency) in [(100, 10.0), (200, 20.0), (300, 15.0)] {
            agg.on_receive(PriorityTier::High, size);
            agg.on_send(PriorityTier::High, size, latency);
        }

        let high = agg.tier(PriorityTier::High);
        assert_eq!(high.packets_sent, 3);
        assert_eq!(high.bytes_sent, 600);
        assert_eq!(high.packets_received, 3);
        assert_eq!(high.bytes_received, 600);
        assert!(approx(high.avg_latency_ms(), 15.0));

        // |20 - 10| + |15 - 15|
        assert!(approx(high.cumulative_jitter_ms, 10.0));
        assert!(approx(high.avg_jitter_ms(), 5.0));
        assert!(high.avg_jitter_ms().is_finite() && high.avg_jitter_ms() >= 0.0);

        assert_eq!(*agg.tier(PriorityTier::Low), TierMetrics::default());
    }

    #[test]
    fn single_send_has_no_jitter() {
        let mut agg = MetricsAggregator::new();
        agg.on_send(PriorityTier::Low, 64, 42.0);
        let low = agg.tier(PriorityTier::Low);
        assert_eq!(low.cumulative_jitter_ms, 0.0);
        assert_eq!(low.avg_jitter_ms(), 0.0);
        assert!(approx(low.avg_latency_ms(), 42.0));
    }

    #[test]
    fn throughput_uses_elapsed_time() {
        let mut agg = MetricsAggregator::new();
        agg.on_send(PriorityTier::Medium, 1024, 1.0);
        agg.on_send(PriorityTier::Medium, 1024, 1.0);

        let snapshot = agg.snapshot(Duration::from_secs(2), [0, 2, 0]);
        // 2048 bytes * 8 / 2 s / 1024
        assert!(approx(snapshot.throughput_kbps(PriorityTier::Medium), 8.0));
        assert_eq!(snapshot.flows(PriorityTier::Medium), 2);

        let empty = agg.snapshot(Duration::ZERO, [0; 3]);
        assert_eq!(empty.throughput_kbps(PriorityTier::Medium), 0.0);
    }

    #[test]
    fn idle_tier_derives_zeroes() {
        let stat = TierMetrics::default();
        assert_eq!(stat.avg_latency_ms(), 0.0);
        assert_eq!(stat.avg_jitter_ms(), 0.0);
        assert_eq!(stat.throughput_kbps(Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn drops_are_counted_per_tier() {
        let mut agg = MetricsAggregator::new();
        agg.on_drop(PriorityTier::Low);
        agg.on_drop(PriorityTier::Low);
        assert_eq!(agg.tier(PriorityTier::Low).packets_dropped, 2);
        assert_eq!(agg.tier(PriorityTier::High).packets_dropped, 0);
    }
}
