use crate::entry::QueueEntry;
use crate::qdisc::{FifoQdisc, MarkingQdisc, Qdisc};
use crate::tier::PriorityTier;

// ==========================================
// Strict-priority set: HIGH > MEDIUM > LOW
// ==========================================
/// HIGH and MEDIUM are marking-ordered, LOW is FIFO. A tier is only served
/// once every tier above it is empty.
pub struct PriorityQueueSet<T> {
    high: Box<dyn Qdisc<T>>,
    medium: Box<dyn Qdisc<T>>,
    low: Box<dyn Qdisc<T>>,
}

impl<T: 'static> PriorityQueueSet<T> {
    pub fn new(hard_limit: Option<usize>) -> Self {
        Self {
            high: Box::new(MarkingQdisc::new(hard_limit)),
            medium: Box::new(MarkingQdisc::new(hard_limit)),
            low: Box::new(FifoQdisc::new(hard_limit)),
        }
    }
}

impl<T> PriorityQueueSet<T> {
    fn queue_mut(&mut self, tier: PriorityTier) -> &mut dyn Qdisc<T> {
        match tier {
            PriorityTier::High => self.high.as_mut(),
            PriorityTier::Medium => self.medium.as_mut(),
            PriorityTier::Low => self.low.as_mut(),
        }
    }

    fn queue(&self, tier: PriorityTier) -> &dyn Qdisc<T> {
        match tier {
            PriorityTier::High => self.high.as_ref(),
            PriorityTier::Medium => self.medium.as_ref(),
            PriorityTier::Low => self.low.as_ref(),
        }
    }

    /// `Err` carries the entry the tier's queue dropped to stay within its limit.
    pub fn enqueue(&mut self, tier: PriorityTier, entry: QueueEntry<T>) -> Result<(), QueueEntry<T>> {
        self.queue_mut(tier).enqueue(entry)
    }

    /// Next entry to forward, or `None` when all three tiers are empty.
    pub fn dequeue_next(&mut self) -> Option<(PriorityTier, QueueEntry<T>)> {
        PriorityTier::ALL
            .into_iter()
            .find_map(|tier| self.queue_mut(tier).dequeue().map(|entry| (tier, entry)))
    }

    /// Queue depths in drain order.
    pub fn depths(&self) -> [usize; 3] {
        PriorityTier::ALL.map(|tier| self.queue(tier).len())
    }

    pub fn len(&self) -> usize {
        self.depths().iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        PriorityTier::ALL
            .into_iter()
            .all(|tier| self.queue(tier).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qdisc::test_util::entry;

    #[test]
    fn drains_by_tier_not_arrival() {
        let mut set = PriorityQueueSet::new(None);
        set.enqueue(PriorityTier::Low, entry(10, 1)).unwrap();
        set.enqueue(PriorityTier::High, entry(200, 2)).unwrap();
        set.enqueue(PriorityTier::Medium, entry(150, 3)).unwrap();
        assert_eq!(set.depths(), [1, 1, 1]);

        let tiers: Vec<PriorityTier> = std::iter::from_fn(|| set.dequeue_next())
            .map(|(tier, _)| tier)
            .collect();
        assert_eq!(
            tiers,
            vec![PriorityTier::High, PriorityTier::Medium, PriorityTier::Low]
        );
        assert!(set.dequeue_next().is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn equal_high_markings_follow_arrival() {
        let mut set = PriorityQueueSet::new(None);
        set.enqueue(PriorityTier::High, entry(200, 1)).unwrap();
        set.enqueue(PriorityTier::High, entry(200, 2)).unwrap();

        assert_eq!(set.dequeue_next().map(|(_, e)| e.seq), Some(1));
        assert_eq!(set.dequeue_next().map(|(_, e)| e.seq), Some(2));
    }

    #[test]
    fn low_waits_while_higher_tiers_are_replenished() {
        let mut set = PriorityQueueSet::new(None);
        set.enqueue(PriorityTier::Low, entry(0, 0)).unwrap();

        let mut seq = 1;
        for _ in 0..100 {
            set.enqueue(PriorityTier::High, entry(220, seq)).unwrap();
            set.enqueue(PriorityTier::Medium, entry(140, seq + 1)).unwrap();
            seq += 2;
            let (tier, _) = set.dequeue_next().unwrap();
            assert_ne!(tier, PriorityTier::Low);
        }
        assert_eq!(set.depths()[2], 1);
    }

    #[test]
    fn limit_applies_per_tier() {
        let mut set = PriorityQueueSet::new(Some(1));
        set.enqueue(PriorityTier::High, entry(200, 1)).unwrap();
        set.enqueue(PriorityTier::Low, entry(0, 2)).unwrap();
        assert!(set.enqueue(PriorityTier::High, entry(210, 3)).is_err());
        let dropped = set.enqueue(PriorityTier::Low, entry(0, 4)).unwrap_err();
        assert_eq!(dropped.seq, 2);
        assert_eq!(set.len(), 2);
    }
}
