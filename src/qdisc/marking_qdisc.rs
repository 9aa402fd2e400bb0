use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{entry::QueueEntry, qdisc::Qdisc};

// Heap wrapper: higher marking first, then earlier arrival.
struct Ranked<T>(QueueEntry<T>);

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Ranked<T> {}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .marking
            .cmp(&other.0.marking)
            .then_with(|| other.0.seq.cmp(&self.0.seq))
    }
}

// ==========================================
// Marking-ordered queue (priority over fairness)
// ==========================================
/// Always yields the highest-marking entry; equal markings leave in arrival
/// order. A steady stream of high markings starves lower ones.
pub struct MarkingQdisc<T> {
    heap: BinaryHeap<Ranked<T>>,
    hard_limit: Option<usize>,
}

impl<T> MarkingQdisc<T> {
    pub fn new(hard_limit: Option<usize>) -> Self {
        Self {
            heap: BinaryHeap::new(),
            hard_limit,
        }
    }
}

impl<T> Qdisc<T> for MarkingQdisc<T> {
    fn enqueue(&mut self, entry: QueueEntry<T>) -> Result<(), QueueEntry<T>> {
        // Tail-drop: entries already queued keep their place
        if self.hard_limit.is_some_and(|limit| self.heap.len() >= limit) {
            return Err(entry);
        }
        self.heap.push(Ranked(entry));
        Ok(())
    }

    fn peek(&self) -> Option<&QueueEntry<T>> {
        self.heap.peek().map(|ranked| &ranked.0)
    }

    fn dequeue(&mut self) -> Option<QueueEntry<T>> {
        self.heap.pop().map(|ranked| ranked.0)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qdisc::test_util::entry;

    #[test]
    fn higher_marking_leaves_first_regardless_of_arrival() {
        let mut q = MarkingQdisc::new(None);
        q.enqueue(entry(200, 1)).unwrap();
        q.enqueue(entry(250, 2)).unwrap();
        q.enqueue(entry(220, 3)).unwrap();

        let order: Vec<u8> = std::iter::from_fn(|| q.dequeue()).map(|e| e.marking).collect();
        assert_eq!(order, vec![250, 220, 200]);
    }

    #[test]
    fn equal_markings_leave_in_arrival_order() {
        let mut q = MarkingQdisc::new(None);
        for seq in [4, 2, 7, 3] {
            q.enqueue(entry(200, seq)).unwrap();
        }
        let order: Vec<u64> = std::iter::from_fn(|| q.dequeue()).map(|e| e.seq).collect();
        assert_eq!(order, vec![2, 3, 4, 7]);
    }

    #[test]
    fn tail_drop_when_full() {
        let mut q = MarkingQdisc::new(Some(1));
        q.enqueue(entry(150, 1)).unwrap();
        let rejected = q.enqueue(entry(190, 2)).unwrap_err();
        assert_eq!(rejected.seq, 2);
        assert_eq!(q.peek().map(|e| e.seq), Some(1));
    }
}
