use crate::entry::QueueEntry;

mod fifo_qdisc;
mod marking_qdisc;
mod priority_set;

pub use fifo_qdisc::FifoQdisc;
pub use marking_qdisc::MarkingQdisc;
pub use priority_set::PriorityQueueSet;

/// A single queue discipline. `enqueue` hands back whichever entry had to be
/// dropped when the queue is at its limit.
pub trait Qdisc<T> {
    fn enqueue(&mut self, entry: QueueEntry<T>) -> Result<(), QueueEntry<T>>;
    fn peek(&self) -> Option<&QueueEntry<T>>;
    fn dequeue(&mut self) -> Option<QueueEntry<T>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use crate::entry::QueueEntry;

    pub fn entry(marking: u8, seq: u64) -> QueueEntry<u64> {
        QueueEntry {
            marking,
            payload: seq,
            source: Ipv4Addr::new(10, 0, 0, 1),
            byte_size: 100,
            arrival: Duration::from_millis(seq),
            seq,
        }
    }
}
