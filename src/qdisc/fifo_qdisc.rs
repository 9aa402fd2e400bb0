use std::collections::VecDeque;

use crate::{entry::QueueEntry, qdisc::Qdisc};

// ==========================================
// Plain FIFO, optional drop-head limit
// ==========================================
pub struct FifoQdisc<T> {
    queue: VecDeque<QueueEntry<T>>,
    hard_limit: Option<usize>,
}

impl<T> FifoQdisc<T> {
    pub fn new(hard_limit: Option<usize>) -> Self {
        Self {
            queue: VecDeque::new(),
            hard_limit,
        }
    }
}

impl<T> Qdisc<T> for FifoQdisc<T> {
    fn enqueue(&mut self, entry: QueueEntry<T>) -> Result<(), QueueEntry<T>> {
        if let Some(limit) = self.hard_limit {
            if self.queue.len() >= limit {
                // Drop-head: the oldest entry makes room for the newcomer
                if let Some(oldest) = self.queue.pop_front() {
                    self.queue.push_back(entry);
                    return Err(oldest);
                }
                // limit == 0
                return Err(entry);
            }
        }
        self.queue.push_back(entry);
        Ok(())
    }

    fn peek(&self) -> Option<&QueueEntry<T>> {
        self.queue.front()
    }

    fn dequeue(&mut self) -> Option<QueueEntry<T>> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}
