use std::net::Ipv4Addr;
use std::time::Duration;

/// A packet waiting to be forwarded. Never mutated once created.
#[derive(Debug)]
pub struct QueueEntry<T> {
    pub marking: u8,
    pub payload: T,
    pub source: Ipv4Addr,
    pub byte_size: usize,
    /// Host time at enqueue.
    pub arrival: Duration,
    /// Global arrival counter, breaks ties between equal markings.
    pub seq: u64,
}
