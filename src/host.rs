use std::net::SocketAddrV4;
use std::time::Duration;

use crate::access::AccessConfig;
use crate::error::DeviceError;
use crate::tier::PriorityTier;

/// Deferred callbacks the controller registers with its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerEvent {
    DrainStep,
}

/// A medium-access device that accepts per-tier contention parameters.
pub trait AccessDevice {
    fn apply(&mut self, tier: PriorityTier, config: &AccessConfig);
}

/// Everything the controller needs from the environment it runs in.
///
/// Hosts are single-threaded event loops: every controller entry point runs
/// to completion before the next event is dispatched.
pub trait Host<T> {
    /// Monotonic time since the host started.
    fn now(&self) -> Duration;

    /// Deliver `event` back to the controller once `delay` has passed.
    fn schedule_after(&mut self, delay: Duration, event: TimerEvent);

    fn send_to(&mut self, destination: SocketAddrV4, payload: T, marking: u8);

    /// Takes back a packet the controller will never forward.
    fn discard(&mut self, payload: T);

    /// Capability query for the access device behind `interface`.
    fn access_device(&mut self, interface: &str) -> Result<&mut dyn AccessDevice, DeviceError>;
}
