//! Deterministic discrete-event host.
//!
//! Events are ordered by (time, insertion order) and dispatched one at a
//! time, so every run with the same inputs produces the same trace.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use log::trace;

use crate::access::AccessConfig;
use crate::controller::QosController;
use crate::error::DeviceError;
use crate::host::{AccessDevice, Host, TimerEvent};
use crate::tier::PriorityTier;

enum SimEvent<T> {
    Arrival {
        marking: u8,
        source: Ipv4Addr,
        payload: T,
        byte_size: usize,
    },
    Timer(TimerEvent),
}

struct Scheduled<T> {
    at: Duration,
    seq: u64,
    event: SimEvent<T>,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentPacket<T> {
    pub at: Duration,
    pub destination: SocketAddrV4,
    pub payload: T,
    pub marking: u8,
}

/// Records every parameter set pushed to it.
#[derive(Debug, Default)]
pub struct SimAccessDevice {
    applied: Vec<(PriorityTier, AccessConfig)>,
    current: [Option<AccessConfig>; 3],
}

impl SimAccessDevice {
    pub fn applied(&self) -> &[(PriorityTier, AccessConfig)] {
        &self.applied
    }

    pub fn current(&self, tier: PriorityTier) -> Option<&AccessConfig> {
        self.current[tier.index()].as_ref()
    }
}

impl AccessDevice for SimAccessDevice {
    fn apply(&mut self, tier: PriorityTier, config: &AccessConfig) {
        self.applied.push((tier, *config));
        self.current[tier.index()] = Some(*config);
    }
}

pub struct SimHost<T> {
    now: Duration,
    seq: u64,
    events: BinaryHeap<Reverse<Scheduled<T>>>,
    interface: String,
    device: Option<SimAccessDevice>,
    sent: Vec<SentPacket<T>>,
    discarded: Vec<T>,
    timers_fired: u64,
}

impl<T> SimHost<T> {
    /// Host whose `interface` supports access-category configuration.
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            now: Duration::ZERO,
            seq: 0,
            events: BinaryHeap::new(),
            interface: interface.into(),
            device: Some(SimAccessDevice::default()),
            sent: Vec::new(),
            discarded: Vec::new(),
            timers_fired: 0,
        }
    }

    /// Host whose `interface` exists but cannot be tuned.
    pub fn without_access_device(interface: impl Into<String>) -> Self {
        Self {
            device: None,
            ..Self::new(interface)
        }
    }

    fn push(&mut self, at: Duration, event: SimEvent<T>) {
        let seq = self.seq;
        self.seq += 1;
        self.events.push(Reverse(Scheduled { at, seq, event }));
    }

    /// Queue a packet arrival at absolute time `at`.
    pub fn inject(&mut self, at: Duration, marking: u8, source: Ipv4Addr, payload: T, byte_size: usize) {
        self.push(
            at,
            SimEvent::Arrival {
                marking,
                source,
                payload,
                byte_size,
            },
        );
    }

    /// Dispatch the earliest pending event. Returns false when none is left.
    pub fn step(&mut self, controller: &mut QosController<T>) -> bool {
        let Some(Reverse(scheduled)) = self.events.pop() else {
            return false;
        };
        self.now = self.now.max(scheduled.at);

        match scheduled.event {
            SimEvent::Arrival {
                marking,
                source,
                payload,
                byte_size,
            } => {
                controller.on_packet_arrived(self, marking, source, payload, byte_size);
            }
            SimEvent::Timer(event) => {
                self.timers_fired += 1;
                controller.on_timer(self, event);
            }
        }
        true
    }

    pub fn run(&mut self, controller: &mut QosController<T>) {
        while self.step(controller) {}
    }

    /// Dispatch every event scheduled at or before `deadline`, then advance to it.
    pub fn run_until(&mut self, controller: &mut QosController<T>, deadline: Duration) {
        while self
            .events
            .peek()
            .is_some_and(|Reverse(next)| next.at <= deadline)
        {
            self.step(controller);
        }
        self.now = self.now.max(deadline);
    }

    pub fn sent(&self) -> &[SentPacket<T>] {
        &self.sent
    }

    /// Payloads the controller dropped, in drop order.
    pub fn discarded(&self) -> &[T] {
        &self.discarded
    }

    pub fn device(&self) -> Option<&SimAccessDevice> {
        self.device.as_ref()
    }

    pub fn pending_timers(&self) -> usize {
        self.events
            .iter()
            .filter(|Reverse(s)| matches!(s.event, SimEvent::Timer(_)))
            .count()
    }

    pub fn timers_fired(&self) -> u64 {
        self.timers_fired
    }
}

impl<T> Host<T> for SimHost<T> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule_after(&mut self, delay: Duration, event: TimerEvent) {
        let at = self.now + delay;
        trace!("timer {:?} at {:?}", event, at);
        self.push(at, SimEvent::Timer(event));
    }

    fn send_to(&mut self, destination: SocketAddrV4, payload: T, marking: u8) {
        self.sent.push(SentPacket {
            at: self.now,
            destination,
            payload,
            marking,
        });
    }

    fn discard(&mut self, payload: T) {
        trace!("discard at {:?}", self.now);
        self.discarded.push(payload);
    }

    fn access_device(&mut self, interface: &str) -> Result<&mut dyn AccessDevice, DeviceError> {
        if interface != self.interface {
            return Err(DeviceError::NotFound(interface.to_string()));
        }
        match self.device.as_mut() {
            Some(device) => Ok(device as &mut dyn AccessDevice),
            None => Err(DeviceError::NotAccessCapable(interface.to_string())),
        }
    }
}

// ==========================================
// Station traffic profile
// ==========================================
const STATION_MARKINGS: [u8; 8] = [0x00, 0x20, 0x40, 0x60, 0x80, 0xa0, 0xc0, 0xe0];
const STATION_INTERVALS_MS: [u64; 8] = [10, 10, 10, 10, 5, 5, 1, 1];

/// Station `index` sends from `192.168.1.(index + 2)` with a marking and send
/// interval taken round-robin from the profile table.
pub fn station(index: usize) -> (Ipv4Addr, u8, Duration) {
    let host_part = (index % 253 + 2) as u8;
    (
        Ipv4Addr::new(192, 168, 1, host_part),
        STATION_MARKINGS[index % STATION_MARKINGS.len()],
        Duration::from_millis(STATION_INTERVALS_MS[index % STATION_INTERVALS_MS.len()]),
    )
}

/// Inject periodic traffic for `stations` stations until `duration`.
/// Station `i` starts at `i` milliseconds so flows do not arrive in lockstep.
pub fn inject_station_traffic(
    host: &mut SimHost<Vec<u8>>,
    stations: usize,
    duration: Duration,
    packet_size: usize,
) -> usize {
    let mut injected = 0;
    for index in 0..stations {
        let (source, marking, interval) = station(index);
        let mut at = Duration::from_millis(index as u64);
        while at < duration {
            host.inject(at, marking, source, vec![0u8; packet_size], packet_size);
            injected += 1;
            at += interval;
        }
    }
    injected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;

    #[test]
    fn events_dispatch_in_time_then_insertion_order() {
        let config = ControllerConfig::default();
        let mut controller = QosController::new(&config, Duration::ZERO);
        let mut host: SimHost<u32> = SimHost::new("wlan0");
        let src = Ipv4Addr::new(10, 0, 0, 1);

        host.inject(Duration::from_millis(5), 0, src, 2, 10);
        host.inject(Duration::from_millis(1), 0, src, 1, 10);
        host.inject(Duration::from_millis(5), 0, src, 3, 10);
        host.run(&mut controller);

        let payloads: Vec<u32> = host.sent().iter().map(|p| p.payload).collect();
        assert_eq!(payloads, vec![1, 2, 3]);
    }

    #[test]
    fn device_query_distinguishes_missing_and_incapable() {
        let mut host: SimHost<()> = SimHost::new("wlan0");
        assert!(host.access_device("wlan0").is_ok());
        assert_eq!(
            host.access_device("eth0").err(),
            Some(DeviceError::NotFound("eth0".to_string()))
        );

        let mut host: SimHost<()> = SimHost::without_access_device("wlan0");
        assert_eq!(
            host.access_device("wlan0").err(),
            Some(DeviceError::NotAccessCapable("wlan0".to_string()))
        );
    }

    #[test]
    fn station_profile_cycles() {
        let (addr, marking, interval) = station(6);
        assert_eq!(addr, Ipv4Addr::new(192, 168, 1, 8));
        assert_eq!(marking, 0xc0);
        assert_eq!(interval, Duration::from_millis(1));

        let (_, marking, interval) = station(9);
        assert_eq!(marking, 0x20);
        assert_eq!(interval, Duration::from_millis(10));
    }

    #[test]
    fn station_traffic_counts() {
        let mut host = SimHost::new("wlan0");
        // station 0: every 10 ms from 0 -> 10 packets in 100 ms
        // station 1: every 10 ms from 1 ms -> 10 packets
        let injected = inject_station_traffic(&mut host, 2, Duration::from_millis(100), 64);
        assert_eq!(injected, 20);
    }
}
