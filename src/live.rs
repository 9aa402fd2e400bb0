//! NFQUEUE host: real IPv4 packets in, verdicts out.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::net::SocketAddrV4;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{info, trace, warn};
use nfq::{Message, Queue, Verdict};

use crate::access::AccessConfig;
use crate::config::ControllerConfig;
use crate::controller::QosController;
use crate::error::DeviceError;
use crate::host::{AccessDevice, Host, TimerEvent};
use crate::ipv4::{Ipv4Header, remarked};
use crate::report;
use crate::tier::PriorityTier;

const BATCH_LIMIT: usize = 10000;
const QUEUE_MAX_LEN: u32 = 10000;

/// A queued netfilter message and the queue it must be answered on.
pub struct NfqPacket {
    msg: Message,
    queue_index: usize,
}

fn make_queue(queue_num: u16) -> Result<Queue, std::io::Error> {
    let mut q = Queue::open()?;
    q.bind(queue_num)?;
    q.set_copy_range(queue_num, 0xFFFF)?;
    q.set_queue_max_len(queue_num, QUEUE_MAX_LEN)?;
    q.set_nonblocking(true);
    Ok(q)
}

/// Wireless interface bookkeeping: the parameter set each access category
/// is expected to run with.
#[derive(Debug, Default)]
pub struct WirelessDevice {
    current: [Option<AccessConfig>; 3],
}

impl AccessDevice for WirelessDevice {
    fn apply(&mut self, tier: PriorityTier, config: &AccessConfig) {
        let slot = &mut self.current[tier.index()];
        if slot.as_ref() != Some(config) {
            info!(
                "{} -> AIFSN={} CWmin={} CWmax={} TXOP={} us",
                tier.access_category(),
                config.arbitration_spacing,
                config.cw_min,
                config.cw_max,
                config.txop_limit_micros
            );
            *slot = Some(*config);
        }
    }
}

/// Checks sysfs once: the interface must exist and be backed by an 802.11 phy.
fn probe_interface(interface: &str) -> Result<WirelessDevice, DeviceError> {
    let base = Path::new("/sys/class/net").join(interface);
    if !base.exists() {
        return Err(DeviceError::NotFound(interface.to_string()));
    }
    if !base.join("phy80211").exists() {
        return Err(DeviceError::NotAccessCapable(interface.to_string()));
    }
    Ok(WirelessDevice::default())
}

pub struct NfqHost {
    queues: Vec<Queue>,
    start: Instant,
    timers: BinaryHeap<Reverse<(Duration, u64, TimerEvent)>>,
    timer_seq: u64,
    interface: String,
    device: Result<WirelessDevice, DeviceError>,
}

impl NfqHost {
    pub fn open(queue_nums: &[u16], interface: &str) -> Result<Self, std::io::Error> {
        let queues = queue_nums
            .iter()
            .map(|&num| make_queue(num))
            .collect::<Result<Vec<_>, _>>()?;

        let device = probe_interface(interface);
        if let Err(err) = &device {
            warn!("{}; packets will be forwarded without access tuning", err);
        }

        Ok(Self {
            queues,
            start: Instant::now(),
            timers: BinaryHeap::new(),
            timer_seq: 0,
            interface: interface.to_string(),
            device,
        })
    }

    fn pop_due(&mut self) -> Option<TimerEvent> {
        let now = self.now();
        let due = matches!(self.timers.peek(), Some(Reverse((at, _, _))) if *at <= now);
        if !due {
            return None;
        }
        self.timers.pop().map(|Reverse((_, _, event))| event)
    }

    fn accept(&mut self, queue_index: usize, msg: Message) {
        self.verdict(queue_index, msg, Verdict::Accept);
    }

    fn verdict(&mut self, queue_index: usize, mut msg: Message, verdict: Verdict) {
        msg.set_verdict(verdict);
        if let Err(err) = self.queues[queue_index].verdict(msg) {
            warn!("verdict on queue index {} failed: {}", queue_index, err);
        }
    }
}

impl Host<NfqPacket> for NfqHost {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn schedule_after(&mut self, delay: Duration, event: TimerEvent) {
        let at = self.now() + delay;
        self.timers.push(Reverse((at, self.timer_seq, event)));
        self.timer_seq += 1;
    }

    /// The packet keeps its own destination; `destination` is informational.
    fn send_to(&mut self, destination: SocketAddrV4, payload: NfqPacket, marking: u8) {
        let NfqPacket { mut msg, queue_index } = payload;

        if let Some(bytes) = remarked(msg.get_payload(), marking) {
            msg.set_payload(bytes);
        }

        trace!("accept for {} on queue index {}", destination, queue_index);
        self.accept(queue_index, msg);
    }

    fn discard(&mut self, payload: NfqPacket) {
        let NfqPacket { msg, queue_index } = payload;
        trace!("drop on queue index {}", queue_index);
        self.verdict(queue_index, msg, Verdict::Drop);
    }

    fn access_device(&mut self, interface: &str) -> Result<&mut dyn AccessDevice, DeviceError> {
        if interface != self.interface {
            return Err(DeviceError::NotFound(interface.to_string()));
        }
        match self.device.as_mut() {
            Ok(device) => Ok(device as &mut dyn AccessDevice),
            Err(err) => Err(err.clone()),
        }
    }
}

/// Serve `queue_nums` forever, reporting every `report_interval`.
pub fn run(config: &ControllerConfig, queue_nums: &[u16], csv: Option<PathBuf>) -> anyhow::Result<()> {
    let mut host = NfqHost::open(queue_nums, &config.egress_interface)?;
    let mut controller: QosController<NfqPacket> = QosController::new(config, host.now());
    let report_interval = config.report_interval();
    let mut last_report = Instant::now();

    info!(
        "serving NFQUEUE {:?}, egress {}, pacing {:?}",
        queue_nums,
        config.egress_interface,
        config.pacing()
    );

    loop {
        let mut working = false;

        let mut packet_count = 0;
        loop {
            if packet_count >= BATCH_LIMIT {
                break;
            }
            let mut no_packet = true;
            for queue_index in 0..host.queues.len() {
                let Ok(msg) = host.queues[queue_index].recv() else {
                    continue;
                };
                working = true;
                packet_count += 1;
                no_packet = false;

                let Some(header) = Ipv4Header::parse(msg.get_payload()) else {
                    // Not ours to classify
                    host.accept(queue_index, msg);
                    continue;
                };
                let byte_size = msg.get_payload().len();
                controller.on_packet_arrived(
                    &mut host,
                    header.marking,
                    header.source,
                    NfqPacket { msg, queue_index },
                    byte_size,
                );
            }
            if no_packet {
                break;
            }
        }

        while let Some(event) = host.pop_due() {
            working = true;
            controller.on_timer(&mut host, event);
        }

        if last_report.elapsed() >= report_interval {
            let snapshot = controller.snapshot_metrics(host.now());
            report::log_snapshot("controller", &snapshot, controller.queue_depths());
            if let Some(path) = &csv {
                if let Err(err) = report::write_csv_file(path, &snapshot) {
                    warn!("{}", err);
                }
            }
            last_report = Instant::now();
        }

        if !working {
            std::thread::sleep(Duration::from_micros(100));
        }
    }
}
