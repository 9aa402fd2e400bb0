use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use log::info;

use crate::error::ReportError;
use crate::metrics::MetricsSnapshot;

pub const CSV_HEADER: &str = "Priority,PacketsReceived,PacketsSent,BytesReceived,BytesSent,ThroughputKbps,AvgLatencyMs,AvgJitterMs,PacketsDropped";

// ==========================================
// Monitor table
// ==========================================
pub fn log_snapshot(name: &str, snapshot: &MetricsSnapshot, depths: [usize; 3]) {
    let now_str = Local::now().format("%H:%M:%S");
    let rule = "-".repeat(96);

    info!("[{}] {} after {:.1}s", now_str, name, snapshot.elapsed.as_secs_f64());
    info!("{}", rule);
    info!(
        "{:<8} | {:>8} | {:>8} | {:>8} | {:>6} | {:>10} | {:>10} | {:>10} | {:>7}",
        "Tier", "In", "Out", "Dropped", "Flows", "Kbps", "Lat(ms)", "Jit(ms)", "Backlog"
    );
    info!("{}", rule);

    for ((tier, stat), backlog) in snapshot.iter().zip(depths) {
        info!(
            "{:<8} | {:>8} | {:>8} | {:>8} | {:>6} | {:>10.2} | {:>10.2} | {:>10.2} | {:>7}",
            tier.label(),
            stat.packets_received,
            stat.packets_sent,
            stat.packets_dropped,
            snapshot.flows(tier),
            stat.throughput_kbps(snapshot.elapsed),
            stat.avg_latency_ms(),
            stat.avg_jitter_ms(),
            backlog
        );
    }
    info!("{}", rule);
}

// ==========================================
// CSV export
// ==========================================
/// One row per tier that sent anything, highest tier first.
pub fn write_csv<W: Write>(mut writer: W, snapshot: &MetricsSnapshot) -> Result<(), ReportError> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for (tier, stat) in snapshot.iter() {
        if stat.packets_sent == 0 {
            continue;
        }
        writeln!(
            writer,
            "{},{},{},{},{},{:.2},{:.2},{:.2},{}",
            tier.label(),
            stat.packets_received,
            stat.packets_sent,
            stat.bytes_received,
            stat.bytes_sent,
            stat.throughput_kbps(snapshot.elapsed),
            stat.avg_latency_ms(),
            stat.avg_jitter_ms(),
            stat.packets_dropped
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv_file(path: impl AsRef<Path>, snapshot: &MetricsSnapshot) -> Result<(), ReportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_csv(BufWriter::new(File::create(path)?), snapshot)?;
    info!("metrics exported to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::metrics::MetricsAggregator;
    use crate::tier::PriorityTier;

    #[test]
    fn csv_skips_silent_tiers() {
        let mut agg = MetricsAggregator::new();
        agg.on_receive(PriorityTier::High, 128);
        agg.on_send(PriorityTier::High, 128, 2.0);
        agg.on_receive(PriorityTier::High, 128);
        agg.on_send(PriorityTier::High, 128, 4.0);
        agg.on_receive(PriorityTier::Low, 64);

        let snapshot = agg.snapshot(Duration::from_secs(1), [1, 0, 1]);
        let mut out = Vec::new();
        write_csv(&mut out, &snapshot).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], CSV_HEADER);
        // 256 bytes * 8 / 1 s / 1024 = 2 Kbps; jitter |4 - 2| / 1
        assert_eq!(lines[1], "HIGH,2,2,256,256,2.00,3.00,2.00,0");
        assert_eq!(lines.len(), 2);
    }
}
