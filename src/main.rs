use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use tos_shaper::sim::{SimHost, inject_station_traffic};
use tos_shaper::{ControllerConfig, QosController, live, report};

#[derive(Parser)]
#[command(version, about = "ToS-driven QoS classifier and strict-priority shaper")]
struct Cli {
    /// JSON controller config; omitted fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the per-tier CSV report here
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a scripted multi-station scenario on the simulated host
    Sim {
        #[arg(long, default_value_t = 8)]
        stations: usize,
        #[arg(long, default_value_t = 30)]
        duration_secs: u64,
        #[arg(long, default_value_t = 256)]
        packet_size: usize,
        /// Simulate an egress interface without access-category support
        #[arg(long)]
        no_device: bool,
    },
    /// Shape packets delivered by NFQUEUE
    Live {
        /// Queue numbers to bind
        #[arg(long, value_delimiter = ',', default_values_t = [0u16])]
        queues: Vec<u16>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };

    match cli.command {
        Command::Sim {
            stations,
            duration_secs,
            packet_size,
            no_device,
        } => {
            let duration = Duration::from_secs(duration_secs);
            let mut host = if no_device {
                SimHost::without_access_device(config.egress_interface.clone())
            } else {
                SimHost::new(config.egress_interface.clone())
            };
            let injected = inject_station_traffic(&mut host, stations, duration, packet_size);
            info!("{} stations, {} packets over {:?}", stations, injected, duration);

            let mut controller = QosController::new(&config, Duration::ZERO);
            host.run_until(&mut controller, duration);

            let snapshot = controller.snapshot_metrics(duration);
            report::log_snapshot("simulation", &snapshot, controller.queue_depths());
            if let Some(path) = &cli.csv {
                report::write_csv_file(path, &snapshot)?;
            } else {
                report::write_csv(std::io::stdout().lock(), &snapshot)?;
            }
        }
        Command::Live { queues } => live::run(&config, &queues, cli.csv)?,
    }

    Ok(())
}
