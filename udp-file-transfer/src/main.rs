//! Entry point for `udp-file-transfer`.
//!
//! Parses CLI arguments and dispatches into either **server** (receiver) or
//! **client** (sender) mode.  All protocol work is delegated to library
//! modules; `main.rs` owns only process setup (logging, argument parsing)
//! and the file I/O on either end.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use udp_file_transfer::simulator::{FaultyTransport, SimulatorConfig};
use udp_file_transfer::socket::Socket;
use udp_file_transfer::{receive_file, send_file, Config, Outcome};

/// Reliable whole-file transfer over UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Receive one file and write it to disk.
    Server {
        /// Local address to bind.
        #[arg(short, long, default_value = "127.0.0.1:5555")]
        bind: SocketAddr,
        /// Where the received file is written.
        #[arg(short, long, default_value = "received_file")]
        output: PathBuf,
        /// Seconds to wait for a datagram before re-sending the last ACK.
        #[arg(long, default_value_t = 3.0)]
        timeout: f64,
        /// Give up after this many consecutive silent timeouts.
        #[arg(long)]
        idle_limit: Option<u32>,
    },
    /// Send one file to a server.
    Client {
        /// File to send.
        file: PathBuf,
        /// Remote server address.
        #[arg(short, long, default_value = "127.0.0.1:5555")]
        server: SocketAddr,
        /// Seconds to wait for an ACK before going back to the window base.
        #[arg(long, default_value_t = 2.0)]
        timeout: f64,
        /// Seconds to pause before sending the file digest.
        #[arg(long, default_value_t = 2.0)]
        settle: f64,
        /// Initial slow-start threshold, in packets.
        #[arg(long, default_value_t = 16)]
        threshold: u32,
        /// Halve the threshold on every timeout.
        #[arg(long)]
        threshold_decrease: bool,
        #[command(flatten)]
        faults: Faults,
    },
}

/// Fault injection applied to outgoing datagrams.
#[derive(Args)]
struct Faults {
    /// Probability of dropping a datagram.
    #[arg(long, default_value_t = 0.0, value_parser = probability)]
    loss_rate: f64,
    /// Probability of zeroing a data packet's CRC field.
    #[arg(long, default_value_t = 0.0, value_parser = probability)]
    corrupt_rate: f64,
    /// Probability of sending a datagram twice.
    #[arg(long, default_value_t = 0.0, value_parser = probability)]
    duplicate_rate: f64,
    /// Seed for the fault RNG.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.mode {
        Mode::Server {
            bind,
            output,
            timeout,
            idle_limit,
        } => {
            let config = Config {
                receiver_timeout: seconds(timeout)?,
                receiver_idle_limit: idle_limit,
                ..Config::default()
            };
            run_server(bind, &output, &config).await?
        }
        Mode::Client {
            file,
            server,
            timeout,
            settle,
            threshold,
            threshold_decrease,
            faults,
        } => {
            let config = Config {
                sender_timeout: seconds(timeout)?,
                settle_delay: seconds(settle)?,
                initial_threshold: threshold,
                threshold_decrease,
                ..Config::default()
            };
            run_client(&file, server, &config, faults).await?
        }
    };

    Ok(match outcome {
        Outcome::Success => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn run_server(bind: SocketAddr, output: &Path, config: &Config) -> Result<Outcome> {
    let socket = Socket::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    log::info!("listening on {}", socket.local_addr);

    let report = receive_file(socket, config).await?;
    if report.has_file() {
        tokio::fs::write(output, &report.data)
            .await
            .with_context(|| format!("writing {}", output.display()))?;
        log::info!("saved {} bytes to {}", report.data.len(), output.display());
    }
    println!(
        "{}: {} packets, {} ACKs sent, {} corrupted, {} duplicates",
        report.outcome, report.packets, report.acks_sent, report.corrupted, report.duplicates
    );
    Ok(report.outcome)
}

async fn run_client(
    file: &Path,
    server: SocketAddr,
    config: &Config,
    faults: Faults,
) -> Result<Outcome> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let local = SocketAddr::from(([0u8, 0, 0, 0], 0));
    let socket = Socket::bind(local).await.context("binding client socket")?;
    let transport = FaultyTransport::new(
        socket,
        SimulatorConfig {
            loss_rate: faults.loss_rate,
            corrupt_rate: faults.corrupt_rate,
            duplicate_rate: faults.duplicate_rate,
            seed: faults.seed,
        },
    );

    let report = send_file(transport, server, &data, config).await?;
    println!(
        "{}: {} packets, {} sent, {} timeouts, final window {}",
        report.outcome, report.packets, report.packets_sent, report.timeouts, report.final_window
    );
    Ok(report.outcome)
}

fn probability(s: &str) -> std::result::Result<f64, String> {
    let p: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{s} is not a probability in [0, 1]"))
    }
}

fn seconds(value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid duration {value}"))
}
