//! Sender role: handshake, windowed transfer, digest.
//!
//! [`send_file`] drives one session through
//! `AwaitingHandshake → Transferring → AwaitingDigest → Closed(Success)`.
//!
//! Each transfer round emits up to `cwnd` packets, then waits one
//! `sender_timeout` for a single inbound message:
//! - `ACK<n>` advancing the base grows the window (slow start, then
//!   congestion avoidance);
//! - a timeout collapses the window to one and goes back to the base.
//!
//! Once every packet is acknowledged the sender pauses for `settle_delay`
//! and fires the `MD5<hex>` frame without waiting for a reply.  The sender
//! never learns whether the receiver's digest matched.

use std::net::SocketAddr;

use crate::checksum::file_digest;
use crate::config::Config;
use crate::congestion::{CongestionWindow, Phase as Growth};
use crate::connection::{Connection, Inbound};
use crate::error::Result;
use crate::gbn_sender::{AckOutcome, SendWindow};
use crate::packet::{ControlFrame, Packet};
use crate::socket::Transport;
use crate::state::{Outcome, Phase};

/// Summary of a finished send session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub outcome: Outcome,
    /// Packets the file was split into.
    pub packets: u32,
    /// Data packets put on the wire, retransmissions included.
    pub packets_sent: u64,
    /// Receive timeouts that triggered a go-back.
    pub timeouts: u32,
    /// Congestion window when the transfer ended.
    pub final_window: u32,
    /// Digest sent to the receiver; `None` if the session aborted first.
    pub digest: Option<String>,
}

/// Transfer `file` to the receiver at `peer` over `transport`.
///
/// I/O errors and an oversize file are returned as `Err`; a failed
/// handshake is reported as [`Outcome::Aborted`].
pub async fn send_file<T: Transport>(
    transport: T,
    peer: SocketAddr,
    file: &[u8],
    config: &Config,
) -> Result<SendReport> {
    let cwnd = CongestionWindow::new(config.initial_threshold)
        .with_threshold_decrease(config.threshold_decrease);
    let window = SendWindow::new(file, cwnd)?;
    log::info!(
        "sending {} bytes as {} packets to {peer}",
        file.len(),
        window.total()
    );

    let conn = Connection::connect(transport, peer, window.total(), config.sender_timeout).await?;
    let mut sender = FileSender {
        conn,
        window,
        packets_sent: 0,
        timeouts: 0,
    };
    if let Phase::Closed(outcome) = &sender.conn.phase {
        return Ok(sender.report(outcome.clone(), None));
    }

    sender.transfer(config).await?;

    sender.conn.phase = Phase::AwaitingDigest;
    let digest = file_digest(file);
    log::info!("all packets acknowledged; file digest {digest}");
    tokio::time::sleep(config.settle_delay).await;
    sender
        .conn
        .send_frame(&ControlFrame::FileDigest(digest.clone()))
        .await?;
    log::debug!("[sender] → MD5{digest}");

    sender.conn.phase = Phase::Closed(Outcome::Success);
    log::info!("transfer complete");
    Ok(sender.report(Outcome::Success, Some(digest)))
}

/// Sender-side session state.
struct FileSender<T> {
    conn: Connection<T>,
    window: SendWindow,
    packets_sent: u64,
    timeouts: u32,
}

impl<T: Transport> FileSender<T> {
    /// The `Transferring` phase: rounds until `base` reaches the end.
    async fn transfer(&mut self, config: &Config) -> Result<()> {
        while !self.window.is_complete() {
            let round: Vec<Packet> = self.window.next_round().to_vec();
            for packet in &round {
                self.conn.send_packet(packet).await?;
                self.packets_sent += 1;
                log::debug!("[sender] → DATA seq={} crc={}", packet.seq, packet.checksum);
            }

            match self.conn.recv(config.sender_timeout).await? {
                Inbound::Frame(ControlFrame::Ack(n)) => self.on_ack(n),
                Inbound::TimedOut => {
                    self.timeouts += 1;
                    self.window.on_timeout();
                    log::debug!(
                        "[sender] timeout; window reset to 1, resending from {}",
                        self.window.base
                    );
                }
                Inbound::Frame(other) => log::debug!("[sender] ignoring {other:?}"),
                Inbound::Data(packet) => {
                    log::debug!("[sender] ignoring data packet {}", packet.seq)
                }
                Inbound::Malformed(e) => log::debug!("[sender] discarding datagram: {e}"),
            }
        }
        Ok(())
    }

    fn on_ack(&mut self, n: u32) {
        match self.window.on_ack(n) {
            AckOutcome::Advanced { acked, phase } => {
                let regime = match phase {
                    Growth::SlowStart => "slow start",
                    Growth::CongestionAvoidance => "congestion avoidance",
                };
                log::debug!(
                    "[sender] ← ACK{n} (+{acked}); {regime}: window = {}",
                    self.window.window_size()
                );
            }
            AckOutcome::Stale => log::debug!("[sender] ← ACK{n} (duplicate)"),
            AckOutcome::OutOfRange => log::warn!(
                "[sender] ← ACK{n} beyond {} packets; ignored",
                self.window.total()
            ),
        }
    }

    fn report(&self, outcome: Outcome, digest: Option<String>) -> SendReport {
        SendReport {
            outcome,
            packets: self.window.total(),
            packets_sent: self.packets_sent,
            timeouts: self.timeouts,
            final_window: self.window.window_size(),
            digest,
        }
    }
}
