//! Receiver role: accept, reassemble, verify.
//!
//! [`receive_file`] waits for a `CONNECT`, then loops on one bounded receive
//! at a time:
//!
//! | Inbound                  | Action                                          |
//! |--------------------------|-------------------------------------------------|
//! | valid data packet        | feed [`ReceiveBuffer`], send `ACK<expected>`    |
//! | CRC mismatch / malformed | discard silently, no ACK                        |
//! | `MD5<hex>`               | compare digests and close                       |
//! | timeout                  | re-send `ACK<expected>`                         |
//!
//! Corrupted packets are never negatively acknowledged; the sender recovers
//! them through its own timeout.

use crate::checksum::{verify_digest, DigestCheck};
use crate::config::Config;
use crate::connection::{Connection, Inbound};
use crate::error::Result;
use crate::gbn_receiver::{Accepted, ReceiveBuffer};
use crate::packet::{ControlFrame, Packet};
use crate::socket::Transport;
use crate::state::{AbortReason, Outcome, Phase};

/// Summary of a finished receive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveReport {
    pub outcome: Outcome,
    /// Reassembled file with the final packet's padding stripped.
    pub data: Vec<u8>,
    /// Packets delivered in order (`expected_seq` at close).
    pub packets: u32,
    /// Packet count the sender announced in its `CONNECT`, if any.
    pub announced_packets: Option<u32>,
    pub acks_sent: u32,
    pub corrupted: u32,
    pub malformed: u32,
    pub duplicates: u32,
}

impl ReceiveReport {
    /// `true` when the data should be written out: the session got past the
    /// handshake and ended on a digest comparison.
    pub fn has_file(&self) -> bool {
        matches!(self.outcome, Outcome::Success | Outcome::Mismatch { .. })
    }
}

/// Run one receive session on `transport`.
pub async fn receive_file<T: Transport>(transport: T, config: &Config) -> Result<ReceiveReport> {
    let conn = Connection::accept(transport).await?;
    let mut receiver = FileReceiver {
        conn,
        buffer: ReceiveBuffer::new(),
        acks_sent: 0,
        corrupted: 0,
        malformed: 0,
        duplicates: 0,
    };
    if let Phase::Closed(outcome) = receiver.conn.phase.clone() {
        return Ok(receiver.into_report(outcome));
    }

    let outcome = receiver.transfer(config).await?;
    receiver.conn.phase = Phase::Closed(outcome.clone());
    match &outcome {
        Outcome::Success => log::info!("file received correctly; digest matches"),
        other => log::warn!("transfer ended: {other}"),
    }
    Ok(receiver.into_report(outcome))
}

/// Receiver-side session state.
struct FileReceiver<T> {
    conn: Connection<T>,
    buffer: ReceiveBuffer,
    acks_sent: u32,
    corrupted: u32,
    malformed: u32,
    duplicates: u32,
}

impl<T: Transport> FileReceiver<T> {
    /// The `Transferring` phase; returns once the digest arrives or the
    /// idle limit is hit.
    async fn transfer(&mut self, config: &Config) -> Result<Outcome> {
        let mut idle = 0u32;
        loop {
            let inbound = self.conn.recv(config.receiver_timeout).await?;
            if !matches!(inbound, Inbound::TimedOut) {
                idle = 0;
            }
            match inbound {
                Inbound::Data(packet) => self.on_packet(packet).await?,
                Inbound::Frame(ControlFrame::FileDigest(hex)) => {
                    self.conn.phase = Phase::AwaitingDigest;
                    log::debug!("[receiver] ← MD5{hex}");
                    return Ok(self.verify(&hex));
                }
                Inbound::Frame(other) => log::debug!("[receiver] ignoring {other:?}"),
                Inbound::Malformed(e) => {
                    self.malformed += 1;
                    log::debug!("[receiver] discarding malformed datagram: {e}");
                }
                Inbound::TimedOut => {
                    idle += 1;
                    if let Some(limit) = config.receiver_idle_limit {
                        if idle >= limit {
                            return Ok(Outcome::Aborted(AbortReason::PeerSilent {
                                timeouts: idle,
                            }));
                        }
                    }
                    log::debug!(
                        "[receiver] timeout; re-sending ACK{}",
                        self.buffer.ack_number()
                    );
                    self.send_ack().await?;
                }
            }
        }
    }

    async fn on_packet(&mut self, packet: Packet) -> Result<()> {
        if let Err(e) = packet.verify() {
            self.corrupted += 1;
            log::warn!("[receiver] packet {} discarded: {e}", packet.seq);
            return Ok(());
        }

        match self.buffer.on_packet(packet.seq, &packet.payload) {
            Accepted::Delivered { drained } => {
                log::debug!("[receiver] ← DATA seq={} in order", packet.seq);
                if drained > 0 {
                    log::debug!("[receiver] drained {drained} buffered packet(s)");
                }
            }
            Accepted::Buffered => {
                log::debug!(
                    "[receiver] ← DATA seq={} out of order; buffered ({} pending)",
                    packet.seq,
                    self.buffer.pending_len()
                );
            }
            Accepted::Duplicate => {
                self.duplicates += 1;
                log::debug!("[receiver] ← DATA seq={} duplicate", packet.seq);
            }
        }
        if let Some(total) = self.conn.total_packets {
            log::trace!("[receiver] progress {}/{total}", self.buffer.ack_number());
        }
        self.send_ack().await
    }

    async fn send_ack(&mut self) -> Result<()> {
        let n = self.buffer.ack_number();
        self.conn.send_frame(&ControlFrame::Ack(n)).await?;
        self.acks_sent += 1;
        log::debug!("[receiver] → ACK{n}");
        Ok(())
    }

    fn verify(&self, received: &str) -> Outcome {
        match verify_digest(received, self.buffer.delivered()) {
            DigestCheck::Match => Outcome::Success,
            DigestCheck::Mismatch { received, computed } => {
                Outcome::Mismatch { received, computed }
            }
        }
    }

    fn into_report(self, outcome: Outcome) -> ReceiveReport {
        ReceiveReport {
            outcome,
            packets: self.buffer.ack_number(),
            announced_packets: self.conn.total_packets,
            acks_sent: self.acks_sent,
            corrupted: self.corrupted,
            malformed: self.malformed,
            duplicates: self.duplicates,
            data: self.buffer.into_file(),
        }
    }
}
