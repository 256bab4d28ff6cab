//! Go-Back-N send-side state machine.
//!
//! [`SendWindow`] segments a file into framed packets and tracks which of
//! them the receiver has acknowledged.
//!
//! # Protocol contract
//!
//! - Each round emits up to `cwnd` packets starting at `next_seq`.
//! - ACKs are **cumulative**: `Ack(K)` means packets `0..K` have arrived.
//! - On timeout, the window collapses to one packet and sending resumes at
//!   `base` (go back to N), not at the lost packet alone.
//!
//! # Sequence-number layout
//!
//! ```text
//!     base            next_seq            total
//!      │                  │                  │
//!  ────┼──────────────────┼──────────────────┼──▶ seq space
//!  acked│ <── in flight ─▶│ <── unsent ─────▶│
//! ```
//!
//! Invariant: `base <= next_seq <= total`.
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.

use crate::congestion::{CongestionWindow, Phase};
use crate::error::Error;
use crate::packet::{Packet, MAX_PACKETS, PAYLOAD_LEN};

/// Result of feeding a cumulative ACK to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// `base` moved forward by `acked` packets and the window grew.
    Advanced { acked: u32, phase: Phase },
    /// ACK at or behind `base`; nothing new.
    Stale,
    /// ACK names a sequence number past the end of the file.
    OutOfRange,
}

/// Send-side state for one file transfer.
#[derive(Debug)]
pub struct SendWindow {
    /// Oldest unacknowledged sequence number (cumulative ACK floor).
    pub base: u32,

    /// Sequence number of the next packet to emit.
    pub next_seq: u32,

    packets: Vec<Packet>,
    cwnd: CongestionWindow,
}

impl SendWindow {
    /// Split `file` into [`PAYLOAD_LEN`]-byte packets numbered from 0.
    ///
    /// Fails when the file needs more sequence numbers than the 4-digit
    /// header field can hold.
    pub fn new(file: &[u8], cwnd: CongestionWindow) -> Result<Self, Error> {
        let count = file.len().div_ceil(PAYLOAD_LEN);
        if count > MAX_PACKETS as usize {
            return Err(Error::FileTooLarge { packets: count });
        }
        let packets = file
            .chunks(PAYLOAD_LEN)
            .zip(0u32..)
            .map(|(chunk, seq)| Packet::new(seq, chunk))
            .collect();
        Ok(Self {
            base: 0,
            next_seq: 0,
            packets,
            cwnd,
        })
    }

    /// Total number of packets in the file.
    pub fn total(&self) -> u32 {
        self.packets.len() as u32
    }

    /// Current congestion window in packets.
    pub fn window_size(&self) -> u32 {
        self.cwnd.size()
    }

    /// `true` once every packet has been cumulatively acknowledged.
    pub fn is_complete(&self) -> bool {
        self.base == self.total()
    }

    /// Take the packets for the next round and advance `next_seq` past them.
    ///
    /// Returns at most `cwnd` packets; fewer (possibly none) near the end of
    /// the file.
    pub fn next_round(&mut self) -> &[Packet] {
        let start = self.next_seq;
        let end = start.saturating_add(self.cwnd.size()).min(self.total());
        self.next_seq = end;
        &self.packets[start as usize..end as usize]
    }

    /// Process a cumulative ACK.
    pub fn on_ack(&mut self, ack_num: u32) -> AckOutcome {
        if ack_num > self.total() {
            return AckOutcome::OutOfRange;
        }
        if ack_num <= self.base {
            return AckOutcome::Stale;
        }
        let acked = ack_num - self.base;
        self.base = ack_num;
        // After a rewind the receiver may already hold packets past
        // `next_seq` in its pending map.
        self.next_seq = self.next_seq.max(self.base);
        let phase = self.cwnd.on_ack();
        AckOutcome::Advanced { acked, phase }
    }

    /// Receive timeout: collapse the window and go back to `base`.
    pub fn on_timeout(&mut self) {
        self.cwnd.on_timeout();
        self.next_seq = self.base;
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
