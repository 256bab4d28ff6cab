//! Receive-side reassembly buffer.
//!
//! [`ReceiveBuffer`] accepts validated data packets in any order:
//!
//! - A packet with seq == `expected_seq` is delivered, then any buffered
//!   packets that have become contiguous are drained after it.
//! - A packet ahead of `expected_seq` is held in `pending` until the gap
//!   before it is filled (selective-repeat buffering).
//! - A packet behind `expected_seq` is a duplicate and is dropped.
//!
//! After every packet (accepted or not) the caller sends a **cumulative ACK**
//! carrying [`ReceiveBuffer::ack_number`].
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.

use std::collections::BTreeMap;

use crate::checksum::strip_padding;

/// What happened to an inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    /// In-order; `drained` further packets were released from `pending`.
    Delivered { drained: u32 },
    /// Ahead of `expected_seq`; held for later.
    Buffered,
    /// Already delivered or already held.
    Duplicate,
}

/// Reassembly state for one transfer.
#[derive(Debug, Default)]
pub struct ReceiveBuffer {
    /// Next sequence number required for in-order delivery.
    pub expected_seq: u32,

    /// Out-of-order payloads keyed by sequence number.  Every key is
    /// strictly greater than `expected_seq`.
    pending: BTreeMap<u32, Vec<u8>>,

    /// Payloads of packets `0..expected_seq`, concatenated in order.
    delivered: Vec<u8>,
}

impl ReceiveBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one checksum-validated packet.
    pub fn on_packet(&mut self, seq: u32, payload: &[u8]) -> Accepted {
        if seq < self.expected_seq {
            return Accepted::Duplicate;
        }
        if seq > self.expected_seq {
            if self.pending.contains_key(&seq) {
                return Accepted::Duplicate;
            }
            self.pending.insert(seq, payload.to_vec());
            return Accepted::Buffered;
        }

        self.delivered.extend_from_slice(payload);
        self.expected_seq += 1;

        let mut drained = 0;
        while let Some(next) = self.pending.remove(&self.expected_seq) {
            self.delivered.extend_from_slice(&next);
            self.expected_seq += 1;
            drained += 1;
        }
        Accepted::Delivered { drained }
    }

    /// Cumulative ACK value: the next sequence number still missing.
    pub fn ack_number(&self) -> u32 {
        self.expected_seq
    }

    /// Number of packets held out of order.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Delivered bytes including the zero padding of the final packet.
    pub fn delivered(&self) -> &[u8] {
        &self.delivered
    }

    /// Consume the buffer and return the delivered stream with trailing
    /// padding removed.
    pub fn into_file(mut self) -> Vec<u8> {
        let len = strip_padding(&self.delivered).len();
        self.delivered.truncate(len);
        self.delivered
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
