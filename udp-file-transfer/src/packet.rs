//! Wire-format definitions for every datagram the two roles exchange.
//!
//! A datagram is either a fixed-layout data [`Packet`] or a textual
//! [`ControlFrame`].  This module is responsible for:
//! - Framing a file chunk into a data packet (padding + CRC-32).
//! - Serialising packets and control frames into byte buffers.
//! - Classifying and parsing a raw datagram, returning [`PacketError`] for
//!   truncated or non-numeric input.
//!
//! Pure byte transformations; nothing here touches a socket.
//!
//! # Wire format
//!
//! All numeric fields are ASCII decimal.
//!
//! ```text
//!  data packet (24 bytes)
//!  +---------+--------------------+------------------------------+
//!  | seq (4) |   checksum (10)    |         payload (10)         |
//!  +---------+--------------------+------------------------------+
//!   "0042"    "3632233996"          b"hello\0\0\0\0\0"
//!
//!  control frames (variable length)
//!  CONNECT            handshake request
//!  CONNECT <n>        handshake request announcing n packets
//!  ACK                handshake reply
//!  ACK<n>             cumulative ACK, n = next expected sequence number
//!  MD5<hex>           whole-file digest
//! ```
//!
//! Control frames are recognised by their literal prefix before any attempt
//! is made to parse a data packet.

use thiserror::Error;

use crate::checksum;

/// Width of the zero-padded decimal sequence-number field.
pub const SEQ_DIGITS: usize = 4;

/// Width of the zero-padded decimal CRC-32 field.
pub const CHECKSUM_DIGITS: usize = 10;

/// Byte length of the data-packet header (sequence + checksum).
pub const HEADER_LEN: usize = SEQ_DIGITS + CHECKSUM_DIGITS;

/// Exact payload size of every data packet; short chunks are zero-padded.
pub const PAYLOAD_LEN: usize = 10;

/// Number of distinct sequence numbers the 4-digit field can carry.
pub const MAX_PACKETS: u32 = 10_000;

const TAG_CONNECT: &[u8] = b"CONNECT";
const TAG_ACK: &[u8] = b"ACK";
const TAG_DIGEST: &[u8] = b"MD5";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a datagram is rejected by the codec or the checksum gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// Datagram shorter than the 14-byte data header.
    #[error("datagram too short: {len} bytes, need at least {HEADER_LEN}")]
    TooShort { len: usize },
    /// Data packet whose payload is not exactly [`PAYLOAD_LEN`] bytes.
    #[error("data packet is {len} bytes, expected {}", HEADER_LEN + PAYLOAD_LEN)]
    BadLength { len: usize },
    /// Sequence-number field is not an unsigned decimal.
    #[error("sequence field is not an unsigned decimal")]
    BadSequence,
    /// Checksum field is not an unsigned decimal that fits in 32 bits.
    #[error("checksum field is not an unsigned 32-bit decimal")]
    BadChecksum,
    /// A control frame carried a malformed argument.
    #[error("malformed {tag} frame")]
    BadControl { tag: &'static str },
    /// Framing is valid but the payload does not match its CRC-32.
    #[error("checksum mismatch: header says {expected}, payload hashes to {computed}")]
    ChecksumMismatch { expected: u32, computed: u32 },
}

// ---------------------------------------------------------------------------
// Data packet
// ---------------------------------------------------------------------------

/// One fixed-size segment of the file.
///
/// Sequence numbers are assigned densely from 0 in file order.  A packet is
/// accepted by the receiver only when `checksum == crc32(payload)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub seq: u32,
    pub checksum: u32,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Frame `chunk` as packet `seq`, zero-padding it to [`PAYLOAD_LEN`] and
    /// computing the checksum over the padded block.
    pub fn new(seq: u32, chunk: &[u8]) -> Self {
        debug_assert!(
            chunk.len() <= PAYLOAD_LEN,
            "chunk of {} bytes exceeds the {PAYLOAD_LEN}-byte payload",
            chunk.len()
        );
        let mut payload = chunk.to_vec();
        payload.resize(PAYLOAD_LEN, 0);
        Self {
            seq,
            checksum: checksum::crc32(&payload),
            payload,
        }
    }

    /// Serialise into `seq(4) ++ checksum(10) ++ payload`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        buf.extend_from_slice(format!("{:0width$}", self.seq, width = SEQ_DIGITS).as_bytes());
        buf.extend_from_slice(
            format!("{:0width$}", self.checksum, width = CHECKSUM_DIGITS).as_bytes(),
        );
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse a data packet of exactly `HEADER_LEN + PAYLOAD_LEN` bytes.
    ///
    /// The checksum is *not* verified here; see [`Packet::verify`].
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::TooShort { len: buf.len() });
        }
        if buf.len() != HEADER_LEN + PAYLOAD_LEN {
            return Err(PacketError::BadLength { len: buf.len() });
        }
        let seq = parse_decimal(&buf[..SEQ_DIGITS]).ok_or(PacketError::BadSequence)?;
        let checksum =
            parse_decimal(&buf[SEQ_DIGITS..HEADER_LEN]).ok_or(PacketError::BadChecksum)?;
        Ok(Self {
            seq,
            checksum,
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }

    /// Recompute the CRC-32 of the payload and compare it with the header.
    pub fn verify(&self) -> Result<(), PacketError> {
        let computed = checksum::crc32(&self.payload);
        if computed == self.checksum {
            Ok(())
        } else {
            Err(PacketError::ChecksumMismatch {
                expected: self.checksum,
                computed,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Control frames
// ---------------------------------------------------------------------------

/// Non-data messages, distinguished by a literal prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    /// Handshake request, optionally announcing the file's packet count.
    Connect { total_packets: Option<u32> },
    /// Bare `ACK` answering a `Connect`.
    ConnectAck,
    /// Cumulative ACK naming the next sequence number the receiver needs.
    Ack(u32),
    /// Hex digest of the whole (unpadded) file.
    FileDigest(String),
}

impl ControlFrame {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Connect { total_packets: None } => TAG_CONNECT.to_vec(),
            Self::Connect {
                total_packets: Some(n),
            } => format!("CONNECT {n}").into_bytes(),
            Self::ConnectAck => TAG_ACK.to_vec(),
            Self::Ack(n) => format!("ACK{n}").into_bytes(),
            Self::FileDigest(hex) => format!("MD5{hex}").into_bytes(),
        }
    }

    /// Try to parse `buf` as a control frame.
    ///
    /// Returns `None` when no control prefix matches, so the caller can fall
    /// through to data-packet decoding.
    pub fn decode(buf: &[u8]) -> Option<Result<Self, PacketError>> {
        if let Some(rest) = buf.strip_prefix(TAG_CONNECT) {
            return Some(decode_connect(rest));
        }
        if let Some(rest) = buf.strip_prefix(TAG_ACK) {
            if rest.is_empty() {
                return Some(Ok(Self::ConnectAck));
            }
            return Some(
                parse_decimal(rest)
                    .map(Self::Ack)
                    .ok_or(PacketError::BadControl { tag: "ACK" }),
            );
        }
        if let Some(rest) = buf.strip_prefix(TAG_DIGEST) {
            return Some(decode_digest(rest));
        }
        None
    }
}

fn decode_connect(rest: &[u8]) -> Result<ControlFrame, PacketError> {
    if rest.is_empty() {
        return Ok(ControlFrame::Connect {
            total_packets: None,
        });
    }
    rest.strip_prefix(b" ")
        .and_then(parse_decimal)
        .map(|n| ControlFrame::Connect {
            total_packets: Some(n),
        })
        .ok_or(PacketError::BadControl { tag: "CONNECT" })
}

fn decode_digest(rest: &[u8]) -> Result<ControlFrame, PacketError> {
    if rest.is_empty() || !rest.iter().all(u8::is_ascii_hexdigit) {
        return Err(PacketError::BadControl { tag: "MD5" });
    }
    Ok(ControlFrame::FileDigest(
        String::from_utf8_lossy(rest).into_owned(),
    ))
}

// ---------------------------------------------------------------------------
// Datagram
// ---------------------------------------------------------------------------

/// Any inbound datagram after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datagram {
    Control(ControlFrame),
    Data(Packet),
}

impl Datagram {
    /// Classify and parse a raw datagram: control prefixes first, then the
    /// fixed data-packet layout.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        match ControlFrame::decode(buf) {
            Some(frame) => frame.map(Self::Control),
            None => Packet::decode(buf).map(Self::Data),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Control(frame) => frame.encode(),
            Self::Data(packet) => packet.encode(),
        }
    }
}

/// Parse an unsigned decimal made only of ASCII digits.
fn parse_decimal(field: &[u8]) -> Option<u32> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(field).ok()?.parse().ok()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
