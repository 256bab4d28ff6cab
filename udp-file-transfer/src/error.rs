//! Crate-level error type.
//!
//! Only conditions that end a session abnormally are errors.  Malformed or
//! corrupted datagrams and receive timeouts are absorbed by the protocol
//! loops; handshake failure and digest mismatch are reported as a session
//! [`Outcome`](crate::state::Outcome).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport or storage failure from the OS.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file needs more sequence numbers than the 4-digit field allows.
    #[error("file needs {packets} packets, more than the {max} a transfer can number", max = crate::packet::MAX_PACKETS)]
    FileTooLarge { packets: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
