//! Connection finite-state machine types.
//!
//! ```text
//!  AwaitingHandshake ──Connect/ACK──▶ Transferring ──all acked / MD5──▶ AwaitingDigest
//!        │                                                                  │
//!        │ timeout / unexpected                                             ▼
//!        └───────────────────────────────▶ Closed(Aborted)     Closed(Success | Mismatch)
//! ```
//!
//! Transitions live in [`crate::connection`], [`crate::sender`] and
//! [`crate::receiver`]; this module only names the states and outcomes.

use std::fmt;

/// Phase of one transfer session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    AwaitingHandshake,
    Transferring,
    AwaitingDigest,
    Closed(Outcome),
}


/// Terminal result of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Sender: every packet acknowledged and the digest sent.
    /// Receiver: reassembled digest equals the sender's.
    Success,
    /// Receiver only: the digests differ.  The data is still persisted.
    Mismatch { received: String, computed: String },
    /// The session never got going, or the peer went silent.
    Aborted(AbortReason),
}

/// Why a session was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// No handshake reply within the timeout.
    HandshakeTimedOut,
    /// The first message was not the expected handshake frame.
    UnexpectedHandshake(String),
    /// The receiver hit its configured idle limit.
    PeerSilent { timeouts: u32 },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Mismatch { received, computed } => {
                write!(f, "digest mismatch (received {received}, computed {computed})")
            }
            Self::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandshakeTimedOut => write!(f, "timed out waiting for handshake"),
            Self::UnexpectedHandshake(got) => write!(f, "unexpected handshake message {got:?}"),
            Self::PeerSilent { timeouts } => {
                write!(f, "peer silent for {timeouts} consecutive timeouts")
            }
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed(outcome) => write!(f, "Closed({outcome})"),
            other => write!(f, "{other:?}"),
        }
    }
}
