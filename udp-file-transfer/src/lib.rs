//! `udp-file-transfer` — reliable, ordered whole-file delivery over UDP.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐  CONNECT / DATA / MD5  ┌──────────┐
//!  │  Sender  │───────────────────────▶│ Receiver │
//!  └────┬─────┘                        └─────┬────┘
//!       │        ACK / ACK<n>                │
//!       │◀───────────────────────────────────┘
//!       │
//!  ┌────▼───────────────────────────────┐
//!  │            Connection              │
//!  │  (handshake, phase, peer filter)   │
//!  └────┬───────────────────────────────┘
//!       │ opaque datagrams
//!  ┌────▼──────┐
//!  │ Transport │  (tokio UdpSocket, optionally behind the fault simulator)
//!  └───────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]        — wire format (data packets and control frames)
//! - [`checksum`]      — CRC-32 per packet, MD5 per file
//! - [`gbn_sender`]    — send window: segmentation and go-back-N cursor
//! - [`congestion`]    — slow start / congestion avoidance window
//! - [`gbn_receiver`]  — out-of-order reassembly buffer
//! - [`state`]         — session phases and outcomes
//! - [`connection`]    — handshake and inbound classification
//! - [`sender`]        — sender role driver
//! - [`receiver`]      — receiver role driver
//! - [`socket`]        — datagram transport seam and UDP implementation
//! - [`simulator`]     — loss / corruption / duplication injection
//! - [`config`]        — timeouts and window parameters

pub mod checksum;
pub mod config;
pub mod congestion;
pub mod connection;
pub mod error;
pub mod gbn_receiver;
pub mod gbn_sender;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod simulator;
pub mod socket;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use receiver::{receive_file, ReceiveReport};
pub use sender::{send_file, SendReport};
pub use state::{AbortReason, Outcome, Phase};
