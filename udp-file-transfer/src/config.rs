//! Session configuration.
//!
//! Supplied once at startup (see `main.rs`) and never mutated while a
//! session runs.

use std::time::Duration;

use crate::congestion::INITIAL_THRESHOLD;

/// Timeouts and window parameters shared by both roles.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long the sender waits for an ACK before going back to `base`.
    pub sender_timeout: Duration,
    /// How long the receiver waits for a datagram before re-sending its ACK.
    pub receiver_timeout: Duration,
    /// Pause between the final ACK and the digest frame.
    pub settle_delay: Duration,
    /// Initial slow-start threshold in packets.
    pub initial_threshold: u32,
    /// Halve the threshold on every sender timeout.
    pub threshold_decrease: bool,
    /// Receiver gives up after this many consecutive silent timeouts.
    pub receiver_idle_limit: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sender_timeout: Duration::from_secs(2),
            receiver_timeout: Duration::from_secs(3),
            settle_delay: Duration::from_secs(2),
            initial_threshold: INITIAL_THRESHOLD,
            threshold_decrease: false,
            receiver_idle_limit: None,
        }
    }
}

impl Config {
    /// Short timeouts for loopback tests.
    pub fn loopback() -> Self {
        Self {
            sender_timeout: Duration::from_millis(200),
            receiver_timeout: Duration::from_millis(300),
            settle_delay: Duration::from_millis(100),
            receiver_idle_limit: Some(20),
            ..Self::default()
        }
    }
}
