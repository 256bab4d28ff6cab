//! Fault-injecting transport for exercising recovery paths.
//!
//! Real networks drop, duplicate, and corrupt packets.  [`FaultyTransport`]
//! wraps any [`Transport`] and applies a seeded fault model to outgoing
//! datagrams:
//!
//! | Fault        | Description                                             |
//! |--------------|---------------------------------------------------------|
//! | Loss         | Drop a datagram with probability `loss_rate`.           |
//! | Corruption   | Zero the CRC field of a data packet (`corrupt_rate`).   |
//! | Duplication  | Deliver a datagram twice (`duplicate_rate`).            |
//!
//! Receives pass straight through.  With the default configuration the
//! wrapper is a transparent pass-through.

use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::packet::{Datagram, CHECKSUM_DIGITS, SEQ_DIGITS};
use crate::socket::{Recv, Transport};

/// Fault probabilities, each in `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub loss_rate: f64,
    pub corrupt_rate: f64,
    pub duplicate_rate: f64,
    /// RNG seed so failures are reproducible.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            duplicate_rate: 0.0,
            seed: 0,
        }
    }
}

/// Counters of the faults applied so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultStats {
    pub dropped: u32,
    pub corrupted: u32,
    pub duplicated: u32,
}

#[derive(Debug)]
struct State {
    rng: StdRng,
    stats: FaultStats,
}

/// A [`Transport`] that randomly damages what it sends.
#[derive(Debug)]
pub struct FaultyTransport<T> {
    inner: T,
    config: SimulatorConfig,
    state: Mutex<State>,
}

/// What to do with one outgoing datagram.
struct Verdict {
    drop: bool,
    corrupt: bool,
    copies: usize,
}

impl<T: Transport> FaultyTransport<T> {
    /// Wrap `inner`.  Rates outside `[0.0, 1.0]` are clamped; NaN counts
    /// as zero.
    pub fn new(inner: T, mut config: SimulatorConfig) -> Self {
        for rate in [
            &mut config.loss_rate,
            &mut config.corrupt_rate,
            &mut config.duplicate_rate,
        ] {
            *rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        }
        let state = State {
            rng: StdRng::seed_from_u64(config.seed),
            stats: FaultStats::default(),
        };
        Self {
            inner,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn stats(&self) -> FaultStats {
        self.lock().stats
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn roll(&self, is_data: bool) -> Verdict {
        let mut state = self.lock();
        let drop = state.rng.gen_bool(self.config.loss_rate);
        let corrupt = !drop && is_data && state.rng.gen_bool(self.config.corrupt_rate);
        let copies = if !drop && state.rng.gen_bool(self.config.duplicate_rate) {
            2
        } else {
            1
        };
        if drop {
            state.stats.dropped += 1;
        }
        if corrupt {
            state.stats.corrupted += 1;
        }
        if copies > 1 {
            state.stats.duplicated += 1;
        }
        Verdict {
            drop,
            corrupt,
            copies,
        }
    }
}

impl<T: Transport> Transport for FaultyTransport<T> {
    async fn send_to(&self, buf: &[u8], peer: SocketAddr) -> io::Result<()> {
        let is_data = matches!(Datagram::decode(buf), Ok(Datagram::Data(_)));
        let verdict = self.roll(is_data);
        if verdict.drop {
            log::debug!("[sim] dropped {} byte datagram", buf.len());
            return Ok(());
        }

        let mut bytes = buf.to_vec();
        if verdict.corrupt {
            bytes[SEQ_DIGITS..SEQ_DIGITS + CHECKSUM_DIGITS].fill(b'0');
            log::debug!(
                "[sim] zeroed CRC of packet {}",
                String::from_utf8_lossy(&bytes[..SEQ_DIGITS])
            );
        }
        for _ in 0..verdict.copies {
            self.inner.send_to(&bytes, peer).await?;
        }
        Ok(())
    }

    async fn recv_from(&self, wait: Option<Duration>) -> io::Result<Recv> {
        self.inner.recv_from(wait).await
    }
}
