//! Per-session handshake and inbound demultiplexing.
//!
//! A [`Connection`] owns the transport, the peer address and the current
//! [`Phase`] for one transfer.  It is created by either
//! - [`Connection::connect`] (sender): send `CONNECT <n>`, wait one timeout
//!   for the bare `ACK`, or
//! - [`Connection::accept`] (receiver): wait for `CONNECT`, reply `ACK`.
//!
//! Any other first message, or a sender-side timeout, leaves the connection
//! in `Closed(Aborted)`; there is no handshake retry.  After a successful
//! handshake the role drivers in [`crate::sender`] and [`crate::receiver`]
//! take over and use [`Connection::recv`] to read peer traffic.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;
use crate::packet::{ControlFrame, Datagram, Packet, PacketError};
use crate::socket::{Recv, Transport};
use crate::state::{AbortReason, Outcome, Phase};

/// One inbound event as seen by a role's control loop.
#[derive(Debug)]
pub enum Inbound {
    Frame(ControlFrame),
    Data(Packet),
    /// Datagram from the peer that the codec rejected.
    Malformed(PacketError),
    TimedOut,
}

/// A handshaken (or aborted) session with one peer.
#[derive(Debug)]
pub struct Connection<T> {
    /// Current FSM state.
    pub phase: Phase,

    /// Remote peer address.
    pub peer: SocketAddr,

    /// Packet count announced in `CONNECT <n>`, if any.
    pub total_packets: Option<u32>,

    transport: T,
}

impl<T: Transport> Connection<T> {
    /// Active open: announce `total_packets` to `peer` and wait up to
    /// `wait` for the handshake `ACK`.
    pub async fn connect(
        transport: T,
        peer: SocketAddr,
        total_packets: u32,
        wait: Duration,
    ) -> Result<Self> {
        let mut conn = Self {
            phase: Phase::AwaitingHandshake,
            peer,
            total_packets: Some(total_packets),
            transport,
        };
        conn.send_frame(&ControlFrame::Connect {
            total_packets: Some(total_packets),
        })
        .await?;
        log::debug!("[handshake] → CONNECT {total_packets} to {peer}");

        conn.phase = match conn.transport.recv_from(Some(wait)).await? {
            Recv::TimedOut => {
                log::warn!("[handshake] no ACK from {peer} within {wait:?}");
                Phase::Closed(Outcome::Aborted(AbortReason::HandshakeTimedOut))
            }
            Recv::Datagram(buf, from)
                if from == peer
                    && matches!(ControlFrame::decode(&buf), Some(Ok(ControlFrame::ConnectAck))) =>
            {
                log::info!("connection established with {peer}");
                Phase::Transferring
            }
            Recv::Datagram(buf, from) => {
                log::warn!("[handshake] unexpected reply from {from}; aborting");
                Phase::Closed(Outcome::Aborted(AbortReason::UnexpectedHandshake(
                    preview(&buf),
                )))
            }
        };
        Ok(conn)
    }

    /// Passive open: block until the first datagram arrives and accept it
    /// only if it is a `CONNECT`.
    pub async fn accept(transport: T) -> Result<Self> {
        let (buf, peer) = loop {
            match transport.recv_from(None).await? {
                Recv::Datagram(buf, from) => break (buf, from),
                Recv::TimedOut => continue,
            }
        };
        let mut conn = Self {
            phase: Phase::AwaitingHandshake,
            peer,
            total_packets: None,
            transport,
        };

        match ControlFrame::decode(&buf) {
            Some(Ok(ControlFrame::Connect { total_packets })) => {
                conn.total_packets = total_packets;
                conn.send_frame(&ControlFrame::ConnectAck).await?;
                conn.phase = Phase::Transferring;
                match total_packets {
                    Some(n) => log::info!("connection from {peer}; expecting {n} packets"),
                    None => log::info!("connection from {peer}"),
                }
            }
            _ => {
                log::warn!("[handshake] invalid connection message from {peer}; aborting");
                conn.phase = Phase::Closed(Outcome::Aborted(AbortReason::UnexpectedHandshake(
                    preview(&buf),
                )));
            }
        }
        Ok(conn)
    }

    pub async fn send_frame(&self, frame: &ControlFrame) -> Result<()> {
        self.transport.send_to(&frame.encode(), self.peer).await?;
        Ok(())
    }

    pub async fn send_packet(&self, packet: &Packet) -> Result<()> {
        self.transport.send_to(&packet.encode(), self.peer).await?;
        Ok(())
    }

    /// Wait up to `wait` for the next datagram from the peer and classify
    /// it.  Datagrams from any other address are dropped without restarting
    /// the clock.
    pub async fn recv(&self, wait: Duration) -> Result<Inbound> {
        let deadline = Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.transport.recv_from(Some(remaining)).await? {
                Recv::TimedOut => return Ok(Inbound::TimedOut),
                Recv::Datagram(_, from) if from != self.peer => {
                    log::debug!("ignoring datagram from stranger {from}");
                }
                Recv::Datagram(buf, _) => {
                    return Ok(match Datagram::decode(&buf) {
                        Ok(Datagram::Control(frame)) => Inbound::Frame(frame),
                        Ok(Datagram::Data(packet)) => Inbound::Data(packet),
                        Err(e) => Inbound::Malformed(e),
                    });
                }
            }
        }
    }
}

/// Short printable rendering of an unexpected datagram for diagnostics.
fn preview(buf: &[u8]) -> String {
    let shown = &buf[..buf.len().min(32)];
    String::from_utf8_lossy(shown).into_owned()
}
