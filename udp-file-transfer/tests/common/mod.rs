//! Shared helpers for the integration tests: loopback sockets, a
//! deterministic drop pattern, and a few raw-datagram conveniences for
//! scripting one side of a session by hand.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use udp_file_transfer::packet::{ControlFrame, Datagram, Packet};
use udp_file_transfer::socket::{Recv, Socket, Transport};

/// Bind a socket to an OS-assigned port on loopback.
pub async fn ephemeral() -> Socket {
    let addr = "127.0.0.1:0".parse().unwrap();
    Socket::bind(addr).await.expect("bind failed")
}

/// `len` bytes of printable, non-zero content.
pub fn sample_file(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'A' + (i % 26) as u8).collect()
}

/// Wait for the next datagram and decode it, panicking on timeout.
pub async fn expect_datagram(sock: &Socket, wait: Duration) -> (Datagram, SocketAddr) {
    match sock.recv_from(Some(wait)).await.expect("recv failed") {
        Recv::Datagram(buf, from) => (
            Datagram::decode(&buf).unwrap_or_else(|e| panic!("undecodable datagram: {e}")),
            from,
        ),
        Recv::TimedOut => panic!("no datagram within {wait:?}"),
    }
}

/// Wait for the next data packet and return its sequence number.
pub async fn expect_data(sock: &Socket, wait: Duration) -> u32 {
    match expect_datagram(sock, wait).await.0 {
        Datagram::Data(packet) => packet.seq,
        other => panic!("expected data packet, got {other:?}"),
    }
}

/// Wait for the next cumulative ACK and return its value.
pub async fn expect_ack(sock: &Socket, wait: Duration) -> u32 {
    match expect_datagram(sock, wait).await.0 {
        Datagram::Control(ControlFrame::Ack(n)) => n,
        other => panic!("expected ACK<n>, got {other:?}"),
    }
}

pub async fn send_frame(sock: &Socket, frame: ControlFrame, to: SocketAddr) {
    sock.send_to(&frame.encode(), to).await.unwrap();
}

pub async fn send_packet(sock: &Socket, packet: &Packet, to: SocketAddr) {
    sock.send_to(&packet.encode(), to).await.unwrap();
}

/// Drops every `every`-th datagram it is asked to send.
///
/// With `data_only` set, only data packets are counted and dropped, so
/// control frames (handshake, digest) always get through.  The first send
/// is never dropped.
pub struct DropPattern<T> {
    inner: T,
    every: u32,
    data_only: bool,
    seen: AtomicU32,
    pub dropped: AtomicU32,
}

impl<T> DropPattern<T> {
    pub fn new(inner: T, every: u32, data_only: bool) -> Self {
        Self {
            inner,
            every,
            data_only,
            seen: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }
}

impl<T: Transport> Transport for DropPattern<T> {
    async fn send_to(&self, buf: &[u8], peer: SocketAddr) -> io::Result<()> {
        let counted = !self.data_only || matches!(Datagram::decode(buf), Ok(Datagram::Data(_)));
        if counted {
            let n = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
            if n > 1 && n % self.every == 0 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
        }
        self.inner.send_to(buf, peer).await
    }

    async fn recv_from(&self, wait: Option<Duration>) -> io::Result<Recv> {
        self.inner.recv_from(wait).await
    }
}
