//! Datagram transport seam and its tokio UDP implementation.
//!
//! The protocol loops are generic over [`Transport`]: send an opaque buffer
//! to a peer, or wait a bounded time for the next inbound buffer.  A receive
//! timeout is reported as [`Recv::TimedOut`], not as an error, because the
//! loops treat it as a scheduled recovery signal.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Largest datagram read in one receive call.
pub const MAX_DATAGRAM: usize = 1024;

/// Result of one bounded receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recv {
    Datagram(Vec<u8>, SocketAddr),
    TimedOut,
}

/// Unreliable, unordered, message-oriented channel.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send `buf` as one datagram to `peer`.
    async fn send_to(&self, buf: &[u8], peer: SocketAddr) -> io::Result<()>;

    /// Wait for the next datagram.  `None` waits indefinitely.
    async fn recv_from(&self, wait: Option<Duration>) -> io::Result<Recv>;
}

impl<T: Transport + ?Sized> Transport for &T {
    async fn send_to(&self, buf: &[u8], peer: SocketAddr) -> io::Result<()> {
        (**self).send_to(buf, peer).await
    }

    async fn recv_from(&self, wait: Option<Duration>) -> io::Result<Recv> {
        (**self).recv_from(wait).await
    }
}

// ---------------------------------------------------------------------------
// Socket
// ---------------------------------------------------------------------------

/// A UDP socket bound to a local address.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (filled in after OS assigns ephemeral port).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind a new socket to `local_addr`.
    ///
    /// Passing `127.0.0.1:0` lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> io::Result<Self> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }
}

impl Transport for Socket {
    async fn send_to(&self, buf: &[u8], peer: SocketAddr) -> io::Result<()> {
        self.inner.send_to(buf, peer).await?;
        Ok(())
    }

    async fn recv_from(&self, wait: Option<Duration>) -> io::Result<Recv> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, addr) = match wait {
            Some(limit) => match timeout(limit, self.inner.recv_from(&mut buf)).await {
                Ok(result) => result?,
                Err(_elapsed) => return Ok(Recv::TimedOut),
            },
            None => self.inner.recv_from(&mut buf).await?,
        };
        buf.truncate(n);
        Ok(Recv::Datagram(buf, addr))
    }
}
