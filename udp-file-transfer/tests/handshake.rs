//! Integration tests for the CONNECT / ACK handshake.
//!
//! Each test binds real `tokio::net::UdpSocket`s on loopback, runs one side
//! in a background task, and checks the phase each side ends up in.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use udp_file_transfer::connection::Connection;
use udp_file_transfer::socket::{Recv, Transport};
use udp_file_transfer::{receive_file, send_file, AbortReason, Config, Outcome, Phase};

use common::ephemeral;

/// Both sides should reach `Transferring` after a clean handshake.
#[tokio::test]
async fn handshake_both_sides_reach_transferring() {
    let server_socket = ephemeral().await;
    let server_addr = server_socket.local_addr;

    let server_task = tokio::spawn(Connection::accept(server_socket));

    let client = tokio::time::timeout(
        Duration::from_secs(5),
        Connection::connect(ephemeral().await, server_addr, 3, Duration::from_secs(2)),
    )
    .await
    .expect("client connect timed out")
    .expect("client connect failed");

    let server = tokio::time::timeout(Duration::from_secs(5), server_task)
        .await
        .expect("server accept timed out")
        .expect("server task panicked")
        .expect("server accept failed");

    assert_eq!(client.phase, Phase::Transferring);
    assert_eq!(server.phase, Phase::Transferring);
    assert_eq!(server.total_packets, Some(3));
    assert_eq!(client.peer, server_addr);
}

/// A bare `CONNECT` without a packet count is still a valid request.
#[tokio::test]
async fn bare_connect_gets_bare_ack() {
    let server_socket = ephemeral().await;
    let server_addr = server_socket.local_addr;
    let server_task = tokio::spawn(Connection::accept(server_socket));

    let client = ephemeral().await;
    client.send_to(b"CONNECT", server_addr).await.unwrap();
    let reply = client.recv_from(Some(Duration::from_secs(2))).await.unwrap();
    assert_eq!(reply, Recv::Datagram(b"ACK".to_vec(), server_addr));

    let server = server_task.await.unwrap().unwrap();
    assert_eq!(server.phase, Phase::Transferring);
    assert_eq!(server.total_packets, None);
    assert_eq!(server.peer, client.local_addr);
}

/// Anything other than `CONNECT` as the first message aborts the receiver
/// without a reply.
#[tokio::test]
async fn receiver_aborts_on_unexpected_first_message() {
    let server_socket = ephemeral().await;
    let server_addr = server_socket.local_addr;
    let server_task =
        tokio::spawn(async move { receive_file(server_socket, &Config::loopback()).await });

    let client = ephemeral().await;
    client.send_to(b"ACK5", server_addr).await.unwrap();

    let report = server_task.await.unwrap().unwrap();
    assert_eq!(
        report.outcome,
        Outcome::Aborted(AbortReason::UnexpectedHandshake("ACK5".into()))
    );
    assert!(!report.has_file());
    assert_eq!(
        client.recv_from(Some(Duration::from_millis(100))).await.unwrap(),
        Recv::TimedOut
    );
}

/// Connecting to an address where nobody is listening fails after one
/// timeout rather than hanging.
#[tokio::test]
async fn sender_aborts_when_peer_is_silent() {
    let silent_addr: SocketAddr = {
        let tmp = ephemeral().await;
        tmp.local_addr // socket closes here; nothing will answer
    };

    let report = send_file(ephemeral().await, silent_addr, b"payload", &Config::loopback())
        .await
        .unwrap();

    assert_eq!(
        report.outcome,
        Outcome::Aborted(AbortReason::HandshakeTimedOut)
    );
    assert_eq!(report.packets_sent, 0);
    assert_eq!(report.digest, None);
}

/// A reply other than the bare `ACK` aborts the sender; there is no retry.
#[tokio::test]
async fn sender_aborts_on_wrong_reply() {
    let server = ephemeral().await;
    let server_addr = server.local_addr;
    let responder = tokio::spawn(async move {
        let Recv::Datagram(request, from) = server.recv_from(None).await.unwrap() else {
            unreachable!("recv without a timeout cannot time out");
        };
        server.send_to(b"ACK0", from).await.unwrap();
        // Nothing else should follow the aborted handshake.
        let next = server
            .recv_from(Some(Duration::from_millis(300)))
            .await
            .unwrap();
        (request, next)
    });

    let report = send_file(ephemeral().await, server_addr, b"payload", &Config::loopback())
        .await
        .unwrap();
    let (request, next) = responder.await.unwrap();

    assert_eq!(request, b"CONNECT 1");
    assert_eq!(next, Recv::TimedOut);
    assert_eq!(
        report.outcome,
        Outcome::Aborted(AbortReason::UnexpectedHandshake("ACK0".into()))
    );
}
