//! Runs the built binary in both modes against each other.

mod common;

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use common::{ephemeral, sample_file};

const BIN: &str = env!("CARGO_BIN_EXE_udp-file-transfer");

#[tokio::test]
async fn client_and_server_move_a_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.bin");
    let output = dir.path().join("received.bin");
    let file = sample_file(137);
    std::fs::write(&input, &file).unwrap();

    // Reserve a free port, then release it for the server.
    let addr = ephemeral().await.local_addr;

    let mut server = Command::new(BIN)
        .args(["server", "--bind", &addr.to_string(), "--output"])
        .arg(&output)
        .args(["--timeout", "0.3", "--idle-limit", "20"])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = Command::new(BIN)
        .arg("client")
        .arg(&input)
        .args(["--server", &addr.to_string(), "--timeout", "0.2", "--settle", "0.1"])
        .output();
    let client = tokio::time::timeout(Duration::from_secs(30), client)
        .await
        .expect("client hung")
        .unwrap();
    assert!(client.status.success());
    assert!(String::from_utf8_lossy(&client.stdout).starts_with("success"));

    let status = tokio::time::timeout(Duration::from_secs(30), server.wait())
        .await
        .expect("server hung")
        .unwrap();
    assert!(status.success());
    assert_eq!(std::fs::read(&output).unwrap(), file);
}

#[tokio::test]
async fn client_fails_without_a_server() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.bin");
    std::fs::write(&input, b"nobody listening").unwrap();
    let addr = ephemeral().await.local_addr;

    let client = Command::new(BIN)
        .arg("client")
        .arg(&input)
        .args(["--server", &addr.to_string(), "--timeout", "0.2"])
        .output()
        .await
        .unwrap();
    assert!(!client.status.success());
}

#[tokio::test]
async fn fault_rates_must_be_probabilities() {
    for rate in ["NaN", "1.5", "-0.1"] {
        let client = Command::new(BIN)
            .args(["client", "missing.bin", "--loss-rate", rate])
            .output()
            .await
            .unwrap();
        assert!(!client.status.success());
        assert!(String::from_utf8_lossy(&client.stderr).contains("--loss-rate"));
    }
}
