// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn spec(port: u16) -> TunnelSpec {
    TunnelSpec {
        container: "runtime".to_string(),
        local_address: "127.0.0.1".to_string(),
        local_port: port,
        container_port: 3000,
    }
}

#[yare::parameterized(
    ipv4      = { "0.0.0.0:34567", Some(34567) },
    two_lines = { "0.0.0.0:40000\n[::]:40000", Some(40000) },
    garbage   = { "no ports", None },
    empty     = { "", None },
)]
fn published_port(output: &str, expected: Option<u16>) {
    assert_eq!(parse_published_port(output), expected);
}

#[tokio::test]
async fn relay_pipes_bytes_until_cancelled() {
    let upstream = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_addr = upstream.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut conn, _) = upstream.accept().await.unwrap();
        let mut buf = [0u8; 4];
        conn.read_exact(&mut buf).await.unwrap();
        conn.write_all(&buf).await.unwrap();
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local_addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(relay(listener, upstream_addr.to_string(), cancel.clone()));

    let mut client = TcpStream::connect(local_addr).await.unwrap();
    client.write_all(b"ping").await.unwrap();
    let mut echoed = [0u8; 4];
    client.read_exact(&mut echoed).await.unwrap();
    assert_eq!(&echoed, b"ping");

    let handle = TunnelHandle::new(cancel, Some(task));
    assert!(!handle.is_closed());
    handle.close().await;
    assert!(TcpStream::connect(local_addr).await.is_err());
}

#[tokio::test]
async fn bind_reports_addr_in_use() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();
    let err = bind(&spec(port)).await.unwrap_err();
    assert!(matches!(err, AdapterError::AddrInUse(p) if p == port));
}

#[tokio::test]
async fn fake_tracks_open_and_closed_tunnels() {
    let fake = FakeTunneler::new();
    fake.set_busy(20001);

    assert!(matches!(fake.open(spec(20001)).await, Err(AdapterError::AddrInUse(20001))));
    let handle = fake.open(spec(20002)).await.unwrap();
    assert_eq!(fake.active(), vec![spec(20002)]);

    handle.close().await;
    assert!(fake.active().is_empty());
    assert_eq!(fake.attempts().len(), 2);
}

#[tokio::test]
async fn dropping_handle_closes_tunnel() {
    let fake = FakeTunneler::new();
    drop(fake.open(spec(20003)).await.unwrap());
    assert!(fake.active().is_empty());
}
