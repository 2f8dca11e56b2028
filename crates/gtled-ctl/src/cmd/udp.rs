//! Shared UDP helpers for CLI commands.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::net::UdpSocket;

/// Bind an ephemeral socket that may send to broadcast addresses.
pub async fn open() -> Result<UdpSocket> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .context("failed to bind local socket")?;
    socket.set_broadcast(true).context("SO_BROADCAST")?;
    Ok(socket)
}

/// Send every datagram in order.
pub async fn send_all(socket: &UdpSocket, target: SocketAddr, datagrams: &[Bytes]) -> Result<()> {
    for datagram in datagrams {
        socket
            .send_to(datagram, target)
            .await
            .with_context(|| format!("failed to send to {target}"))?;
    }
    Ok(())
}

/// Wait for the next datagram, or `None` once `wait` passes without one.
pub async fn recv_within(
    socket: &UdpSocket,
    wait: Duration,
) -> Result<Option<(Bytes, SocketAddr)>> {
    let mut buf = vec![0u8; 64];
    match tokio::time::timeout(wait, socket.recv_from(&mut buf)).await {
        Ok(received) => {
            let (len, peer) = received.context("recv_from failed")?;
            Ok(Some((Bytes::copy_from_slice(&buf[..len]), peer)))
        }
        Err(_) => Ok(None),
    }
}
