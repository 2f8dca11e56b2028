//! Control socket setup.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Bind the control socket. Must be called from inside a tokio runtime.
pub fn bind_control_socket(addr: SocketAddr) -> Result<UdpSocket> {
    let socket = make_socket(addr).with_context(|| format!("failed to bind {addr}"))?;
    UdpSocket::from_std(socket).context("failed to convert to tokio UdpSocket")
}

fn make_socket(addr: SocketAddr) -> Result<std::net::UdpSocket> {
    let socket =
        Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP)).context("socket()")?;

    socket.set_reuse_address(true).context("SO_REUSEADDR")?;
    if addr.is_ipv4() {
        // Discovery requests arrive as broadcasts.
        socket.set_broadcast(true).context("SO_BROADCAST")?;
    }
    socket.set_nonblocking(true).context("set_nonblocking")?;
    socket.bind(&addr.into()).context("bind()")?;

    Ok(socket.into())
}
