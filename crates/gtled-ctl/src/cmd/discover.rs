//! Controller discovery.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;

use gtled_core::wire::{encode_request, parse_packet, CommandId};

use super::udp;

/// How long to keep listening for answers.
const DISCOVERY_WINDOW: Duration = Duration::from_secs(1);

/// A controller that answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Responder {
    pub addr: SocketAddr,
    /// Last octet of the address the controller reports for itself.
    pub last_octet: u8,
}

/// Pull the reported octet out of a discovery reply.
pub fn parse_reply(datagram: &[u8]) -> Option<u8> {
    let packet = parse_packet(datagram).ok()?;
    if packet.command != u8::from(CommandId::Discovery) {
        return None;
    }
    packet.payload.first().copied()
}

pub async fn cmd_discover(target: SocketAddr) -> Result<()> {
    let socket = udp::open().await?;
    udp::send_all(&socket, target, &[encode_request(CommandId::Discovery)]).await?;

    let deadline = Instant::now() + DISCOVERY_WINDOW;
    let mut found = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        let Some((reply, addr)) = udp::recv_within(&socket, remaining).await? else {
            break;
        };
        match parse_reply(&reply) {
            Some(last_octet) => found.push(Responder { addr, last_octet }),
            None => eprintln!("ignoring unexpected reply from {addr}: {}", hex::encode(&reply)),
        }
    }

    if found.is_empty() {
        println!("No controllers answered.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Controllers ({})", found.len());
    println!("═══════════════════════════════════════");
    for r in &found {
        let reported = match r.addr {
            SocketAddr::V4(v4) => {
                let o = v4.ip().octets();
                Ipv4Addr::new(o[0], o[1], o[2], r.last_octet).to_string()
            }
            SocketAddr::V6(_) => format!("*.*.*.{}", r.last_octet),
        };
        println!("  ┌─ {}", r.addr);
        println!("  └─ reports  : {}", reported);
    }
    Ok(())
}
