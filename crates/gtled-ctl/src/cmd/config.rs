//! Brightness and power commands.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use gtled_core::wire::{
    encode_request, encode_set_config, parse_packet, CommandId, ConfigPayload,
};

use super::udp;

const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

/// Decode a GetConfig reply into (brightness, power state).
pub fn parse_reply(datagram: &[u8]) -> Result<(u8, u8)> {
    let packet = parse_packet(datagram)?;
    if packet.command != u8::from(CommandId::GetConfig) {
        bail!("reply carries command {}, expected get_config", packet.command);
    }
    let payload = ConfigPayload::parse(packet.payload)?;
    Ok((payload.brightness, payload.power_state))
}

pub async fn cmd_config_get(target: SocketAddr) -> Result<()> {
    let socket = udp::open().await?;
    udp::send_all(&socket, target, &[encode_request(CommandId::GetConfig)]).await?;

    let (reply, from) = udp::recv_within(&socket, REPLY_TIMEOUT)
        .await?
        .with_context(|| format!("no reply from {target} within {}s", REPLY_TIMEOUT.as_secs()))?;
    let (brightness, power) = parse_reply(&reply)
        .with_context(|| format!("bad reply from {from}: {}", hex::encode(&reply)))?;

    println!("═══════════════════════════════════════");
    println!("  Controller {}", from);
    println!("═══════════════════════════════════════");
    println!("  Brightness : {}", brightness);
    println!("  Power      : {}", if power == 0 { "off" } else { "on" });
    Ok(())
}

pub async fn cmd_config_set(target: SocketAddr, brightness: u8, power: u8) -> Result<()> {
    let socket = udp::open().await?;
    udp::send_all(&socket, target, &[encode_set_config(brightness, power)]).await?;
    println!("Sent brightness={} power={} to {}", brightness, power, target);
    Ok(())
}
