//! Sparse updates and solid-colour frames.

use std::net::SocketAddr;

use anyhow::{Context, Result};

use gtled_core::wire::{encode_set_leds, encode_stream_frame, DEFAULT_INDICES_PER_CHUNK};

use super::udp;

pub async fn cmd_leds(target: SocketAddr, indices: &[u16]) -> Result<()> {
    let command_id: u8 = rand::random();
    let chunks = encode_set_leds(command_id, indices, DEFAULT_INDICES_PER_CHUNK)
        .context("failed to encode sparse update")?;

    let socket = udp::open().await?;
    udp::send_all(&socket, target, &chunks).await?;
    println!(
        "Sent {} LEDs in {} chunk(s) to {} (command id {})",
        indices.len(),
        chunks.len(),
        target,
        command_id
    );
    Ok(())
}

/// One frame with every pixel set to the same colour.
pub fn solid_frame(led_count: usize, rgb: [u8; 3]) -> Vec<u8> {
    rgb.repeat(led_count)
}

pub async fn cmd_fill(
    target: SocketAddr,
    led_count: usize,
    chunk_size: usize,
    rgb: [u8; 3],
) -> Result<()> {
    let frame_id: u8 = rand::random();
    let frame = solid_frame(led_count, rgb);
    let chunks =
        encode_stream_frame(frame_id, &frame, chunk_size).context("failed to encode frame")?;

    let socket = udp::open().await?;
    udp::send_all(&socket, target, &chunks).await?;
    println!(
        "Sent #{} to {} LEDs in {} chunk(s) to {} (frame id {})",
        hex::encode(rgb),
        led_count,
        chunks.len(),
        target,
        frame_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_frame_repeats_colour() {
        assert_eq!(solid_frame(2, [1, 2, 3]), vec![1, 2, 3, 1, 2, 3]);
        assert!(solid_frame(0, [9, 9, 9]).is_empty());
    }
}
