//! Sparse updates and frame streaming end to end.

use anyhow::Result;

use gtled_core::wire::{encode_request, encode_set_config, encode_set_leds, encode_stream_frame, CommandId};
use gtled_services::Rgb;

use crate::*;

fn gradient() -> Vec<u8> {
    (0..LEDS * 3).map(|i| (i * 7 % 256) as u8).collect()
}

fn as_rgb(bytes: &[u8]) -> Vec<Rgb> {
    bytes
        .chunks_exact(3)
        .map(|c| Rgb::new(c[0], c[1], c[2]))
        .collect()
}

#[tokio::test]
async fn sparse_update_lights_exactly_the_listed_leds() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    let ids = [1u16, 2, 3, 40, 95];
    client.send_all(&encode_set_leds(11, &ids, 2)?).await?;

    let strip = daemon.wait_for_strip(|s| s.refreshes() == 1).await?;
    for i in 0..LEDS {
        let expected = if ids.contains(&(i as u16)) {
            Rgb::WHITE
        } else {
            Rgb::BLACK
        };
        assert_eq!(strip.pixel(i), Some(expected), "pixel {i}");
    }

    daemon.stop().await?;
    Ok(())
}

#[tokio::test]
async fn frame_streamed_out_of_order_renders_whole() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    let rgb = gradient();
    let chunks = encode_stream_frame(1, &rgb, CHUNK)?;
    let reordered: Vec<_> = chunks.iter().rev().cloned().collect();
    client.send_all(&reordered).await?;

    let strip = daemon.wait_for_strip(|s| s.refreshes() == 1).await?;
    assert_eq!(strip.pixels(), &as_rgb(&rgb)[..]);

    let stats = daemon.stop().await?;
    assert_eq!(stats.renders, 1);
    Ok(())
}

#[tokio::test]
async fn consecutive_frames_each_render() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    let first = gradient();
    let second: Vec<u8> = first.iter().map(|b| b.wrapping_add(1)).collect();
    client.send_all(&encode_stream_frame(1, &first, CHUNK)?).await?;
    client.send_all(&encode_stream_frame(2, &second, CHUNK)?).await?;

    let strip = daemon.wait_for_strip(|s| s.refreshes() == 2).await?;
    assert_eq!(strip.pixels(), &as_rgb(&second)[..]);

    daemon.stop().await?;
    Ok(())
}

#[tokio::test]
async fn abandoned_frame_never_leaks_into_the_next() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    // Frame 1 never completes: only its last chunk is sent.
    let stale = vec![0xaa; LEDS * 3];
    let stale_chunks = encode_stream_frame(1, &stale, CHUNK)?;
    client.send(&stale_chunks[2]).await?;

    // Frame 2 is a single short chunk claiming to be the whole frame.
    let fresh = encode_stream_frame(2, &[9, 9, 9], CHUNK)?;
    client.send_all(&fresh).await?;

    let strip = daemon.wait_for_strip(|s| s.refreshes() == 1).await?;
    assert_eq!(strip.pixel(0), Some(Rgb::new(9, 9, 9)));
    assert!(strip.pixels()[1..].iter().all(|p| *p == Rgb::BLACK));

    daemon.stop().await?;
    Ok(())
}

#[tokio::test]
async fn power_off_blanks_a_streamed_frame() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    client.send_all(&encode_stream_frame(1, &gradient(), CHUNK)?).await?;
    daemon.wait_for_strip(|s| s.refreshes() >= 1).await?;

    client.send(&encode_set_config(128, 0)).await?;
    // Round-trip a request so the SetConfig is known to be handled.
    client.request(&encode_request(CommandId::GetConfig)).await?;
    assert!(daemon.strip().pixels().iter().all(|p| *p == Rgb::BLACK));

    daemon.stop().await?;
    Ok(())
}
