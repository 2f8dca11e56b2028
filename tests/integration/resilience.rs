//! Bad input never stops the loop.

use anyhow::Result;

use gtled_core::wire::{encode_request, encode_stream_frame, CommandId};

use crate::*;

#[tokio::test]
async fn garbage_is_dropped_and_the_loop_keeps_serving() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    let garbage: [&[u8]; 6] = [
        b"",
        b"G",
        b"HELLO",
        b"GT\x63",
        b"GT\x06\x01",
        b"GT\x07\x00\x01",
    ];
    for datagram in garbage {
        client.send(datagram).await?;
    }

    assert_eq!(
        client.request(&encode_request(CommandId::Discovery)).await?,
        b"GT\x00\x4d"
    );

    let stats = daemon.stop().await?;
    assert_eq!(stats.dropped, 6);
    assert_eq!(stats.replies, 1);
    Ok(())
}

#[tokio::test]
async fn corrupted_frame_chunk_blocks_completion() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    let rgb = vec![0x42; LEDS * 3];
    let chunks = encode_stream_frame(5, &rgb, CHUNK)?;
    let mut corrupt = chunks[1].to_vec();
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0x80;

    client.send(&chunks[0]).await?;
    client.send(&corrupt).await?;
    client.send(&chunks[2]).await?;
    client.request(&encode_request(CommandId::Discovery)).await?;
    assert_eq!(daemon.strip().refreshes(), 0);

    // The clean retransmission completes the frame.
    client.send(&chunks[1]).await?;
    daemon.wait_for_strip(|s| s.refreshes() == 1).await?;

    let stats = daemon.stop().await?;
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.renders, 1);
    Ok(())
}
