//! Request/reply commands over real UDP.

use anyhow::Result;
use std::time::Duration;

use gtled_core::wire::{encode_request, encode_set_config, CommandId};
use gtled_core::{DeviceConfig, PowerState};
use gtled_services::ConfigStore;

use crate::*;

#[tokio::test]
async fn discovery_reports_last_octet_to_sender() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    let reply = client.request(&encode_request(CommandId::Discovery)).await?;
    assert_eq!(reply, b"GT\x00\x4d");

    daemon.stop().await?;
    Ok(())
}

#[tokio::test]
async fn discovery_without_station_address_stays_silent() -> Result<()> {
    let daemon = Daemon::spawn_with_station(None).await?;
    let client = Client::connect(daemon.addr).await?;

    client.send(&encode_request(CommandId::Discovery)).await?;
    assert_eq!(client.recv(Duration::from_millis(300)).await?, None);

    let stats = daemon.stop().await?;
    assert_eq!(stats.dropped, 1);
    Ok(())
}

#[tokio::test]
async fn set_config_is_visible_to_get_config() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    daemon.store.save(&DeviceConfig {
        wifi_ssid: "garage".into(),
        ..DeviceConfig::default()
    })?;
    let client = Client::connect(daemon.addr).await?;

    assert_eq!(
        client.request(&encode_request(CommandId::GetConfig)).await?,
        b"GT\x01\x80\x01"
    );

    client.send(&encode_set_config(7, 1)).await?;
    assert_eq!(
        client.request(&encode_request(CommandId::GetConfig)).await?,
        b"GT\x01\x07\x01"
    );

    let stored = daemon.store.snapshot();
    assert_eq!(stored.brightness, 7);
    assert_eq!(stored.power(), PowerState::On);
    assert_eq!(stored.wifi_ssid, "garage");
    assert_eq!(daemon.strip().brightness(), 7);

    daemon.stop().await?;
    Ok(())
}

#[tokio::test]
async fn get_config_echoes_stored_power_byte() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    client.send(&encode_set_config(10, 2)).await?;
    assert_eq!(
        client.request(&encode_request(CommandId::GetConfig)).await?,
        b"GT\x01\x0a\x02"
    );

    daemon.stop().await?;
    Ok(())
}

#[tokio::test]
async fn short_set_config_changes_nothing() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    let client = Client::connect(daemon.addr).await?;

    client.send(b"GT\x02\x05").await?;
    // GetConfig is handled after the short SetConfig, in order.
    assert_eq!(
        client.request(&encode_request(CommandId::GetConfig)).await?,
        b"GT\x01\x80\x01"
    );
    assert_eq!(daemon.store.snapshot(), DeviceConfig::default());

    daemon.stop().await?;
    Ok(())
}
