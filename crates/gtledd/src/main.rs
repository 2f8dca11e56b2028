//! gtledd: LED controller daemon.

use anyhow::{Context, Result};

use gtled_core::config::DaemonConfig;
use gtled_core::{DeviceConfig, PowerState};
use gtled_services::{ConfigStore, ControllerState, FileConfigStore, LedStrip};

use gtledd::dispatch::CommandRouter;
use gtledd::station::ProbedStation;
use gtledd::{receive, socket};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = DaemonConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = DaemonConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        DaemonConfig::default()
    });
    tracing::info!(
        addr = %config.listen_addr(),
        leds = config.leds.count,
        stream_chunk_size = config.leds.stream_chunk_size,
        "gtledd starting"
    );

    // Device record
    let store = FileConfigStore::new(&config.storage.device_config_path);
    let device = store.load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load device config, using defaults");
        DeviceConfig::default()
    });
    if !device.credentials_fit() {
        tracing::warn!("stored wifi credentials exceed the station driver's limits");
    }
    tracing::info!(
        path = %store.path().display(),
        brightness = device.brightness,
        power = device.power_state,
        "device config ready"
    );

    // Output
    let strip = LedStrip::new(config.leds.count, device.brightness);
    if device.power() == PowerState::Off {
        tracing::info!("power is off, output stays blank until the next update");
    }

    // Network
    let station = ProbedStation::new(config.station_ip()?);
    let socket = socket::bind_control_socket(config.listen_addr())
        .context("failed to create control socket")?;

    let router = CommandRouter::new(store, strip, station);
    let state = ControllerState::new(config.leds.count, config.leds.stream_chunk_size);

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    let serve_task = tokio::spawn(receive::serve(
        socket,
        router,
        state,
        shutdown_tx.subscribe(),
    ));

    match serve_task.await {
        Ok(Ok(stats)) => tracing::info!(
            datagrams = stats.datagrams,
            renders = stats.renders,
            dropped = stats.dropped,
            "gtledd stopped"
        ),
        Ok(Err(e)) => tracing::error!(error = %e, "receive loop failed"),
        Err(e) => tracing::error!(error = %e, "receive loop panicked"),
    }

    Ok(())
}
