//! The receive loop: one task, one datagram at a time.
//!
//! The loop owns the router and the controller state outright, so nothing
//! here needs a lock. Receive and send errors are logged and the loop keeps
//! going; only the shutdown signal ends it.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use gtled_core::wire::MAX_DATAGRAM;
use gtled_services::ControllerState;

use crate::dispatch::{CommandRouter, Outcome, RouterStats};

/// How often the loop logs a snapshot of mode and counters.
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(10);

/// Serve until a shutdown signal arrives. Returns the final counters.
pub async fn serve(
    socket: UdpSocket,
    mut router: CommandRouter,
    mut state: ControllerState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<RouterStats> {
    let local = socket.local_addr().context("control socket has no local address")?;
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut snapshot = tokio::time::interval(SNAPSHOT_INTERVAL);
    snapshot.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(addr = %local, "receive loop starting");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("receive loop shutting down");
                return Ok(router.stats());
            }

            _ = snapshot.tick() => {
                let stats = router.stats();
                tracing::info!(
                    mode = state.mode().name(),
                    datagrams = stats.datagrams,
                    replies = stats.replies,
                    renders = stats.renders,
                    duplicates = stats.duplicates,
                    dropped = stats.dropped,
                    "router snapshot"
                );
            }

            received = socket.recv_from(&mut buf) => {
                let (len, peer) = match received {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = %e, "recv_from failed");
                        continue;
                    }
                };

                match router.route(&mut state, &buf[..len]) {
                    Outcome::Reply(reply) => {
                        if let Err(e) = socket.send_to(&reply, peer).await {
                            tracing::warn!(peer = %peer, error = %e, "failed to send reply");
                        } else {
                            tracing::debug!(peer = %peer, reply = %hex::encode(&reply), "reply sent");
                        }
                    }
                    outcome => tracing::trace!(peer = %peer, ?outcome, "datagram handled"),
                }
            }
        }
    }
}
