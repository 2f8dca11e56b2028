//! gtled integration test harness.
//!
//! Each test runs the real receive loop on an ephemeral loopback port with
//! in-memory collaborators, then talks to it over real UDP sockets using the
//! same encoders senders use. Handles to the store and strip stay with the
//! test so it can check what the daemon did.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use gtled_services::{ControllerState, LedStrip, MemoryConfigStore};
use gtledd::dispatch::{CommandRouter, RouterStats};
use gtledd::{receive, socket};

mod protocol;
mod reassembly;
mod resilience;

// ── Harness ───────────────────────────────────────────────────────────────────

pub const LEDS: usize = 96;
pub const CHUNK: usize = 96;
pub const STATION: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 77);

/// How long to wait for a reply or a state change.
pub const WAIT: Duration = Duration::from_secs(2);

/// A running daemon plus the handles a test inspects.
pub struct Daemon {
    pub addr: SocketAddr,
    pub store: MemoryConfigStore,
    pub strip: Arc<Mutex<LedStrip>>,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<Result<RouterStats>>,
}

impl Daemon {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_station(Some(STATION)).await
    }

    pub async fn spawn_with_station(station: Option<Ipv4Addr>) -> Result<Self> {
        let store = MemoryConfigStore::default();
        let strip = Arc::new(Mutex::new(LedStrip::new(LEDS, 255)));
        let router = CommandRouter::new(store.clone(), strip.clone(), station);
        let state = ControllerState::new(LEDS, CHUNK);

        let socket = socket::bind_control_socket((Ipv4Addr::LOCALHOST, 0).into())?;
        let addr = socket.local_addr()?;
        let (shutdown, _) = broadcast::channel(1);
        let task = tokio::spawn(receive::serve(socket, router, state, shutdown.subscribe()));

        Ok(Self {
            addr,
            store,
            strip,
            shutdown,
            task,
        })
    }

    pub fn strip(&self) -> LedStrip {
        self.strip.lock().unwrap().clone()
    }

    /// Poll until `check` holds for the strip, or fail after `WAIT`.
    pub async fn wait_for_strip(&self, check: impl Fn(&LedStrip) -> bool) -> Result<LedStrip> {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let strip = self.strip();
            if check(&strip) {
                return Ok(strip);
            }
            if tokio::time::Instant::now() >= deadline {
                bail!("strip never reached the expected state");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Stop the loop and return its final counters.
    pub async fn stop(self) -> Result<RouterStats> {
        let _ = self.shutdown.send(());
        tokio::time::timeout(WAIT, self.task)
            .await
            .context("receive loop did not stop")??
    }
}

/// A sender socket pointed at one daemon.
pub struct Client {
    socket: UdpSocket,
    target: SocketAddr,
}

impl Client {
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        Ok(Self { socket, target })
    }

    pub async fn send(&self, datagram: &[u8]) -> Result<()> {
        self.socket.send_to(datagram, self.target).await?;
        Ok(())
    }

    pub async fn send_all(&self, datagrams: &[Bytes]) -> Result<()> {
        for datagram in datagrams {
            self.send(datagram).await?;
        }
        Ok(())
    }

    /// Next reply, or `None` if nothing arrives within `wait`.
    pub async fn recv(&self, wait: Duration) -> Result<Option<Vec<u8>>> {
        let mut buf = [0u8; 64];
        match tokio::time::timeout(wait, self.socket.recv_from(&mut buf)).await {
            Ok(received) => {
                let (len, _) = received?;
                Ok(Some(buf[..len].to_vec()))
            }
            Err(_) => Ok(None),
        }
    }

    /// Send and wait for the reply.
    pub async fn request(&self, datagram: &[u8]) -> Result<Vec<u8>> {
        self.send(datagram).await?;
        self.recv(WAIT).await?.context("no reply")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn daemon_starts_and_stops_cleanly() -> Result<()> {
    let daemon = Daemon::spawn().await?;
    assert!(daemon.addr.ip().is_loopback());
    let stats = daemon.stop().await?;
    assert_eq!(stats, RouterStats::default());
    Ok(())
}
