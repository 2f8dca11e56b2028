//! Collaborator traits for the controller's external dependencies.
//!
//! The router only ever sees these traits: where configuration is stored,
//! how pixels reach the strip and how the station address is found are
//! deployment concerns.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use gtled_core::DeviceConfig;

use crate::buffer::Rgb;

/// Durable storage for the device record.
pub trait ConfigStore: Send {
    /// Load the stored record. A store with nothing saved yet returns defaults.
    fn load(&self) -> Result<DeviceConfig>;

    fn save(&self, config: &DeviceConfig) -> Result<()>;
}

/// The pixel-output driver.
///
/// Calls are synchronous and expected to return quickly; the router makes
/// them inline between datagrams.
pub trait PixelOutput: Send {
    /// Clear the strip, paint `indices` with `color`, and refresh.
    fn render_sparse(&mut self, indices: &[u16], color: Rgb) -> Result<()>;

    /// Show a full RGB frame (3 bytes per pixel).
    fn render_frame(&mut self, rgb: &[u8]) -> Result<()>;

    fn set_brightness(&mut self, brightness: u8) -> Result<()>;

    /// Turn every pixel off.
    fn blank(&mut self) -> Result<()>;
}

/// Source of the controller's current station-mode IPv4 address.
pub trait StationAddress: Send {
    /// `None` while the station interface has no address.
    fn current_station_ip(&self) -> Option<Ipv4Addr>;
}

/// Shared outputs, so a handle can be kept for inspection while the router
/// owns another.
impl<T: PixelOutput> PixelOutput for Arc<Mutex<T>> {
    fn render_sparse(&mut self, indices: &[u16], color: Rgb) -> Result<()> {
        lock(self)?.render_sparse(indices, color)
    }

    fn render_frame(&mut self, rgb: &[u8]) -> Result<()> {
        lock(self)?.render_frame(rgb)
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<()> {
        lock(self)?.set_brightness(brightness)
    }

    fn blank(&mut self) -> Result<()> {
        lock(self)?.blank()
    }
}

fn lock<T>(output: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    output
        .lock()
        .map_err(|_| anyhow!("pixel output lock poisoned"))
}

/// A fixed address, for deployments where it is known up front.
impl StationAddress for Option<Ipv4Addr> {
    fn current_station_ip(&self) -> Option<Ipv4Addr> {
        *self
    }
}
