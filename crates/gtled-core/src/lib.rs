//! gtled-core: wire format, integrity check, and configuration types.
//! All other gtled crates depend on this one.

pub mod config;
pub mod crc;
pub mod device;
pub mod wire;

pub use device::{DeviceConfig, PowerState};
pub use wire::{CommandId, WireError};
