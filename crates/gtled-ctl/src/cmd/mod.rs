//! CLI command modules.

pub mod config;
pub mod discover;
pub mod leds;
pub mod udp;
