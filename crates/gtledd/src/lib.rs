//! gtledd: the controller daemon.
//!
//! `dispatch` turns one datagram into state changes and an optional reply;
//! `receive` drives it from a UDP socket.

pub mod dispatch;
pub mod receive;
pub mod socket;
pub mod station;

pub use dispatch::{CommandRouter, DropReason, Outcome, RouterStats};
pub use station::ProbedStation;
