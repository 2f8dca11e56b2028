//! Routes validated datagrams to the handler for their command.
//!
//! The router owns only the collaborators and counters. All protocol state
//! lives in the `ControllerState` passed in with each datagram, so a test
//! can build a fresh state per case and inspect it afterwards.

use bytes::Bytes;

use gtled_core::wire::{
    encode_config_reply, encode_discovery_reply, parse_packet, CommandId, ConfigPayload,
    FrameChunk, SparseChunk, WireError,
};
use gtled_core::{DeviceConfig, PowerState};
use gtled_services::{
    ConfigStore, ControllerMode, ControllerState, FrameError, FrameProgress, PixelOutput, Rgb,
    SparseError, SparseProgress, StationAddress,
};

/// Color painted on every index of a completed sparse update.
pub const SPARSE_COLOR: Rgb = Rgb::WHITE;

/// What routing one datagram produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send these bytes back to the sender.
    Reply(Bytes),
    /// State advanced (or config stored); nothing to send.
    Accepted,
    /// A reassembly completed and was rendered; the controller is now in
    /// this mode.
    Rendered(ControllerMode),
    /// A frame chunk that had already been applied.
    Duplicate,
    /// Nothing happened beyond a log record.
    Dropped(DropReason),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropReason {
    #[error("malformed datagram: {0}")]
    Malformed(WireError),

    #[error("unknown command {0}")]
    UnknownCommand(u8),

    #[error("frame chunk crc mismatch: received 0x{received:02x}, computed 0x{computed:02x}")]
    Corrupt { received: u8, computed: u8 },

    #[error(transparent)]
    Sparse(SparseError),

    #[error(transparent)]
    Frame(FrameError),

    #[error("no station address to report")]
    NoStationAddress,

    #[error("config store unavailable")]
    Storage,

    #[error("pixel output failed")]
    Output,
}

/// Running counters, logged periodically by the receive loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub datagrams: u64,
    pub replies: u64,
    pub accepted: u64,
    pub renders: u64,
    pub duplicates: u64,
    pub dropped: u64,
}

pub struct CommandRouter {
    store: Box<dyn ConfigStore>,
    output: Box<dyn PixelOutput>,
    station: Box<dyn StationAddress>,
    stats: RouterStats,
}

impl CommandRouter {
    pub fn new(
        store: impl ConfigStore + 'static,
        output: impl PixelOutput + 'static,
        station: impl StationAddress + 'static,
    ) -> Self {
        Self {
            store: Box::new(store),
            output: Box::new(output),
            station: Box::new(station),
            stats: RouterStats::default(),
        }
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    /// Handle one datagram. Never fails: every problem becomes
    /// `Outcome::Dropped` plus a log record.
    pub fn route(&mut self, state: &mut ControllerState, datagram: &[u8]) -> Outcome {
        self.stats.datagrams += 1;
        tracing::trace!(len = datagram.len(), bytes = %hex::encode(datagram), "datagram");

        let outcome = self.dispatch(state, datagram);
        match &outcome {
            Outcome::Reply(_) => self.stats.replies += 1,
            Outcome::Accepted => self.stats.accepted += 1,
            Outcome::Rendered(_) => self.stats.renders += 1,
            Outcome::Duplicate => self.stats.duplicates += 1,
            Outcome::Dropped(reason) => {
                self.stats.dropped += 1;
                tracing::warn!(len = datagram.len(), reason = %reason, "datagram dropped");
            }
        }
        outcome
    }

    fn dispatch(&mut self, state: &mut ControllerState, datagram: &[u8]) -> Outcome {
        let packet = match parse_packet(datagram) {
            Ok(packet) => packet,
            Err(e) => return Outcome::Dropped(DropReason::Malformed(e)),
        };
        let command = match CommandId::try_from(packet.command) {
            Ok(command) => command,
            Err(_) => return Outcome::Dropped(DropReason::UnknownCommand(packet.command)),
        };
        tracing::trace!(command = command.name(), payload_len = packet.payload.len(), "routing");

        match command {
            CommandId::Discovery => self.discovery(),
            CommandId::GetConfig => self.get_config(),
            CommandId::SetConfig => self.set_config(state, packet.payload),
            CommandId::SetLeds => self.set_leds(state, packet.payload),
            CommandId::StreamFrame => self.stream_frame(state, packet.payload),
        }
    }

    fn discovery(&self) -> Outcome {
        match self.station.current_station_ip() {
            Some(ip) => {
                tracing::debug!(%ip, "answering discovery");
                Outcome::Reply(encode_discovery_reply(ip.octets()[3]))
            }
            None => Outcome::Dropped(DropReason::NoStationAddress),
        }
    }

    fn get_config(&self) -> Outcome {
        match self.load_config() {
            Some(config) => Outcome::Reply(encode_config_reply(
                config.brightness,
                config.power_state,
            )),
            None => Outcome::Dropped(DropReason::Storage),
        }
    }

    fn set_config(&mut self, state: &mut ControllerState, payload: &[u8]) -> Outcome {
        let request = match ConfigPayload::parse(payload) {
            Ok(request) => request,
            Err(e) => return Outcome::Dropped(DropReason::Malformed(e)),
        };
        let Some(mut config) = self.load_config() else {
            return Outcome::Dropped(DropReason::Storage);
        };

        config.brightness = request.brightness;
        config.power_state = request.power_state;
        if let Err(e) = self.store.save(&config) {
            tracing::warn!(error = %e, "failed to save device config");
            return Outcome::Dropped(DropReason::Storage);
        }
        tracing::info!(
            brightness = config.brightness,
            power = config.power_state,
            "device config updated"
        );

        if let Err(e) = self.output.set_brightness(config.brightness) {
            tracing::warn!(error = %e, "failed to apply brightness");
        }
        if config.power() == PowerState::Off {
            state.reset_idle();
            if let Err(e) = self.output.blank() {
                tracing::warn!(error = %e, "failed to blank output");
            }
        }
        Outcome::Accepted
    }

    fn set_leds(&mut self, state: &mut ControllerState, payload: &[u8]) -> Outcome {
        let chunk = match SparseChunk::parse(payload) {
            Ok(chunk) => chunk,
            Err(e) => return Outcome::Dropped(DropReason::Malformed(e)),
        };
        if chunk.has_trailing_byte() {
            tracing::debug!(
                command_id = chunk.header.command_id,
                "ignoring trailing odd byte in sparse chunk"
            );
        }

        let ids = match state.sparse.accept(&chunk) {
            Ok(SparseProgress::Pending { .. }) => return Outcome::Accepted,
            Ok(SparseProgress::Complete(ids)) => ids,
            Err(e) => return Outcome::Dropped(DropReason::Sparse(e)),
        };
        tracing::info!(
            command_id = chunk.header.command_id,
            leds = ids.len(),
            "sparse update complete"
        );
        if let Err(e) = self.output.render_sparse(&ids, SPARSE_COLOR) {
            tracing::warn!(error = %e, "sparse render failed");
            return Outcome::Dropped(DropReason::Output);
        }
        state.set_mode(ControllerMode::Static);
        Outcome::Rendered(ControllerMode::Static)
    }

    fn stream_frame(&mut self, state: &mut ControllerState, payload: &[u8]) -> Outcome {
        let chunk = match FrameChunk::parse(payload) {
            Ok(chunk) => chunk,
            Err(e) => return Outcome::Dropped(DropReason::Malformed(e)),
        };
        // Checked before the reassembler sees the chunk: a corrupt header
        // must not be able to start or reset a session.
        if let Err(WireError::CrcMismatch { received, computed }) = chunk.verify() {
            return Outcome::Dropped(DropReason::Corrupt { received, computed });
        }

        let frame_id = chunk.header.frame_id;
        let rendered = match state.frames.accept(&chunk) {
            Ok(FrameProgress::Pending { .. }) => return Outcome::Accepted,
            Ok(FrameProgress::Duplicate { .. }) => return Outcome::Duplicate,
            Ok(FrameProgress::Complete(rgb)) => {
                tracing::debug!(frame_id, bytes = rgb.len(), "frame complete");
                self.output.render_frame(rgb)
            }
            Err(e) => return Outcome::Dropped(DropReason::Frame(e)),
        };
        if let Err(e) = rendered {
            tracing::warn!(frame_id, error = %e, "frame render failed");
            return Outcome::Dropped(DropReason::Output);
        }
        state.set_mode(ControllerMode::Streaming);
        Outcome::Rendered(ControllerMode::Streaming)
    }

    fn load_config(&self) -> Option<DeviceConfig> {
        match self.store.load() {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load device config");
                None
            }
        }
    }
}
