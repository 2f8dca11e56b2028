//! Controller operating mode and the owned per-process state the router
//! threads through every datagram.

use crate::frame_stream::FrameReassembler;
use crate::sparse::SparseReassembler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerMode {
    /// Nothing has been rendered since start or the last idle reset.
    #[default]
    Idle,
    /// Showing the result of the last sparse update.
    Static,
    /// Showing streamed frames.
    Streaming,
}

impl ControllerMode {
    pub fn name(self) -> &'static str {
        match self {
            ControllerMode::Idle => "idle",
            ControllerMode::Static => "static",
            ControllerMode::Streaming => "streaming",
        }
    }
}

/// Everything the router mutates: mode plus one session slot of each kind.
#[derive(Debug)]
pub struct ControllerState {
    mode: ControllerMode,
    pub sparse: SparseReassembler,
    pub frames: FrameReassembler,
}

impl ControllerState {
    /// `led_count` bounds sparse index lists and sizes the frame buffer.
    pub fn new(led_count: usize, stream_chunk_size: usize) -> Self {
        Self {
            mode: ControllerMode::Idle,
            sparse: SparseReassembler::new(led_count),
            frames: FrameReassembler::new(led_count * 3, stream_chunk_size),
        }
    }

    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    /// Switch mode, logging real transitions.
    pub fn set_mode(&mut self, mode: ControllerMode) {
        if self.mode != mode {
            tracing::info!(from = self.mode.name(), to = mode.name(), "mode changed");
            self.mode = mode;
        }
    }

    /// Back to the start-of-process state.
    pub fn reset_idle(&mut self) {
        self.sparse.reset();
        self.frames.reset();
        self.set_mode(ControllerMode::Idle);
    }
}
