//! gtled-services: the stateful half of the controller: reassembly
//! sessions, controller mode, and the collaborators the router talks to.

pub mod buffer;
pub mod frame_stream;
pub mod mask;
pub mod mode;
pub mod service;
pub mod sparse;
pub mod storage;
pub mod strip;

pub use buffer::{CapacityError, FrameBuffer, Rgb};
pub use frame_stream::{FrameError, FrameProgress, FrameReassembler};
pub use mask::ChunkMask;
pub use mode::{ControllerMode, ControllerState};
pub use service::{ConfigStore, PixelOutput, StationAddress};
pub use sparse::{SparseError, SparseProgress, SparseReassembler};
pub use storage::{FileConfigStore, MemoryConfigStore};
pub use strip::LedStrip;
