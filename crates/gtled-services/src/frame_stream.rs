//! Frame-stream reassembly: places the chunks of one RGB frame into a
//! fixed buffer and reports when the frame is whole.
//!
//! Chunk `i` always lands at byte `i * chunk_size`; the chunk size is a
//! protocol constant shared with senders, never read from the wire. A
//! completion mask makes every chunk index apply at most once.
//!
//! Callers must verify the chunk CRC before handing it in.

use gtled_core::wire::{FrameChunk, MAX_FRAME_CHUNKS};

use crate::buffer::{CapacityError, FrameBuffer};
use crate::mask::ChunkMask;

/// State of the in-flight frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSession {
    pub frame_id: u8,
    pub expected_chunks: u8,
    pub received: ChunkMask,
    full: ChunkMask,
}

impl FrameSession {
    pub fn is_complete(&self) -> bool {
        self.received == self.full
    }
}

/// Result of feeding one chunk in.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameProgress<'a> {
    /// Chunk applied; more are needed.
    Pending { received: u8, expected: u8 },
    /// This chunk index was already applied. Nothing changed.
    Duplicate { chunk_index: u8 },
    /// The frame is whole. The session is closed; the slice stays valid
    /// until the next frame starts.
    Complete(&'a [u8]),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame {frame_id} declares zero chunks")]
    ZeroChunks { frame_id: u8 },

    #[error("frame {frame_id} declares {total} chunks, at most {max} supported")]
    TooManyChunks { frame_id: u8, total: u8, max: usize },

    #[error("chunk index {index} out of bounds (max {max})")]
    ChunkIndexOutOfRange { index: u8, max: usize },

    #[error("chunk index {index} beyond the {total} chunks of frame {frame_id}")]
    ChunkBeyondTotal { frame_id: u8, index: u8, total: u8 },

    #[error("frame {frame_id} aborted: {source}")]
    Overflow {
        frame_id: u8,
        #[source]
        source: CapacityError,
    },
}

/// The single frame session slot plus the frame buffer.
#[derive(Debug)]
pub struct FrameReassembler {
    session: Option<FrameSession>,
    buffer: FrameBuffer,
    chunk_size: usize,
}

impl FrameReassembler {
    /// `frame_len` is the full RGB frame size (LED count × 3).
    pub fn new(frame_len: usize, chunk_size: usize) -> Self {
        Self {
            session: None,
            buffer: FrameBuffer::new(frame_len),
            chunk_size,
        }
    }

    pub fn session(&self) -> Option<FrameSession> {
        self.session
    }

    pub fn buffer(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.session = None;
    }

    pub fn accept(&mut self, chunk: &FrameChunk<'_>) -> Result<FrameProgress<'_>, FrameError> {
        let header = chunk.header;
        let frame_id = header.frame_id;
        let index = header.chunk_index;

        let mut session = match self.session.filter(|s| s.frame_id == frame_id) {
            Some(session) => session,
            None => self.start(frame_id, header.total_chunks)?,
        };

        if index as usize >= MAX_FRAME_CHUNKS {
            return Err(FrameError::ChunkIndexOutOfRange {
                index,
                max: MAX_FRAME_CHUNKS - 1,
            });
        }
        if index >= session.expected_chunks {
            return Err(FrameError::ChunkBeyondTotal {
                frame_id,
                index,
                total: session.expected_chunks,
            });
        }
        if session.received.contains(index as usize) {
            tracing::debug!(frame_id, chunk = index, "duplicate frame chunk");
            return Ok(FrameProgress::Duplicate { chunk_index: index });
        }

        let placed = match (index as usize).checked_mul(self.chunk_size) {
            Some(offset) => self.buffer.write_at(offset, chunk.pixels).map(|()| offset),
            // An offset that does not fit in usize is reported as usize::MAX.
            None => Err(CapacityError {
                offset: usize::MAX,
                len: chunk.pixels.len(),
                capacity: self.buffer.capacity(),
            }),
        };
        let offset = match placed {
            Ok(offset) => offset,
            Err(source) => {
                self.reset();
                return Err(FrameError::Overflow { frame_id, source });
            }
        };
        session.received.insert(index as usize);

        tracing::debug!(
            frame_id,
            chunk = index,
            offset,
            bytes = chunk.pixels.len(),
            received = session.received.count(),
            expected = session.expected_chunks,
            "frame chunk applied"
        );

        if session.is_complete() {
            self.reset();
            return Ok(FrameProgress::Complete(self.buffer.as_slice()));
        }
        self.session = Some(session);
        Ok(FrameProgress::Pending {
            received: session.received.count(),
            expected: session.expected_chunks,
        })
    }

    /// Open a new frame, discarding whatever was in flight and zeroing the
    /// buffer so no stale bytes survive into the new frame.
    fn start(&mut self, frame_id: u8, total_chunks: u8) -> Result<FrameSession, FrameError> {
        if total_chunks == 0 {
            return Err(FrameError::ZeroChunks { frame_id });
        }
        let full = ChunkMask::full(total_chunks as usize).ok_or(FrameError::TooManyChunks {
            frame_id,
            total: total_chunks,
            max: MAX_FRAME_CHUNKS,
        })?;
        if let Some(old) = self.session {
            tracing::debug!(
                old_id = old.frame_id,
                received = old.received.count(),
                expected = old.expected_chunks,
                "discarding partial frame"
            );
        }
        self.buffer.clear();
        let session = FrameSession {
            frame_id,
            expected_chunks: total_chunks,
            received: ChunkMask::EMPTY,
            full,
        };
        self.session = Some(session);
        tracing::debug!(frame_id, total_chunks, "frame started");
        Ok(session)
    }
}
