//! Completion mask for frame reassembly: one bit per chunk index.

use gtled_core::wire::MAX_FRAME_CHUNKS;

/// Fixed-width bitset over chunk indices `0..MAX_FRAME_CHUNKS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkMask(u32);

// The backing integer must have exactly one bit per allowed chunk.
const _: () = assert!(u32::BITS as usize == MAX_FRAME_CHUNKS);

impl ChunkMask {
    pub const EMPTY: ChunkMask = ChunkMask(0);

    /// Mask with the low `count` bits set. `None` if `count` exceeds the width.
    pub fn full(count: usize) -> Option<Self> {
        match count {
            0 => Some(Self::EMPTY),
            n if n < MAX_FRAME_CHUNKS => Some(Self((1u32 << n) - 1)),
            MAX_FRAME_CHUNKS => Some(Self(u32::MAX)),
            _ => None,
        }
    }

    pub fn contains(self, index: usize) -> bool {
        index < MAX_FRAME_CHUNKS && self.0 & (1 << index) != 0
    }

    /// Set the bit for `index`. Returns `Some(true)` if newly set,
    /// `Some(false)` if already present, `None` if out of range.
    pub fn insert(&mut self, index: usize) -> Option<bool> {
        if index >= MAX_FRAME_CHUNKS {
            return None;
        }
        let was_set = self.contains(index);
        self.0 |= 1 << index;
        Some(!was_set)
    }

    /// Number of set bits. At most `MAX_FRAME_CHUNKS`, so it fits a `u8`.
    pub fn count(self) -> u8 {
        self.0.count_ones() as u8
    }
}
