//! Capacity-fixed containers used by the reassemblers.
//!
//! Both reject writes that would not fit instead of truncating, so callers
//! never have to do their own overflow arithmetic.

/// One pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("write of {len} at offset {offset} exceeds capacity {capacity}")]
pub struct CapacityError {
    pub offset: usize,
    pub len: usize,
    pub capacity: usize,
}

// ── FrameBuffer ───────────────────────────────────────────────────────────────

/// Zero-initialised byte buffer of a fixed length.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    bytes: Box<[u8]>,
}

impl FrameBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Copy `data` to `offset`. Nothing is written if any byte would land
    /// past the end.
    pub fn write_at(&mut self, offset: usize, data: &[u8]) -> Result<(), CapacityError> {
        let err = CapacityError {
            offset,
            len: data.len(),
            capacity: self.bytes.len(),
        };
        let end = offset.checked_add(data.len()).ok_or(err)?;
        let dst = self.bytes.get_mut(offset..end).ok_or(err)?;
        dst.copy_from_slice(data);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

// ── IndexList ─────────────────────────────────────────────────────────────────

/// Ordered list of LED indices with a hard upper bound on its length.
#[derive(Debug, Clone)]
pub(crate) struct IndexList {
    ids: Vec<u16>,
    capacity: usize,
}

impl IndexList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Append every index or none of them.
    pub fn try_extend<I>(&mut self, incoming: I) -> Result<(), CapacityError>
    where
        I: ExactSizeIterator<Item = u16>,
    {
        let len = incoming.len();
        if self.ids.len() + len > self.capacity {
            return Err(CapacityError {
                offset: self.ids.len(),
                len,
                capacity: self.capacity,
            });
        }
        self.ids.extend(incoming);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_buffer_starts_zeroed() {
        let buf = FrameBuffer::new(9);
        assert_eq!(buf.as_slice(), &[0u8; 9]);
    }

    #[test]
    fn frame_buffer_rejects_overflow_without_writing() {
        let mut buf = FrameBuffer::new(4);
        let err = buf.write_at(2, &[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            CapacityError {
                offset: 2,
                len: 3,
                capacity: 4
            }
        );
        assert_eq!(buf.as_slice(), &[0, 0, 0, 0]);

        buf.write_at(2, &[7, 8]).unwrap();
        assert_eq!(buf.as_slice(), &[0, 0, 7, 8]);
        assert!(buf.write_at(usize::MAX, &[1]).is_err());
    }

    #[test]
    fn frame_buffer_accepts_empty_write_at_end() {
        let mut buf = FrameBuffer::new(3);
        assert!(buf.write_at(3, &[]).is_ok());
        assert!(buf.write_at(4, &[]).is_err());
    }

    #[test]
    fn index_list_is_all_or_nothing() {
        let mut list = IndexList::with_capacity(3);
        list.try_extend([1u16, 2].into_iter()).unwrap();
        assert!(list.try_extend([3u16, 4].into_iter()).is_err());
        assert_eq!(list.as_slice(), &[1, 2]);
        list.try_extend([3u16].into_iter()).unwrap();
        assert_eq!(list.len(), 3);
    }
}
