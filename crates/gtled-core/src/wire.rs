//! gtled wire format: the UDP control protocol spoken by senders and the
//! controller.
//!
//! Every datagram starts with the 2-byte `"GT"` magic and a command byte.
//! What follows depends on the command. Multi-byte LED indices are
//! little-endian, matching the byte order the controller firmware copies
//! straight out of the datagram.
//!
//! Fixed headers are `#[repr(C, packed)]` zerocopy structs so parsing never
//! copies and never needs unsafe code.

use bytes::{BufMut, Bytes, BytesMut};
use static_assertions::assert_eq_size;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::crc::{self, crc8};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Signature that opens every datagram.
pub const MAGIC: [u8; 2] = *b"GT";

/// Magic + command byte.
pub const HEADER_LEN: usize = 3;

/// Shortest valid SetLeds datagram: header + command id + total + index.
pub const SPARSE_MIN_LEN: usize = 6;

/// Shortest valid StreamFrame datagram: header + crc + frame id + total + index.
pub const FRAME_MIN_LEN: usize = 7;

/// Datagram offset where the CRC-protected region of a StreamFrame chunk begins.
pub const FRAME_CRC_OFFSET: usize = 4;

/// Shortest valid SetConfig datagram: header + brightness + power state.
pub const SET_CONFIG_MIN_LEN: usize = 5;

/// Maximum number of chunks a single frame may be split into.
/// Bounded by the width of the completion mask.
pub const MAX_FRAME_CHUNKS: usize = 32;

/// Default byte size of every StreamFrame chunk payload except possibly the last.
/// Not carried on the wire; sender and controller must agree on it.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 96;

/// Indices per SetLeds chunk that fit the controller firmware's 128-byte
/// receive buffer.
pub const DEFAULT_INDICES_PER_CHUNK: usize = 60;

/// Default UDP port the controller listens on.
pub const DEFAULT_PORT: u16 = 1234;

/// Largest datagram the receive loop reads in one go.
pub const MAX_DATAGRAM: usize = 1500;

/// Chunk counts and indices are single bytes on the wire.
const MAX_WIRE_CHUNKS: usize = u8::MAX as usize;

// ── Command ids ───────────────────────────────────────────────────────────────

/// The command byte at offset 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    /// Reply with the last octet of the controller's station address.
    Discovery = 0,
    /// Reply with brightness and power state.
    GetConfig = 1,
    /// Store brightness and power state. No reply.
    SetConfig = 2,
    /// One chunk of a sparse LED-index update. No reply.
    SetLeds = 6,
    /// One CRC-protected chunk of a full RGB frame. No reply.
    StreamFrame = 7,
}

impl CommandId {
    pub fn name(self) -> &'static str {
        match self {
            CommandId::Discovery => "discovery",
            CommandId::GetConfig => "get_config",
            CommandId::SetConfig => "set_config",
            CommandId::SetLeds => "set_leds",
            CommandId::StreamFrame => "stream_frame",
        }
    }
}

impl TryFrom<u8> for CommandId {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CommandId::Discovery),
            1 => Ok(CommandId::GetConfig),
            2 => Ok(CommandId::SetConfig),
            6 => Ok(CommandId::SetLeds),
            7 => Ok(CommandId::StreamFrame),
            other => Err(WireError::UnknownCommand(other)),
        }
    }
}

impl From<CommandId> for u8 {
    fn from(c: CommandId) -> u8 {
        c as u8
    }
}

// ── Fixed headers ─────────────────────────────────────────────────────────────

/// Common datagram header.
///
/// Wire size: 3 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct PacketHeader {
    /// Always `MAGIC`.
    pub magic: [u8; 2],
    /// Raw command byte. Not guaranteed to be a known `CommandId`.
    pub command: u8,
}

assert_eq_size!(PacketHeader, [u8; HEADER_LEN]);

/// Header that follows `PacketHeader` in a SetLeds chunk.
///
/// Wire size: 3 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct SparseChunkHeader {
    /// Rolling id of the multi-chunk transaction.
    pub command_id: u8,
    /// Number of chunks the sender will send for this transaction.
    pub total_chunks: u8,
    /// Sender's index of this chunk. Informational only.
    pub chunk_index: u8,
}

assert_eq_size!(SparseChunkHeader, [u8; SPARSE_MIN_LEN - HEADER_LEN]);

/// Header that follows `PacketHeader` in a StreamFrame chunk.
///
/// Wire size: 4 bytes. `crc` covers every byte after itself, header
/// fields included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct FrameChunkHeader {
    pub crc: u8,
    /// Rolling id of the frame.
    pub frame_id: u8,
    /// Number of chunks the frame is split into (1..=32).
    pub total_chunks: u8,
    /// Position of this chunk; payload lands at `chunk_index * chunk_size`.
    pub chunk_index: u8,
}

assert_eq_size!(FrameChunkHeader, [u8; FRAME_MIN_LEN - HEADER_LEN]);

/// Payload of SetConfig requests and GetConfig replies.
///
/// Wire size: 2 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct ConfigPayload {
    pub brightness: u8,
    pub power_state: u8,
}

assert_eq_size!(ConfigPayload, [u8; SET_CONFIG_MIN_LEN - HEADER_LEN]);

// ── Validation ────────────────────────────────────────────────────────────────

/// A datagram that passed header validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    /// Raw command byte.
    pub command: u8,
    /// Everything after the 3-byte header.
    pub payload: &'a [u8],
}

/// Check magic and minimum length, and split off the command byte.
pub fn parse_packet(datagram: &[u8]) -> Result<Packet<'_>, WireError> {
    let header = PacketHeader::read_from_prefix(datagram).ok_or(WireError::TooShort {
        len: datagram.len(),
        min: HEADER_LEN,
    })?;
    if header.magic != MAGIC {
        return Err(WireError::BadMagic(header.magic));
    }
    Ok(Packet {
        command: header.command,
        payload: &datagram[HEADER_LEN..],
    })
}

/// `Some` iff the datagram is at least 3 bytes long and starts with `MAGIC`.
pub fn validate(datagram: &[u8]) -> Option<Packet<'_>> {
    parse_packet(datagram).ok()
}

// ── Per-command payloads ──────────────────────────────────────────────────────

/// A parsed SetLeds chunk.
#[derive(Debug, Clone, Copy)]
pub struct SparseChunk<'a> {
    pub header: SparseChunkHeader,
    /// Raw little-endian index bytes.
    pub index_bytes: &'a [u8],
}

impl<'a> SparseChunk<'a> {
    /// Parse the payload that follows `PacketHeader`.
    pub fn parse(payload: &'a [u8]) -> Result<Self, WireError> {
        let header = SparseChunkHeader::read_from_prefix(payload).ok_or(WireError::TooShort {
            len: payload.len() + HEADER_LEN,
            min: SPARSE_MIN_LEN,
        })?;
        Ok(Self {
            header,
            index_bytes: &payload[SPARSE_MIN_LEN - HEADER_LEN..],
        })
    }

    /// Number of complete 16-bit indices carried.
    pub fn index_count(&self) -> usize {
        self.index_bytes.len() / 2
    }

    /// True if the index region has an odd trailing byte (ignored).
    pub fn has_trailing_byte(&self) -> bool {
        self.index_bytes.len() % 2 != 0
    }

    /// Decode the carried indices.
    pub fn indices(&self) -> impl ExactSizeIterator<Item = u16> + 'a {
        let bytes: &'a [u8] = self.index_bytes;
        bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }
}

/// A parsed StreamFrame chunk. The CRC is not checked by `parse`.
#[derive(Debug, Clone, Copy)]
pub struct FrameChunk<'a> {
    pub header: FrameChunkHeader,
    /// The CRC-protected region: frame id, total, index, and pixels.
    pub protected: &'a [u8],
    /// RGB bytes.
    pub pixels: &'a [u8],
}

impl<'a> FrameChunk<'a> {
    /// Parse the payload that follows `PacketHeader`.
    pub fn parse(payload: &'a [u8]) -> Result<Self, WireError> {
        let header = FrameChunkHeader::read_from_prefix(payload).ok_or(WireError::TooShort {
            len: payload.len() + HEADER_LEN,
            min: FRAME_MIN_LEN,
        })?;
        Ok(Self {
            header,
            protected: &payload[FRAME_CRC_OFFSET - HEADER_LEN..],
            pixels: &payload[FRAME_MIN_LEN - HEADER_LEN..],
        })
    }

    /// CRC-8 of the protected region.
    pub fn computed_crc(&self) -> u8 {
        crc8(self.protected)
    }

    /// Check the carried CRC against the protected region.
    pub fn verify(&self) -> Result<(), WireError> {
        if crc::verify(self.protected, self.header.crc) {
            Ok(())
        } else {
            Err(WireError::CrcMismatch {
                received: self.header.crc,
                computed: self.computed_crc(),
            })
        }
    }
}

impl ConfigPayload {
    /// Parse a SetConfig payload. Extra trailing bytes are ignored.
    pub fn parse(payload: &[u8]) -> Result<Self, WireError> {
        Self::read_from_prefix(payload).ok_or(WireError::TooShort {
            len: payload.len() + HEADER_LEN,
            min: SET_CONFIG_MIN_LEN,
        })
    }
}

// ── Encoders ──────────────────────────────────────────────────────────────────

fn header(command: CommandId) -> PacketHeader {
    PacketHeader {
        magic: MAGIC,
        command: command.into(),
    }
}

/// Header-only request (Discovery, GetConfig).
pub fn encode_request(command: CommandId) -> Bytes {
    Bytes::copy_from_slice(header(command).as_bytes())
}

/// SetConfig request.
pub fn encode_set_config(brightness: u8, power_state: u8) -> Bytes {
    encode_config_frame(CommandId::SetConfig, brightness, power_state)
}

/// GetConfig reply.
pub fn encode_config_reply(brightness: u8, power_state: u8) -> Bytes {
    encode_config_frame(CommandId::GetConfig, brightness, power_state)
}

fn encode_config_frame(command: CommandId, brightness: u8, power_state: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(SET_CONFIG_MIN_LEN);
    buf.put_slice(header(command).as_bytes());
    buf.put_slice(
        ConfigPayload {
            brightness,
            power_state,
        }
        .as_bytes(),
    );
    buf.freeze()
}

/// Discovery reply carrying the last octet of the station address.
pub fn encode_discovery_reply(last_octet: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + 1);
    buf.put_slice(header(CommandId::Discovery).as_bytes());
    buf.put_u8(last_octet);
    buf.freeze()
}

/// Split an LED-index list into a SetLeds chunk sequence.
///
/// An empty list still produces one (empty) chunk so the controller sees a
/// complete transaction and clears the strip.
pub fn encode_set_leds(
    command_id: u8,
    indices: &[u16],
    indices_per_chunk: usize,
) -> Result<Vec<Bytes>, WireError> {
    if indices_per_chunk == 0 {
        return Err(WireError::InvalidChunkSize(0));
    }
    let groups: Vec<&[u16]> = if indices.is_empty() {
        vec![&[]]
    } else {
        indices.chunks(indices_per_chunk).collect()
    };
    if groups.len() > MAX_WIRE_CHUNKS {
        return Err(WireError::TooManyChunks {
            count: groups.len(),
            max: MAX_WIRE_CHUNKS,
        });
    }

    let total_chunks = groups.len() as u8;
    Ok(groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| {
            let mut buf = BytesMut::with_capacity(SPARSE_MIN_LEN + group.len() * 2);
            buf.put_slice(header(CommandId::SetLeds).as_bytes());
            buf.put_slice(
                SparseChunkHeader {
                    command_id,
                    total_chunks,
                    chunk_index: i as u8,
                }
                .as_bytes(),
            );
            for &index in group {
                buf.put_u16_le(index);
            }
            buf.freeze()
        })
        .collect())
}

/// Split an RGB frame into a StreamFrame chunk sequence with CRCs filled in.
pub fn encode_stream_frame(
    frame_id: u8,
    rgb: &[u8],
    chunk_size: usize,
) -> Result<Vec<Bytes>, WireError> {
    if chunk_size == 0 {
        return Err(WireError::InvalidChunkSize(0));
    }
    if rgb.is_empty() {
        return Err(WireError::EmptyFrame);
    }
    let count = rgb.len().div_ceil(chunk_size);
    if count > MAX_FRAME_CHUNKS {
        return Err(WireError::TooManyChunks {
            count,
            max: MAX_FRAME_CHUNKS,
        });
    }

    Ok(rgb
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, pixels)| {
            let mut buf = BytesMut::with_capacity(FRAME_MIN_LEN + pixels.len());
            buf.put_slice(header(CommandId::StreamFrame).as_bytes());
            buf.put_u8(0); // crc placeholder
            buf.put_u8(frame_id);
            buf.put_u8(count as u8);
            buf.put_u8(i as u8);
            buf.put_slice(pixels);
            let crc = crc8(&buf[FRAME_CRC_OFFSET..]);
            buf[HEADER_LEN] = crc;
            buf.freeze()
        })
        .collect())
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting or producing wire-format data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("datagram too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error("bad magic: {0:02x?}")]
    BadMagic([u8; 2]),

    #[error("unknown command byte: {0}")]
    UnknownCommand(u8),

    #[error("crc mismatch: received 0x{received:02x}, computed 0x{computed:02x}")]
    CrcMismatch { received: u8, computed: u8 },

    #[error("{count} chunks needed, at most {max} allowed")]
    TooManyChunks { count: usize, max: usize },

    #[error("invalid chunk size {0}")]
    InvalidChunkSize(usize),

    #[error("frame has no pixel data")]
    EmptyFrame,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
