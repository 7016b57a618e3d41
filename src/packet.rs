//! Application packet wire format.
//!
//! Implements the 12-byte header format:
//! ```text
//! ┌─────────┬──────┬─────────┬───────────┬────────────┐
//! │ Version │ Type │ Flags   │ Sequence  │ Length     │
//! │ 1 byte  │1 byte│ 2 bytes │ 4 bytes   │ 4 bytes    │
//! │         │      │ u16 BE  │ u32 BE    │ i32 BE     │
//! └─────────┴──────┴─────────┴───────────┴────────────┘
//! ```
//!
//! All multi-byte integers are Big Endian. The payload length is signed on
//! the wire; a negative value marks a corrupt header.
//!
//! [`PacketCodec`] is a message-boundary codec, not a streaming one: decode
//! accepts a view only when its total length equals header + payload
//! exactly.

use bytes::Bytes;

use crate::codec::FrameCodec;
use crate::error::{FrameError, Result};

/// Header size in bytes (fixed, exactly 12).
pub const HEADER_SIZE: usize = 12;

/// Decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Protocol version.
    pub version: u8,
    /// Message type discriminator.
    pub kind: u8,
    /// Application-defined flag bits.
    pub flags: u16,
    /// Monotone message sequence number.
    pub sequence: u32,
    /// Payload length in bytes; negative only on corrupt input.
    pub payload_length: i32,
}

impl PacketHeader {
    /// Create a new header.
    pub fn new(version: u8, kind: u8, flags: u16, sequence: u32, payload_length: i32) -> Self {
        Self {
            version,
            kind,
            flags,
            sequence,
            payload_length,
        }
    }

    /// Encode the header to bytes (Big Endian).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode the header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is smaller than [`HEADER_SIZE`].
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[0] = self.version;
        buf[1] = self.kind;
        buf[2..4].copy_from_slice(&self.flags.to_be_bytes());
        buf[4..8].copy_from_slice(&self.sequence.to_be_bytes());
        buf[8..12].copy_from_slice(&self.payload_length.to_be_bytes());
    }

    /// Decode a header from bytes (Big Endian).
    ///
    /// Returns `None` if the buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            version: buf[0],
            kind: buf[1],
            flags: u16::from_be_bytes([buf[2], buf[3]]),
            sequence: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            payload_length: i32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
        })
    }

    /// Validate the header: the payload length must be non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.payload_length < 0 {
            return Err(FrameError::InvalidArgument(format!(
                "negative payload length {}",
                self.payload_length
            )));
        }
        Ok(())
    }
}

/// Build a complete packet as a single byte vector.
///
/// Fails if the header's payload length disagrees with the payload.
pub fn build_packet(header: &PacketHeader, payload: &[u8]) -> Result<Vec<u8>> {
    header.validate()?;
    if header.payload_length as usize != payload.len() {
        return Err(FrameError::InvalidArgument(format!(
            "header declares {} payload bytes, got {}",
            header.payload_length,
            payload.len()
        )));
    }
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Parse a complete packet, returning header and an owned payload copy.
///
/// Returns `None` unless the input length equals header + payload exactly.
pub fn parse_packet(input: &[u8]) -> Option<(PacketHeader, Bytes)> {
    let header = PacketHeader::decode(input)?;
    if header.payload_length < 0 {
        return None;
    }
    let total = HEADER_SIZE + header.payload_length as usize;
    if input.len() != total {
        return None;
    }
    let payload = Bytes::copy_from_slice(&input[HEADER_SIZE..]);
    Some((header, payload))
}

/// Message-boundary codec for the 12-byte packet header format.
///
/// Each encode stamps the configured version and type and the next value of
/// an internal sequence counter. Decode emits the payload only; use
/// [`parse_packet`] when the header fields matter.
#[derive(Debug, Clone)]
pub struct PacketCodec {
    version: u8,
    kind: u8,
    flags: u16,
    next_sequence: std::cell::Cell<u32>,
}

impl PacketCodec {
    /// Create a codec stamping the given version and message type.
    pub fn new(version: u8, kind: u8) -> Self {
        Self {
            version,
            kind,
            flags: 0,
            next_sequence: std::cell::Cell::new(0),
        }
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl FrameCodec for PacketCodec {
    fn name(&self) -> &'static str {
        "packet"
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > i32::MAX as usize {
            return Err(FrameError::InvalidArgument(format!(
                "payload of {} bytes does not fit a 32-bit length field",
                payload.len()
            )));
        }
        let sequence = self.next_sequence.get();
        self.next_sequence.set(sequence.wrapping_add(1));

        let header = PacketHeader::new(
            self.version,
            self.kind,
            self.flags,
            sequence,
            payload.len() as i32,
        );
        build_packet(&header, payload)
    }

    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes> {
        let buf = *view;
        let (_, payload) = parse_packet(buf)?;
        *view = &buf[buf.len()..];
        Some(payload)
    }
}
