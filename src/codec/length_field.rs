//! Framing driven by a length field at a configurable header offset.

use bytes::Bytes;

use super::FrameCodec;
use crate::error::{FrameError, Result};

/// Default upper bound on a declared frame length.
pub const DEFAULT_MAX_FRAME: usize = 8192;

/// Codec for headers carrying a total-frame-length field.
///
/// The field value is the TOTAL frame length (header + payload), not the
/// payload length. The emitted frame includes the header bytes.
///
/// A declared length of zero or above the configured maximum is treated as
/// garbage: exactly one byte is discarded from the front of the view so a
/// later header can be found (the resync step).
#[derive(Debug, Clone, Copy)]
pub struct LengthFieldCodec {
    length_bytes: usize,
    big_endian: bool,
    length_offset: usize,
    header_size: usize,
    max_frame: usize,
}

impl LengthFieldCodec {
    /// Create a codec whose length field sits at offset 0 and spans the
    /// whole header.
    ///
    /// `length_bytes` must be 1, 2 or 4.
    pub fn new(length_bytes: usize, big_endian: bool) -> Result<Self> {
        Self::with_layout(length_bytes, big_endian, 0, None, DEFAULT_MAX_FRAME)
    }

    /// Create a codec with an explicit header layout.
    ///
    /// `header_size` defaults to `length_offset + length_bytes` when `None`.
    pub fn with_layout(
        length_bytes: usize,
        big_endian: bool,
        length_offset: usize,
        header_size: Option<usize>,
        max_frame: usize,
    ) -> Result<Self> {
        if !matches!(length_bytes, 1 | 2 | 4) {
            return Err(FrameError::InvalidConfig(format!(
                "length field width must be 1, 2 or 4, got {}",
                length_bytes
            )));
        }
        let header_size = header_size.unwrap_or(length_offset + length_bytes);
        if header_size < length_offset + length_bytes {
            return Err(FrameError::InvalidConfig(format!(
                "header of {} bytes cannot hold a {}-byte length field at offset {}",
                header_size, length_bytes, length_offset
            )));
        }
        if max_frame == 0 {
            return Err(FrameError::InvalidConfig(
                "max frame bytes must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            length_bytes,
            big_endian,
            length_offset,
            header_size,
            max_frame,
        })
    }

    fn read_length(&self, header: &[u8]) -> usize {
        let field = &header[self.length_offset..self.length_offset + self.length_bytes];
        let mut value: u64 = 0;
        if self.big_endian {
            for &b in field {
                value = (value << 8) | u64::from(b);
            }
        } else {
            for &b in field.iter().rev() {
                value = (value << 8) | u64::from(b);
            }
        }
        value as usize
    }

    fn field_capacity(&self) -> u64 {
        match self.length_bytes {
            1 => u64::from(u8::MAX),
            2 => u64::from(u16::MAX),
            _ => u64::from(u32::MAX),
        }
    }
}

impl FrameCodec for LengthFieldCodec {
    fn name(&self) -> &'static str {
        "length-field"
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let total = self.header_size + payload.len();
        if total as u64 > self.field_capacity() {
            return Err(FrameError::InvalidArgument(format!(
                "total frame length {} does not fit a {}-byte length field",
                total, self.length_bytes
            )));
        }

        let mut out = vec![0u8; self.header_size];
        let field = &mut out[self.length_offset..self.length_offset + self.length_bytes];
        let total = total as u64;
        if self.big_endian {
            for (i, b) in field.iter_mut().enumerate() {
                *b = (total >> (8 * (self.length_bytes - 1 - i))) as u8;
            }
        } else {
            for (i, b) in field.iter_mut().enumerate() {
                *b = (total >> (8 * i)) as u8;
            }
        }
        out.extend_from_slice(payload);
        Ok(out)
    }

    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes> {
        let buf = *view;
        if buf.len() < self.header_size {
            return None;
        }

        let len = self.read_length(buf);
        if len == 0 || len > self.max_frame {
            // Resync: this position cannot start a valid frame.
            *view = &buf[1..];
            return None;
        }
        if buf.len() < len {
            return None;
        }

        let frame = Bytes::copy_from_slice(&buf[..len]);
        *view = &buf[len..];
        Some(frame)
    }
}
