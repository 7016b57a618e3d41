//! Constant-size framing.

use bytes::Bytes;

use super::FrameCodec;
use crate::error::{FrameError, Result};

/// Codec for frames of a fixed byte count.
#[derive(Debug, Clone, Copy)]
pub struct FixedLengthCodec {
    size: usize,
}

impl FixedLengthCodec {
    /// Create a codec emitting frames of exactly `size` bytes.
    ///
    /// Fails with [`FrameError::InvalidConfig`] when `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(FrameError::InvalidConfig(
                "fixed frame size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { size })
    }

    /// The configured frame size.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl FrameCodec for FixedLengthCodec {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        Ok(payload.to_vec())
    }

    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes> {
        let buf = *view;
        if buf.len() < self.size {
            return None;
        }
        let frame = Bytes::copy_from_slice(&buf[..self.size]);
        *view = &buf[self.size..];
        Some(frame)
    }
}
