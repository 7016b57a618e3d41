//! 32-bit big-endian length-prefixed framing.

use bytes::Bytes;

use super::FrameCodec;
use crate::error::{FrameError, Result};

/// Size of the length prefix in bytes.
const PREFIX_SIZE: usize = 4;

/// Codec for `[u32 BE payload length][payload]` framing.
///
/// The length prefix counts payload bytes only and is not part of the
/// emitted frame. A prefix whose sign bit is set is rejected silently
/// (the view is left untouched so the caller can give up or resync by
/// other means).
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthPrefixedCodec;

impl FrameCodec for LengthPrefixedCodec {
    fn name(&self) -> &'static str {
        "length-prefixed"
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > i32::MAX as usize {
            return Err(FrameError::InvalidArgument(format!(
                "payload of {} bytes does not fit a 32-bit length prefix",
                payload.len()
            )));
        }
        let mut out = Vec::with_capacity(PREFIX_SIZE + payload.len());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        Ok(out)
    }

    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes> {
        let buf = *view;
        if buf.len() < PREFIX_SIZE {
            return None;
        }

        let raw = i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if raw < 0 {
            return None;
        }

        let len = raw as usize;
        if buf.len() < PREFIX_SIZE + len {
            return None;
        }

        let frame = Bytes::copy_from_slice(&buf[PREFIX_SIZE..PREFIX_SIZE + len]);
        *view = &buf[PREFIX_SIZE + len..];
        Some(frame)
    }
}
