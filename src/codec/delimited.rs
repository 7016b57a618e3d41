//! Framing by an optional start byte and a mandatory end byte.

use bytes::Bytes;

use super::FrameCodec;
use crate::error::Result;

/// Default bound on the distance searched for an end byte.
pub const DEFAULT_MAX_FRAME: usize = 8192;

/// Codec for `[start] payload end` framing.
///
/// Without a start byte the frame is everything up to and including the
/// first end byte. With a start byte the frame is the whole bracketed span,
/// start and end bytes included; anything before the start byte is dropped.
/// The start and end byte may be the same value (HDLC-style 0x7E flags).
///
/// Overflow protection: when no end byte is found within `max_frame` bytes
/// the view is cleared entirely so an unbounded garbage run cannot pin the
/// receive buffer.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedCodec {
    start: Option<u8>,
    end: u8,
    max_frame: usize,
}

impl DelimitedCodec {
    /// Frame by a single end byte.
    pub fn new(end: u8) -> Self {
        Self {
            start: None,
            end,
            max_frame: DEFAULT_MAX_FRAME,
        }
    }

    /// Frame by a start byte and an end byte.
    pub fn with_start(start: u8, end: u8) -> Self {
        Self {
            start: Some(start),
            end,
            max_frame: DEFAULT_MAX_FRAME,
        }
    }

    /// Override the max-frame bound.
    pub fn with_max_frame(start: Option<u8>, end: u8, max_frame: usize) -> Self {
        Self {
            start,
            end,
            max_frame,
        }
    }
}

impl FrameCodec for DelimitedCodec {
    fn name(&self) -> &'static str {
        "delimited"
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(payload.len() + 2);
        if let Some(start) = self.start {
            out.push(start);
        }
        out.extend_from_slice(payload);
        out.push(self.end);
        Ok(out)
    }

    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes> {
        let buf = *view;

        let (frame_start, search_from) = match self.start {
            Some(start) => match buf.iter().position(|&b| b == start) {
                Some(i) => (i, i + 1),
                None => {
                    // Nothing decodable without a start byte; drop the garbage.
                    *view = &buf[buf.len()..];
                    return None;
                }
            },
            None => (0, 0),
        };

        match buf[search_from..].iter().position(|&b| b == self.end) {
            Some(rel) => {
                let end_idx = search_from + rel;
                let frame = Bytes::copy_from_slice(&buf[frame_start..=end_idx]);
                *view = &buf[end_idx + 1..];
                Some(frame)
            }
            None => {
                if buf.len() - frame_start > self.max_frame {
                    *view = &buf[buf.len()..];
                }
                None
            }
        }
    }
}
