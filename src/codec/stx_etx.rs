//! STX/ETX bracketed framing.

use bytes::Bytes;

use super::FrameCodec;
use crate::error::Result;

/// Start-of-text control byte.
pub const STX: u8 = 0x02;
/// End-of-text control byte.
pub const ETX: u8 = 0x03;

/// Codec for `STX payload ETX` framing.
///
/// The decoded frame is the bytes strictly between STX and ETX; bytes before
/// the STX are skipped once a complete bracket is found.
#[derive(Debug, Clone, Copy, Default)]
pub struct StxEtxCodec;

impl FrameCodec for StxEtxCodec {
    fn name(&self) -> &'static str {
        "stx-etx"
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(payload.len() + 2);
        out.push(STX);
        out.extend_from_slice(payload);
        out.push(ETX);
        Ok(out)
    }

    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes> {
        let buf = *view;
        let stx = buf.iter().position(|&b| b == STX)?;
        let rel = buf[stx + 1..].iter().position(|&b| b == ETX)?;
        let etx = stx + 1 + rel;

        let frame = Bytes::copy_from_slice(&buf[stx + 1..etx]);
        *view = &buf[etx + 1..];
        Some(frame)
    }
}
