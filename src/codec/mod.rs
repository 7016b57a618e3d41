//! Framing codecs - cutting a byte stream into discrete frames.
//!
//! Every framing discipline implements [`FrameCodec`]:
//!
//! - [`NewlineCodec`] - LF / CR / CRLF terminated lines
//! - [`DelimitedCodec`] - optional start byte + end byte
//! - [`StxEtxCodec`] - STX ... ETX bracketing
//! - [`FixedLengthCodec`] - constant-size frames
//! - [`LengthPrefixedCodec`] - 32-bit big-endian payload length prefix
//! - [`LengthFieldCodec`] - configurable length field inside a header
//! - [`ModbusRtuCodec`] - function-code driven lengths, CRC-16, resync scan
//! - [`AutoFrameCodec`] - wraps a candidate set, scores them, locks a winner
//!
//! # Design
//!
//! `decode` takes the receive buffer as a `&mut &[u8]` view and advances it
//! in place by reslicing from the front. Decoded frames are owned
//! [`Bytes`] copies, independent of the source buffer, so callers may hold
//! them across reads while the buffer is reused.
//!
//! # Example
//!
//! ```
//! use autoframe::codec::{FrameCodec, NewlineCodec};
//!
//! let mut codec = NewlineCodec;
//! let wire = codec.encode(b"hello").unwrap();
//! let mut view: &[u8] = &wire;
//! let frame = codec.decode(&mut view).unwrap();
//! assert_eq!(&frame[..], b"hello");
//! assert!(view.is_empty());
//! ```

mod auto;
mod delimited;
mod fixed;
mod length_field;
mod length_prefixed;
mod modbus;
mod newline;
mod stx_etx;

pub use auto::{AutoFrameCodec, AutoFrameConfig};
pub use delimited::DelimitedCodec;
pub use fixed::FixedLengthCodec;
pub use length_field::LengthFieldCodec;
pub use length_prefixed::LengthPrefixedCodec;
pub use modbus::{crc16, ModbusRtuCodec, ModbusRtuConfig};
pub use newline::NewlineCodec;
pub use stx_etx::{StxEtxCodec, ETX, STX};

use bytes::Bytes;

use crate::error::Result;

/// A bidirectional encoder/decoder for one framing discipline.
///
/// Codecs are synchronous and non-suspending. They never panic on malformed
/// input; failure is reported by returning `None` from `decode`.
pub trait FrameCodec: Send {
    /// Short stable tag identifying the discipline (used in lock labels
    /// and log lines).
    fn name(&self) -> &'static str;

    /// Wrap a payload in the framing discipline.
    ///
    /// Returns a newly allocated byte sequence; never mutates the input.
    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Try to extract one frame from the front of `view`.
    ///
    /// On success the view is advanced past the consumed bytes, which may
    /// include skipped prefix garbage for codecs that resync. On `None` the
    /// view is either unchanged (insufficient data) or advanced by the
    /// codec's defined resync step (invalid length, garbage discard).
    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes>;
}
