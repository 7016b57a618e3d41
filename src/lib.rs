//! # autoframe
//!
//! Byte-stream frame codecs with protocol auto-detection and a streaming
//! sniffer.
//!
//! The crate turns a continuous, possibly noisy octet stream - serial
//! lines, sockets carrying industrial protocols, or logs thereof - into a
//! sequence of discrete frames, and back, without prior knowledge of the
//! framing discipline in use.
//!
//! ## Layers
//!
//! - **Codecs** ([`codec`]): newline, delimited, STX/ETX, fixed-length,
//!   length-prefixed, configurable length-field, Modbus RTU with CRC-16
//!   resync, and a 12-byte packet header format ([`packet`]). All share the
//!   [`codec::FrameCodec`] contract: decode advances a borrowed byte view
//!   in place and emits owned frames.
//! - **Auto-detection** ([`codec::AutoFrameCodec`]): scores a candidate set
//!   per pass and locks onto a consistent winner.
//! - **Sniffer** ([`sniffer`]): drives a codec set against a live
//!   [`transport::Transport`], hands decoded frames to a
//!   [`dump::FrameDumper`], and keeps unconsumed bytes across reads.
//!
//! ## Example
//!
//! ```
//! use autoframe::codec::{AutoFrameCodec, FrameCodec, ModbusRtuCodec, NewlineCodec};
//!
//! let mut auto = AutoFrameCodec::new(vec![
//!     Box::new(ModbusRtuCodec::new()),
//!     Box::new(NewlineCodec),
//! ])
//! .unwrap();
//!
//! let mut view: &[u8] = b"sensor online\n";
//! let frame = auto.decode(&mut view).unwrap();
//! assert_eq!(&frame[..], b"sensor online");
//! ```

pub mod codec;
pub mod dump;
pub mod error;
pub mod packet;
pub mod sniffer;
pub mod transport;

pub use codec::{
    AutoFrameCodec, AutoFrameConfig, DelimitedCodec, FixedLengthCodec, FrameCodec,
    LengthFieldCodec, LengthPrefixedCodec, ModbusRtuCodec, ModbusRtuConfig, NewlineCodec,
    StxEtxCodec,
};
pub use dump::{FrameDumper, HexDumper};
pub use error::{FrameError, Result};
pub use packet::{PacketCodec, PacketHeader};
pub use sniffer::AutoFrameSniffer;
pub use transport::{StreamTransport, Transport};
