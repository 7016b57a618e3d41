//! Dump sinks for captured frames.
//!
//! A [`FrameDumper`] accepts one record per frame: direction tag, remote
//! label, sequence number, and the frame bytes. [`HexDumper`] renders the
//! classic offset / hex / ASCII dump onto any async writer.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{FrameError, Result};

/// Bytes rendered per hex-dump row.
const ROW_WIDTH: usize = 16;

/// An asynchronous sink for frame records.
///
/// A dump call returns once the record has been persisted; the sniffer
/// relies on that to keep records ordered.
pub trait FrameDumper: Send {
    /// Persist one frame record.
    fn dump(
        &mut self,
        direction: &str,
        remote: &str,
        sequence: u64,
        frame: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Render one hex-dump row: `0000  41 42 ..  |AB..|`.
pub fn hex_line(offset: usize, row: &[u8]) -> String {
    let mut hex = String::with_capacity(ROW_WIDTH * 3);
    for (i, byte) in row.iter().enumerate() {
        if i > 0 {
            hex.push(' ');
        }
        hex.push_str(&format!("{:02X}", byte));
    }
    // Pad short rows so the ASCII column lines up.
    let pad = ROW_WIDTH * 3 - 1 - hex.len();
    let ascii: String = row
        .iter()
        .map(|&b| if (32..=126).contains(&b) { b as char } else { '.' })
        .collect();
    format!("{:04x}  {}{}  |{}|", offset, hex, " ".repeat(pad), ascii)
}

/// Dumper writing human-readable hex dumps to an async writer.
#[derive(Debug)]
pub struct HexDumper<W> {
    writer: W,
}

impl<W> HexDumper<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the dumper and return the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin + Send> FrameDumper for HexDumper<W> {
    async fn dump(
        &mut self,
        direction: &str,
        remote: &str,
        sequence: u64,
        frame: &[u8],
    ) -> Result<()> {
        let mut text = format!(
            "{} {} #{} ({} bytes)\n",
            direction,
            remote,
            sequence,
            frame.len()
        );
        for (i, row) in frame.chunks(ROW_WIDTH).enumerate() {
            text.push_str(&hex_line(i * ROW_WIDTH, row));
            text.push('\n');
        }

        self.writer
            .write_all(text.as_bytes())
            .await
            .map_err(|e| FrameError::Dump(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| FrameError::Dump(e.to_string()))?;
        Ok(())
    }
}
