//! Streaming sniffer: drives a codec set against a live receive buffer.
//!
//! [`AutoFrameSniffer`] pulls bytes from a [`Transport`] into a fixed-size
//! buffer. On each read it runs every codec over a copy of the filled
//! prefix; the codec that extracts the most frames wins and its frames are
//! handed to the [`FrameDumper`] in decode order. When nothing decodes, the
//! whole prefix is dumped as one unparsed blob. Unconsumed tail bytes are
//! compacted to the front of the buffer before the next read.
//!
//! # Buffer lifetime discipline
//!
//! The loop suspends at exactly two points: the transport receive and each
//! dumper call. No slice into the receive buffer is ever held across a
//! suspension; only the owned frame copies produced by the codecs survive.
//! This is what lets the buffer be reused (and compacted in place) across
//! reads.
//!
//! # Example
//!
//! ```ignore
//! use autoframe::dump::HexDumper;
//! use autoframe::sniffer::AutoFrameSniffer;
//! use autoframe::transport::StreamTransport;
//! use tokio::sync::oneshot;
//!
//! let stream = tokio::net::TcpStream::connect("10.0.0.7:502").await?;
//! let transport = StreamTransport::new(stream, "10.0.0.7:502");
//! let sniffer = AutoFrameSniffer::new(transport, HexDumper::new(tokio::io::stdout()));
//!
//! let (_stop_tx, stop_rx) = oneshot::channel();
//! sniffer.run(stop_rx).await?;
//! ```

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::codec::{DelimitedCodec, FixedLengthCodec, FrameCodec, LengthFieldCodec, StxEtxCodec};
use crate::dump::FrameDumper;
use crate::error::Result;
use crate::transport::Transport;

/// Receive buffer capacity in bytes.
pub const RECV_BUFFER_SIZE: usize = 8192;

/// Direction tag attached to every sniffed record.
pub const DIRECTION_RX: &str = "RX";

/// Sniffer over a transport and a dump sink.
pub struct AutoFrameSniffer<T, D> {
    transport: T,
    dumper: D,
    codecs: Vec<Box<dyn FrameCodec>>,
    buf: Box<[u8; RECV_BUFFER_SIZE]>,
    filled: usize,
    sequence: u64,
}

impl<T: Transport, D: FrameDumper> AutoFrameSniffer<T, D> {
    /// Create a sniffer with the default codec set.
    pub fn new(transport: T, dumper: D) -> Self {
        Self::with_codecs(transport, dumper, Self::default_codecs())
    }

    /// Create a sniffer with an explicit codec set.
    pub fn with_codecs(transport: T, dumper: D, codecs: Vec<Box<dyn FrameCodec>>) -> Self {
        Self {
            transport,
            dumper,
            codecs,
            buf: Box::new([0u8; RECV_BUFFER_SIZE]),
            filled: 0,
            sequence: 0,
        }
    }

    /// The codec set tried against unknown traffic: LF-delimited lines,
    /// STX/ETX, HDLC-like 0x7E flags, a 2-byte big-endian length field,
    /// and fixed 8/16-byte frames.
    pub fn default_codecs() -> Vec<Box<dyn FrameCodec>> {
        vec![
            Box::new(DelimitedCodec::new(b'\n')),
            Box::new(StxEtxCodec),
            Box::new(DelimitedCodec::with_start(0x7E, 0x7E)),
            Box::new(
                LengthFieldCodec::with_layout(2, true, 0, None, 4096)
                    .expect("static layout is valid"),
            ),
            Box::new(FixedLengthCodec::new(8).expect("static size is valid")),
            Box::new(FixedLengthCodec::new(16).expect("static size is valid")),
        ]
    }

    /// Number of frames dumped so far.
    pub fn frames_dumped(&self) -> u64 {
        self.sequence
    }

    /// Run the receive loop until the remote closes or `shutdown` fires.
    ///
    /// Cancellation is honoured between iterations and during the suspended
    /// receive; a dump call that has started runs to completion. Dropping
    /// the shutdown sender also stops the loop.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        loop {
            let n = tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("sniffer cancelled");
                    return Ok(());
                }
                received = self.transport.receive(&mut self.buf[self.filled..]) => received?,
            };
            if n == 0 {
                tracing::debug!("remote {} closed", self.transport.remote_label());
                return Ok(());
            }
            self.filled += n;

            // Race the codecs over a copy of the filled prefix. Frames are
            // owned copies; the views die before the first suspension.
            let prefix = &self.buf[..self.filled];
            let mut best: Option<(usize, Vec<Bytes>, usize)> = None;
            for (index, codec) in self.codecs.iter_mut().enumerate() {
                let mut local: &[u8] = prefix;
                let mut frames = Vec::new();
                while let Some(frame) = codec.decode(&mut local) {
                    frames.push(frame);
                }
                let better = match &best {
                    Some((_, winning, _)) => frames.len() > winning.len(),
                    None => !frames.is_empty(),
                };
                if better {
                    best = Some((index, frames, local.len()));
                }
            }

            match best {
                None => {
                    // Nothing framed: hand the whole prefix over as one
                    // unparsed blob.
                    let blob = Bytes::copy_from_slice(&self.buf[..self.filled]);
                    self.sequence += 1;
                    self.dumper
                        .dump(
                            DIRECTION_RX,
                            self.transport.remote_label(),
                            self.sequence,
                            &blob,
                        )
                        .await?;
                    self.filled = 0;
                }
                Some((index, frames, remainder)) => {
                    tracing::debug!(
                        "{} framed {} frame(s), {} byte(s) left",
                        self.codecs[index].name(),
                        frames.len(),
                        remainder
                    );
                    for frame in &frames {
                        self.sequence += 1;
                        self.dumper
                            .dump(
                                DIRECTION_RX,
                                self.transport.remote_label(),
                                self.sequence,
                                frame,
                            )
                            .await?;
                    }

                    // Forward-safe compaction: the remainder moves from the
                    // tail to the front of the same buffer.
                    let start = self.filled - remainder;
                    self.buf.copy_within(start..self.filled, 0);
                    self.filled = remainder;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StreamTransport;
    use tokio::io::AsyncWriteExt;

    /// Dumper collecting records in memory for assertions.
    #[derive(Default)]
    struct CollectingDumper {
        records: Vec<(String, String, u64, Vec<u8>)>,
    }

    impl FrameDumper for CollectingDumper {
        async fn dump(
            &mut self,
            direction: &str,
            remote: &str,
            sequence: u64,
            frame: &[u8],
        ) -> Result<()> {
            self.records
                .push((direction.into(), remote.into(), sequence, frame.to_vec()));
            Ok(())
        }
    }

    /// Shared collection handle so tests can inspect records after the
    /// sniffer consumed the dumper.
    #[derive(Clone, Default)]
    struct SharedDumper {
        records: std::sync::Arc<std::sync::Mutex<Vec<(String, u64, Vec<u8>)>>>,
    }

    impl FrameDumper for SharedDumper {
        async fn dump(
            &mut self,
            direction: &str,
            _remote: &str,
            sequence: u64,
            frame: &[u8],
        ) -> Result<()> {
            self.records
                .lock()
                .unwrap()
                .push((direction.into(), sequence, frame.to_vec()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_line_traffic_framed() {
        let (mut tx, rx) = tokio::io::duplex(256);
        let dumper = SharedDumper::default();
        let records = dumper.records.clone();
        let sniffer =
            AutoFrameSniffer::new(StreamTransport::new(rx, "peer"), dumper);

        let (_stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(sniffer.run(stop_rx));

        tx.write_all(b"hello\nworld\n").await.unwrap();
        tx.shutdown().await.unwrap();
        drop(tx);
        task.await.unwrap().unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ("RX".to_string(), 1, b"hello\n".to_vec()));
        assert_eq!(records[1], ("RX".to_string(), 2, b"world\n".to_vec()));
    }

    #[tokio::test]
    async fn test_partial_line_compacted_across_reads() {
        let (mut tx, rx) = tokio::io::duplex(256);
        let dumper = SharedDumper::default();
        let records = dumper.records.clone();
        let sniffer = AutoFrameSniffer::with_codecs(
            StreamTransport::new(rx, "peer"),
            dumper,
            vec![Box::new(DelimitedCodec::new(b'\n'))],
        );

        let (_stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(sniffer.run(stop_rx));

        tx.write_all(b"first\nsec").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        tx.write_all(b"ond\n").await.unwrap();
        tx.shutdown().await.unwrap();
        drop(tx);
        task.await.unwrap().unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].2, b"first\n");
        assert_eq!(records[1].2, b"second\n");
    }

    #[tokio::test]
    async fn test_unparsed_blob_fallback() {
        let (mut tx, rx) = tokio::io::duplex(256);
        let dumper = SharedDumper::default();
        let records = dumper.records.clone();
        // Only a length-field codec, fed data it cannot frame in one read.
        let sniffer = AutoFrameSniffer::with_codecs(
            StreamTransport::new(rx, "peer"),
            dumper,
            vec![Box::new(FixedLengthCodec::new(64).unwrap())],
        );

        let (_stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(sniffer.run(stop_rx));

        tx.write_all(&[0xAB; 10]).await.unwrap();
        tx.shutdown().await.unwrap();
        drop(tx);
        task.await.unwrap().unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "RX");
        assert_eq!(records[0].1, 1);
        assert_eq!(records[0].2, vec![0xAB; 10]);
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_sniffer() {
        let (_tx, rx) = tokio::io::duplex(256);
        let sniffer = AutoFrameSniffer::new(
            StreamTransport::new(rx, "peer"),
            CollectingDumper::default(),
        );

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(sniffer.run(stop_rx));
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        stop_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_most_frames_wins_codec_race() {
        let (mut tx, rx) = tokio::io::duplex(256);
        let dumper = SharedDumper::default();
        let records = dumper.records.clone();
        let sniffer = AutoFrameSniffer::with_codecs(
            StreamTransport::new(rx, "peer"),
            dumper,
            vec![
                Box::new(FixedLengthCodec::new(8).unwrap()),
                Box::new(DelimitedCodec::new(b'\n')),
            ],
        );

        let (_stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(sniffer.run(stop_rx));

        // Three lines of 4 bytes beat one fixed-8 frame.
        tx.write_all(b"aa\nbb\ncc\n").await.unwrap();
        tx.shutdown().await.unwrap();
        drop(tx);
        task.await.unwrap().unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].2, b"aa\n");
        assert_eq!(records[2].2, b"cc\n");
    }
}
