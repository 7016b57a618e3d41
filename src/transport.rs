//! Transport contract consumed by the sniffer.
//!
//! The sniffer needs only two things from an endpoint: an asynchronous
//! receive into a caller-supplied buffer and a label identifying the
//! remote. [`StreamTransport`] adapts any [`AsyncRead`] source - TCP or
//! unix sockets, serial ports, in-memory duplex pipes - to the contract.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// A duplex octet endpoint, seen from the receive side.
pub trait Transport: Send {
    /// Label identifying the remote endpoint (address, port path, ...).
    fn remote_label(&self) -> &str;

    /// Read available bytes into `buf`, suspending until at least one byte
    /// arrives. Returns 0 when the remote has closed.
    fn receive(&mut self, buf: &mut [u8]) -> impl std::future::Future<Output = io::Result<usize>> + Send;
}

/// Adapter exposing any async byte source as a [`Transport`].
#[derive(Debug)]
pub struct StreamTransport<R> {
    reader: R,
    label: String,
}

impl<R> StreamTransport<R> {
    /// Wrap a reader with a remote label.
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
        }
    }

    /// Consume the adapter and return the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead + Unpin + Send> Transport for StreamTransport<R> {
    fn remote_label(&self) -> &str {
        &self.label
    }

    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_stream_transport_receives() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(rx, "test-peer");
        assert_eq!(transport.remote_label(), "test-peer");

        tx.write_all(b"abc").await.unwrap();

        let mut buf = [0u8; 16];
        let n = transport.receive(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"abc");
    }

    #[tokio::test]
    async fn test_stream_transport_reports_close() {
        let (tx, rx) = tokio::io::duplex(64);
        drop(tx);
        let mut transport = StreamTransport::new(rx, "gone");

        let mut buf = [0u8; 16];
        assert_eq!(transport.receive(&mut buf).await.unwrap(), 0);
    }
}
