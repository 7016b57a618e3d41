//! Newline-terminated framing (LF, CR, or CRLF).

use bytes::Bytes;

use super::FrameCodec;
use crate::error::Result;

/// Codec for line-oriented streams.
///
/// The terminator is the first LF or CR in the view; the frame excludes it.
/// A CR immediately followed by LF is consumed as a single terminator.
/// Encode appends a single LF.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewlineCodec;

impl FrameCodec for NewlineCodec {
    fn name(&self) -> &'static str {
        "newline"
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(payload.len() + 1);
        out.extend_from_slice(payload);
        out.push(b'\n');
        Ok(out)
    }

    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes> {
        let buf = *view;
        let idx = buf.iter().position(|&b| b == b'\n' || b == b'\r')?;

        let mut consumed = idx + 1;
        if buf[idx] == b'\r' && buf.get(idx + 1) == Some(&b'\n') {
            consumed += 1;
        }

        let frame = Bytes::copy_from_slice(&buf[..idx]);
        *view = &buf[consumed..];
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_appends_lf() {
        let codec = NewlineCodec;
        assert_eq!(codec.encode(b"AB").unwrap(), b"AB\n");
        assert_eq!(codec.encode(b"").unwrap(), b"\n");
    }

    #[test]
    fn test_decode_lf() {
        let mut codec = NewlineCodec;
        let mut view: &[u8] = b"hello\nrest";
        let frame = codec.decode(&mut view).unwrap();
        assert_eq!(&frame[..], b"hello");
        assert_eq!(view, b"rest");
    }

    #[test]
    fn test_decode_cr_only() {
        let mut codec = NewlineCodec;
        let mut view: &[u8] = b"hello\rX";
        let frame = codec.decode(&mut view).unwrap();
        assert_eq!(&frame[..], b"hello");
        assert_eq!(view, b"X");
    }

    #[test]
    fn test_decode_crlf_consumes_two_bytes() {
        let mut codec = NewlineCodec;
        let mut view: &[u8] = b"AB\r\nCD\n";
        let first = codec.decode(&mut view).unwrap();
        assert_eq!(&first[..], b"AB");
        let second = codec.decode(&mut view).unwrap();
        assert_eq!(&second[..], b"CD");
        assert!(view.is_empty());
    }

    #[test]
    fn test_decode_no_terminator_leaves_view() {
        let mut codec = NewlineCodec;
        let mut view: &[u8] = b"incomplete";
        assert!(codec.decode(&mut view).is_none());
        assert_eq!(view, b"incomplete");
    }

    #[test]
    fn test_decode_empty_line() {
        let mut codec = NewlineCodec;
        let mut view: &[u8] = b"\nnext";
        let frame = codec.decode(&mut view).unwrap();
        assert!(frame.is_empty());
        assert_eq!(view, b"next");
    }

    #[test]
    fn test_roundtrip() {
        let mut codec = NewlineCodec;
        let wire = codec.encode(b"payload").unwrap();
        let mut view: &[u8] = &wire;
        let frame = codec.decode(&mut view).unwrap();
        assert_eq!(&frame[..], b"payload");
        assert!(view.is_empty());
    }
}
