//! Modbus RTU framing with CRC-16 validation and resync scanning.
//!
//! RTU frames have no explicit length field; the total frame length is
//! inferred from the function code (and, for variable-size PDUs, a byte
//! count inside the frame), then confirmed with the trailing CRC-16/MODBUS.
//!
//! Wire layout: `address(1) function(1) data(n) crc_lo(1) crc_hi(1)`.
//!
//! The decoder scans forward over a bounded window of start offsets so a
//! frame can be recovered after line noise. It never discards bytes
//! speculatively at offset 0 when it merely lacks data; a byte is skipped
//! only once it has been positively ruled out as a frame start.

use bytes::Bytes;

use super::FrameCodec;
use crate::error::{FrameError, Result};

/// Default upper bound on a Modbus RTU frame (per the RTU ADU limit of 256,
/// with headroom).
pub const DEFAULT_MAX_FRAME: usize = 260;

/// Default bound on the number of start offsets tried per decode call.
pub const DEFAULT_SCAN_LIMIT: usize = 64;

/// Highest valid unicast slave address.
const MAX_UNICAST_ADDRESS: u8 = 247;

/// Smallest span worth inspecting: address, function, and a 2-byte CRC.
const MIN_SPAN: usize = 4;

/// Compute CRC-16/MODBUS (reflected, polynomial 0xA001, init 0xFFFF).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Configuration for [`ModbusRtuCodec`].
#[derive(Debug, Clone, Copy)]
pub struct ModbusRtuConfig {
    /// Reject candidate lengths above this bound.
    pub max_frame_bytes: usize,
    /// Maximum number of start offsets tried per decode call.
    pub scan_limit_bytes: usize,
    /// Verify the trailing CRC before accepting a frame.
    pub validate_crc: bool,
    /// Accept address 0 (broadcast) as a plausible frame start.
    pub allow_broadcast_address: bool,
}

impl Default for ModbusRtuConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME,
            scan_limit_bytes: DEFAULT_SCAN_LIMIT,
            validate_crc: true,
            allow_broadcast_address: true,
        }
    }
}

/// Codec for Modbus RTU frames.
///
/// # Example
///
/// ```
/// use autoframe::codec::{FrameCodec, ModbusRtuCodec};
///
/// let mut codec = ModbusRtuCodec::new();
/// // Read-holding-registers request: slave 1, start 0, count 10.
/// let wire = codec.encode(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A]).unwrap();
/// assert_eq!(&wire[6..], &[0xC5, 0xCD]);
///
/// let mut view: &[u8] = &wire;
/// let frame = codec.decode(&mut view).unwrap();
/// assert_eq!(&frame[..], &wire[..]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ModbusRtuCodec {
    config: ModbusRtuConfig,
}

impl ModbusRtuCodec {
    /// Create a codec with default limits and CRC validation enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: ModbusRtuConfig) -> Self {
        Self { config }
    }

    /// Plausible first byte of a frame: broadcast (when allowed) or a
    /// unicast slave address.
    fn address_plausible(&self, addr: u8) -> bool {
        if addr == 0 {
            return self.config.allow_broadcast_address;
        }
        addr <= MAX_UNICAST_ADDRESS
    }

    /// Enumerate candidate TOTAL frame lengths for the span starting at an
    /// anchor, derived from the function code. Fills a stack array; returns
    /// the count. Unknown function codes yield no candidates - the codec
    /// does not guess.
    fn candidate_lengths(span: &[u8], out: &mut [usize; 8]) -> usize {
        fn push(out: &mut [usize; 8], n: &mut usize, len: usize) {
            if *n < out.len() {
                out[*n] = len;
                *n += 1;
            }
        }

        let mut n = 0;
        let function = span[1];
        if function & 0x80 != 0 {
            // Exception response: addr, func, code, crc.
            push(out, &mut n, 5);
            return n;
        }

        match function {
            1 | 2 | 3 | 4 => {
                // Request is always 8; response length comes from the byte count.
                push(out, &mut n, 8);
                if span.len() >= 3 {
                    push(out, &mut n, span[2] as usize + 5);
                }
            }
            5 | 6 => push(out, &mut n, 8),
            15 | 16 => {
                // Response echo is 8; request length from the byte count at 6.
                push(out, &mut n, 8);
                if span.len() >= 7 {
                    push(out, &mut n, span[6] as usize + 9);
                }
            }
            22 => push(out, &mut n, 10),
            23 => {
                if span.len() >= 3 {
                    push(out, &mut n, span[2] as usize + 5);
                }
                if span.len() >= 11 {
                    push(out, &mut n, span[10] as usize + 13);
                }
            }
            _ => {}
        }
        n
    }

    fn crc_matches(frame: &[u8]) -> bool {
        let data_len = frame.len() - 2;
        let wire = u16::from_le_bytes([frame[data_len], frame[data_len + 1]]);
        crc16(&frame[..data_len]) == wire
    }
}

impl FrameCodec for ModbusRtuCodec {
    fn name(&self) -> &'static str {
        "modbus-rtu"
    }

    /// Append the CRC-16/MODBUS trailer (low byte first) to the payload.
    ///
    /// The payload must already contain at least the address and function
    /// bytes.
    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() < 2 {
            return Err(FrameError::InvalidArgument(
                "modbus payload needs at least address and function bytes".to_string(),
            ));
        }
        let mut out = Vec::with_capacity(payload.len() + 2);
        out.extend_from_slice(payload);
        out.extend_from_slice(&crc16(payload).to_le_bytes());
        Ok(out)
    }

    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes> {
        let buf = *view;
        let scan_limit = self
            .config
            .scan_limit_bytes
            .min(buf.len().saturating_sub(3));

        let mut s = 0;
        while s <= scan_limit {
            let span = &buf[s..];
            if span.len() < MIN_SPAN {
                break;
            }

            if self.address_plausible(span[0]) {
                let mut candidates = [0usize; 8];
                let count = Self::candidate_lengths(span, &mut candidates);

                let mut incomplete_possible = false;
                for &len in &candidates[..count] {
                    if len == 0 || len > self.config.max_frame_bytes {
                        continue;
                    }
                    if span.len() < len {
                        incomplete_possible = true;
                        continue;
                    }
                    if self.config.validate_crc && !Self::crc_matches(&span[..len]) {
                        continue;
                    }

                    let frame = Bytes::copy_from_slice(&span[..len]);
                    *view = &buf[s + len..];
                    return Some(frame);
                }

                // A plausible header at the current anchor may simply be
                // short on bytes; dropping it would destroy a frame in
                // transit.
                if incomplete_possible && s == 0 {
                    return None;
                }
            }

            s += 1;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wire frame for `01 03 00 00 00 0A` per the CRC reference vector.
    const READ_REQUEST: [u8; 8] = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];

    #[test]
    fn test_crc16_reference_vector() {
        assert_eq!(crc16(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A]), 0xCDC5);
    }

    #[test]
    fn test_encode_appends_crc_little_endian() {
        let codec = ModbusRtuCodec::new();
        let wire = codec.encode(&READ_REQUEST[..6]).unwrap();
        assert_eq!(wire, READ_REQUEST);
    }

    #[test]
    fn test_encode_short_payload_rejected() {
        let codec = ModbusRtuCodec::new();
        assert!(matches!(
            codec.encode(&[0x01]),
            Err(FrameError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_decode_clean_request() {
        let mut codec = ModbusRtuCodec::new();
        let mut view: &[u8] = &READ_REQUEST;
        let frame = codec.decode(&mut view).unwrap();
        assert_eq!(&frame[..], &READ_REQUEST);
        assert!(view.is_empty());
    }

    #[test]
    fn test_decode_resyncs_past_garbage() {
        let mut codec = ModbusRtuCodec::new();
        let mut wire = vec![0xFF, 0xFF];
        wire.extend_from_slice(&READ_REQUEST);
        let mut view: &[u8] = &wire;
        let frame = codec.decode(&mut view).unwrap();
        assert_eq!(&frame[..], &READ_REQUEST);
        assert!(view.is_empty());
    }

    #[test]
    fn test_decode_response_by_byte_count() {
        let mut codec = ModbusRtuCodec::new();
        // Response: addr 1, func 3, byte count 4, four data bytes, CRC.
        let wire = codec
            .encode(&[0x01, 0x03, 0x04, 0x11, 0x22, 0x33, 0x44])
            .unwrap();
        assert_eq!(wire.len(), 9);
        let mut view: &[u8] = &wire;
        let frame = codec.decode(&mut view).unwrap();
        assert_eq!(frame.len(), 9);
        assert!(view.is_empty());
    }

    #[test]
    fn test_decode_exception_response() {
        let mut codec = ModbusRtuCodec::new();
        let wire = codec.encode(&[0x11, 0x83, 0x02]).unwrap();
        assert_eq!(wire.len(), 5);
        let mut view: &[u8] = &wire;
        let frame = codec.decode(&mut view).unwrap();
        assert_eq!(frame.len(), 5);
    }

    #[test]
    fn test_decode_write_multiple_request() {
        let mut codec = ModbusRtuCodec::new();
        // FC16 request: addr, func, start(2), qty(2), byte count 4, data(4).
        let wire = codec
            .encode(&[0x01, 0x10, 0x00, 0x00, 0x00, 0x02, 0x04, 0xAA, 0xBB, 0xCC, 0xDD])
            .unwrap();
        assert_eq!(wire.len(), 13);
        let mut view: &[u8] = &wire;
        let frame = codec.decode(&mut view).unwrap();
        assert_eq!(frame.len(), 13);
        assert!(view.is_empty());
    }

    #[test]
    fn test_incomplete_at_anchor_waits() {
        let mut codec = ModbusRtuCodec::new();
        // Plausible header, but only 6 of 8 bytes present.
        let mut view: &[u8] = &READ_REQUEST[..6];
        assert!(codec.decode(&mut view).is_none());
        assert_eq!(view.len(), 6);
    }

    #[test]
    fn test_crc_mismatch_rejected() {
        let mut codec = ModbusRtuCodec::new();
        let mut corrupted = READ_REQUEST;
        corrupted[7] ^= 0xFF;
        let mut view: &[u8] = &corrupted;
        assert!(codec.decode(&mut view).is_none());
        assert_eq!(view.len(), 8);
    }

    #[test]
    fn test_crc_validation_can_be_disabled() {
        let mut codec = ModbusRtuCodec::with_config(ModbusRtuConfig {
            validate_crc: false,
            ..ModbusRtuConfig::default()
        });
        let mut corrupted = READ_REQUEST;
        corrupted[7] ^= 0xFF;
        let mut view: &[u8] = &corrupted;
        assert!(codec.decode(&mut view).is_some());
    }

    #[test]
    fn test_broadcast_address_configurable() {
        let broadcast = crc16(&[0x00, 0x06, 0x00, 0x01, 0x00, 0x02]);
        let mut wire = vec![0x00, 0x06, 0x00, 0x01, 0x00, 0x02];
        wire.extend_from_slice(&broadcast.to_le_bytes());

        let mut codec = ModbusRtuCodec::new();
        let mut view: &[u8] = &wire;
        assert!(codec.decode(&mut view).is_some());

        let mut strict = ModbusRtuCodec::with_config(ModbusRtuConfig {
            allow_broadcast_address: false,
            ..ModbusRtuConfig::default()
        });
        let mut view: &[u8] = &wire;
        assert!(strict.decode(&mut view).is_none());
        assert_eq!(view.len(), wire.len());
    }

    #[test]
    fn test_implausible_address_not_consumed_without_hit() {
        let mut codec = ModbusRtuCodec::new();
        // 0xF8 (248) is above the unicast range and no frame follows.
        let mut view: &[u8] = &[0xF8, 0x03, 0x00, 0x00, 0x00];
        assert!(codec.decode(&mut view).is_none());
        assert_eq!(view.len(), 5);
    }

    #[test]
    fn test_unknown_function_code_no_guess() {
        let mut codec = ModbusRtuCodec::new();
        // Function 0x2A has no known shape; scan finds nothing.
        let mut view: &[u8] = &[0x01, 0x2A, 0x00, 0x00, 0x00, 0x00];
        assert!(codec.decode(&mut view).is_none());
        assert_eq!(view.len(), 6);
    }

    #[test]
    fn test_garbage_prefix_up_to_scan_limit() {
        let mut codec = ModbusRtuCodec::new();
        let mut wire = vec![0xFE; DEFAULT_SCAN_LIMIT];
        wire.extend_from_slice(&READ_REQUEST);
        let mut view: &[u8] = &wire;
        let frame = codec.decode(&mut view).unwrap();
        assert_eq!(&frame[..], &READ_REQUEST);
        assert!(view.is_empty());
    }

    #[test]
    fn test_masked_write_register() {
        let mut codec = ModbusRtuCodec::new();
        // FC22: addr, func, ref(2), and_mask(2), or_mask(2) = 8 + CRC.
        let wire = codec
            .encode(&[0x01, 0x16, 0x00, 0x04, 0x00, 0xF2, 0x00, 0x25])
            .unwrap();
        assert_eq!(wire.len(), 10);
        let mut view: &[u8] = &wire;
        assert!(codec.decode(&mut view).is_some());
        assert!(view.is_empty());
    }
}
