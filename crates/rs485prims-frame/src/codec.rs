use bytes::{BufMut, Bytes, BytesMut};

use crate::crc::crc16;
use crate::error::{FrameError, Result};

/// Opens every frame.
pub const START_MARKER: u8 = 0xAA;

/// Closes every frame.
pub const END_MARKER: u8 = 0x55;

/// Start marker + destination + source + command + length = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Header plus checksum (2) and end marker (1).
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + 3;

/// Largest payload the length field may declare.
pub const MAX_PAYLOAD: usize = 250;

/// Largest valid frame on the wire.
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD;

/// A validated frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Address the frame is for.
    pub destination: u8,
    /// Address of the sender.
    pub source: u8,
    /// Command or response code.
    pub command: u8,
    /// Command-specific payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(destination: u8, source: u8, command: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            destination,
            source,
            command,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Encode this frame into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        encode_frame(
            self.destination,
            self.source,
            self.command,
            &self.payload,
            &mut buf,
        )?;
        Ok(buf.freeze())
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬──────┬─────┬─────┬─────┬───────────┬──────────┬───────┐
/// │ Start │ Dest │ Src │ Cmd │ Len │ Payload   │ CRC16    │ End   │
/// │ 0xAA  │ (1B) │(1B) │(1B) │(1B) │ (Len B)   │ (2B LE)  │ 0x55  │
/// └───────┴──────┴─────┴─────┴─────┴───────────┴──────────┴───────┘
/// ```
///
/// The checksum covers `Dest..=Payload`.
pub fn encode_frame(
    destination: u8,
    source: u8,
    command: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(FRAME_OVERHEAD + payload.len());
    let start = dst.len();
    dst.put_u8(START_MARKER);
    dst.put_u8(destination);
    dst.put_u8(source);
    dst.put_u8(command);
    dst.put_u8(payload.len() as u8);
    dst.put_slice(payload);
    let crc = crc16(&dst[start + 1..]);
    dst.put_u16_le(crc);
    dst.put_u8(END_MARKER);
    Ok(())
}

/// Decode exactly one frame from `src`.
///
/// `src` must hold the whole frame and nothing else. Marker, length and
/// checksum are all verified; a frame that fails any check is rejected.
pub fn decode_frame(src: &[u8]) -> Result<Frame> {
    if src.len() < FRAME_OVERHEAD {
        return Err(FrameError::LengthMismatch {
            declared: src.get(4).copied().unwrap_or(0) as usize,
            actual: src.len(),
        });
    }

    if src[0] != START_MARKER {
        return Err(FrameError::Framing);
    }

    let declared = src[4] as usize;
    let total = FRAME_OVERHEAD + declared;
    if declared > MAX_PAYLOAD || src.len() != total {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: src.len(),
        });
    }

    if src[total - 1] != END_MARKER {
        return Err(FrameError::Framing);
    }

    let body_end = HEADER_SIZE + declared;
    let received = u16::from_le_bytes([src[body_end], src[body_end + 1]]);
    let computed = crc16(&src[1..body_end]);
    if received != computed {
        return Err(FrameError::Checksum {
            expected: computed,
            actual: received,
        });
    }

    Ok(Frame {
        destination: src[1],
        source: src[2],
        command: src[3],
        payload: Bytes::copy_from_slice(&src[HEADER_SIZE..body_end]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(destination: u8, source: u8, command: u8, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(destination, source, command, payload, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_ping_wire_bytes() {
        let buf = encode(0x03, 0x10, 0x01, b"");
        assert_eq!(
            buf.as_ref(),
            &[0xAA, 0x03, 0x10, 0x01, 0x00, 0x00, 0x35, 0x55]
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let payload = b"hello, bus!";
        let buf = encode(0x01, 0x10, 0x20, payload);
        assert_eq!(buf.len(), FRAME_OVERHEAD + payload.len());

        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame, Frame::new(0x01, 0x10, 0x20, payload.to_vec()));
    }

    #[test]
    fn test_roundtrip_every_payload_length() {
        for len in 0..=MAX_PAYLOAD {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7 + len) as u8).collect();
            let frame = Frame::new(0x02, 0x10, 0x46, payload);
            let bytes = frame.to_bytes().unwrap();
            assert_eq!(bytes.len(), frame.wire_size());
            assert_eq!(decode_frame(&bytes).unwrap(), frame);
        }
    }

    #[test]
    fn test_payload_too_large() {
        let mut buf = BytesMut::new();
        let err = encode_frame(1, 0x10, 1, &[0u8; MAX_PAYLOAD + 1], &mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge {
                size: 251,
                max: 250,
            }
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_too_short() {
        let err = decode_frame(&[0xAA, 0x01, 0x10, 0x01, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, FrameError::LengthMismatch { .. }));
    }

    #[test]
    fn test_decode_bad_markers() {
        let mut buf = encode(0x01, 0x10, 0x01, b"x");
        buf[0] = 0xAB;
        assert!(matches!(decode_frame(&buf), Err(FrameError::Framing)));

        let mut buf = encode(0x01, 0x10, 0x01, b"x");
        let last = buf.len() - 1;
        buf[last] = 0x54;
        assert!(matches!(decode_frame(&buf), Err(FrameError::Framing)));
    }

    #[test]
    fn test_decode_declared_length_exceeds_slice() {
        let mut buf = encode(0x01, 0x10, 0x01, b"abc");
        buf[4] = 10;
        assert!(matches!(
            decode_frame(&buf),
            Err(FrameError::LengthMismatch {
                declared: 10,
                actual: 11
            })
        ));
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut buf = encode(0x01, 0x10, 0x11, b"status");
        buf[6] ^= 0x01;
        assert!(matches!(
            decode_frame(&buf),
            Err(FrameError::Checksum { .. })
        ));
    }

    #[test]
    fn test_single_bit_flips_never_decode() {
        let payload = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80];
        let original = encode(0x03, 0x10, 0x30, &payload);
        // Flip every bit between the markers: header, payload and checksum.
        for byte in 1..original.len() - 1 {
            for bit in 0..8 {
                let mut corrupted = original.clone();
                corrupted[byte] ^= 1 << bit;
                match decode_frame(&corrupted) {
                    Err(FrameError::Checksum { .. }) | Err(FrameError::LengthMismatch { .. }) => {}
                    other => panic!("byte {byte} bit {bit}: unexpected {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(1, 0x10, 1, Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), FRAME_OVERHEAD + 4);
        assert_eq!(MAX_FRAME_SIZE, 258);
    }
}
