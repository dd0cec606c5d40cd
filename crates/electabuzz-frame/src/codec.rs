use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::message::MessageType;

/// Packet header: version (2) + transaction id (2) + type (2) + length (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// The only protocol version currently defined.
pub const VERSION: u16 = 0;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// A decoded protocol packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Protocol version from the header. Only [`VERSION`] is valid.
    pub version: u16,
    /// Transaction id correlating request and response.
    pub transaction_id: u16,
    /// The message type.
    pub message_type: MessageType,
    /// Payload length as declared in the header.
    pub payload_length: u16,
    /// The MessagePack payload.
    pub payload: Bytes,
}

/// Encode a version-0 packet into the wire format.
///
/// Wire format (all fields big-endian):
/// ```text
/// ┌─────────────┬──────────────┬────────────┬────────────┬──────────────┐
/// │ Version (2) │ Trans. ID(2) │ Type (2)   │ Length (2) │ Payload      │
/// │ 0x0000      │              │            │            │ (MessagePack)│
/// └─────────────┴──────────────┴────────────┴────────────┴──────────────┘
/// ```
pub fn encode_packet(
    transaction_id: u16,
    message_type: MessageType,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let length = checked_length(payload.len())?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u16(VERSION);
    dst.put_u16(transaction_id);
    dst.put_u16(message_type.code());
    dst.put_u16(length);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one datagram into a packet.
///
/// The version field is returned as received; rejecting foreign versions is
/// up to the caller. A declared payload length that differs from the number
/// of bytes following the header is rejected.
pub fn decode_packet(datagram: &[u8]) -> Result<Packet> {
    if datagram.len() < HEADER_SIZE {
        return Err(FrameError::Truncated {
            len: datagram.len(),
        });
    }

    let mut header = &datagram[..HEADER_SIZE];
    let version = header.get_u16();
    let transaction_id = header.get_u16();
    let raw_type = header.get_u16();
    let payload_length = header.get_u16();

    let payload = &datagram[HEADER_SIZE..];
    if payload.len() != usize::from(payload_length) {
        trace!(
            declared = payload_length,
            actual = payload.len(),
            "payload length mismatch"
        );
        return Err(FrameError::LengthMismatch {
            declared: payload_length,
            actual: payload.len(),
        });
    }

    let message_type = MessageType::try_from(raw_type)?;

    Ok(Packet {
        version,
        transaction_id,
        message_type,
        payload_length,
        payload: Bytes::copy_from_slice(payload),
    })
}

fn checked_length(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| FrameError::PayloadTooLarge {
        size: len,
        max: MAX_PAYLOAD,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(transaction_id: u16, ty: MessageType, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_packet(transaction_id, ty, payload, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let payload = b"\x01\x02\x03";
        let buf = encoded(7, MessageType::ReadDataReq, payload);

        assert_eq!(buf.len(), HEADER_SIZE + payload.len());

        let packet = decode_packet(&buf).unwrap();
        assert_eq!(packet.version, VERSION);
        assert_eq!(packet.transaction_id, 7);
        assert_eq!(packet.message_type, MessageType::ReadDataReq);
        assert_eq!(usize::from(packet.payload_length), payload.len());
        assert_eq!(packet.payload.as_ref(), payload);
    }

    #[test]
    fn test_header_layout_is_big_endian() {
        let buf = encoded(0x0102, MessageType::WriteDataReq, &[0xAA, 0xBB]);
        assert_eq!(
            buf.as_ref(),
            &[0x00, 0x00, 0x01, 0x02, 0x10, 0x02, 0x00, 0x02, 0xAA, 0xBB]
        );
    }

    #[test]
    fn test_empty_payload() {
        let buf = encoded(1, MessageType::ClientsReq, b"");
        assert_eq!(buf.len(), HEADER_SIZE);

        let packet = decode_packet(&buf).unwrap();
        assert_eq!(packet.message_type, MessageType::ClientsReq);
        assert_eq!(packet.payload_length, 0);
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn test_decode_short_header() {
        let err = decode_packet(&[0x00, 0x00, 0x00]).unwrap_err();
        assert_eq!(err, FrameError::Truncated { len: 3 });
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut buf = encoded(1, MessageType::ReadDataRsp, b"abcd");
        buf.truncate(HEADER_SIZE + 2);

        let err = decode_packet(&buf).unwrap_err();
        assert_eq!(
            err,
            FrameError::LengthMismatch {
                declared: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        let buf = [0x00, 0x00, 0x00, 0x01, 0x30, 0x00, 0x00, 0x00];
        let err = decode_packet(&buf).unwrap_err();
        assert_eq!(err, FrameError::UnknownMessageType(0x3000));
    }

    #[test]
    fn test_decode_keeps_foreign_version() {
        let mut buf = encoded(1, MessageType::PingRsp, b"");
        buf[1] = 0x01;

        let packet = decode_packet(&buf).unwrap();
        assert_eq!(packet.version, 1);
    }

    #[test]
    fn test_payload_too_large() {
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        let mut buf = BytesMut::new();
        let err = encode_packet(1, MessageType::WriteDataReq, &payload, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(buf.is_empty());
    }
}
