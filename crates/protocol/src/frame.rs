//! Length-prefixed framing: a 4-byte little-endian length followed by that many
//! payload bytes.

use std::io::{self, Read, Write};

use crate::error::ProtocolError;

/// Reads one frame: a 4-byte little-endian length, then that many payload bytes.
///
/// A short read of either part means the peer closed the connection or the
/// link failed; both map to [`ProtocolError::TransportLost`].
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_bytes = [0u8; 4];
    read_exact_or_lost(reader, &mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    let mut payload = vec![0u8; len];
    read_exact_or_lost(reader, &mut payload)?;
    Ok(payload)
}

/// Writes one frame: the 4-byte little-endian length of `payload`, then `payload`.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::Framing("payload too large to frame".to_string()))?;
    writer
        .write_all(&len.to_le_bytes())
        .map_err(ProtocolError::TransportLost)?;
    writer.write_all(payload).map_err(ProtocolError::TransportLost)?;
    Ok(())
}

fn read_exact_or_lost<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), ProtocolError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(ProtocolError::TransportLost(io::Error::from(io::ErrorKind::UnexpectedEof)))
        }
        Err(e) => Err(ProtocolError::TransportLost(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello").unwrap();

        let mut cursor = Cursor::new(buf);
        let payload = read_frame(&mut cursor).unwrap();
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn empty_payload_round_trips() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"").unwrap();

        let mut cursor = Cursor::new(buf);
        let payload = read_frame(&mut cursor).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn short_length_read_is_transport_lost() {
        let mut cursor = Cursor::new(vec![0u8, 1]);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::TransportLost(_)));
    }

    #[test]
    fn short_body_read_is_transport_lost() {
        let mut buf = 5u32.to_le_bytes().to_vec();
        buf.extend_from_slice(b"ab"); // claims 5 bytes, only 2 follow
        let mut cursor = Cursor::new(buf);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::TransportLost(_)));
    }
}
