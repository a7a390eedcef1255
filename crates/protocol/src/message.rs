//! Request/response payload encoding: tags, separators, and the decimal-ASCII
//! numeric fields described by the wire protocol.

use std::io::{Read, Write};

use access::{Fd, Permission, SharingMode};

use crate::error::ProtocolError;
use crate::frame::{read_frame, write_frame};

const SEP: u8 = b',';
const TAG_OPEN: u8 = b'O';
const TAG_CLOSE: u8 = b'C';
const TAG_READ: u8 = b'R';
const TAG_WRITE: u8 = b'W';
const STATUS_OK: u8 = b'S';
const STATUS_ERR: u8 = b'F';

const MODE_READ_ONLY: u8 = b'R';
const MODE_WRITE_ONLY: u8 = b'W';
const MODE_READ_WRITE: u8 = b'B';

const SHARE_UNRESTRICTED: u8 = b'0';
const SHARE_EXCLUSIVE: u8 = b'1';
const SHARE_TRANSACTION: u8 = b'2';

/// Default TCP port the daemon listens on, matching the reference implementation.
pub const DEFAULT_PORT: u16 = 20000;

/// A parsed client → server request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Open `path` under the given permission.
    Open {
        /// The path to open, relative to or on the server's filesystem.
        path: String,
        /// The permission requested for this handle.
        permission: Permission,
    },
    /// Close a previously opened descriptor.
    Close {
        /// The descriptor to close.
        fd: Fd,
    },
    /// Read the entire contents of a previously opened descriptor.
    Read {
        /// The descriptor to read.
        fd: Fd,
    },
    /// Write `data` from the start of a previously opened descriptor.
    Write {
        /// The descriptor to write to.
        fd: Fd,
        /// The bytes to write.
        data: Vec<u8>,
    },
}

/// A parsed server → client response, before the caller maps the success
/// payload onto a request-specific return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireResponse {
    /// `S,<data>` — the kind-specific payload is request-dependent and is
    /// interpreted by the caller (fd, byte count, file contents, or empty).
    Success(Vec<u8>),
    /// `F,<code>` — a decimal local-errno-compatible or synthetic error code.
    Failure(i32),
}

fn permission_to_mode_char(permission: Permission) -> u8 {
    match permission {
        Permission::ReadOnly => MODE_READ_ONLY,
        Permission::WriteOnly => MODE_WRITE_ONLY,
        Permission::ReadWrite => MODE_READ_WRITE,
    }
}

fn mode_char_to_permission(byte: u8) -> Result<Permission, ProtocolError> {
    match byte {
        MODE_READ_ONLY => Ok(Permission::ReadOnly),
        MODE_WRITE_ONLY => Ok(Permission::WriteOnly),
        MODE_READ_WRITE => Ok(Permission::ReadWrite),
        other => Err(ProtocolError::Framing(format!("unknown open mode byte {other:#04x}"))),
    }
}

fn sharing_mode_to_byte(mode: SharingMode) -> u8 {
    match mode {
        SharingMode::Unrestricted => SHARE_UNRESTRICTED,
        SharingMode::Exclusive => SHARE_EXCLUSIVE,
        SharingMode::Transaction => SHARE_TRANSACTION,
    }
}

fn byte_to_sharing_mode(byte: u8) -> Result<SharingMode, ProtocolError> {
    match byte {
        SHARE_UNRESTRICTED => Ok(SharingMode::Unrestricted),
        SHARE_EXCLUSIVE => Ok(SharingMode::Exclusive),
        SHARE_TRANSACTION => Ok(SharingMode::Transaction),
        other => Err(ProtocolError::InvalidSharingMode(other)),
    }
}

fn parse_decimal_i64(bytes: &[u8]) -> Result<i64, ProtocolError> {
    std::str::from_utf8(bytes)
        .map_err(|_| ProtocolError::Framing("numeric field was not valid UTF-8".to_string()))?
        .parse::<i64>()
        .map_err(|_| ProtocolError::Framing("numeric field was not a decimal integer".to_string()))
}

/// Sends the handshake frame declaring this connection's [`SharingMode`].
pub fn write_handshake<W: Write>(writer: &mut W, mode: SharingMode) -> Result<(), ProtocolError> {
    write_frame(writer, &[sharing_mode_to_byte(mode)])
}

/// Reads and parses the handshake frame sent immediately after connecting.
pub fn read_handshake<R: Read>(reader: &mut R) -> Result<SharingMode, ProtocolError> {
    let payload = read_frame(reader)?;
    if payload.len() != 1 {
        return Err(ProtocolError::Framing(
            "handshake frame must carry exactly one byte".to_string(),
        ));
    }
    byte_to_sharing_mode(payload[0])
}

/// Writes `request` as one or more frames (two, for [`Request::Write`]).
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<(), ProtocolError> {
    match request {
        Request::Open { path, permission } => {
            let mut payload = vec![TAG_OPEN, SEP];
            payload.extend_from_slice(path.as_bytes());
            payload.push(SEP);
            payload.push(permission_to_mode_char(*permission));
            write_frame(writer, &payload)
        }
        Request::Close { fd } => {
            let mut payload = vec![TAG_CLOSE, SEP];
            payload.extend_from_slice(fd.to_string().as_bytes());
            write_frame(writer, &payload)
        }
        Request::Read { fd } => {
            let mut payload = vec![TAG_READ, SEP];
            payload.extend_from_slice(fd.to_string().as_bytes());
            write_frame(writer, &payload)
        }
        Request::Write { fd, data } => {
            let mut fd_payload = vec![TAG_WRITE, SEP];
            fd_payload.extend_from_slice(fd.to_string().as_bytes());
            write_frame(writer, &fd_payload)?;

            let mut data_payload = vec![TAG_WRITE, SEP];
            data_payload.extend_from_slice(data);
            write_frame(writer, &data_payload)
        }
    }
}

/// Reads one client request, performing the second frame read that
/// [`Request::Write`] requires.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request, ProtocolError> {
    let payload = read_frame(reader)?;
    if payload.len() < 2 || payload[1] != SEP {
        return Err(ProtocolError::Framing("request frame missing tag separator".to_string()));
    }
    let tag = payload[0];
    let body = &payload[2..];

    match tag {
        TAG_OPEN => {
            let sep_idx = body
                .iter()
                .rposition(|&b| b == SEP)
                .ok_or_else(|| ProtocolError::Framing("open request missing mode separator".to_string()))?;
            let path = std::str::from_utf8(&body[..sep_idx])
                .map_err(|_| ProtocolError::Framing("open path was not valid UTF-8".to_string()))?
                .to_string();
            let mode_bytes = &body[sep_idx + 1..];
            if mode_bytes.len() != 1 {
                return Err(ProtocolError::Framing("open mode field must be one byte".to_string()));
            }
            let permission = mode_char_to_permission(mode_bytes[0])?;
            Ok(Request::Open { path, permission })
        }
        TAG_CLOSE => Ok(Request::Close { fd: parse_decimal_i64(body)? }),
        TAG_READ => Ok(Request::Read { fd: parse_decimal_i64(body)? }),
        TAG_WRITE => {
            let fd = parse_decimal_i64(body)?;
            let data_payload = read_frame(reader)?;
            if data_payload.len() < 2 || data_payload[0] != TAG_WRITE || data_payload[1] != SEP {
                return Err(ProtocolError::Framing(
                    "write request's second frame missing tag separator".to_string(),
                ));
            }
            Ok(Request::Write {
                fd,
                data: data_payload[2..].to_vec(),
            })
        }
        other => Err(ProtocolError::Framing(format!("unknown request tag {other:#04x}"))),
    }
}

/// Writes a `S,<data>` response frame.
pub fn write_success<W: Write>(writer: &mut W, data: &[u8]) -> Result<(), ProtocolError> {
    let mut payload = vec![STATUS_OK, SEP];
    payload.extend_from_slice(data);
    write_frame(writer, &payload)
}

/// Writes a `F,<code>` response frame.
pub fn write_failure<W: Write>(writer: &mut W, code: i32) -> Result<(), ProtocolError> {
    let mut payload = vec![STATUS_ERR, SEP];
    payload.extend_from_slice(code.to_string().as_bytes());
    write_frame(writer, &payload)
}

/// Reads one response frame and classifies it as success or failure, without
/// interpreting the success payload (that is request-kind-specific).
pub fn read_wire_response<R: Read>(reader: &mut R) -> Result<WireResponse, ProtocolError> {
    let payload = read_frame(reader)?;
    if payload.len() < 2 || payload[1] != SEP {
        return Err(ProtocolError::Framing("response frame missing status separator".to_string()));
    }
    let data = &payload[2..];
    match payload[0] {
        STATUS_OK => Ok(WireResponse::Success(data.to_vec())),
        STATUS_ERR => {
            let code = parse_decimal_i64(data)?;
            let code = i32::try_from(code)
                .map_err(|_| ProtocolError::Framing("error code out of range".to_string()))?;
            Ok(WireResponse::Failure(code))
        }
        other => Err(ProtocolError::Framing(format!("unknown response status {other:#04x}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn open_request_round_trips() {
        let req = Request::Open {
            path: "some/path.txt".to_string(),
            permission: Permission::ReadWrite,
        };
        let mut buf = Vec::new();
        write_request(&mut buf, &req).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_request(&mut cursor).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn write_request_round_trips_across_two_frames() {
        let req = Request::Write {
            fd: 3,
            data: b"payload,with,commas".to_vec(),
        };
        let mut buf = Vec::new();
        write_request(&mut buf, &req).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_request(&mut cursor).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn close_and_read_requests_round_trip() {
        for req in [Request::Close { fd: 7 }, Request::Read { fd: 7 }] {
            let mut buf = Vec::new();
            write_request(&mut buf, &req).unwrap();
            let mut cursor = Cursor::new(buf);
            let decoded = read_request(&mut cursor).unwrap();
            assert_eq!(decoded, req);
        }
    }

    #[test]
    fn handshake_round_trips_all_modes() {
        for mode in [SharingMode::Unrestricted, SharingMode::Exclusive, SharingMode::Transaction] {
            let mut buf = Vec::new();
            write_handshake(&mut buf, mode).unwrap();
            let mut cursor = Cursor::new(buf);
            assert_eq!(read_handshake(&mut cursor).unwrap(), mode);
        }
    }

    #[test]
    fn invalid_handshake_byte_is_reported() {
        let mut cursor = Cursor::new(vec![1, 0, 0, 0, b'X']);
        let err = read_handshake(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidSharingMode(b'X')));
    }

    #[test]
    fn success_and_failure_responses_round_trip() {
        let mut buf = Vec::new();
        write_success(&mut buf, b"hello").unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(
            read_wire_response(&mut cursor).unwrap(),
            WireResponse::Success(b"hello".to_vec())
        );

        let mut buf = Vec::new();
        write_failure(&mut buf, -55).unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_wire_response(&mut cursor).unwrap(), WireResponse::Failure(-55));
    }
}
