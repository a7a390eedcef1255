//! The blocking client connection: one persistent socket per process,
//! carrying a single declared sharing mode for its lifetime.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use access::{Fd, Permission, SharingMode};
use protocol::{
    read_wire_response, write_handshake, write_request, Request, WireResponse,
};

use crate::error::{ClientError, ClientResult};

/// A single connection to the remote file service.
///
/// Mirrors the reference client library's one-connection-per-process
/// convention, but as an owned object rather than module-global state: the
/// connection's lifetime is this value's lifetime, and nothing here is
/// `Send`-shared across threads (a process that needs more than one
/// connection constructs more than one [`NetFileClient`]).
pub struct NetFileClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl NetFileClient {
    /// Connects to `addr`, declares `sharing_mode` for the session, and
    /// returns a ready client once the server acknowledges the handshake.
    pub fn connect<A: ToSocketAddrs>(addr: A, sharing_mode: SharingMode) -> ClientResult<Self> {
        let stream = TcpStream::connect(addr).map_err(|source| {
            ClientError::Transport(protocol::ProtocolError::TransportLost(source))
        })?;
        let read_half = stream.try_clone().map_err(|source| {
            ClientError::Transport(protocol::ProtocolError::TransportLost(source))
        })?;

        let mut client = Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(stream),
        };

        write_handshake(&mut client.writer, sharing_mode)?;
        client.flush_writer()?;
        match read_wire_response(&mut client.reader)? {
            WireResponse::Success(_) => Ok(client),
            WireResponse::Failure(code) => Err(ClientError::Remote(code)),
        }
    }

    fn flush_writer(&mut self) -> ClientResult<()> {
        std::io::Write::flush(&mut self.writer)
            .map_err(protocol::ProtocolError::TransportLost)
            .map_err(ClientError::Transport)
    }

    fn roundtrip(&mut self, request: &Request) -> ClientResult<Vec<u8>> {
        write_request(&mut self.writer, request)?;
        self.flush_writer()?;
        match read_wire_response(&mut self.reader)? {
            WireResponse::Success(data) => Ok(data),
            WireResponse::Failure(code) => Err(ClientError::Remote(code)),
        }
    }

    fn parse_decimal(data: &[u8]) -> ClientResult<i64> {
        std::str::from_utf8(data)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                ClientError::Transport(protocol::ProtocolError::Framing(
                    "expected a decimal numeric field in the response".to_string(),
                ))
            })
    }

    /// Opens `path` under `permission`, returning the descriptor the caller
    /// must pass to [`Self::read`], [`Self::write`], and [`Self::close`].
    pub fn open(&mut self, path: &str, permission: Permission) -> ClientResult<Fd> {
        let data = self.roundtrip(&Request::Open {
            path: path.to_string(),
            permission,
        })?;
        let negated = Self::parse_decimal(&data)?;
        Ok(-negated)
    }

    /// Closes a descriptor previously returned by [`Self::open`].
    pub fn close(&mut self, fd: Fd) -> ClientResult<()> {
        self.roundtrip(&Request::Close { fd }).map(|_| ())
    }

    /// Reads the entire file into `buf`, following the reference library's
    /// truncate-and-null-terminate semantics: if the file is at least as long
    /// as `buf`, only `buf.len() - 1` bytes are copied and the last byte is
    /// set to `0`, returning `buf.len()`; otherwise the whole file is copied
    /// and the actual length returned.
    ///
    /// An empty `buf` returns `0` without touching it — the reference
    /// implementation's equivalent case underflows a zero-length buffer
    /// instead.
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> ClientResult<usize> {
        let data = self.roundtrip(&Request::Read { fd })?;
        if buf.is_empty() {
            return Ok(0);
        }
        if data.len() >= buf.len() {
            let copy_len = buf.len() - 1;
            buf[..copy_len].copy_from_slice(&data[..copy_len]);
            buf[copy_len] = 0;
            Ok(buf.len())
        } else {
            buf[..data.len()].copy_from_slice(&data);
            Ok(data.len())
        }
    }

    /// Reads the entire file without truncation, for callers that don't need
    /// the fixed-buffer semantics of [`Self::read`].
    pub fn read_to_vec(&mut self, fd: Fd) -> ClientResult<Vec<u8>> {
        self.roundtrip(&Request::Read { fd })
    }

    /// Writes `data` from the start of the file, returning the number of
    /// bytes the server reports having written.
    pub fn write(&mut self, fd: Fd, data: &[u8]) -> ClientResult<usize> {
        let response = self.roundtrip(&Request::Write {
            fd,
            data: data.to_vec(),
        })?;
        let reported = Self::parse_decimal(&response)?;
        let reported_usize = usize::try_from(reported).map_err(|_| {
            ClientError::Transport(protocol::ProtocolError::Framing(
                "negative byte count in write response".to_string(),
            ))
        })?;
        if reported_usize > data.len() {
            return Err(ClientError::TooManyBytesWritten {
                requested: data.len(),
                reported,
            });
        }
        Ok(reported_usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal_rejects_non_numeric_payloads() {
        let err = NetFileClient::parse_decimal(b"not-a-number").unwrap_err();
        assert!(matches!(err, ClientError::Transport(protocol::ProtocolError::Framing(_))));
    }

    #[test]
    fn parse_decimal_accepts_negative_values() {
        assert_eq!(NetFileClient::parse_decimal(b"-42").unwrap(), -42);
    }
}
