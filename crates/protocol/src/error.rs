//! Errors raised while framing or parsing messages.

use std::io;
use thiserror::Error;

use access::INVALID_SHARING_MODE_CODE;

/// Errors raised by the frame/message codec.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A frame's length or payload could not be read or written in full: the
    /// peer closed the connection or the socket errored. Always fatal.
    #[error("transport lost: {0}")]
    TransportLost(#[source] io::Error),

    /// A frame's payload did not parse as a well-formed request or response
    /// (malformed tag, missing separator, non-decimal numeric field). Always
    /// fatal to the connection.
    #[error("framing violation: {0}")]
    Framing(String),

    /// The handshake frame carried a byte that does not name a known sharing mode.
    #[error("invalid sharing mode byte {0:#04x}")]
    InvalidSharingMode(u8),
}

impl ProtocolError {
    /// Returns the decimal code that should be sent back over the wire, for the
    /// one variant ([`ProtocolError::InvalidSharingMode`]) that has a defined
    /// wire response. The other variants are fatal transport failures raised
    /// while the peer can no longer be reached, so there is nothing to send.
    #[must_use]
    pub fn wire_code(&self) -> Option<i32> {
        match self {
            ProtocolError::InvalidSharingMode(_) => Some(INVALID_SHARING_MODE_CODE),
            ProtocolError::TransportLost(_) | ProtocolError::Framing(_) => None,
        }
    }
}

/// Result alias used throughout the codec.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
