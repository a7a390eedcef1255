//! Errors surfaced to callers of [`crate::NetFileClient`].

use protocol::ProtocolError;
use thiserror::Error;

/// Errors raised by the client library.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The framing or transport layer failed; the connection is no longer usable.
    #[error("connection lost: {0}")]
    Transport(#[from] ProtocolError),

    /// The server reported a failure for the request, carrying its decimal code
    /// (a local errno value, or the synthetic invalid-sharing-mode code).
    #[error("server reported error code {0}")]
    Remote(i32),

    /// The server reported writing more bytes than were sent, which can only
    /// mean a protocol desynchronization.
    #[error("server reported writing {reported} bytes, more than the {requested} requested")]
    TooManyBytesWritten {
        /// Bytes the caller asked to write.
        requested: usize,
        /// Bytes the server claimed to have written.
        reported: i64,
    },
}

/// Result alias used throughout the client crate.
pub type ClientResult<T> = Result<T, ClientError>;
