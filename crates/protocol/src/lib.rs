#![deny(unsafe_code)]
#![deny(missing_docs)]
//! # Overview
//!
//! `protocol` is the wire codec for the remote file service: length-prefixed
//! framing ([`frame`]) and the request/response payload grammar
//! ([`message`]) that the daemon and client crates speak over a `TcpStream`.
//!
//! Every request is one frame, except [`Request::Write`], which is sent as two
//! frames under the same tag: the descriptor, then the payload. Every response
//! is a single `S,<data>` or `F,<code>` frame; callers interpret the success
//! payload according to which request produced it (Open returns a negated
//! descriptor, Write returns a decimal byte count, Read returns raw file
//! bytes, Close returns nothing).
//!
//! # Errors
//!
//! All fallible operations return [`ProtocolError`]. Framing and transport
//! failures are always fatal to the connection; only [`ProtocolError::InvalidSharingMode`]
//! has a defined wire response via [`ProtocolError::wire_code`].

mod error;
mod frame;
mod message;

pub use error::{ProtocolError, ProtocolResult};
pub use frame::{read_frame, write_frame};
pub use message::{
    read_handshake, read_request, read_wire_response, write_failure, write_handshake,
    write_request, write_success, Request, WireResponse, DEFAULT_PORT,
};
