#![deny(unsafe_code)]
#![deny(missing_docs)]
//! # Overview
//!
//! `client` is the blocking client library for the remote file access
//! protocol: one persistent connection per process, a declared sharing mode
//! fixed at connect time, and four operations — open, read, write, close —
//! that mirror local file I/O but dispatch to the server.
//!
//! # Design
//!
//! [`NetFileClient::connect`] resolves and connects the socket, sends the
//! handshake frame, and parses the server's acknowledgement. Each subsequent
//! call frames a request, blocks for the response, and translates `F,<code>`
//! into [`ClientError::Remote`] or `S,<data>` into the expected return value.
//!
//! # Errors
//!
//! All fallible operations return [`ClientError`].

mod connection;
mod error;

pub use connection::NetFileClient;
pub use error::{ClientError, ClientResult};

pub use access::{Fd, Permission, SharingMode};
