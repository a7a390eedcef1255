//! Errors raised while starting or running the daemon.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised by [`crate::run`] and the session loop it drives.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// The underlying bind failure.
        #[source]
        source: io::Error,
    },

    /// Accepting an incoming connection failed.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),
}

/// Result alias used throughout the daemon crate.
pub type DaemonResult<T> = Result<T, DaemonError>;
