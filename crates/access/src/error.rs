//! Error taxonomy for the access manager.
//!
//! Every variant maps to a wire-transmissible numeric code via [`AccessError::wire_code`]
//! so the daemon's dispatch layer never needs a second translation table.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Synthetic code for a handshake byte that does not name a known sharing mode.
///
/// Negative so it can never collide with a real platform errno, which are small
/// positive integers. Mirrors the donor project's `INVALID_FILE_MODE` constant.
pub const INVALID_SHARING_MODE_CODE: i32 = -55;

#[cfg(unix)]
mod errno {
    pub const EACCES: i32 = libc::EACCES;
    pub const EBADF: i32 = libc::EBADF;
}

#[cfg(not(unix))]
mod errno {
    // POSIX-conventional values, used as a portable fallback on targets
    // without libc errno constants.
    pub const EACCES: i32 = 13;
    pub const EBADF: i32 = 9;
}

/// Errors raised while servicing an open/close/read/write request.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The underlying local file I/O call failed; the OS error code is propagated verbatim.
    #[error("local I/O error on {path}: {source}")]
    LocalIo {
        /// Path the failing syscall was operating on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An access-mode conflict: the requested open is incompatible with current holders,
    /// or the caller's permission does not allow the requested read/write.
    #[error("permission denied")]
    PolicyDenied,

    /// The connection referenced a descriptor it does not hold, or one that does not exist.
    #[error("bad file descriptor")]
    BadHandle,
}

impl AccessError {
    /// Returns the decimal code that should be sent back over the wire on failure.
    #[must_use]
    pub fn wire_code(&self) -> i32 {
        match self {
            AccessError::LocalIo { source, .. } => {
                source.raw_os_error().unwrap_or(errno::EACCES)
            }
            AccessError::PolicyDenied => errno::EACCES,
            AccessError::BadHandle => errno::EBADF,
        }
    }

    pub(crate) fn local_io(path: PathBuf, source: io::Error) -> Self {
        AccessError::LocalIo { path, source }
    }
}

/// Result alias used throughout the access manager.
pub type AccessResult<T> = Result<T, AccessError>;
