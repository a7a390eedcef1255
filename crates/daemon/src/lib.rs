#![deny(unsafe_code)]
#![deny(missing_docs)]
//! # Overview
//!
//! `daemon` is the TCP server half of the remote file access protocol: it
//! binds a listening socket, spawns one worker thread per accepted
//! connection, and dispatches each connection's framed requests against a
//! single process-wide [`access::AccessManager`].
//!
//! # Design
//!
//! [`config`] parses CLI arguments into a [`config::DaemonConfig`]. [`server`]
//! owns the bind/accept loop. [`worker`] runs one connection's handshake and
//! request/response cycle. [`session`] is the per-connection state the worker
//! keeps privately (never shared across threads).
//!
//! # Invariants
//!
//! - Exactly one [`access::AccessManager`] is shared by every worker spawned
//!   from a given [`server::serve`] call.
//! - A worker never holds the manager's internal lock across a socket read or
//!   write; see [`access`] for the lock's scope.
//! - A connection that disconnects, cleanly or not, releases every file it
//!   held before its worker thread exits.
//!
//! # Errors
//!
//! Fallible daemon-level operations (binding, accepting) return [`DaemonError`].

mod config;
mod error;
mod server;
mod session;
mod worker;

pub use config::DaemonConfig;
pub use error::{DaemonError, DaemonResult};
pub use server::{bind, serve};

use std::ffi::OsString;
use std::io::Write;

/// Parses `args`, binds the configured socket, and runs the accept loop until
/// it fails. Returns a process exit code: `0` on a clean (never, in practice)
/// shutdown, `2` on argument errors, `1` on a bind or accept failure.
///
/// Mirrors the `fn main() -> ExitCode` pattern of the daemon binary: callers
/// pass `std::env::args_os()` and the process's stdout/stderr handles.
pub fn run<I, T>(args: I, stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = match DaemonConfig::try_parse_from(args) {
        Ok(config) => config,
        Err(err) => {
            let _ = write!(stdout, "{err}");
            return err.exit_code();
        }
    };

    #[cfg(feature = "tracing")]
    if config.verbose {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .try_init();
    }

    let listener = match bind(&config) {
        Ok(listener) => listener,
        Err(err) => {
            let _ = writeln!(stderr, "netfiled: {err}");
            return 1;
        }
    };

    let _ = writeln!(stdout, "netfiled: listening on {}", config.bind);

    match serve(listener) {
        Ok(()) => 0,
        Err(err) => {
            let _ = writeln!(stderr, "netfiled: {err}");
            1
        }
    }
}
