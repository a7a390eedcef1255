//! TCP bootstrap: bind the listening socket and spawn one worker thread per
//! accepted connection.

use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use access::AccessManager;

use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::worker;

/// Binds the listening socket described by `config`.
///
/// Split from [`serve`] so callers (notably tests) can bind an ephemeral port
/// with `config.bind`'s port set to `0` and read back the real address via
/// [`TcpListener::local_addr`] before handing the listener to [`serve`].
pub fn bind(config: &DaemonConfig) -> DaemonResult<TcpListener> {
    TcpListener::bind(config.bind).map_err(|source| DaemonError::Bind {
        addr: config.bind,
        source,
    })
}

/// Runs the accept loop on an already-bound listener. Blocks until accepting
/// a connection fails; each accepted connection is handed to its own thread
/// and shares the single process-wide [`AccessManager`] created here.
pub fn serve(listener: TcpListener) -> DaemonResult<()> {
    let manager = Arc::new(AccessManager::new());
    let next_connection_id = AtomicU64::new(1);

    for stream in listener.incoming() {
        let stream = stream.map_err(DaemonError::Accept)?;
        let connection_id = next_connection_id.fetch_add(1, Ordering::Relaxed);
        let manager = Arc::clone(&manager);

        #[cfg(feature = "tracing")]
        if let Ok(peer) = stream.peer_addr() {
            tracing::debug!(connection_id, %peer, "accepted connection");
        }

        thread::spawn(move || worker::run(stream, manager, connection_id));
    }

    Ok(())
}
