//! Per-connection state the worker owns and never shares.

use std::collections::HashSet;

use access::{ConnectionId, Fd, SharingMode};

/// The sharing mode and held-file set for one accepted connection.
///
/// This is private to the worker that owns the connection; the only
/// cross-worker state is the [`access::AccessManager`]'s table.
pub(crate) struct Session {
    pub(crate) connection_id: ConnectionId,
    pub(crate) sharing_mode: SharingMode,
    held: HashSet<Fd>,
}

impl Session {
    pub(crate) fn new(connection_id: ConnectionId, sharing_mode: SharingMode) -> Self {
        Self {
            connection_id,
            sharing_mode,
            held: HashSet::new(),
        }
    }

    pub(crate) fn record_open(&mut self, fd: Fd) {
        self.held.insert(fd);
    }

    pub(crate) fn record_close(&mut self, fd: Fd) {
        self.held.remove(&fd);
    }

    pub(crate) fn held_fds(&self) -> impl Iterator<Item = Fd> + '_ {
        self.held.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_open_and_close() {
        let mut session = Session::new(1, SharingMode::Unrestricted);
        session.record_open(3);
        session.record_open(4);
        session.record_close(3);
        let remaining: Vec<Fd> = session.held_fds().collect();
        assert_eq!(remaining, vec![4]);
    }
}
