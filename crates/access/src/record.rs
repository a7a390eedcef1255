//! [`ClientHandle`] and [`FileRecord`]: the per-open and per-path server state.

use std::fs::File;
use std::path::PathBuf;

use crate::types::{ConnectionId, Fd, Permission, SharingMode};

/// The fact that a particular connection holds a particular file open.
#[derive(Debug, Clone, Copy)]
pub struct ClientHandle {
    /// The connection that holds this handle.
    pub connection_id: ConnectionId,
    /// The permission this handle was opened with.
    pub permission: Permission,
    /// The sharing mode declared by the owning connection's session.
    pub sharing_mode: SharingMode,
}

/// Server-side state for one currently-open path.
///
/// `max_sharing_mode` and `any_writer` are derived fields recomputed on every
/// mutation of `owners`; they are never updated independently (see
/// [`FileRecord::recompute_derived`]).
pub struct FileRecord {
    /// Server-assigned descriptor clients use to reference this record.
    pub fd: Fd,
    /// The filesystem path this record backs.
    pub path: PathBuf,
    /// The server's open local file, shared by every current holder.
    pub file: File,
    /// The connections currently holding this path open.
    pub owners: Vec<ClientHandle>,
    /// Strictest sharing mode among `owners`, or `None` when empty.
    pub max_sharing_mode: Option<SharingMode>,
    /// True iff some holder has write permission.
    pub any_writer: bool,
}

impl FileRecord {
    pub(crate) fn new(fd: Fd, path: PathBuf, file: File) -> Self {
        FileRecord {
            fd,
            path,
            file,
            owners: Vec::new(),
            max_sharing_mode: None,
            any_writer: false,
        }
    }

    /// Number of connections currently holding this record open.
    #[must_use]
    pub fn refcount(&self) -> usize {
        self.owners.len()
    }

    pub(crate) fn push_owner(&mut self, handle: ClientHandle) {
        self.owners.push(handle);
        self.recompute_derived();
    }

    /// Removes the handle belonging to `connection_id`, if any. Returns whether one was removed.
    pub(crate) fn remove_owner(&mut self, connection_id: ConnectionId) -> bool {
        let before = self.owners.len();
        self.owners.retain(|h| h.connection_id != connection_id);
        let removed = self.owners.len() != before;
        if removed {
            self.recompute_derived();
        }
        removed
    }

    pub(crate) fn owner(&self, connection_id: ConnectionId) -> Option<&ClientHandle> {
        self.owners.iter().find(|h| h.connection_id == connection_id)
    }

    fn recompute_derived(&mut self) {
        self.max_sharing_mode = self.owners.iter().map(|h| h.sharing_mode).max();
        self.any_writer = self.owners.iter().any(|h| h.permission.can_write());
    }
}

/// An immutable, point-in-time view of a [`FileRecord`]'s derived state, used by
/// tests and diagnostics without exposing the underlying `File`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSnapshot {
    /// Number of current holders.
    pub refcount: usize,
    /// Strictest sharing mode among current holders.
    pub max_sharing_mode: Option<SharingMode>,
    /// Whether any holder has write permission.
    pub any_writer: bool,
}

impl From<&FileRecord> for RecordSnapshot {
    fn from(record: &FileRecord) -> Self {
        RecordSnapshot {
            refcount: record.refcount(),
            max_sharing_mode: record.max_sharing_mode,
            any_writer: record.any_writer,
        }
    }
}
