//! The [`AccessManager`]: the mutex-guarded [`FileTable`] and the open/close/read/write
//! policy described in the module-level invariants.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{AccessError, AccessResult};
use crate::record::{ClientHandle, FileRecord, RecordSnapshot};
use crate::types::{ConnectionId, Fd, Permission, SharingMode};

/// The process-wide table of open files, keyed by path with an auxiliary
/// fd → path index. Both indices live behind the same lock so a single
/// critical section can update them atomically with respect to each other.
struct FileTable {
    by_path: HashMap<PathBuf, FileRecord>,
    by_fd: HashMap<Fd, PathBuf>,
    next_fd: Fd,
}

impl FileTable {
    fn new() -> Self {
        FileTable {
            by_path: HashMap::new(),
            by_fd: HashMap::new(),
            next_fd: 1,
        }
    }
}

/// Shared file-access manager: one instance per daemon process, held behind an
/// `Arc` and handed to every connection worker.
pub struct AccessManager {
    table: Mutex<FileTable>,
}

impl Default for AccessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessManager {
    /// Creates an empty access manager.
    #[must_use]
    pub fn new() -> Self {
        AccessManager {
            table: Mutex::new(FileTable::new()),
        }
    }

    /// Opens `path` for `connection_id` under `session_mode`, requesting `permission`.
    ///
    /// See the open policy invariants in the crate documentation for the admission rules.
    pub fn open(
        &self,
        path: &Path,
        session_mode: SharingMode,
        permission: Permission,
        connection_id: ConnectionId,
    ) -> AccessResult<Fd> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(record) = table.by_path.get(path) {
            // Rule 1: duplicate open guard.
            if record.owner(connection_id).is_some() {
                return Err(AccessError::PolicyDenied);
            }

            // Rule 3: transaction exclusion.
            let transaction_conflict = record
                .owners
                .iter()
                .any(|h| h.sharing_mode == SharingMode::Transaction)
                || session_mode == SharingMode::Transaction;
            if transaction_conflict {
                return Err(AccessError::PolicyDenied);
            }

            // Rule 4: read-only opens bypass the writer-admission check entirely.
            // Rule 5: write admission under Exclusive — at most one writer at a time.
            if permission.can_write() {
                let exclusive_in_play = session_mode == SharingMode::Exclusive
                    || record.max_sharing_mode == Some(SharingMode::Exclusive);
                if exclusive_in_play {
                    let existing_writers = record.owners.iter().filter(|h| h.permission.can_write()).count();
                    if existing_writers >= 1 {
                        return Err(AccessError::PolicyDenied);
                    }
                }
            }
            // Rule 6: otherwise (Unrestricted on both sides) admit unconditionally.

            let fd = record.fd;
            let record = table.by_path.get_mut(path).expect("record just looked up");
            record.push_owner(ClientHandle {
                connection_id,
                permission,
                sharing_mode: session_mode,
            });
            #[cfg(feature = "tracing")]
            tracing::debug!(?path, fd, connection_id, ?permission, "admitted open on existing record");
            return Ok(fd);
        }

        // Rule 2: fresh path.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| AccessError::local_io(path.to_path_buf(), e))?;

        let fd = table.next_fd;
        table.next_fd += 1;

        let mut record = FileRecord::new(fd, path.to_path_buf(), file);
        record.push_owner(ClientHandle {
            connection_id,
            permission,
            sharing_mode: session_mode,
        });

        table.by_path.insert(path.to_path_buf(), record);
        table.by_fd.insert(fd, path.to_path_buf());

        #[cfg(feature = "tracing")]
        tracing::debug!(?path, fd, connection_id, ?permission, "opened fresh path");

        Ok(fd)
    }

    /// Closes `fd` on behalf of `connection_id`.
    pub fn close(&self, fd: Fd, connection_id: ConnectionId) -> AccessResult<()> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        let path = table.by_fd.get(&fd).cloned().ok_or(AccessError::BadHandle)?;

        let record = table.by_path.get_mut(&path).ok_or(AccessError::BadHandle)?;
        if !record.remove_owner(connection_id) {
            return Err(AccessError::BadHandle);
        }

        if record.refcount() == 0 {
            table.by_path.remove(&path);
            table.by_fd.remove(&fd);
            #[cfg(feature = "tracing")]
            tracing::debug!(?path, fd, "last holder closed, file released");
        }

        Ok(())
    }

    /// Reads the entire contents of the file backing `fd`, on behalf of `connection_id`.
    pub fn read(&self, fd: Fd, connection_id: ConnectionId) -> AccessResult<Vec<u8>> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        let path = table.by_fd.get(&fd).cloned().ok_or(AccessError::BadHandle)?;
        let record = table.by_path.get_mut(&path).ok_or(AccessError::BadHandle)?;

        let permission = record.owner(connection_id).ok_or(AccessError::BadHandle)?.permission;
        if !permission.can_read() {
            return Err(AccessError::PolicyDenied);
        }

        record
            .file
            .seek(SeekFrom::Start(0))
            .map_err(|e| AccessError::local_io(path.clone(), e))?;
        let mut buf = Vec::new();
        record
            .file
            .read_to_end(&mut buf)
            .map_err(|e| AccessError::local_io(path, e))?;
        Ok(buf)
    }

    /// Writes `data` from the start of the file backing `fd`, on behalf of `connection_id`.
    /// Returns the number of bytes actually written.
    pub fn write(&self, fd: Fd, connection_id: ConnectionId, data: &[u8]) -> AccessResult<usize> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        let path = table.by_fd.get(&fd).cloned().ok_or(AccessError::BadHandle)?;
        let record = table.by_path.get_mut(&path).ok_or(AccessError::BadHandle)?;

        let permission = record.owner(connection_id).ok_or(AccessError::BadHandle)?.permission;
        if !permission.can_write() {
            return Err(AccessError::PolicyDenied);
        }

        record
            .file
            .seek(SeekFrom::Start(0))
            .map_err(|e| AccessError::local_io(path.clone(), e))?;
        record
            .file
            .write_all(data)
            .map_err(|e| AccessError::local_io(path, e))?;
        Ok(data.len())
    }

    /// Releases every handle held by `connection_id`, e.g. on abrupt disconnect.
    ///
    /// Iterates records by holder rather than by the session's remembered fd
    /// list paired with a possibly-stale id, avoiding the argument-order bug
    /// noted against the original implementation (see DESIGN.md).
    pub fn release_connection(&self, connection_id: ConnectionId) {
        let fds: Vec<Fd> = {
            let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            table
                .by_path
                .values()
                .filter(|r| r.owner(connection_id).is_some())
                .map(|r| r.fd)
                .collect()
        };

        for fd in fds {
            if let Err(err) = self.close(fd, connection_id) {
                #[cfg(feature = "tracing")]
                tracing::warn!(fd, connection_id, %err, "failed releasing handle on disconnect");
                #[cfg(not(feature = "tracing"))]
                let _ = err;
            }
        }
    }

    /// Returns a snapshot of the record at `path`, if one currently exists.
    /// Intended for tests and diagnostics.
    #[must_use]
    pub fn snapshot(&self, path: &Path) -> Option<RecordSnapshot> {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.by_path.get(path).map(RecordSnapshot::from)
    }
}
