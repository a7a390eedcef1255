#![deny(unsafe_code)]
#![deny(missing_docs)]
//! # Overview
//!
//! `access` is the shared file-access manager for the remote file service: the
//! data structure, concurrency protocol, and access-compatibility rules that
//! govern how many clients can simultaneously hold a given file in which mode.
//!
//! The [`AccessManager`] owns a process-wide table of [`FileRecord`]s keyed by
//! path, guarded by a single mutex. Every open/close/read/write request acquires
//! that mutex for the whole operation; socket I/O never happens while it is held.
//!
//! # Invariants
//!
//! - `max_sharing_mode(r)` equals the strictest [`SharingMode`] among `r`'s owners.
//! - `any_writer(r)` is true iff some owner holds [`Permission::WriteOnly`] or
//!   [`Permission::ReadWrite`].
//! - `refcount(r) == owners.len()`, and a path is present in the table iff
//!   `refcount(r) > 0`.
//! - No connection holds two handles on the same path at once.
//!
//! # Errors
//!
//! All fallible operations return [`AccessError`], which carries a [`AccessError::wire_code`]
//! for direct translation into the wire protocol's `F,<code>` response.

mod error;
mod manager;
mod record;
mod types;

pub use error::{AccessError, AccessResult, INVALID_SHARING_MODE_CODE};
pub use manager::AccessManager;
pub use record::{ClientHandle, FileRecord, RecordSnapshot};
pub use types::{ConnectionId, Fd, Permission, SharingMode};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with_contents(contents: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("create temp file");
        f.write_all(contents).expect("write temp file");
        f.flush().expect("flush temp file");
        f
    }

    #[test]
    fn unrestricted_read_write_round_trip() {
        let file = file_with_contents(b"");
        let manager = AccessManager::new();

        let fd = manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadWrite, 1)
            .expect("open succeeds");

        let written = manager.write(fd, 1, b"Hello").expect("write succeeds");
        assert_eq!(written, 5);

        let data = manager.read(fd, 1).expect("read succeeds");
        assert_eq!(data, b"Hello");

        manager.close(fd, 1).expect("close succeeds");
    }

    #[test]
    fn exclusive_blocks_second_writer_but_allows_reader() {
        let file = file_with_contents(b"");
        let manager = AccessManager::new();

        let fd_a = manager
            .open(file.path(), SharingMode::Exclusive, Permission::ReadWrite, 1)
            .expect("A opens for read/write");

        let err = manager
            .open(file.path(), SharingMode::Exclusive, Permission::WriteOnly, 2)
            .expect_err("B's write open must be denied");
        assert!(matches!(err, AccessError::PolicyDenied));

        let fd_b = manager
            .open(file.path(), SharingMode::Exclusive, Permission::ReadOnly, 2)
            .expect("B's read-only open coexists");

        manager.close(fd_a, 1).expect("A closes");
        manager.close(fd_b, 2).expect("B closes");
    }

    #[test]
    fn transaction_rejects_second_holder_until_released() {
        let file = file_with_contents(b"");
        let manager = AccessManager::new();

        let fd_a = manager
            .open(file.path(), SharingMode::Transaction, Permission::ReadWrite, 1)
            .expect("A opens exclusively under transaction");

        let err = manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadOnly, 2)
            .expect_err("B must be rejected while A holds a transaction");
        assert!(matches!(err, AccessError::PolicyDenied));

        manager.close(fd_a, 1).expect("A closes");

        manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadOnly, 2)
            .expect("B succeeds once A has released the file");
    }

    #[test]
    fn disconnect_releases_every_held_file() {
        let files = [
            file_with_contents(b""),
            file_with_contents(b""),
            file_with_contents(b""),
        ];
        let manager = AccessManager::new();

        for f in &files {
            manager
                .open(f.path(), SharingMode::Unrestricted, Permission::ReadWrite, 1)
                .expect("open succeeds");
        }

        manager.release_connection(1);

        for f in &files {
            assert!(manager.snapshot(f.path()).is_none(), "file should be released");
        }
    }

    #[test]
    fn closing_twice_yields_bad_handle() {
        let file = file_with_contents(b"");
        let manager = AccessManager::new();

        let fd = manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadOnly, 1)
            .expect("open succeeds");

        manager.close(fd, 1).expect("first close succeeds");
        let err = manager.close(fd, 1).expect_err("second close must fail");
        assert!(matches!(err, AccessError::BadHandle));
    }

    #[test]
    fn reopening_same_path_on_same_connection_is_denied() {
        let file = file_with_contents(b"");
        let manager = AccessManager::new();

        manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadOnly, 1)
            .expect("first open succeeds");

        let err = manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadOnly, 1)
            .expect_err("second open on the same connection must be denied");
        assert!(matches!(err, AccessError::PolicyDenied));
    }

    #[test]
    fn open_then_close_restores_prior_snapshot() {
        let file = file_with_contents(b"");
        let manager = AccessManager::new();

        let before = manager.snapshot(file.path());
        assert!(before.is_none());

        let fd = manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadWrite, 1)
            .expect("open succeeds");
        manager.close(fd, 1).expect("close succeeds");

        assert_eq!(manager.snapshot(file.path()), before);
    }

    #[test]
    fn read_without_a_held_handle_is_bad_handle() {
        let file = file_with_contents(b"");
        let manager = AccessManager::new();

        let fd = manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadOnly, 1)
            .expect("A opens for read");

        // Connection 2 never opened this fd.
        let err = manager.read(fd, 2).expect_err("must fail for a non-holder");
        assert!(matches!(err, AccessError::BadHandle));
    }

    #[test]
    fn write_without_write_permission_is_policy_denied() {
        let file = file_with_contents(b"");
        let manager = AccessManager::new();

        let fd = manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadOnly, 1)
            .expect("open for read only");

        let err = manager.write(fd, 1, b"x").expect_err("write must be denied");
        assert!(matches!(err, AccessError::PolicyDenied));
    }

    #[test]
    fn refcount_and_any_writer_track_owners() {
        let file = file_with_contents(b"");
        let manager = AccessManager::new();

        let fd_a = manager
            .open(file.path(), SharingMode::Unrestricted, Permission::ReadOnly, 1)
            .expect("A opens read-only");
        let snap = manager.snapshot(file.path()).unwrap();
        assert_eq!(snap.refcount, 1);
        assert!(!snap.any_writer);

        manager
            .open(file.path(), SharingMode::Unrestricted, Permission::WriteOnly, 2)
            .expect("B opens write-only");
        let snap = manager.snapshot(file.path()).unwrap();
        assert_eq!(snap.refcount, 2);
        assert!(snap.any_writer);

        manager.close(fd_a, 1).expect("A closes");
        let snap = manager.snapshot(file.path()).unwrap();
        assert_eq!(snap.refcount, 1);
        assert!(snap.any_writer);
    }
}
