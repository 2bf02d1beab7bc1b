//! # Snapshot Locking
//!
//! Serializes commits from every handle on one snapshot file, in this
//! process or another.
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on
//! Windows) on a `<snapshot>.lock` file next to the snapshot.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::ports::StoreError;

/// Exclusive lock on a snapshot file, released on drop.
pub(crate) struct SnapshotLock {
    file: File,
    path: PathBuf,
}

impl SnapshotLock {
    /// Path of the lock file guarding `snapshot`.
    pub(crate) fn lock_path(snapshot: &Path) -> PathBuf {
        let mut name = snapshot.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        snapshot.with_file_name(name)
    }

    /// Block until the lock on `snapshot` is held.
    pub(crate) fn acquire(snapshot: &Path) -> Result<Self, StoreError> {
        let path = Self::lock_path(snapshot);
        let io_err = |e: std::io::Error| StoreError::Io {
            message: format!("{}: {e}", path.display()),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;
        file.lock_exclusive().map_err(io_err)?;

        tracing::trace!(lock = %path.display(), "Snapshot lock acquired");
        Ok(Self { file, path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        // The lock file is left in place so waiters keep locking the same inode.
        let _ = self.file.unlock();
    }
}
