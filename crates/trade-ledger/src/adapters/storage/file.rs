use super::lock::SnapshotLock;
use super::{apply_batch, StateMap};
use crate::ports::{StateStore, StoreError, VersionedValue, WriteBatch};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// On-disk form of one entry.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    value: Vec<u8>,
    version: u64,
}

/// File-backed implementation of [`StateStore`].
///
/// The whole state is kept in memory and rewritten as a bincode snapshot
/// after every successful commit. The snapshot is written to a temp file
/// and renamed over the old one, so a crash leaves either the previous or
/// the new state on disk, never a mix.
///
/// Several handles may be open on one file. A commit holds the snapshot
/// lock, reloads the file and checks its guards against what is on disk,
/// so a handle working from a stale view gets
/// [`StoreError::VersionConflict`] and sees the fresh state on its retry.
pub struct FileStateStore {
    state: RwLock<StateMap>,
    path: PathBuf,
}

impl FileStateStore {
    /// Open the store at `path`, loading any existing snapshot.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = load_snapshot(&path)?;
        if state.is_empty() {
            tracing::info!(path = %path.display(), "No existing state, starting empty");
        }

        tracing::debug!(path = %path.display(), keys = state.len(), "Loaded state file");
        Ok(Self {
            state: RwLock::new(state),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory view with the snapshot currently on disk.
    pub fn reload(&self) -> Result<(), StoreError> {
        let _lock = SnapshotLock::acquire(&self.path)?;
        let disk = load_snapshot(&self.path)?;
        *self.state.write() = disk;
        Ok(())
    }

    fn save(&self, state: &StateMap) -> Result<(), StoreError> {
        let io_err = |e: std::io::Error| StoreError::Io {
            message: format!("{}: {e}", self.path.display()),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let bytes = encode_snapshot(state)?;
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

/// Read the snapshot at `path`. A missing file is an empty state.
fn load_snapshot(path: &Path) -> Result<StateMap, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => decode_snapshot(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateMap::new()),
        Err(e) => Err(StoreError::Io {
            message: format!("{}: {e}", path.display()),
        }),
    }
}

fn encode_snapshot(state: &StateMap) -> Result<Vec<u8>, StoreError> {
    // Sorted so identical states produce identical files.
    let entries: BTreeMap<&str, StoredEntry> = state
        .iter()
        .map(|(key, v)| {
            (
                key.as_str(),
                StoredEntry {
                    value: v.value.clone(),
                    version: v.version,
                },
            )
        })
        .collect();
    bincode::serialize(&entries).map_err(|e| StoreError::Corruption {
        message: e.to_string(),
    })
}

fn decode_snapshot(bytes: &[u8]) -> Result<StateMap, StoreError> {
    let entries: BTreeMap<String, StoredEntry> =
        bincode::deserialize(bytes).map_err(|e| StoreError::Corruption {
            message: e.to_string(),
        })?;
    Ok(entries
        .into_iter()
        .map(|(key, entry)| {
            (
                key,
                VersionedValue {
                    value: entry.value,
                    version: entry.version,
                },
            )
        })
        .collect())
}

impl StateStore for FileStateStore {
    fn get_versioned(&self, key: &str) -> Result<Option<VersionedValue>, StoreError> {
        Ok(self.state.read().get(key).cloned())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let _lock = SnapshotLock::acquire(&self.path)?;
        let mut state = self.state.write();

        // Guards are checked against the file, not this handle's view.
        let disk = load_snapshot(&self.path)?;
        let mut next = disk.clone();
        match apply_batch(&mut next, batch).and_then(|()| self.save(&next)) {
            Ok(()) => {
                *state = next;
                Ok(())
            }
            Err(e) => {
                if let StoreError::VersionConflict { key } = &e {
                    tracing::debug!(path = %self.path.display(), %key, "Commit conflicted with the state on disk");
                }
                *state = disk;
                Err(e)
            }
        }
    }
}
