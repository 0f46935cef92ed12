use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use taskstreak_core::storage::{StateStore, StoreError};
use tempfile::NamedTempFile;
use tracing::instrument;

/// File-backed store: one file per key under `root`.
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    #[instrument(skip_all, fields(key))]
    async fn write(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        write_atomic(&self.path_for(key), value)
    }

    #[instrument(skip_all, fields(key))]
    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        fs::read(self.path_for(key)).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    key: key.to_string(),
                }
            } else {
                storage_err(err)
            }
        })
    }

    #[instrument(skip_all, fields(key))]
    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_err(err)),
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = path.parent().ok_or_else(|| StoreError::Storage {
        reason: "invalid storage path".to_string(),
    })?;
    fs::create_dir_all(parent).map_err(storage_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
    tmp.write_all(bytes).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

/// Keep keys usable as file names on every platform.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn storage_err<E: ToString>(err: E) -> StoreError {
    StoreError::Storage {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_writes_plain_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path().join("nested"));

        store.write("taskstreak_state", b"{\"version\":2}").await.expect("write");
        let read = store.read("taskstreak_state").await.expect("read");
        assert_eq!(read, b"{\"version\":2}");
        assert!(store.path_for("taskstreak_state").ends_with("taskstreak_state.json"));
    }

    #[tokio::test]
    async fn overwrite_replaces_previous_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path());
        store.write("k", b"first").await.expect("write");
        store.write("k", b"second").await.expect("overwrite");
        assert_eq!(store.read("k").await.expect("read"), b"second");
    }

    #[tokio::test]
    async fn missing_key_is_not_found_and_remove_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path());
        let err = store.read("absent").await.expect_err("should be missing");
        assert!(matches!(err, StoreError::NotFound { .. }));

        store.write("k", b"v").await.expect("write");
        store.remove("k").await.expect("remove");
        store.remove("k").await.expect("remove again");
        assert!(matches!(
            store.read("k").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn keys_are_made_path_safe() {
        assert_eq!(sanitize_key("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_key("taskstreak_state"), "taskstreak_state");
    }
}
