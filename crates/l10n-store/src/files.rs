use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use l10n_core::{FileStore, FileStoreError};
use tracing::debug;

/// Writes artifacts below a root directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl FileStore for LocalFileStore {
    fn write(&self, path: &str, contents: &[u8]) -> Result<(), FileStoreError> {
        let full = self.full_path(path);
        let err = |source: std::io::Error| FileStoreError::Write {
            path: full.display().to_string(),
            source,
        };
        let dir = full.parent().unwrap_or(self.root.as_path());
        std::fs::create_dir_all(dir).map_err(err)?;
        // temp file in the same directory so the rename stays on one filesystem
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(err)?;
        tmp.write_all(contents).map_err(err)?;
        tmp.persist(&full).map_err(|e| err(e.error))?;
        debug!(event = "artifact_written", path = %full.display(), bytes = contents.len());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), FileStoreError> {
        let full = self.full_path(path);
        match std::fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileStoreError::Delete {
                path: full.display().to_string(),
                source,
            }),
        }
    }

    fn link_latest(&self, target: &str, link: &str) -> Result<(), FileStoreError> {
        let full = self.full_path(link);
        let err = |source: std::io::Error| FileStoreError::Link {
            link: full.display().to_string(),
            target: target.to_string(),
            source,
        };
        match std::fs::remove_file(&full) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(err(e)),
        }
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(target, &full).map_err(err)?;
        }
        #[cfg(not(unix))]
        {
            let dir = full.parent().unwrap_or(self.root.as_path());
            std::fs::copy(dir.join(target), &full).map_err(err)?;
        }
        Ok(())
    }
}

/// In-memory artifact store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    links: Mutex<BTreeMap<String, String>>,
    failing: Mutex<BTreeSet<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `path` fail with a permission error.
    pub fn fail_writes_to(&self, path: &str) {
        lock(&self.failing).insert(path.to_string());
    }

    pub fn read(&self, path: &str) -> Option<String> {
        lock(&self.files)
            .get(path)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn paths(&self) -> Vec<String> {
        lock(&self.files).keys().cloned().collect()
    }

    pub fn link_target(&self, link: &str) -> Option<String> {
        lock(&self.links).get(link).cloned()
    }
}

impl FileStore for MemoryFileStore {
    fn write(&self, path: &str, contents: &[u8]) -> Result<(), FileStoreError> {
        if lock(&self.failing).contains(path) {
            return Err(FileStoreError::Write {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        lock(&self.files).insert(path.to_string(), contents.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), FileStoreError> {
        lock(&self.files).remove(path);
        Ok(())
    }

    fn link_latest(&self, target: &str, link: &str) -> Result<(), FileStoreError> {
        lock(&self.links).insert(link.to_string(), target.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_store_replaces_files_and_ignores_missing_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        store.write("all/drupal/drupal-9.1.0.de.po", b"first").unwrap();
        store.write("all/drupal/drupal-9.1.0.de.po", b"second").unwrap();
        let content = std::fs::read_to_string(store.full_path("all/drupal/drupal-9.1.0.de.po")).unwrap();
        assert_eq!(content, "second");

        store.delete("all/drupal/drupal-9.1.0.de.po").unwrap();
        store.delete("all/drupal/drupal-9.1.0.de.po").unwrap();
        assert!(!store.full_path("all/drupal/drupal-9.1.0.de.po").exists());
    }

    #[cfg(unix)]
    #[test]
    fn local_store_links_latest_relative_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        store.write("all/drupal/drupal-9.1.1.de.po", b"po").unwrap();
        store
            .link_latest("drupal-9.1.1.de.po", "all/drupal/drupal-9.1.x.de.po")
            .unwrap();
        store
            .link_latest("drupal-9.1.1.de.po", "all/drupal/drupal-9.1.x.de.po")
            .unwrap();
        let via_link = std::fs::read_to_string(store.full_path("all/drupal/drupal-9.1.x.de.po")).unwrap();
        assert_eq!(via_link, "po");
    }

    #[test]
    fn memory_store_can_fail_writes() {
        let store = MemoryFileStore::new();
        store.fail_writes_to("x.po");
        assert!(store.write("x.po", b"a").is_err());
        store.write("y.po", b"b").unwrap();
        assert_eq!(store.read("y.po").as_deref(), Some("b"));
    }
}
