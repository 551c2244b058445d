use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{BlobStore, BlobStoreError, Result, validate_key};

const BLOB_EXTENSION: &str = "json";

/// Blob store keeping one `<key>.json` file per key inside a data directory.
///
/// Writes go to a temporary file in the same directory which then replaces
/// the target, so readers never observe a half-written blob.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Open (and create if needed) the data directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| BlobStoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        info!(dir = %dir.display(), "Opened file blob store");
        Ok(Self { dir })
    }

    /// Data directory backing this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    ///
    /// # Errors
    /// Returns [`BlobStoreError::InvalidKey`] for keys that are not plain names.
    pub fn blob_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{BLOB_EXTENSION}")))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.blob_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BlobStoreError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.blob_path(key)?;
        let io_err = |source: io::Error| BlobStoreError::Io {
            key: key.to_owned(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(value.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|err| io_err(err.error))?;

        debug!(key, path = %path.display(), bytes = value.len(), "Wrote blob");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileBlobStore) {
        let dir = TempDir::with_prefix("taskboard-store-test-").unwrap_or_else(|err| panic!("{err}"));
        let store = FileBlobStore::open(dir.path()).unwrap_or_else(|err| panic!("open: {err}"));
        (dir, store)
    }

    #[test]
    fn missing_file_reads_as_none() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("tasks").unwrap_or_else(|err| panic!("{err}")), None);
    }

    #[test]
    fn set_then_get_returns_value() {
        let (dir, store) = temp_store();
        store
            .set("tasks", r#"[{"id":"a"}]"#)
            .unwrap_or_else(|err| panic!("set: {err}"));
        assert_eq!(
            store.get("tasks").unwrap_or_else(|err| panic!("get: {err}")).as_deref(),
            Some(r#"[{"id":"a"}]"#)
        );
        assert!(dir.path().join("tasks.json").exists());
    }

    #[test]
    fn overwrite_leaves_no_temp_files_behind() {
        let (dir, store) = temp_store();
        store.set("tasks", "[]").unwrap_or_else(|err| panic!("{err}"));
        store.set("tasks", "[1]").unwrap_or_else(|err| panic!("{err}"));
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap_or_else(|err| panic!("{err}"))
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn rejects_keys_escaping_the_directory() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(BlobStoreError::InvalidKey(_))
        ));
        assert!(matches!(store.get("a/b"), Err(BlobStoreError::InvalidKey(_))));
    }

    #[test]
    fn open_creates_nested_directories() {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("{err}"));
        let nested = dir.path().join("a").join("b");
        let store = FileBlobStore::open(&nested).unwrap_or_else(|err| panic!("{err}"));
        assert!(store.dir().is_dir());
    }
}
