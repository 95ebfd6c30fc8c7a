//! File-backed store

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::warn;

use super::{KeyValueStore, StoreError};

/// Durable key-value store kept as a single JSON object on disk.
///
/// Every write rewrites the whole document through a temporary file and a
/// rename, so a crash leaves either the previous or the new document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file starts an empty store; an
    /// unreadable document is discarded with a warning.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError::Io`] if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let values = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|source| {
                warn!(path = %path.display(), "discarding malformed store file: {source}");

                BTreeMap::new()
            }),
            Err(source) if source.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(source.into()),
        };

        Ok(Self { path, values })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        fs::create_dir_all(parent)?;

        let contents = serde_json::to_string_pretty(&self.values).map_err(|source| {
            StoreError::Serialize {
                key: "*",
                source,
            }
        })?;

        let mut tmp = NamedTempFile::new_in(parent)?;

        tmp.write_all(contents.as_bytes())?;
        tmp.persist(&self.path).map_err(io::Error::from)?;

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let previous = self.values.insert(key.to_string(), value);

        if let Err(error) = self.flush() {
            match previous {
                Some(previous) => self.values.insert(key.to_string(), previous),
                None => self.values.remove(key),
            };

            return Err(error);
        }

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let Some(previous) = self.values.remove(key) else {
            return Ok(());
        };

        if let Err(error) = self.flush() {
            self.values.insert(key.to_string(), previous);

            return Err(error);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn missing_file_opens_empty() -> TestResult {
        let dir = tempdir()?;
        let store = FileStore::open(dir.path().join("store.json"))?;

        assert!(store.get("greenerCart")?.is_none());

        Ok(())
    }

    #[test]
    fn values_survive_reopen() -> TestResult {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::open(&path)?;
        store.set("weeklyBudget", "\"150\"".to_string())?;
        store.set("lastReset", "\"2026-10-01T00:00:00Z\"".to_string())?;
        store.remove("lastReset")?;

        let reopened = FileStore::open(&path)?;

        assert_eq!(reopened.get("weeklyBudget")?, Some("\"150\"".to_string()));
        assert!(reopened.get("lastReset")?.is_none());

        Ok(())
    }

    #[test]
    fn data_file_with_tmp_extension_is_written_in_place() -> TestResult {
        let dir = tempdir()?;
        let path = dir.path().join("greencart.tmp");

        let mut store = FileStore::open(&path)?;
        store.set("weeklyBudget", "\"120\"".to_string())?;
        store.set("lastReset", "\"2026-10-01T00:00:00Z\"".to_string())?;

        let reopened = FileStore::open(&path)?;

        assert_eq!(reopened.get("weeklyBudget")?, Some("\"120\"".to_string()));
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);

        Ok(())
    }

    #[test]
    fn malformed_file_opens_empty() -> TestResult {
        let dir = tempdir()?;
        let path = dir.path().join("store.json");

        fs::write(&path, "not a json document")?;

        let store = FileStore::open(&path)?;

        assert!(store.get("greenerCart")?.is_none());

        Ok(())
    }
}
