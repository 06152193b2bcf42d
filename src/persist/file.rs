//! JSON file-backed state store.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use crate::persist::{StateStore, StoreError, TimeoutRecord};

/// A [`StateStore`] keeping one `<key>.json` file per key.
///
/// Files live in a caller-chosen directory; the default is the current
/// working directory, which together with a fixed key gives the classic
/// single-well-known-file recovery behavior.
#[derive(Debug, Clone, Default)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn io_err(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<TimeoutRecord>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path).map_err(|e| Self::io_err(key, e))?;
        let reader = BufReader::new(file);
        let record: TimeoutRecord =
            serde_json::from_reader(reader).map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                source: e,
            })?;

        tracing::debug!(key, start = record.start, timeout = record.timeout, "loaded state record");
        Ok(Some(record))
    }

    fn save(&self, key: &str, record: &TimeoutRecord) -> Result<(), StoreError> {
        let file = File::create(self.path_for(key)).map_err(|e| Self::io_err(key, e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, record).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            source: e,
        })?;

        tracing::debug!(key, start = record.start, timeout = record.timeout, "saved state record");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| Self::io_err(key, e))?;
            tracing::debug!(key, "deleted state record");
        }
        Ok(())
    }
}
