//! File-backed store.
//!
//! The whole store is one JSON object (`{"storage key": "stored value"}`).
//! Every write rewrites the file through a sibling named `<file>.tmp` and a
//! rename, so a crash mid-write leaves the previous contents intact. A failed
//! write removes its temporary file.

use super::KeyValueStore;
use crate::core::{MigrationError, Result};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, starting empty if the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = Self::read_entries(&path).await?;
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of every stored entry, ordered by key.
    pub async fn entries(&self) -> BTreeMap<String, String> {
        self.entries.lock().await.clone()
    }

    async fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => {
                return Err(MigrationError::Io(format!(
                    "read store '{}': {}",
                    path.display(),
                    err
                )));
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            MigrationError::Storage(format!("parse store '{}': {}", path.display(), err))
        })
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.tmp_path();
        let written = match fs::write(&tmp_path, bytes).await {
            Ok(()) => fs::rename(&tmp_path, &self.path).await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }
        Ok(())
    }

    /// `store.json` -> `store.json.tmp`, so stores differing only by
    /// extension never share a temporary file.
    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(key.to_string(), value);
        if let Err(err) = self.write_entries(&entries).await {
            // Keep memory in line with what is on disk.
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.write_entries(&entries).await {
            entries.insert(key.to_string(), previous);
            return Err(err);
        }
        Ok(())
    }
}
