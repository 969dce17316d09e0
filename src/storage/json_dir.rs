//! Directory-backed scan store
//!
//! One pretty-printed JSON document per scan (`scan_<id>.json`) plus the
//! latest progress snapshot beside it (`scan_<id>.progress.json`). Writes go
//! to a temporary file first and are renamed into place.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::scanner::types::{ScanProgress, ScanResult};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::{sort_newest_first, ScanStore};

const KEY_PREFIX: &str = "scan_";
const RESULT_SUFFIX: &str = ".json";
const PROGRESS_SUFFIX: &str = ".progress.json";

#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::Io {
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn result_path(&self, scan_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", KEY_PREFIX, scan_id, RESULT_SUFFIX))
    }

    pub fn progress_path(&self, scan_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", KEY_PREFIX, scan_id, PROGRESS_SUFFIX))
    }

    async fn write_json<T: Serialize>(
        &self,
        scan_id: &str,
        path: PathBuf,
        value: &T,
    ) -> StorageResult<()> {
        let bytes =
            serde_json::to_vec_pretty(value).map_err(|source| StorageError::Serialization {
                scan_id: scan_id.to_string(),
                source,
            })?;

        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|source| StorageError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| StorageError::Io { path, source })
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        scan_id: &str,
        path: PathBuf,
    ) -> StorageResult<Option<T>> {
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Serialization {
                scan_id: scan_id.to_string(),
                source,
            })
    }

    async fn remove_if_present(path: PathBuf) -> StorageResult<()> {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// `scan_<id>.json` -> `<id>`; progress files and strangers are skipped
fn scan_id_from_file_name(name: &str) -> Option<&str> {
    if name.ends_with(PROGRESS_SUFFIX) {
        return None;
    }
    name.strip_prefix(KEY_PREFIX)?
        .strip_suffix(RESULT_SUFFIX)
        .filter(|id| !id.is_empty())
}

#[async_trait]
impl ScanStore for JsonDirStore {
    async fn save_result(&self, scan_id: &str, result: &ScanResult) -> StorageResult<()> {
        self.write_json(scan_id, self.result_path(scan_id), result)
            .await
    }

    async fn update_progress(&self, scan_id: &str, progress: &ScanProgress) -> StorageResult<()> {
        self.write_json(scan_id, self.progress_path(scan_id), progress)
            .await
    }

    async fn load_result(&self, scan_id: &str) -> StorageResult<Option<ScanResult>> {
        self.read_json(scan_id, self.result_path(scan_id)).await
    }

    async fn load_progress(&self, scan_id: &str) -> StorageResult<Option<ScanProgress>> {
        self.read_json(scan_id, self.progress_path(scan_id)).await
    }

    async fn list_results(&self) -> StorageResult<Vec<ScanResult>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|source| StorageError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let mut results = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(StorageError::Io {
                        path: self.dir.clone(),
                        source,
                    })
                }
            };
            let file_name = entry.file_name();
            let Some(scan_id) = file_name.to_str().and_then(scan_id_from_file_name) else {
                continue;
            };
            // Unreadable documents are skipped so one bad file does not hide the rest
            match self.read_json::<ScanResult>(scan_id, entry.path()).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping stored scan '{}': {}", scan_id, e),
            }
        }

        sort_newest_first(&mut results);
        Ok(results)
    }

    async fn delete_result(&self, scan_id: &str) -> StorageResult<()> {
        Self::remove_if_present(self.result_path(scan_id)).await?;
        Self::remove_if_present(self.progress_path(scan_id)).await
    }
}
