//! In-memory scan store
//!
//! Used by tests and by the binary when no output directory is given. Keeps
//! every progress snapshot it receives so the history can be inspected.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::core::sync::{read_or, write_or};
use crate::scanner::types::{ScanProgress, ScanResult};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::{sort_newest_first, ScanStore};

#[derive(Debug, Default)]
struct StoreState {
    results: HashMap<String, ScanResult>,
    progress: HashMap<String, Vec<ScanProgress>>,
    save_counts: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

fn sync_error(message: String) -> StorageError {
    StorageError::Synchronisation { message }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every progress snapshot received for a scan, oldest first
    pub fn progress_history(&self, scan_id: &str) -> Vec<ScanProgress> {
        read_or(&self.state, "memory store", sync_error)
            .map(|state| state.progress.get(scan_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// How many times a final result was saved for a scan
    pub fn save_count(&self, scan_id: &str) -> usize {
        read_or(&self.state, "memory store", sync_error)
            .map(|state| state.save_counts.get(scan_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn result_count(&self) -> usize {
        read_or(&self.state, "memory store", sync_error)
            .map(|state| state.results.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn save_result(&self, scan_id: &str, result: &ScanResult) -> StorageResult<()> {
        let mut state = write_or(&self.state, "memory store", sync_error)?;
        state.results.insert(scan_id.to_string(), result.clone());
        *state.save_counts.entry(scan_id.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn update_progress(&self, scan_id: &str, progress: &ScanProgress) -> StorageResult<()> {
        let mut state = write_or(&self.state, "memory store", sync_error)?;
        state
            .progress
            .entry(scan_id.to_string())
            .or_default()
            .push(progress.clone());
        Ok(())
    }

    async fn load_result(&self, scan_id: &str) -> StorageResult<Option<ScanResult>> {
        let state = read_or(&self.state, "memory store", sync_error)?;
        Ok(state.results.get(scan_id).cloned())
    }

    async fn load_progress(&self, scan_id: &str) -> StorageResult<Option<ScanProgress>> {
        let state = read_or(&self.state, "memory store", sync_error)?;
        Ok(state
            .progress
            .get(scan_id)
            .and_then(|history| history.last().cloned()))
    }

    async fn list_results(&self) -> StorageResult<Vec<ScanResult>> {
        let mut results: Vec<ScanResult> = read_or(&self.state, "memory store", sync_error)?
            .results
            .values()
            .cloned()
            .collect();
        sort_newest_first(&mut results);
        Ok(results)
    }

    async fn delete_result(&self, scan_id: &str) -> StorageResult<()> {
        let mut state = write_or(&self.state, "memory store", sync_error)?;
        state.results.remove(scan_id);
        state.progress.remove(scan_id);
        Ok(())
    }
}
