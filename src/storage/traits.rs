//! The storage port consumed by the scan engine

use async_trait::async_trait;

use crate::scanner::types::{ScanProgress, ScanResult};
use crate::storage::error::StorageResult;

/// Persistence for scan results and progress snapshots.
///
/// The engine only calls [`ScanStore::save_result`] and
/// [`ScanStore::update_progress`], and treats both as best effort. The read
/// side serves the application layer.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Persist the final result of a completed scan
    async fn save_result(&self, scan_id: &str, result: &ScanResult) -> StorageResult<()>;

    /// Persist the latest progress snapshot of a running scan
    async fn update_progress(&self, scan_id: &str, progress: &ScanProgress) -> StorageResult<()>;

    async fn load_result(&self, scan_id: &str) -> StorageResult<Option<ScanResult>>;

    async fn load_progress(&self, scan_id: &str) -> StorageResult<Option<ScanProgress>>;

    /// All stored results, newest first
    async fn list_results(&self) -> StorageResult<Vec<ScanResult>>;

    /// Remove a stored result and its progress; absent ids are not an error
    async fn delete_result(&self, scan_id: &str) -> StorageResult<()>;
}

/// Newest first by scan timestamp, then by id for a stable order
pub(crate) fn sort_newest_first(results: &mut [ScanResult]) {
    results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
}
