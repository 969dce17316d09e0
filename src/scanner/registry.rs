//! Registry of live scans
//!
//! The only structure mutated from more than one task. Every operation holds
//! the lock for the map access alone.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::sync::{read_recovering, write_or, write_recovering};
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::instance::ScanInstance;

#[derive(Debug, Default)]
pub struct ScanRegistry {
    scans: RwLock<HashMap<String, Arc<ScanInstance>>>,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new instance; an identifier may only be registered once
    pub fn insert(&self, instance: Arc<ScanInstance>) -> ScanResult<()> {
        let mut scans = write_or(&self.scans, "scan registry", |message| {
            ScanError::Synchronisation { message }
        })?;

        let scan_id = instance.id().to_string();
        if scans.contains_key(&scan_id) {
            return Err(ScanError::AlreadyRegistered { scan_id });
        }
        log::trace!("Registering scan {}", scan_id);
        scans.insert(scan_id, instance);
        Ok(())
    }

    pub fn lookup(&self, scan_id: &str) -> Option<Arc<ScanInstance>> {
        read_recovering(&self.scans, "scan registry")
            .get(scan_id)
            .cloned()
    }

    /// Remove an instance; removing an absent id is a no-op
    pub fn remove(&self, scan_id: &str) -> Option<Arc<ScanInstance>> {
        let removed = write_recovering(&self.scans, "scan registry").remove(scan_id);
        if removed.is_some() {
            log::trace!("Retired scan {}", scan_id);
        }
        removed
    }

    pub fn contains(&self, scan_id: &str) -> bool {
        read_recovering(&self.scans, "scan registry").contains_key(scan_id)
    }

    pub fn len(&self) -> usize {
        read_recovering(&self.scans, "scan registry").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = read_recovering(&self.scans, "scan registry")
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Snapshot of every registered instance
    pub fn instances(&self) -> Vec<Arc<ScanInstance>> {
        read_recovering(&self.scans, "scan registry")
            .values()
            .cloned()
            .collect()
    }
}
