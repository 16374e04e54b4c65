//! Extraction cache owned by the orchestrator
//!
//! Raw tables are reused across pipeline invocations only while every source
//! file still has the same path, modification time and length.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::SystemTime;

use super::RawData;
use crate::config::SourceTable;

/// Identity of a source file at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub table: SourceTable,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

#[derive(Debug)]
struct CacheEntry {
    key: Vec<SourceFingerprint>,
    data: Rc<RawData>,
}

/// Memoized extraction result keyed by source fingerprints
#[derive(Debug, Default)]
pub struct ExtractCache {
    entry: Option<CacheEntry>,
    hits: u64,
    misses: u64,
}

impl ExtractCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached data if it was extracted from exactly these files
    pub fn lookup(&mut self, key: &[SourceFingerprint]) -> Option<Rc<RawData>> {
        match &self.entry {
            Some(entry) if entry.key == key => {
                self.hits += 1;
                Some(Rc::clone(&entry.data))
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Replace the cached entry
    pub fn store(&mut self, key: Vec<SourceFingerprint>, data: RawData) -> Rc<RawData> {
        let data = Rc::new(data);
        self.entry = Some(CacheEntry {
            key,
            data: Rc::clone(&data),
        });
        data
    }

    /// Drop the cached entry
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
