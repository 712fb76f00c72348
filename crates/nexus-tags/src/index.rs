//! Shared, store-backed tag index

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nexus_core::{DocumentStore, StorageResult};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use crate::graph::TagGraph;

/// Read every document under the store root and return `(path, tags)` pairs.
///
/// Documents that fail to parse are logged and skipped.
pub async fn scan_store(store: &DocumentStore) -> StorageResult<Vec<(String, Vec<String>)>> {
    let paths = store.list("").await?;
    let mut entries = Vec::with_capacity(paths.len());

    for path in paths {
        match store.read(&path).await {
            Ok(document) => entries.push((path, document.tags())),
            Err(e) => warn!("Skipping {} during tag scan: {}", path, e),
        }
    }

    Ok(entries)
}

/// A [`TagGraph`] shared between bundles.
///
/// Cloning is cheap and every clone sees the same graph. Lock guards are
/// plain `parking_lot` guards and must not be held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    graph: Arc<RwLock<TagGraph>>,
    initialized: Arc<AtomicBool>,
}

impl TagIndex {
    /// Create an empty, uninitialized index
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the initial scan has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Build memberships from a full scan. Later calls are no-ops.
    pub async fn initialize(&self, store: &DocumentStore) -> StorageResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let entries = scan_store(store).await?;
        {
            let mut graph = self.graph.write();
            // Another caller may have finished the scan while we were reading
            if self.initialized.swap(true, Ordering::AcqRel) {
                return Ok(());
            }
            for (path, tags) in &entries {
                graph.index_document(path, tags);
            }
        }

        info!("Tag index initialized from {} documents", entries.len());
        Ok(())
    }

    /// Drop all memberships and rebuild them from a fresh scan.
    ///
    /// Relationships and hierarchy links are kept. Returns the number of
    /// documents indexed.
    pub async fn refresh(&self, store: &DocumentStore) -> StorageResult<usize> {
        let entries = scan_store(store).await?;
        {
            let mut graph = self.graph.write();
            graph.clear_memberships();
            for (path, tags) in &entries {
                graph.index_document(path, tags);
            }
        }
        self.initialized.store(true, Ordering::Release);

        info!("Tag index rescanned {} documents", entries.len());
        Ok(entries.len())
    }

    /// Shared read access
    pub fn read(&self) -> RwLockReadGuard<'_, TagGraph> {
        self.graph.read()
    }

    /// Exclusive write access
    pub fn write(&self) -> RwLockWriteGuard<'_, TagGraph> {
        self.graph.write()
    }
}
