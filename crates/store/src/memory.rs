//! In-memory record store for tests and dry runs.

use async_trait::async_trait;
use pipeline::{RecordStore, StoreDocument, StoreError};
use tokio::sync::RwLock;

/// In-process [`RecordStore`].
///
/// Every `load` returns a clone, so callers get the same whole-document
/// semantics as with the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: RwLock<StoreDocument>,
    persist_count: std::sync::atomic::AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `document`.
    pub fn with_document(document: StoreDocument) -> Self {
        Self {
            document: RwLock::new(document),
            persist_count: Default::default(),
        }
    }

    /// Returns a copy of the current document.
    pub async fn snapshot(&self) -> StoreDocument {
        self.document.read().await.clone()
    }

    /// Number of `persist` calls so far.
    pub fn persist_count(&self) -> usize {
        self.persist_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self) -> Result<StoreDocument, StoreError> {
        Ok(self.document.read().await.clone())
    }

    async fn persist(&self, document: &StoreDocument) -> Result<(), StoreError> {
        *self.document.write().await = document.clone();
        self.persist_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
