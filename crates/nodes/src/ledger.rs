//! Usage and audit ledger: the per-user generation counter and the
//! append-only audit log.
//!
//! Every mutation is a whole-document load/modify/persist cycle against the
//! [`RecordStore`]. Cycles issued through one ledger are serialised behind an
//! async mutex, so concurrent requests in this process cannot overwrite each
//! other's updates.

use std::sync::Arc;

use pipeline::{AuditLogEntry, Creativity, RecordStore, StoreError, UserId};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Reads and writes the pipeline's fields of the shared record store.
pub struct UsageLedger {
    store: Arc<dyn RecordStore>,
    write_lock: Mutex<()>,
}

impl UsageLedger {
    /// Creates a ledger over `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Appends a moderation entry and persists it.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    #[instrument(skip_all, fields(user_id = %entry.user_id))]
    pub async fn record_moderation(&self, entry: AuditLogEntry) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.store.load().await?;
        document.append_log(&entry)?;
        self.store.persist(&document).await?;
        debug!("moderation entry persisted");
        Ok(())
    }

    /// Appends a generation entry, then increments the user's counter by one.
    ///
    /// The two steps are persisted separately, log first, so a failure between
    /// them can lose an increment but never a log entry. Returns the updated
    /// counter.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    #[instrument(skip_all, fields(user_id = %entry.user_id))]
    pub async fn record_generation(&self, entry: AuditLogEntry) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let user_id = entry.user_id.clone();

        let mut document = self.store.load().await?;
        document.append_log(&entry)?;
        self.store.persist(&document).await?;

        let user = document.user_mut(&user_id);
        user.ai_usage_count += 1;
        let count = user.ai_usage_count;
        self.store.persist(&document).await?;

        debug!(usage_count = count, "generation recorded");
        Ok(count)
    }

    /// Successful generations for a user so far.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn usage_count(&self, user_id: &UserId) -> Result<u64, StoreError> {
        Ok(self.store.load().await?.usage_count(user_id))
    }

    /// A user's creativity preference, or the default when unset.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn creativity(&self, user_id: &UserId) -> Result<Creativity, StoreError> {
        Ok(self.store.load().await?.creativity(user_id))
    }

    /// Stores a creativity preference.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    #[instrument(skip(self), fields(user_id = %user_id, creativity = %creativity))]
    pub async fn set_creativity(
        &self,
        user_id: &UserId,
        creativity: Creativity,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.store.load().await?;
        document.user_mut(user_id).creativity = Some(creativity);
        self.store.persist(&document).await
    }

    /// A user's audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn entries_for(&self, user_id: &UserId) -> Result<Vec<AuditLogEntry>, StoreError> {
        let mut entries: Vec<AuditLogEntry> = self
            .store
            .load()
            .await?
            .audit_entries()
            .into_iter()
            .filter(|e| &e.user_id == user_id)
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

impl std::fmt::Debug for UsageLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageLedger").finish_non_exhaustive()
    }
}
