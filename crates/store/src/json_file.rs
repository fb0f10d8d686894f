//! Whole-document JSON file store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pipeline::{RecordStore, StoreDocument, StoreError};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// [`RecordStore`] backed by a single JSON file.
///
/// A missing or empty file loads as an empty document. `persist` writes a
/// uniquely named sibling temporary file and renames it over the target, so
/// readers never observe a partially written document and concurrent writers
/// never share a temporary file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store for the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<name>.<pid>.<random>.tmp` next to the target.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(
            ".{}.{}.tmp",
            std::process::id(),
            Uuid::new_v4().simple()
        ));
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<StoreDocument, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("store file missing; starting from an empty document");
                return Ok(StoreDocument::default());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(StoreDocument::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[instrument(skip(self, document), fields(path = %self.path.display()))]
    async fn persist(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document)?;
        let temp = self.temp_path();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let written = match tokio::fs::write(&temp, &bytes).await {
            Ok(()) => tokio::fs::rename(&temp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(temp = %temp.display(), error = %cleanup, "failed to remove temporary file");
                }
            }
            return Err(e.into());
        }

        debug!(bytes = bytes.len(), "store document persisted");
        Ok(())
    }
}
