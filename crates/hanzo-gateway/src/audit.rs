//! Append-only audit trail

use crate::error::Result;
use crate::types::AuditRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Destination for audit records
///
/// Write-only from the gateway's perspective. Implementations must accept
/// concurrent calls and keep each record a single, unbroken unit.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Durably append one record
    async fn record(&self, entry: &AuditRecord) -> Result<()>;
}

/// JSON-lines file sink: one self-contained JSON object per line
///
/// `record` returns only after the line has been synced to storage.
pub struct JsonlAuditSink {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonlAuditSink {
    /// Open (or create) the audit file in append mode, creating parent
    /// directories as needed
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), "audit log opened");

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, entry: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        // Whole line under one lock so concurrent requests never interleave
        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }
}

/// In-memory sink, for embedding and tests
#[derive(Clone, Default)]
pub struct MemoryAuditSink {
    records: Arc<std::sync::Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: &AuditRecord) -> Result<()> {
        match self.records.lock() {
            Ok(mut records) => records.push(entry.clone()),
            Err(poisoned) => poisoned.into_inner().push(entry.clone()),
        }
        Ok(())
    }
}
