// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! File-based JSON storage backend for the Ledger.
//!
//! [`FileStorage`] persists the full event chain to a single JSON file.
//! Every mutation flushes the file atomically (write-rename) so a crash
//! mid-write never leaves a partial file.
//!
//! ## Caveats
//!
//! * Holds the full chain in memory and rewrites the entire file on every
//!   `insert`. Not intended for high-frequency write workloads or chains
//!   that outgrow available memory — see [`crate::sql`] for that case.
//! * Concurrent access from multiple processes is not supported. A single
//!   `FileStorage` instance is the only writer a deployment should run.

use std::io;
use std::path::{Path, PathBuf};

use gavel_core::error::LedgerError;
use gavel_core::storage::LedgerStorage;
use gavel_core::types::AuditEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of the full event chain, serialized to / deserialized from disk.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageSnapshot {
    events: Vec<AuditEvent>,
}

/// A file-backed [`LedgerStorage`] implementation that persists events as
/// JSON.
///
/// # Examples
///
/// ```rust,no_run
/// use gavel_storage::FileStorage;
/// use gavel_core::Ledger;
///
/// let storage = FileStorage::open("/var/lib/gavel/ledger.json")
///     .expect("failed to open ledger file");
/// let ledger = Ledger::new(storage);
/// ```
pub struct FileStorage {
    path: PathBuf,
    data: StorageSnapshot,
}

impl FileStorage {
    /// Open an existing JSON storage file, or create a new empty one if the
    /// path does not exist.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if the file exists but cannot be read or if
    /// the JSON is malformed.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw).map_err(|error| {
                tracing::error!(path = %path.display(), %error, "ledger storage file is corrupt");
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("ledger storage JSON parse error: {error}"),
                )
            })?
        } else {
            tracing::info!(path = %path.display(), "no ledger storage file found, starting empty");
            StorageSnapshot::default()
        };

        Ok(Self { path, data })
    }

    /// Flush the current in-memory chain to disk using an atomic
    /// write-rename.
    ///
    /// The file is written to `<path>.tmp` first, then renamed over the
    /// target, so a crash during the write never leaves a partial file.
    fn flush(&self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.data).map_err(|error| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("ledger storage serialization error: {error}"),
            )
        })?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json).map_err(|error| {
            tracing::error!(path = %self.path.display(), %error, "failed to write ledger snapshot");
            error
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|error| {
            tracing::error!(path = %self.path.display(), %error, "failed to rename ledger snapshot into place");
            error
        })?;
        Ok(())
    }
}

impl LedgerStorage for FileStorage {
    fn tip(&self) -> Option<AuditEvent> {
        self.data.events.last().cloned()
    }

    fn insert(&mut self, event: AuditEvent) -> Result<(), LedgerError> {
        if self.data.events.iter().any(|e| e.id == event.id) {
            tracing::warn!(event_id = %event.id, "rejected insert of duplicate event id");
            return Err(LedgerError::Storage("duplicate event id".into()));
        }
        self.data.events.push(event);
        self.flush()
            .map_err(|error| LedgerError::Storage(format!("flush failed: {error}")))?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> Option<AuditEvent> {
        self.data.events.iter().find(|e| e.id == id).cloned()
    }

    fn all_ordered(&self) -> Vec<AuditEvent> {
        self.data.events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_core::Ledger;

    #[test]
    fn open_creates_empty_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.tip().is_none());
    }

    #[test]
    fn append_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            let mut ledger = Ledger::new(storage);
            ledger
                .append("agent:a", "INBOUND_INTENT", serde_json::json!({"content": "x"}), "v1")
                .unwrap();
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.all_ordered().len(), 1);
        assert!(reopened.tip().is_some());
    }

    #[test]
    fn reopened_chain_still_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            let mut ledger = Ledger::new(storage);
            for i in 0..5 {
                ledger
                    .append(
                        "agent:a",
                        "INBOUND_INTENT",
                        serde_json::json!({"content": format!("file-{i}")}),
                        "v1",
                    )
                    .unwrap();
            }
        }

        let reopened = FileStorage::open(&path).unwrap();
        let ledger = Ledger::new(reopened);
        assert!(ledger.verify().chain_valid);
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        use chrono::Utc;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut storage = FileStorage::open(&path).unwrap();

        let event = AuditEvent {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            actor_id: "agent:a".into(),
            action_type: "INBOUND_INTENT".into(),
            intent_payload: serde_json::json!({}),
            policy_version: "v1".into(),
            event_hash: "deadbeef".into(),
            previous_event_hash: "GENESIS".into(),
        };
        storage.insert(event.clone()).unwrap();

        assert!(storage.insert(event).is_err());
    }
}
