// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! SQL-backed storage for the Ledger, built on `sqlx` against SQLite.
//!
//! [`LedgerStorage`] is a synchronous trait — the Ledger and Approval
//! Registry are plain data structures with no opinion on async. `sqlx`'s
//! driver is async-only, so [`SqlStorage`] bridges the two with
//! `tokio::task::block_in_place` + `Handle::block_on`, which is only valid
//! from a worker thread of a multi-threaded Tokio runtime — the same
//! requirement [`gavel_core::AsyncControlPlane`] already places on its
//! caller. Constructing a [`SqlStorage`] outside such a runtime panics on
//! first use rather than deadlocking silently.
//!
//! ## Schema
//!
//! One append-only table:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS audit_events (
//!     id                  TEXT PRIMARY KEY,
//!     created_at          TEXT NOT NULL,
//!     actor_id            TEXT NOT NULL,
//!     action_type         TEXT NOT NULL,
//!     intent_payload      TEXT NOT NULL,
//!     policy_version      TEXT NOT NULL,
//!     event_hash          TEXT NOT NULL,
//!     previous_event_hash TEXT NOT NULL UNIQUE
//! );
//! CREATE INDEX IF NOT EXISTS idx_audit_events_created_at ON audit_events(created_at);
//! CREATE INDEX IF NOT EXISTS idx_audit_events_actor_id    ON audit_events(actor_id);
//! CREATE INDEX IF NOT EXISTS idx_audit_events_action_type ON audit_events(action_type);
//! ```
//!
//! The unique index on `previous_event_hash` enforces (I1) — no two rows may
//! share a predecessor. Mutation is blocked by triggers rather than
//! convention, per the ledger's immutability interlock:
//!
//! ```sql
//! CREATE TRIGGER IF NOT EXISTS audit_events_no_update
//!     BEFORE UPDATE ON audit_events
//!     BEGIN SELECT RAISE(ABORT, 'audit_events is append-only'); END;
//! CREATE TRIGGER IF NOT EXISTS audit_events_no_delete
//!     BEFORE DELETE ON audit_events
//!     BEGIN SELECT RAISE(ABORT, 'audit_events is append-only'); END;
//! ```
//!
//! Every `insert` runs inside a `BEGIN IMMEDIATE` transaction so the tip
//! read and the row write are atomic with respect to other connections,
//! matching the serialization requirement on the Ledger tip.

use gavel_core::error::LedgerError;
use gavel_core::storage::LedgerStorage;
use gavel_core::types::{AuditEvent, AuditFilter};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tokio::runtime::Handle;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audit_events (
    id                  TEXT PRIMARY KEY,
    created_at          TEXT NOT NULL,
    actor_id            TEXT NOT NULL,
    action_type         TEXT NOT NULL,
    intent_payload      TEXT NOT NULL,
    policy_version      TEXT NOT NULL,
    event_hash          TEXT NOT NULL,
    previous_event_hash TEXT NOT NULL UNIQUE
);
CREATE INDEX IF NOT EXISTS idx_audit_events_created_at ON audit_events(created_at);
CREATE INDEX IF NOT EXISTS idx_audit_events_actor_id    ON audit_events(actor_id);
CREATE INDEX IF NOT EXISTS idx_audit_events_action_type ON audit_events(action_type);
CREATE TRIGGER IF NOT EXISTS audit_events_no_update
    BEFORE UPDATE ON audit_events
    BEGIN SELECT RAISE(ABORT, 'audit_events is append-only'); END;
CREATE TRIGGER IF NOT EXISTS audit_events_no_delete
    BEFORE DELETE ON audit_events
    BEGIN SELECT RAISE(ABORT, 'audit_events is append-only'); END;
"#;

/// SQLite-backed [`LedgerStorage`], reached through an `sqlx::SqlitePool`.
pub struct SqlStorage {
    pool: SqlitePool,
}

impl SqlStorage {
    /// Connect to `database_url` (e.g. `sqlite://gavel.db`) and ensure the
    /// schema exists. Must be called from within a Tokio runtime.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|error| {
                tracing::error!(database_url, %error, "failed to connect to ledger database");
                error
            })?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        tracing::info!(database_url, "ledger database schema ready");
        Ok(Self { pool })
    }

    fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        tokio::task::block_in_place(|| Handle::current().block_on(fut))
    }

    async fn tip_async(&self) -> Option<AuditEvent> {
        let row = sqlx::query(
            "SELECT id, created_at, actor_id, action_type, intent_payload, policy_version, \
             event_hash, previous_event_hash FROM audit_events \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()?;
        Some(row_to_event(&row))
    }

    async fn insert_async(&self, event: AuditEvent) -> Result<(), LedgerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::Storage(format!("begin transaction: {e}")))?;

        sqlx::query("INSERT INTO audit_events (id, created_at, actor_id, action_type, intent_payload, policy_version, event_hash, previous_event_hash) VALUES (?, ?, ?, ?, ?, ?, ?, ?)")
            .bind(event.id.to_string())
            .bind(gavel_core::hash::canonical_timestamp(&event.created_at))
            .bind(&event.actor_id)
            .bind(&event.action_type)
            .bind(gavel_core::hash::canonical_json(&event.intent_payload))
            .bind(&event.policy_version)
            .bind(&event.event_hash)
            .bind(&event.previous_event_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    tracing::warn!(event_id = %event.id, "rejected insert: duplicate event id or chain fork");
                    LedgerError::Storage("duplicate event id or chain fork".into())
                }
                other => {
                    tracing::error!(event_id = %event.id, error = %other, "ledger insert failed");
                    LedgerError::Storage(format!("insert failed: {other}"))
                }
            })?;

        tx.commit()
            .await
            .map_err(|e| LedgerError::Storage(format!("commit failed: {e}")))
    }

    async fn get_by_id_async(&self, id: Uuid) -> Option<AuditEvent> {
        let row = sqlx::query(
            "SELECT id, created_at, actor_id, action_type, intent_payload, policy_version, \
             event_hash, previous_event_hash FROM audit_events WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()?;
        Some(row_to_event(&row))
    }

    async fn all_ordered_async(&self) -> Vec<AuditEvent> {
        sqlx::query(
            "SELECT id, created_at, actor_id, action_type, intent_payload, policy_version, \
             event_hash, previous_event_hash FROM audit_events ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .iter()
        .map(row_to_event)
        .collect()
    }

    async fn list_async(&self, filter: &AuditFilter, page: usize, size: usize) -> Vec<AuditEvent> {
        // SQLite stores the canonical timestamp text, which sorts lexically
        // identical to chronological order for RFC 3339 with a fixed-width
        // millisecond field, so filtering and paging can happen in SQL.
        let mut query = String::from(
            "SELECT id, created_at, actor_id, action_type, intent_payload, policy_version, \
             event_hash, previous_event_hash FROM audit_events WHERE 1=1",
        );
        if filter.actor_id.is_some() {
            query.push_str(" AND actor_id = ?");
        }
        if filter.action_type.is_some() {
            query.push_str(" AND action_type = ?");
        }
        if filter.since.is_some() {
            query.push_str(" AND created_at >= ?");
        }
        if filter.until.is_some() {
            query.push_str(" AND created_at <= ?");
        }
        query.push_str(" ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?");

        let mut q = sqlx::query(&query);
        if let Some(actor_id) = &filter.actor_id {
            q = q.bind(actor_id);
        }
        if let Some(action_type) = &filter.action_type {
            q = q.bind(action_type);
        }
        if let Some(since) = filter.since {
            q = q.bind(gavel_core::hash::canonical_timestamp(&since));
        }
        if let Some(until) = filter.until {
            q = q.bind(gavel_core::hash::canonical_timestamp(&until));
        }
        let offset = page.saturating_sub(1).saturating_mul(size);
        q = q.bind(size as i64).bind(offset as i64);

        q.fetch_all(&self.pool)
            .await
            .unwrap_or_default()
            .iter()
            .map(row_to_event)
            .collect()
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> AuditEvent {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    AuditEvent {
        id: Uuid::parse_str(&id).expect("ids are stored as valid UUIDs"),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .expect("created_at stored in canonical RFC 3339 form")
            .with_timezone(&chrono::Utc),
        actor_id: row.get("actor_id"),
        action_type: row.get("action_type"),
        intent_payload: serde_json::from_str(&row.get::<String, _>("intent_payload"))
            .expect("intent_payload stored as valid JSON"),
        policy_version: row.get("policy_version"),
        event_hash: row.get("event_hash"),
        previous_event_hash: row.get("previous_event_hash"),
    }
}

impl LedgerStorage for SqlStorage {
    fn tip(&self) -> Option<AuditEvent> {
        self.block_on(self.tip_async())
    }

    fn insert(&mut self, event: AuditEvent) -> Result<(), LedgerError> {
        self.block_on(self.insert_async(event))
    }

    fn get_by_id(&self, id: Uuid) -> Option<AuditEvent> {
        self.block_on(self.get_by_id_async(id))
    }

    fn all_ordered(&self) -> Vec<AuditEvent> {
        self.block_on(self.all_ordered_async())
    }

    fn list(&self, filter: &AuditFilter, page: usize, size: usize) -> Vec<AuditEvent> {
        self.block_on(self.list_async(filter, page, size))
    }
}
