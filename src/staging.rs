// 📦 Staging Store - validated rows parked between preview and finalize
//
// Batches are addressed only by an opaque id. Nothing is kept in memory
// between calls, so stage / retrieve / discard may run in different processes.

use crate::error::Result;
use crate::validator::NormalizedRow;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBatch {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub rows: Vec<NormalizedRow>,
}

/// JSON document stored in the payload column
#[derive(Debug, Serialize, Deserialize)]
struct BatchPayload {
    #[serde(default)]
    rows: Vec<NormalizedRow>,
}

/// Durable keyed store for staged batches
pub trait StagingStore {
    /// Persist rows and return a fresh, globally unique batch id
    fn stage(&self, rows: &[NormalizedRow]) -> Result<String>;

    /// Load a batch; `None` when the id is unknown
    fn retrieve(&self, batch_id: &str) -> Result<Option<StagedBatch>>;

    /// Delete a batch; unknown ids are not an error
    fn discard(&self, batch_id: &str) -> Result<()>;
}

// ============================================================================
// SQLITE IMPLEMENTATION
// ============================================================================

pub struct SqliteStagingStore {
    conn: Connection,
}

impl SqliteStagingStore {
    /// Open (or create) the staging table in the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_staging(&conn)?;
        Ok(SqliteStagingStore { conn })
    }

    /// Number of batches currently staged
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM import_batches", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub fn setup_staging(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS import_batches (
            id TEXT PRIMARY KEY NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_import_batches_created_at ON import_batches(created_at)",
        [],
    )?;

    Ok(())
}

impl StagingStore for SqliteStagingStore {
    fn stage(&self, rows: &[NormalizedRow]) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let payload = serde_json::to_string(&BatchPayload { rows: rows.to_vec() })?;
        let created_at = Utc::now();

        self.conn.execute(
            "INSERT INTO import_batches (id, payload, created_at) VALUES (?1, ?2, ?3)",
            params![id, payload, created_at.to_rfc3339()],
        )?;

        info!(batch_id = %id, rows = rows.len(), "batch staged");
        Ok(id)
    }

    fn retrieve(&self, batch_id: &str) -> Result<Option<StagedBatch>> {
        let found: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT payload, created_at FROM import_batches WHERE id = ?1",
                params![batch_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((payload_json, created_at_str)) = found else {
            debug!(batch_id, "batch not found");
            return Ok(None);
        };

        let payload: BatchPayload = serde_json::from_str(&payload_json)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Some(StagedBatch {
            id: batch_id.to_string(),
            created_at,
            rows: payload.rows,
        }))
    }

    fn discard(&self, batch_id: &str) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM import_batches WHERE id = ?1", params![batch_id])?;
        debug!(batch_id, removed, "batch discarded");
        Ok(())
    }
}
