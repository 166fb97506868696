// 🧾 Finalizer - commit a staged batch into the property/unit store
//
// One SQLite transaction wraps the whole batch. Each row runs inside its own
// savepoint: a failed row is rolled back on its own and recorded, the rest
// of the batch carries on. Store-unavailable errors abort everything and
// leave the staged batch in place.

use crate::entities::{find_or_create_property, find_or_create_unit, setup_entities};
use crate::error::{EntityError, ImportError, Result};
use crate::staging::StagingStore;
use crate::validator::NormalizedRow;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Rows whose property was created or reused
    pub imported: usize,
    /// Rows lost to a uniqueness race with another writer
    pub skipped: usize,
    /// "{full_address}: {message}" per failed row
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizeOutcome {
    NotFound,
    NothingToImport,
    Completed(ImportSummary),
}

impl FinalizeOutcome {
    /// User-facing text for the terminal outcomes
    pub fn message(&self) -> Option<&'static str> {
        match self {
            FinalizeOutcome::NotFound => Some("Import batch not found. Please upload again."),
            FinalizeOutcome::NothingToImport => Some("Nothing to import."),
            FinalizeOutcome::Completed(_) => None,
        }
    }
}

enum RowOutcome {
    Imported,
    Skipped,
    Failed(String),
}

// ============================================================================
// ENTITY STORE HANDLE
// ============================================================================

/// Owns the connection the property/unit tables live in
pub struct EntityStore {
    conn: Connection,
}

impl EntityStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_entities(&conn)?;
        Ok(EntityStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ============================================================================
// FINALIZE
// ============================================================================

/// Commit the staged batch `batch_id`
///
/// Not-found and empty batches are reported without touching either store.
pub fn finalize<S: StagingStore + ?Sized>(
    staging: &S,
    store: &mut EntityStore,
    batch_id: &str,
) -> Result<FinalizeOutcome> {
    let Some(batch) = staging.retrieve(batch_id)? else {
        info!(batch_id, "finalize: batch not found");
        return Ok(FinalizeOutcome::NotFound);
    };

    if batch.rows.is_empty() {
        info!(batch_id, "finalize: nothing to import");
        return Ok(FinalizeOutcome::NothingToImport);
    }

    let summary = commit_rows(&mut store.conn, &batch.rows)?;
    staging.discard(batch_id)?;

    info!(
        batch_id,
        imported = summary.imported,
        skipped = summary.skipped,
        errors = summary.errors.len(),
        "finalize complete"
    );
    Ok(FinalizeOutcome::Completed(summary))
}

/// Run every row inside one transaction, isolating row failures
pub fn commit_rows(conn: &mut Connection, rows: &[NormalizedRow]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut tx = conn.transaction()?;

    for row in rows {
        let mut sp = tx.savepoint()?;

        match import_row(&sp, row) {
            Ok(()) => {
                sp.commit()?;
                record(&mut summary, row, RowOutcome::Imported);
            }
            Err(err) if err.is_fatal() => {
                // Dropping the savepoint and transaction rolls everything back
                return Err(ImportError::Unavailable(err.to_string()));
            }
            Err(EntityError::Conflict) => {
                sp.rollback()?;
                record(&mut summary, row, RowOutcome::Skipped);
            }
            Err(err) => {
                sp.rollback()?;
                record(&mut summary, row, RowOutcome::Failed(err.to_string()));
            }
        }
    }

    tx.commit()?;
    Ok(summary)
}

fn import_row(conn: &Connection, row: &NormalizedRow) -> std::result::Result<(), EntityError> {
    let property = find_or_create_property(conn, &row.building_name, &row.full_address)?;
    debug!(created = property.was_created(), name = %row.building_name, "property resolved");
    let property = property.into_inner();

    if let Some(number) = row.unit.as_deref().filter(|n| !n.is_empty()) {
        find_or_create_unit(conn, property.id, number)?;
    }

    Ok(())
}

fn record(summary: &mut ImportSummary, row: &NormalizedRow, outcome: RowOutcome) {
    match outcome {
        RowOutcome::Imported => summary.imported += 1,
        RowOutcome::Skipped => {
            warn!(address = %row.full_address, "row skipped: natural key taken by another writer");
            summary.skipped += 1;
        }
        RowOutcome::Failed(message) => {
            warn!(address = %row.full_address, error = %message, "row failed");
            summary.errors.push(format!("{}: {}", row.full_address, message));
        }
    }
}
