// Entity Store - Property / Unit create-or-fetch by natural key
//
// Each entity has:
// - Surrogate id (INTEGER PRIMARY KEY)
// - Natural key used for create-or-fetch (name+address, property+number)
// - Unique indexes so a racing writer surfaces as EntityError::Conflict

pub mod property;
pub mod unit;

pub use property::{find_or_create_property, get_all_properties, Property};
pub use unit::{find_or_create_unit, get_units_for_property, Unit};

use crate::error::Result;
use rusqlite::Connection;

/// Result of a create-or-fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Created(T),
    Existing(T),
}

impl<T> Resolution<T> {
    pub fn was_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Resolution::Created(value) | Resolution::Existing(value) => value,
        }
    }
}

pub fn setup_entities(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Properties (name unique, case-insensitive)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS properties (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL COLLATE NOCASE,
            address TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Units (number unique per property)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
            number TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_properties_name ON properties(name)",
        [],
    )?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_units_property_number ON units(property_id, number)",
        [],
    )?;

    Ok(())
}

/// Count rows in the entity tables: (properties, units)
pub fn entity_counts(conn: &Connection) -> Result<(i64, i64)> {
    let properties: i64 = conn.query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))?;
    let units: i64 = conn.query_row("SELECT COUNT(*) FROM units", [], |row| row.get(0))?;
    Ok((properties, units))
}
