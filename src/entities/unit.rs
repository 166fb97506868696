// 🚪 Unit Entity - numbered unit inside a property

use super::Resolution;
use crate::error::EntityError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    pub property_id: i64,
    pub number: String,
    pub created_at: DateTime<Utc>,
}

impl Unit {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created_at_str: String = row.get(3)?;

        Ok(Unit {
            id: row.get(0)?,
            property_id: row.get(1)?,
            number: row.get(2)?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

/// Reuse unit `number` under `property_id`, or create it
pub fn find_or_create_unit(
    conn: &Connection,
    property_id: i64,
    number: &str,
) -> Result<Resolution<Unit>, EntityError> {
    let existing = conn
        .query_row(
            "SELECT id, property_id, number, created_at FROM units
             WHERE property_id = ?1 AND number = ?2",
            params![property_id, number],
            Unit::from_row,
        )
        .optional()?;
    if let Some(unit) = existing {
        return Ok(Resolution::Existing(unit));
    }

    if number.trim().is_empty() {
        return Err(EntityError::Invalid("Number can't be blank".to_string()));
    }

    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO units (property_id, number, created_at) VALUES (?1, ?2, ?3)",
        params![property_id, number, created_at.to_rfc3339()],
    )?;

    Ok(Resolution::Created(Unit {
        id: conn.last_insert_rowid(),
        property_id,
        number: number.to_string(),
        created_at,
    }))
}

pub fn get_units_for_property(conn: &Connection, property_id: i64) -> crate::error::Result<Vec<Unit>> {
    let mut stmt = conn.prepare(
        "SELECT id, property_id, number, created_at FROM units
         WHERE property_id = ?1
         ORDER BY id",
    )?;

    let units = stmt
        .query_map(params![property_id], Unit::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(units)
}
