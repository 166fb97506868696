// 🏢 Property Entity - a named building at one address
//
// Natural key for create-or-fetch: exact (name, address).
// Name alone is unique case-insensitively across the whole table.

use super::Resolution;
use crate::error::EntityError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl Property {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created_at_str: String = row.get(3)?;
        let address: Option<String> = row.get(2)?;

        Ok(Property {
            id: row.get(0)?,
            name: row.get(1)?,
            address: address.unwrap_or_default(),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

fn find_by_natural_key(
    conn: &Connection,
    name: &str,
    address: &str,
) -> Result<Option<Property>, EntityError> {
    let found = conn
        .query_row(
            "SELECT id, name, address, created_at FROM properties
             WHERE name = ?1 COLLATE BINARY AND address = ?2",
            params![name, address],
            Property::from_row,
        )
        .optional()?;
    Ok(found)
}

fn name_taken(conn: &Connection, name: &str) -> Result<bool, EntityError> {
    let taken = conn
        .query_row(
            "SELECT 1 FROM properties WHERE name = ?1",
            params![name],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(taken)
}

/// Reuse the property with this exact name and address, or create it
///
/// Errors:
/// - `Invalid` when the name is blank or taken (any case) by another address
/// - `Conflict` when the INSERT itself hits the unique index (racing writer)
pub fn find_or_create_property(
    conn: &Connection,
    name: &str,
    address: &str,
) -> Result<Resolution<Property>, EntityError> {
    if let Some(existing) = find_by_natural_key(conn, name, address)? {
        return Ok(Resolution::Existing(existing));
    }

    if name.trim().is_empty() {
        return Err(EntityError::Invalid("Name can't be blank".to_string()));
    }
    if name_taken(conn, name)? {
        return Err(EntityError::Invalid("Name has already been taken".to_string()));
    }

    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO properties (name, address, created_at) VALUES (?1, ?2, ?3)",
        params![name, address, created_at.to_rfc3339()],
    )?;

    Ok(Resolution::Created(Property {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        address: address.to_string(),
        created_at,
    }))
}

pub fn get_all_properties(conn: &Connection) -> crate::error::Result<Vec<Property>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, address, created_at FROM properties ORDER BY id",
    )?;

    let properties = stmt
        .query_map([], Property::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(properties)
}
