// 🔍 Deduplication - detect repeated rows within one file
// Exact match on a case-insensitive composite key, first occurrence wins

use std::collections::HashMap;

/// Stand-in for a blank unit so "no unit" never collides with a real unit value
pub const NO_UNIT_SENTINEL: &str = "__NO_UNIT__";

// ============================================================================
// COMPOSITE KEY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey(String);

impl DedupeKey {
    /// Build the key from trimmed fields and the normalized state
    pub fn new(
        building_name: &str,
        street_address: &str,
        unit: &str,
        city: &str,
        state: &str,
        zip_code: &str,
    ) -> Self {
        let unit = if unit.is_empty() {
            NO_UNIT_SENTINEL.to_string()
        } else {
            unit.to_lowercase()
        };

        DedupeKey(
            [
                building_name.to_lowercase(),
                street_address.to_lowercase(),
                unit,
                city.to_lowercase(),
                state.to_lowercase(),
                zip_code.to_string(),
            ]
            .join("|"),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// DUPLICATE TRACKER
// ============================================================================

/// Remembers the first line each key was seen on
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    seen: HashMap<DedupeKey, usize>,
}

impl DuplicateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` at `line_number`
    ///
    /// Returns `Some(first_line)` if the key was already seen; the earlier
    /// mapping is kept untouched in that case.
    pub fn check_and_record(&mut self, key: DedupeKey, line_number: usize) -> Option<usize> {
        if let Some(first_line) = self.seen.get(&key) {
            return Some(*first_line);
        }
        self.seen.insert(key, line_number);
        None
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
