// ✅ Validator/Normalizer - CSV rows → accepted rows + rejection messages
//
// Rows are processed strictly in file order. Every row ends up either
// accepted or rejected with exactly one reason:
//   missing fields → invalid zip → duplicate

use crate::address::build_address_display;
use crate::deduplication::{DedupeKey, DuplicateTracker};
use crate::error::Result;
use crate::states::normalize_state;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use tracing::{debug, info};

/// Data rows start on line 2 (line 1 is the header)
pub const HEADER_ROWS: usize = 1;

/// Symbolic header keys the importer reads
pub const FIELD_BUILDING_NAME: &str = "building_name";
pub const FIELD_STREET_ADDRESS: &str = "street_address";
pub const FIELD_UNIT: &str = "unit";
pub const FIELD_CITY: &str = "city";
pub const FIELD_STATE: &str = "state";
pub const FIELD_ZIP_CODE: &str = "zip_code";

// ============================================================================
// CORE TYPES
// ============================================================================

/// One CSV record before any normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub line_number: usize,
    pub building_name: String,
    pub street_address: String,
    pub unit: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl RawRow {
    /// Copy with every field trimmed
    fn trimmed(&self) -> RawRow {
        RawRow {
            line_number: self.line_number,
            building_name: self.building_name.trim().to_string(),
            street_address: self.street_address.trim().to_string(),
            unit: self.unit.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
        }
    }
}

/// A validated row, ready to be staged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub building_name: String,
    pub street_address: String,
    pub unit: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    /// Computed once here; finalize matches on it verbatim
    pub full_address: String,
}

impl NormalizedRow {
    /// One-line summary for the review screen
    pub fn summary(&self) -> String {
        format!("{}: {}", self.building_name, self.full_address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    MissingFields(Vec<String>),
    InvalidZip,
    Duplicate { first_line: usize },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingFields(fields) => {
                write!(f, "Missing required fields ({})", fields.join(", "))
            }
            RejectionReason::InvalidZip => {
                write!(f, "Invalid Zip Code (must be at least 5 digits and numbers only)")
            }
            RejectionReason::Duplicate { first_line } => {
                write!(f, "Duplicate entry (matches line {})", first_line)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub line_number: usize,
    pub display_address: String,
    pub reason: RejectionReason,
}

impl fmt::Display for RejectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}: \"{}\" {}",
            self.line_number, self.display_address, self.reason
        )
    }
}

/// Result of validating one file
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<NormalizedRow>,
    pub rejected: Vec<RejectionRecord>,
}

impl ValidationOutcome {
    /// Rendered rejection messages, in file order
    pub fn error_messages(&self) -> Vec<String> {
        self.rejected.iter().map(|r| r.to_string()).collect()
    }
}

// ============================================================================
// FIELD CHECKS
// ============================================================================

/// 5 or more ASCII digits, nothing else
pub fn is_valid_zip(zip: &str) -> bool {
    zip.len() >= 5 && zip.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Stateful per-file validator (holds the duplicate tracker)
#[derive(Debug, Default)]
pub struct Validator {
    tracker: DuplicateTracker,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate one row; call in file order
    pub fn validate_row(&mut self, raw: &RawRow) -> std::result::Result<NormalizedRow, RejectionRecord> {
        let row = raw.trimmed();
        let state = normalize_state(&row.state);

        let display_address = build_address_display(
            &row.street_address,
            &row.city,
            state.as_deref().unwrap_or(&row.state),
            &row.zip_code,
            &row.unit,
        );
        let reject = |reason: RejectionReason| RejectionRecord {
            line_number: row.line_number,
            display_address: display_address.clone(),
            reason,
        };

        // Rule 1: required fields (unit is never required)
        let mut missing = Vec::new();
        if row.building_name.is_empty() {
            missing.push("Building Name".to_string());
        }
        if row.street_address.is_empty() {
            missing.push("Street Address".to_string());
        }
        if row.city.is_empty() {
            missing.push("City".to_string());
        }
        if state.is_none() {
            missing.push("State".to_string());
        }
        if row.zip_code.is_empty() {
            missing.push("Zip Code".to_string());
        }
        let state = match state {
            Some(state) if missing.is_empty() => state,
            _ => return Err(reject(RejectionReason::MissingFields(missing))),
        };

        // Rule 2: zip format
        if !is_valid_zip(&row.zip_code) {
            return Err(reject(RejectionReason::InvalidZip));
        }

        // Rule 3: duplicate within this file
        let key = DedupeKey::new(
            &row.building_name,
            &row.street_address,
            &row.unit,
            &row.city,
            &state,
            &row.zip_code,
        );
        if let Some(first_line) = self.tracker.check_and_record(key, row.line_number) {
            return Err(reject(RejectionReason::Duplicate { first_line }));
        }

        let full_address = build_address_display(
            &row.street_address,
            &row.city,
            &state,
            &row.zip_code,
            &row.unit,
        );

        Ok(NormalizedRow {
            building_name: row.building_name,
            street_address: row.street_address,
            unit: if row.unit.is_empty() { None } else { Some(row.unit) },
            city: row.city,
            state,
            zip_code: row.zip_code,
            full_address,
        })
    }

    /// Validate every row, preserving order in both outputs
    pub fn validate_rows<I>(&mut self, rows: I) -> ValidationOutcome
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut outcome = ValidationOutcome::default();

        for raw in rows {
            match self.validate_row(&raw) {
                Ok(row) => outcome.accepted.push(row),
                Err(rejection) => {
                    debug!(line = rejection.line_number, reason = %rejection.reason, "row rejected");
                    outcome.rejected.push(rejection);
                }
            }
        }

        info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "validation complete"
        );
        outcome
    }
}

// ============================================================================
// CSV READING
// ============================================================================

/// Turn header text into a lookup key: "Building Name" → "building_name"
pub fn symbolize_header(header: &str) -> String {
    let cleaned: String = header
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Column positions for the six known fields
#[derive(Debug, Default)]
struct ColumnMap {
    building_name: Option<usize>,
    street_address: Option<usize>,
    unit: Option<usize>,
    city: Option<usize>,
    state: Option<usize>,
    zip_code: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = ColumnMap::default();

        // First matching column wins
        for (idx, header) in headers.iter().enumerate() {
            let slot = match symbolize_header(header).as_str() {
                FIELD_BUILDING_NAME => &mut map.building_name,
                FIELD_STREET_ADDRESS => &mut map.street_address,
                FIELD_UNIT => &mut map.unit,
                FIELD_CITY => &mut map.city,
                FIELD_STATE => &mut map.state,
                FIELD_ZIP_CODE => &mut map.zip_code,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(idx);
            }
        }

        map
    }

    fn field(record: &csv::StringRecord, idx: Option<usize>) -> String {
        idx.and_then(|i| record.get(i)).unwrap_or("").to_string()
    }

    fn raw_row(&self, record: &csv::StringRecord, line_number: usize) -> RawRow {
        RawRow {
            line_number,
            building_name: Self::field(record, self.building_name),
            street_address: Self::field(record, self.street_address),
            unit: Self::field(record, self.unit),
            city: Self::field(record, self.city),
            state: Self::field(record, self.state),
            zip_code: Self::field(record, self.zip_code),
        }
    }
}

/// Physical line numbers for records, counting the blank lines the
/// csv reader skips between them
struct LineTracker<'a> {
    data: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineTracker<'a> {
    fn new(data: &'a [u8]) -> Self {
        LineTracker { data, offset: 0, line: 1 }
    }

    fn advance_to(&mut self, end: usize) {
        let end = end.clamp(self.offset, self.data.len());
        self.line += self.data[self.offset..end].iter().filter(|b| **b == b'\n').count();
        self.offset = end;
    }

    /// Line of the first record at or after byte `from`
    fn record_start(&mut self, from: usize) -> usize {
        self.advance_to(from);
        let blanks = self.data[self.offset..]
            .iter()
            .take_while(|b| **b == b'\n' || **b == b'\r')
            .count();
        self.advance_to(self.offset + blanks);
        self.line
    }
}

/// Read all data rows from a CSV source with a header row
///
/// Line numbers are the physical line a record starts on, so blank lines
/// (which the reader drops) still advance the count.
pub fn read_rows<R: Read>(mut reader: R) -> Result<Vec<RawRow>> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&data);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let columns = ColumnMap::from_headers(rdr.headers()?);
    let mut lines = LineTracker::new(data);
    let mut record_end = rdr.position().byte() as usize;

    let mut rows = Vec::new();
    let mut record = csv::StringRecord::new();
    while rdr.read_record(&mut record)? {
        let line_number = lines.record_start(record_end);
        record_end = rdr.position().byte() as usize;
        rows.push(columns.raw_row(&record, line_number));
    }

    Ok(rows)
}

/// Read and validate a whole CSV source
pub fn validate_csv<R: Read>(reader: R) -> Result<ValidationOutcome> {
    let rows = read_rows(reader)?;
    Ok(Validator::new().validate_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "building_name,street_address,unit,city,state,zip_code\n";

    fn validate(body: &str) -> ValidationOutcome {
        validate_csv(format!("{}{}", HEADER, body).as_bytes()).unwrap()
    }

    #[test]
    fn test_accepts_clean_row() {
        let outcome = validate("Tower A,1 Main St,4B,Boston,MA,02134\n");

        assert_eq!(outcome.rejected.len(), 0);
        assert_eq!(outcome.accepted.len(), 1);

        let row = &outcome.accepted[0];
        assert_eq!(row.building_name, "Tower A");
        assert_eq!(row.unit.as_deref(), Some("4B"));
        assert_eq!(row.state, "Massachusetts");
        assert_eq!(row.full_address, "1 Main St, Boston, Massachusetts 02134 Unit 4B");
    }

    #[test]
    fn test_trims_fields_and_blank_unit_is_none() {
        let outcome = validate("  Tower A , 1 Main St ,  , Boston , ma , 02134 \n");

        let row = &outcome.accepted[0];
        assert_eq!(row.building_name, "Tower A");
        assert_eq!(row.street_address, "1 Main St");
        assert_eq!(row.unit, None);
        assert_eq!(row.full_address, "1 Main St, Boston, Massachusetts 02134");
    }

    #[test]
    fn test_missing_fields_listed_in_one_message() {
        let outcome = validate(",1 Main St,,,ZZ,02134\n");

        assert_eq!(outcome.accepted.len(), 0);
        assert_eq!(
            outcome.error_messages(),
            vec![r#"Line 2: "1 Main St, ZZ 02134" Missing required fields (Building Name, City, State)"#]
        );
    }

    #[test]
    fn test_all_blank_row_is_unknown_address() {
        let outcome = validate(",,,,,\n");

        assert_eq!(
            outcome.error_messages(),
            vec![r#"Line 2: "Unknown address" Missing required fields (Building Name, Street Address, City, State, Zip Code)"#]
        );
    }

    #[test]
    fn test_missing_fields_short_circuits_zip_check() {
        let outcome = validate("Tower,1 Main St,,,TX,12a\n");

        assert_eq!(outcome.rejected.len(), 1);
        assert!(matches!(outcome.rejected[0].reason, RejectionReason::MissingFields(_)));
    }

    #[test]
    fn test_zip_validation() {
        assert!(is_valid_zip("02134"));
        assert!(is_valid_zip("021345678"));
        assert!(!is_valid_zip("1234"));
        assert!(!is_valid_zip("12a45"));
        assert!(!is_valid_zip(""));
        assert!(!is_valid_zip("02134-5678"));
        assert!(!is_valid_zip("０２１３４"));
    }

    #[test]
    fn test_invalid_zip_message() {
        let outcome = validate("Tower,1 Main St,,Austin,TX,7870\n");

        assert_eq!(
            outcome.error_messages(),
            vec![r#"Line 2: "1 Main St, Austin, Texas 7870" Invalid Zip Code (must be at least 5 digits and numbers only)"#]
        );
    }

    #[test]
    fn test_duplicate_after_state_and_case_normalization() {
        let outcome = validate(
            "BldgX,\"1 Main St\",,\"Town\",\"ca\",\"02134\"\n\
             BldgX,\"1 Main St\",,\"town\",\"California\",\"02134\"\n",
        );

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(
            outcome.error_messages(),
            vec![r#"Line 3: "1 Main St, town, California 02134" Duplicate entry (matches line 2)"#]
        );
    }

    #[test]
    fn test_duplicate_cites_first_occurrence() {
        let outcome = validate(
            "B,1 Main St,1,Town,TX,75001\n\
             B,1 Main St,2,Town,TX,75001\n\
             B,1 Main St,1,Town,TX,75001\n\
             b,1 MAIN ST,1,TOWN,texas,75001\n",
        );

        assert_eq!(outcome.accepted.len(), 2);
        let cited: Vec<_> = outcome
            .rejected
            .iter()
            .map(|r| (r.line_number, r.reason.clone()))
            .collect();
        assert_eq!(
            cited,
            vec![
                (4, RejectionReason::Duplicate { first_line: 2 }),
                (5, RejectionReason::Duplicate { first_line: 2 }),
            ]
        );
    }

    #[test]
    fn test_unit_vs_no_unit_not_duplicate() {
        let outcome = validate(
            "B,1 Main St,,Town,TX,75001\n\
             B,1 Main St,1,Town,TX,75001\n",
        );
        assert_eq!(outcome.accepted.len(), 2);
    }

    #[test]
    fn test_invalid_row_does_not_claim_dedupe_key() {
        let outcome = validate(
            "B,1 Main St,,Town,TX,7500\n\
             B,1 Main St,,Town,TX,75001\n",
        );
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn test_every_row_accounted_for_in_order() {
        let body = "A,1 St,,Town,TX,75001\n\
                    ,2 St,,Town,TX,75001\n\
                    C,3 St,,Town,TX,7500x\n\
                    A,1 St,,Town,TX,75001\n\
                    E,5 St,,Town,OK,73001\n";
        let outcome = validate(body);

        assert_eq!(outcome.accepted.len() + outcome.rejected.len(), 5);

        let rejected_lines: Vec<usize> = outcome.rejected.iter().map(|r| r.line_number).collect();
        assert_eq!(rejected_lines, vec![3, 4, 5]);
        let accepted: Vec<&str> = outcome.accepted.iter().map(|r| r.street_address.as_str()).collect();
        assert_eq!(accepted, vec!["1 St", "5 St"]);
    }

    #[test]
    fn test_line_numbers_survive_blank_lines() {
        let outcome = validate(
            "A,1 St,,Town,TX,75001\n\
             \n\
             B,2 St,,Town,TX,7500\n\
             \n\
             \n\
             A,1 St,,Town,TX,75001\n",
        );

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(
            outcome.error_messages(),
            vec![
                r#"Line 4: "2 St, Town, Texas 7500" Invalid Zip Code (must be at least 5 digits and numbers only)"#,
                r#"Line 7: "1 St, Town, Texas 75001" Duplicate entry (matches line 2)"#,
            ]
        );
    }

    #[test]
    fn test_line_numbers_with_crlf_and_quoted_newlines() {
        let csv = "building_name,street_address,unit,city,state,zip_code\r\n\
                   \"Tower\nNorth\",1 St,,Town,TX,75001\r\n\
                   \r\n\
                   B,2 St,,Town,TX,7500\r\n";
        let rows = read_rows(csv.as_bytes()).unwrap();

        let lines: Vec<usize> = rows.iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![2, 5]);
    }

    #[test]
    fn test_headers_matched_symbolically() {
        let csv = "Zip Code, Building Name ,STATE,City,Street Address,Notes\n\
                   02134,Tower,MA,Boston,1 Main St,ignored\n";
        let outcome = validate_csv(csv.as_bytes()).unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].building_name, "Tower");
        assert_eq!(outcome.accepted[0].unit, None);
    }

    #[test]
    fn test_missing_column_fails_every_row() {
        let csv = "building_name,street_address,city,state\n\
                   Tower,1 Main St,Boston,MA\n\
                   Other,2 Main St,Boston,MA\n";
        let outcome = validate_csv(csv.as_bytes()).unwrap();

        assert_eq!(outcome.accepted.len(), 0);
        assert!(outcome
            .error_messages()
            .iter()
            .all(|m| m.ends_with("Missing required fields (Zip Code)")));
    }

    #[test]
    fn test_short_record_tolerated() {
        let csv = format!("{}Tower,1 Main St\n", HEADER);
        let outcome = validate_csv(csv.as_bytes()).unwrap();
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn test_symbolize_header() {
        assert_eq!(symbolize_header("Building Name"), "building_name");
        assert_eq!(symbolize_header("  ZIP   code "), "zip_code");
        assert_eq!(symbolize_header("State:"), "state");
        assert_eq!(symbolize_header("street_address"), "street_address");
    }

    #[test]
    fn test_display_uses_raw_state_when_unresolved() {
        let outcome = validate("Tower,1 Main St,,Town,Narnia,02134\n");
        assert_eq!(outcome.rejected[0].display_address, "1 Main St, Town, Narnia 02134");
    }
}
