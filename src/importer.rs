// 📥 Importer - validate a CSV upload and stage the accepted rows for review

use crate::error::Result;
use crate::staging::StagingStore;
use crate::validator::{validate_csv, NormalizedRow};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// What the review screen shows before the user confirms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewReport {
    pub batch_id: String,
    pub rows: Vec<NormalizedRow>,
    /// Rendered rejection messages, in file order
    pub errors: Vec<String>,
}

impl PreviewReport {
    pub fn summaries(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.summary()).collect()
    }
}

/// Validate `reader` and stage the accepted rows
///
/// A batch is staged even when no row was accepted; finalize then
/// reports that there is nothing to import.
pub fn preview<R, S>(reader: R, staging: &S) -> Result<PreviewReport>
where
    R: Read,
    S: StagingStore + ?Sized,
{
    let outcome = validate_csv(reader)?;
    let errors = outcome.error_messages();
    let batch_id = staging.stage(&outcome.accepted)?;

    info!(
        batch_id = %batch_id,
        rows = outcome.accepted.len(),
        errors = errors.len(),
        "preview staged"
    );

    Ok(PreviewReport {
        batch_id,
        rows: outcome.accepted,
        errors,
    })
}

pub fn preview_file<S: StagingStore + ?Sized>(path: &Path, staging: &S) -> Result<PreviewReport> {
    let file = File::open(path)?;
    preview(file, staging)
}
