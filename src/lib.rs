// Address Import - Core Library
// Exposes the preview/finalize pipeline for the CLI, API server and tests

pub mod address;
pub mod config;
pub mod deduplication;
pub mod entities;
pub mod error;
pub mod finalizer;
pub mod importer;
pub mod logging;
pub mod staging;
pub mod states;
pub mod validator;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use address::build_address_display;
pub use config::Config;
pub use deduplication::{DedupeKey, DuplicateTracker};
pub use entities::{
    find_or_create_property, find_or_create_unit, setup_entities, Property, Resolution, Unit,
};
pub use error::{EntityError, ImportError, Result};
pub use finalizer::{finalize, EntityStore, FinalizeOutcome, ImportSummary};
pub use importer::{preview, preview_file, PreviewReport};
pub use staging::{SqliteStagingStore, StagedBatch, StagingStore};
pub use states::normalize_state;
pub use validator::{
    is_valid_zip, validate_csv, NormalizedRow, RawRow, RejectionReason, RejectionRecord,
    ValidationOutcome, Validator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
