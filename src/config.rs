// ⚙️ Configuration - command line flags with environment fallbacks

use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "address_import.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Settings shared by the CLI and the server
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// SQLite database holding staged batches, properties and units
    #[arg(long, short = 'd', env = "ADDRESS_IMPORT_DB", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,
}
