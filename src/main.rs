use address_import::{
    finalize, logging, preview_file, Config, EntityStore, FinalizeOutcome, SqliteStagingStore,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "address-import")]
#[command(about = "Validate, stage and import building/unit address CSV files")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a CSV file and stage the accepted rows for review
    Preview {
        /// CSV file with a header row
        csv_file: PathBuf,
    },
    /// Commit a staged batch into the property/unit store
    Finalize {
        /// Batch id printed by `preview`
        batch_id: String,
    },
}

fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Preview { csv_file } => run_preview(&cli.config, &csv_file),
        Commands::Finalize { batch_id } => run_finalize(&cli.config, &batch_id),
    }
}

fn run_preview(config: &Config, csv_file: &Path) -> Result<()> {
    let staging = SqliteStagingStore::open(&config.database)
        .with_context(|| format!("Failed to open database {:?}", config.database))?;
    let report = preview_file(csv_file, &staging)
        .with_context(|| format!("Failed to read CSV file {:?}", csv_file))?;

    println!("📂 Preview of {}", csv_file.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n✓ {} rows ready to import", report.rows.len());
    for summary in report.summaries() {
        println!("   {}", summary);
    }

    if !report.errors.is_empty() {
        println!("\n✗ {} rows rejected", report.errors.len());
        for error in &report.errors {
            println!("   {}", error);
        }
    }

    println!("\n📦 Batch: {}", report.batch_id);
    println!("   Run: address-import finalize {}", report.batch_id);

    Ok(())
}

fn run_finalize(config: &Config, batch_id: &str) -> Result<()> {
    let staging = SqliteStagingStore::open(&config.database)
        .with_context(|| format!("Failed to open database {:?}", config.database))?;
    let mut store = EntityStore::open(&config.database)
        .with_context(|| format!("Failed to open database {:?}", config.database))?;

    let outcome = finalize(&staging, &mut store, batch_id).context("Import failed")?;

    match outcome {
        FinalizeOutcome::Completed(summary) => {
            println!("💾 Import complete");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("✓ Imported: {}", summary.imported);
            println!("✓ Skipped (already imported): {}", summary.skipped);
            if !summary.errors.is_empty() {
                println!("\n✗ {} rows failed", summary.errors.len());
                for error in &summary.errors {
                    println!("   {}", error);
                }
            }
        }
        FinalizeOutcome::NothingToImport => {
            println!("{}", FinalizeOutcome::NothingToImport.message().unwrap_or_default());
        }
        FinalizeOutcome::NotFound => {
            eprintln!("❌ {}", FinalizeOutcome::NotFound.message().unwrap_or_default());
            std::process::exit(1);
        }
    }

    Ok(())
}
