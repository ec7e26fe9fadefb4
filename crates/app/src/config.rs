use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ledgerflow", version, about = "Bank-transaction ingestion and classification")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a CSV export: classify every row and merge it into the store.
    Ingest(IngestArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// CSV file with a header row; `description`, `amount`, and `posted_at`
    /// (or `transacted_at`) columns are required.
    pub file: PathBuf,

    /// Business the transactions belong to.
    #[arg(long, env = "LEDGERFLOW_BUSINESS_ID", default_value = "demo-business-1")]
    pub business_id: String,

    /// Fallback account id for rows without one.
    #[arg(long, env = "LEDGERFLOW_ACCOUNT_ID", default_value = "bank-1")]
    pub account_id: String,

    /// Fallback institution name for rows without one.
    #[arg(long, env = "LEDGERFLOW_INSTITUTION", default_value = "demo-bank")]
    pub institution: String,

    /// Fallback currency for rows without one.
    #[arg(long, env = "LEDGERFLOW_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Ingestion-channel tag recorded on every transaction.
    #[arg(long, env = "LEDGERFLOW_SOURCE", default_value = "bank")]
    pub source: String,

    /// Import batch id; generated when absent.
    #[arg(long)]
    pub batch_id: Option<String>,

    /// SQLite database path.
    #[arg(long, env = "LEDGERFLOW_DB", default_value = "ledgerflow.db")]
    pub db: PathBuf,

    /// Abort the batch at the first bad row instead of skipping it.
    #[arg(long)]
    pub strict: bool,
}

/// `import_` plus the first 12 hex characters of a fresh UUIDv4.
pub fn generate_batch_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("import_{}", &hex[..12])
}
