mod config;

use std::fs::File;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ledgerflow_ingest::{
    load_csv, run_pipeline, CanonicalContext, RowPolicy, RuleEngine, SourceDefaults,
};
use ledgerflow_storage::{create_db, upsert_transactions};

use config::{Cli, Command, IngestArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ingest(args) => ingest(args).await,
    }
}

async fn ingest(args: IngestArgs) -> anyhow::Result<()> {
    let file = File::open(&args.file)
        .with_context(|| format!("cannot open {}", args.file.display()))?;

    let defaults = SourceDefaults {
        currency: args.currency,
        account_id: args.account_id,
        institution_name: args.institution,
    };
    // A malformed schema fails here, before the database is even opened.
    let batch = load_csv(file, &defaults).context("loading CSV")?;

    let import_batch_id = args.batch_id.unwrap_or_else(config::generate_batch_id);
    info!(
        batch = %import_batch_id,
        rows = batch.records.len(),
        rejected = batch.rejected.len(),
        "loaded csv"
    );

    let ctx = CanonicalContext {
        business_id: args.business_id,
        source: args.source,
        import_batch_id,
    };
    let policy = if args.strict {
        RowPolicy::Abort
    } else {
        RowPolicy::Skip
    };
    let report = run_pipeline(batch, &RuleEngine::new(), &ctx, policy, Utc::now())?;
    if !report.dropped.is_empty() {
        warn!(dropped = report.dropped.len(), "some rows were not ingested");
    }

    let pool = create_db(&args.db).await.context("opening database")?;
    let summary = upsert_transactions(&pool, &report.transactions).await?;
    pool.close().await;

    println!(
        "created={} updated={} skipped={}",
        summary.created, summary.updated, summary.skipped
    );
    if !report.dropped.is_empty() {
        println!("dropped={}", report.dropped.len());
    }
    Ok(())
}
