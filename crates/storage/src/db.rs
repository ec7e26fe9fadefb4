use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

/// Open (creating if missing) the SQLite database and run migrations.
///
/// A single connection serializes all writes, so same-key upserts within a
/// batch can never interleave; the pool exists for its lifecycle handling,
/// not for parallelism.
pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS canonical_transactions (
            business_id TEXT NOT NULL,
            provider_txn_id TEXT NOT NULL,
            transaction_id TEXT NOT NULL,
            account_id TEXT NOT NULL,
            posted_at TEXT NOT NULL,
            amount TEXT NOT NULL,
            currency TEXT NOT NULL,
            cashflow_type TEXT,
            category TEXT,
            vendor_name TEXT,
            raw_description TEXT NOT NULL,
            source TEXT NOT NULL,
            meta TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (business_id, provider_txn_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_canonical_txn_posted_at
        ON canonical_transactions (business_id, posted_at)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
