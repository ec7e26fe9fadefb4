pub mod db;
pub mod writer;

pub use db::{create_db, DbPool};
pub use writer::{upsert_transactions, StorageError, UpsertSummary};
