use thiserror::Error;

use ledgerflow_core::CanonicalTransaction;

use crate::db::DbPool;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Meta serialization failed: {0}")]
    Meta(#[from] serde_json::Error),
    #[error("Uniqueness conflict for ({business_id}, {provider_txn_id})")]
    Conflict {
        business_id: String,
        provider_txn_id: String,
    },
}

/// Per-batch merge counts. `created + updated + skipped` equals the number
/// of records submitted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertSummary {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}

enum Merge {
    Created,
    Updated,
    Skipped,
}

/// Native atomic upsert. Every column except `created_at` is replaced, but
/// only when some content column actually differs; `updated_at` and the
/// batch id inside `meta` are volatile bookkeeping and deliberately left out
/// of the change gate, so a pure replay is a no-op rather than an update.
const UPSERT_SQL: &str = r#"
    INSERT INTO canonical_transactions (
        business_id, provider_txn_id, transaction_id, account_id, posted_at,
        amount, currency, cashflow_type, category, vendor_name,
        raw_description, source, meta, created_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (business_id, provider_txn_id) DO UPDATE SET
        transaction_id = excluded.transaction_id,
        account_id = excluded.account_id,
        posted_at = excluded.posted_at,
        amount = excluded.amount,
        currency = excluded.currency,
        cashflow_type = excluded.cashflow_type,
        category = excluded.category,
        vendor_name = excluded.vendor_name,
        raw_description = excluded.raw_description,
        source = excluded.source,
        meta = excluded.meta,
        updated_at = excluded.updated_at
    WHERE canonical_transactions.transaction_id IS NOT excluded.transaction_id
       OR canonical_transactions.account_id IS NOT excluded.account_id
       OR canonical_transactions.posted_at IS NOT excluded.posted_at
       OR canonical_transactions.amount IS NOT excluded.amount
       OR canonical_transactions.currency IS NOT excluded.currency
       OR canonical_transactions.cashflow_type IS NOT excluded.cashflow_type
       OR canonical_transactions.category IS NOT excluded.category
       OR canonical_transactions.vendor_name IS NOT excluded.vendor_name
       OR canonical_transactions.raw_description IS NOT excluded.raw_description
       OR canonical_transactions.source IS NOT excluded.source
       OR json_extract(canonical_transactions.meta, '$.institution_name')
          IS NOT json_extract(excluded.meta, '$.institution_name')
"#;

/// Merge a batch of canonical transactions into the store, keyed by
/// `(business_id, provider_txn_id)`.
///
/// Replaying the same logical batch any number of times leaves the store in
/// the state one run produces: the first run creates every record, identical
/// reruns skip every record, and `created_at` survives every later write
/// untouched.
pub async fn upsert_transactions(
    pool: &DbPool,
    records: &[CanonicalTransaction],
) -> Result<UpsertSummary, StorageError> {
    let mut summary = UpsertSummary::default();

    for tx in records {
        match upsert_one(pool, tx).await {
            Ok(Merge::Created) => summary.created += 1,
            Ok(Merge::Updated) => summary.updated += 1,
            Ok(Merge::Skipped) => summary.skipped += 1,
            Err(err) if is_unique_violation(&err) => {
                // Unreachable through the upsert path; only a foreign writer
                // racing on the same key without ON CONFLICT can get here.
                let conflict = StorageError::Conflict {
                    business_id: tx.business_id.clone(),
                    provider_txn_id: tx.provider_txn_id.clone(),
                };
                tracing::error!(error = %conflict, "storage conflict, record not merged");
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "batch merged"
    );
    Ok(summary)
}

async fn upsert_one(pool: &DbPool, tx: &CanonicalTransaction) -> Result<Merge, StorageError> {
    let meta = serde_json::to_string(&tx.meta)?;
    let (cashflow_type, category) = match tx.classification {
        Some(c) => (
            Some(c.cashflow_type.to_string()),
            Some(c.category.to_string()),
        ),
        None => (None, None),
    };

    // One SQL transaction per record: the existence probe and the upsert
    // commit together, and the single-connection pool serializes same-key
    // writers across tasks.
    let mut db_tx = pool.begin().await?;

    let existed: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM canonical_transactions
         WHERE business_id = ? AND provider_txn_id = ?)",
    )
    .bind(&tx.business_id)
    .bind(&tx.provider_txn_id)
    .fetch_one(&mut *db_tx)
    .await?;

    let result = sqlx::query(UPSERT_SQL)
        .bind(&tx.business_id)
        .bind(&tx.provider_txn_id)
        .bind(&tx.transaction_id)
        .bind(&tx.account_id)
        .bind(tx.posted_at.to_rfc3339())
        .bind(tx.amount.normalize().to_string())
        .bind(&tx.currency)
        .bind(cashflow_type)
        .bind(category)
        .bind(&tx.vendor_name)
        .bind(&tx.raw_description)
        .bind(&tx.source)
        .bind(meta)
        .bind(tx.created_at.to_rfc3339())
        .bind(tx.updated_at.to_rfc3339())
        .execute(&mut *db_tx)
        .await?;

    db_tx.commit().await?;

    Ok(if existed == 0 {
        Merge::Created
    } else if result.rows_affected() > 0 {
        Merge::Updated
    } else {
        Merge::Skipped
    })
}

/// SQLite extended result codes for primary-key and unique-index violations.
fn is_unique_violation(err: &StorageError) -> bool {
    match err {
        StorageError::Sqlx(sqlx::Error::Database(db)) => {
            matches!(db.code().as_deref(), Some("1555") | Some("2067"))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_db;
    use chrono::{TimeZone, Utc};
    use ledgerflow_core::{CashflowType, Category, Classification, TxnMeta};
    use rust_decimal::Decimal;
    use sqlx::Row;
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn test_pool() -> (TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("test.db")).await.unwrap();
        (dir, pool)
    }

    fn sample(key: &str, category: Category) -> CanonicalTransaction {
        let ts = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let id = format!("{key:0>64}");
        CanonicalTransaction {
            transaction_id: id.clone(),
            business_id: "demo-business-1".to_string(),
            account_id: "bank-1".to_string(),
            provider_txn_id: id,
            posted_at: ts,
            amount: Decimal::from_str("-812.40").unwrap(),
            currency: "USD".to_string(),
            classification: Some(Classification {
                cashflow_type: CashflowType::Outflow,
                category,
            }),
            vendor_name: Some("SYSCO FOODS INV".to_string()),
            raw_description: "SYSCO FOODS INV 88213".to_string(),
            source: "bank".to_string(),
            meta: TxnMeta {
                import_batch_id: "import_aaaaaaaaaaaa".to_string(),
                institution_name: "demo-bank".to_string(),
            },
            created_at: ts,
            updated_at: ts,
        }
    }

    async fn stored_field(pool: &DbPool, key: &str, column: &str) -> Option<String> {
        let id = format!("{key:0>64}");
        let row = sqlx::query(&format!(
            "SELECT {column} FROM canonical_transactions
             WHERE business_id = ? AND provider_txn_id = ?"
        ))
        .bind("demo-business-1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
        row.get(0)
    }

    #[tokio::test]
    async fn first_run_creates_everything() {
        let (_dir, pool) = test_pool().await;
        let batch = vec![
            sample("1", Category::OutflowCogsFood),
            sample("2", Category::OutflowInsurance),
        ];

        let summary = upsert_transactions(&pool, &batch).await.unwrap();
        assert_eq!(
            summary,
            UpsertSummary {
                created: 2,
                updated: 0,
                skipped: 0
            }
        );
    }

    #[tokio::test]
    async fn identical_replay_skips_every_record() {
        let (_dir, pool) = test_pool().await;
        let batch = vec![
            sample("1", Category::OutflowCogsFood),
            sample("2", Category::OutflowInsurance),
        ];
        upsert_transactions(&pool, &batch).await.unwrap();

        for _ in 0..3 {
            let summary = upsert_transactions(&pool, &batch).await.unwrap();
            assert_eq!(
                summary,
                UpsertSummary {
                    created: 0,
                    updated: 0,
                    skipped: 2
                }
            );
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM canonical_transactions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn replay_with_new_batch_bookkeeping_is_still_a_skip() {
        let (_dir, pool) = test_pool().await;
        let first = sample("1", Category::OutflowCogsFood);
        upsert_transactions(&pool, std::slice::from_ref(&first))
            .await
            .unwrap();

        // Same content, different batch id and write time.
        let mut replay = first.clone();
        replay.meta.import_batch_id = "import_bbbbbbbbbbbb".to_string();
        replay.updated_at = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();

        let summary = upsert_transactions(&pool, &[replay]).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.updated, 0);

        // The no-op write left the original bookkeeping in place.
        let meta = stored_field(&pool, "1", "meta").await.unwrap();
        assert!(meta.contains("import_aaaaaaaaaaaa"));
        let updated_at = stored_field(&pool, "1", "updated_at").await.unwrap();
        assert_eq!(updated_at, first.updated_at.to_rfc3339());
    }

    #[tokio::test]
    async fn created_at_survives_re_upsert_with_different_created_at() {
        let (_dir, pool) = test_pool().await;
        let first = sample("1", Category::OutflowCogsFood);
        upsert_transactions(&pool, std::slice::from_ref(&first))
            .await
            .unwrap();

        let mut later = sample("1", Category::OutflowVendorNoncogs);
        later.created_at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        later.updated_at = later.created_at;

        let summary = upsert_transactions(&pool, &[later]).await.unwrap();
        assert_eq!(summary.updated, 1);

        let created_at = stored_field(&pool, "1", "created_at").await.unwrap();
        assert_eq!(created_at, first.created_at.to_rfc3339());
    }

    #[tokio::test]
    async fn content_change_overwrites_everything_else() {
        let (_dir, pool) = test_pool().await;
        upsert_transactions(&pool, &[sample("1", Category::OutflowCogsFood)])
            .await
            .unwrap();

        // A rule change reclassified the same transaction.
        let mut reclassified = sample("1", Category::OutflowVendorNoncogs);
        reclassified.meta.import_batch_id = "import_cccccccccccc".to_string();
        reclassified.updated_at = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();

        let summary = upsert_transactions(&pool, &[reclassified.clone()])
            .await
            .unwrap();
        assert_eq!(
            summary,
            UpsertSummary {
                created: 0,
                updated: 1,
                skipped: 0
            }
        );

        let category = stored_field(&pool, "1", "category").await.unwrap();
        assert_eq!(category, "OUTFLOW_VENDOR_NONCOGS");
        let meta = stored_field(&pool, "1", "meta").await.unwrap();
        assert!(meta.contains("import_cccccccccccc"));
        let updated_at = stored_field(&pool, "1", "updated_at").await.unwrap();
        assert_eq!(updated_at, reclassified.updated_at.to_rfc3339());
    }

    #[tokio::test]
    async fn duplicate_rows_within_one_batch_insert_once() {
        let (_dir, pool) = test_pool().await;
        let tx = sample("1", Category::OutflowCogsFood);
        let summary = upsert_transactions(&pool, &[tx.clone(), tx]).await.unwrap();
        assert_eq!(
            summary,
            UpsertSummary {
                created: 1,
                updated: 0,
                skipped: 1
            }
        );
    }

    #[tokio::test]
    async fn unclassified_records_store_null_tokens() {
        let (_dir, pool) = test_pool().await;
        let mut tx = sample("1", Category::OutflowCogsFood);
        tx.classification = None;
        tx.vendor_name = None;
        upsert_transactions(&pool, &[tx]).await.unwrap();

        assert_eq!(stored_field(&pool, "1", "cashflow_type").await, None);
        assert_eq!(stored_field(&pool, "1", "category").await, None);
        assert_eq!(stored_field(&pool, "1", "vendor_name").await, None);
    }
}
