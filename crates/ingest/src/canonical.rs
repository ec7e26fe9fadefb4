use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use ledgerflow_core::{CanonicalTransaction, ClassifiedRecord, RawRecord, TxnMeta};

#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Unparseable posted_at: '{0}'")]
    InvalidPostedAt(String),
}

/// Batch-level inputs the canonicalizer cannot derive from a record.
#[derive(Debug, Clone)]
pub struct CanonicalContext {
    pub business_id: String,
    pub source: String,
    pub import_batch_id: String,
}

/// Deterministic identity: SHA-256 over the pipe-joined raw fields
/// `account_id | posted_at | amount | raw_description`, hex encoded.
///
/// The amount is serialized through `Decimal::normalize()` so that scale
/// differences in the source text (`1500.00` vs `1500.0`) cannot split one
/// logical transaction into two identities; `posted_at` contributes its raw
/// source text, unparsed. Classification and vendor extraction never feed
/// the hash.
pub fn deterministic_txn_id(record: &RawRecord) -> String {
    let seed = format!(
        "{}|{}|{}|{}",
        record.account_id,
        record.posted_at,
        record.amount.normalize(),
        record.raw_description
    );
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hex::encode(hasher.finalize())
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y",
];

/// Parse the source-supplied posted_at text. RFC 3339 first, then naive
/// date-times taken as UTC, then bare dates at midnight UTC.
pub fn parse_posted_at(s: &str) -> Result<DateTime<Utc>, ValidationError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
        }
    }

    Err(ValidationError::InvalidPostedAt(s.to_string()))
}

/// Project a classified record into the canonical schema.
///
/// `created_at` and `updated_at` are both set to `now`; whether `created_at`
/// actually persists is decided by the writer, which never overwrites it for
/// an existing key.
pub fn canonicalize(
    record: ClassifiedRecord,
    ctx: &CanonicalContext,
    now: DateTime<Utc>,
) -> Result<CanonicalTransaction, ValidationError> {
    let posted_at = parse_posted_at(&record.raw.posted_at)?;
    let transaction_id = deterministic_txn_id(&record.raw);

    Ok(CanonicalTransaction {
        provider_txn_id: transaction_id.clone(),
        transaction_id,
        business_id: ctx.business_id.clone(),
        account_id: record.raw.account_id,
        posted_at,
        amount: record.raw.amount,
        currency: record.raw.currency.to_uppercase(),
        classification: record.classification,
        vendor_name: record.vendor_name,
        raw_description: record.raw.raw_description,
        source: ctx.source.clone(),
        meta: TxnMeta {
            import_batch_id: ctx.import_batch_id.clone(),
            institution_name: record.raw.institution_name,
        },
        created_at: now,
        updated_at: now,
    })
}
