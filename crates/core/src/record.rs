use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::classification::Classification;

/// One row as it came off the source, before any derivation. `posted_at`
/// stays an unparsed string here: the identity hash is computed over the
/// source-supplied text, not over a parsed timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub account_id: String,
    pub posted_at: String,
    /// Signed amount: negative leaves the account, positive enters it.
    pub amount: Decimal,
    pub currency: String,
    /// Never null; empty string when the source cell was empty.
    pub raw_description: String,
    pub institution_name: String,
}

/// A raw record after vendor extraction and rule evaluation.
#[derive(Debug, Clone)]
pub struct ClassifiedRecord {
    pub raw: RawRecord,
    pub vendor_name: Option<String>,
    pub classification: Option<Classification>,
}

/// Batch bookkeeping persisted alongside each transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnMeta {
    pub import_batch_id: String,
    pub institution_name: String,
}

/// The persisted entity. `(business_id, provider_txn_id)` is the storage
/// key; `provider_txn_id` equals `transaction_id` because the source carries
/// no provider-side identity of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub transaction_id: String,
    pub business_id: String,
    pub account_id: String,
    pub provider_txn_id: String,
    pub posted_at: DateTime<Utc>,
    pub amount: Decimal,
    pub currency: String,
    #[serde(flatten)]
    pub classification: Option<Classification>,
    pub vendor_name: Option<String>,
    pub raw_description: String,
    pub source: String,
    pub meta: TxnMeta,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
