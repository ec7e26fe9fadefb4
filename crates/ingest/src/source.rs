use std::io::Read;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use ledgerflow_core::RawRecord;

/// Substituted when an optional column is absent or a cell is blank.
#[derive(Debug, Clone)]
pub struct SourceDefaults {
    pub currency: String,
    pub account_id: String,
    pub institution_name: String,
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),
}

/// A row excluded from the batch, with the 1-based file line it came from.
#[derive(Debug, Clone)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

/// A raw record tagged with the 1-based file line it came from, so that
/// failures later in the pipeline can still name their source row.
#[derive(Debug, Clone)]
pub struct SourceRow {
    pub line: u64,
    pub record: RawRecord,
}

#[derive(Debug, Default)]
pub struct SourceBatch {
    pub records: Vec<SourceRow>,
    pub rejected: Vec<RejectedRow>,
}

/// Load raw records from a CSV export with a header row.
///
/// Required columns: `description`, `amount`, and `posted_at` (or
/// `transacted_at`). A missing required column fails the whole batch before
/// any row is read. Rows whose amount does not parse are returned in
/// `rejected` rather than failing the load; the caller applies its own
/// strictness policy. Description and posted_at cells are carried verbatim,
/// since the identity hash is computed over the source text.
pub fn load_csv<R: Read>(data: R, defaults: &SourceDefaults) -> Result<SourceBatch, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let description_col = column("description")
        .ok_or_else(|| SourceError::MissingColumn("description".to_string()))?;
    let amount_col =
        column("amount").ok_or_else(|| SourceError::MissingColumn("amount".to_string()))?;
    let posted_at_col = column("posted_at")
        .or_else(|| column("transacted_at"))
        .ok_or_else(|| SourceError::MissingColumn("posted_at or transacted_at".to_string()))?;
    let currency_col = column("currency");
    let account_col = column("account_id").or_else(|| column("account"));
    let institution_col = column("institution_name");

    let mut batch = SourceBatch::default();

    for result in reader.records() {
        let record = result?;
        if record.is_empty() {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let amount = match parse_amount(record.get(amount_col).unwrap_or_default()) {
            Ok(amount) => amount,
            Err(err) => {
                batch.rejected.push(RejectedRow {
                    line,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        batch.records.push(SourceRow {
            line,
            record: RawRecord {
                account_id: field_or(&record, account_col, &defaults.account_id).to_string(),
                posted_at: record.get(posted_at_col).unwrap_or_default().to_string(),
                amount,
                currency: field_or(&record, currency_col, &defaults.currency).to_uppercase(),
                raw_description: record.get(description_col).unwrap_or_default().to_string(),
                institution_name: field_or(&record, institution_col, &defaults.institution_name)
                    .to_string(),
            },
        });
    }

    Ok(batch)
}

fn field_or<'a>(record: &'a csv::StringRecord, idx: Option<usize>, default: &'a str) -> &'a str {
    idx.and_then(|i| record.get(i))
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

/// Accepts plain decimals plus bank-export noise: `$`, thousands commas,
/// stray spaces, and accounting parentheses for negatives.
fn parse_amount(raw: &str) -> Result<Decimal, SourceError> {
    let trimmed = raw.trim();
    let (negative, body) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };
    let cleaned = body.replace([',', '$', ' '], "");
    let mut amount =
        Decimal::from_str(&cleaned).map_err(|_| SourceError::InvalidAmount(trimmed.to_string()))?;
    if negative {
        amount = -amount;
    }
    Ok(amount)
}
