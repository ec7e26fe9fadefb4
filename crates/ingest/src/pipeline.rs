use chrono::{DateTime, Utc};
use thiserror::Error;

use ledgerflow_core::{CanonicalTransaction, ClassifiedRecord};

use crate::canonical::{canonicalize, CanonicalContext, ValidationError};
use crate::classify::RuleEngine;
use crate::source::{RejectedRow, SourceBatch, SourceRow};
use crate::vendor::extract_vendor_name;

/// What to do with a row the pipeline cannot process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// Drop the row, log it, and keep going (the default).
    #[default]
    Skip,
    /// Fail the whole batch at the first bad row.
    Abort,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Line {line}: {reason}")]
    BadAmount { line: u64, reason: String },
    #[error("Line {line}: {source}")]
    BadPostedAt {
        line: u64,
        #[source]
        source: ValidationError,
    },
}

/// Outcome of one batch run. `dropped` is only populated under
/// `RowPolicy::Skip`; under `Abort` the first bad row is an error instead.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub transactions: Vec<CanonicalTransaction>,
    pub dropped: Vec<RejectedRow>,
}

/// Drive one batch through the pure stages: vendor extraction, rule
/// classification, canonicalization. No storage involved; every record is
/// handled independently, so the output order matches the input order.
pub fn run_pipeline(
    batch: SourceBatch,
    engine: &RuleEngine,
    ctx: &CanonicalContext,
    policy: RowPolicy,
    now: DateTime<Utc>,
) -> Result<PipelineReport, PipelineError> {
    let mut report = PipelineReport::default();

    for rejected in batch.rejected {
        match policy {
            RowPolicy::Abort => {
                return Err(PipelineError::BadAmount {
                    line: rejected.line,
                    reason: rejected.reason,
                })
            }
            RowPolicy::Skip => {
                tracing::warn!(line = rejected.line, reason = %rejected.reason, "skipping row");
                report.dropped.push(rejected);
            }
        }
    }

    for SourceRow { line, record: raw } in batch.records {
        let vendor_name = extract_vendor_name(&raw.raw_description);
        let classification = engine.classify(raw.amount, &raw.raw_description);
        let classified = ClassifiedRecord {
            raw,
            vendor_name,
            classification,
        };
        match canonicalize(classified, ctx, now) {
            Ok(tx) => report.transactions.push(tx),
            Err(err) => match policy {
                RowPolicy::Abort => return Err(PipelineError::BadPostedAt { line, source: err }),
                RowPolicy::Skip => {
                    tracing::warn!(line, error = %err, "skipping row");
                    report.dropped.push(RejectedRow {
                        line,
                        reason: err.to_string(),
                    });
                }
            },
        }
    }

    Ok(report)
}
