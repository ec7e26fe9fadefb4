pub mod canonical;
pub mod classify;
pub mod pipeline;
pub mod source;
pub mod vendor;

pub use canonical::{canonicalize, deterministic_txn_id, CanonicalContext, ValidationError};
pub use classify::RuleEngine;
pub use pipeline::{run_pipeline, PipelineError, PipelineReport, RowPolicy};
pub use source::{load_csv, RejectedRow, SourceBatch, SourceDefaults, SourceError, SourceRow};
pub use vendor::extract_vendor_name;
