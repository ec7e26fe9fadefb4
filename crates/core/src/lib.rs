pub mod classification;
pub mod record;

pub use classification::{CashflowType, Category, Classification};
pub use record::{CanonicalTransaction, ClassifiedRecord, RawRecord, TxnMeta};
