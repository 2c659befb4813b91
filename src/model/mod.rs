//! Types that represent the core data model, such as `Transaction` and `ReportDimension`.
mod amount;
mod dimension;
mod filter;
mod transaction;

pub use amount::{Amount, AmountError};
pub use dimension::{DimensionKey, DimensionValue, ReportDimension};
pub use filter::TransactionFilter;
pub use transaction::{
    Status, Transaction, TransactionRecord, TransactionType, MAX_TRANSACTION_NUMBER_LEN, MAX_YEAR,
    MIN_YEAR,
};
