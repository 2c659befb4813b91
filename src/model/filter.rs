use crate::model::Transaction;

/// Equality predicates applied to transactions before they are listed or reported on. All set
/// predicates must match.
///
/// `transaction_type` and `status` are compared as given, so a value that is not a known choice
/// matches nothing rather than being an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub transaction_type: Option<String>,
    pub status: Option<String>,
    pub year: Option<i64>,
}

impl TransactionFilter {
    /// Builds a filter from raw request parameters. Empty values are ignored, and `year` is only
    /// used when it consists entirely of ASCII digits. A year too large for an `i64` saturates, so
    /// it still filters and matches nothing.
    pub fn from_params(
        transaction_type: Option<&str>,
        status: Option<&str>,
        year: Option<&str>,
    ) -> Self {
        let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_string);
        let year = year
            .filter(|y| !y.is_empty() && y.bytes().all(|b| b.is_ascii_digit()))
            .map(|y| y.parse::<i64>().unwrap_or(i64::MAX));
        Self {
            transaction_type: non_empty(transaction_type),
            status: non_empty(status),
            year,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_type.is_none() && self.status.is_none() && self.year.is_none()
    }

    /// Whether `transaction` satisfies every predicate of this filter.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        let type_ok = self
            .transaction_type
            .as_deref()
            .map_or(true, |t| t == transaction.transaction_type.as_str());
        let status_ok = self
            .status
            .as_deref()
            .map_or(true, |s| s == transaction.status.as_str());
        let year_ok = self.year.map_or(true, |y| y == i64::from(transaction.year));
        type_ok && status_ok && year_ok
    }
}
