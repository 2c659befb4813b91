//! The transaction fields that a report can be grouped by.

use crate::model::{Status, Transaction, TransactionType};
use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// One of the groupable transaction fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ReportDimension {
    TransactionType,
    Status,
    Year,
}

serde_plain::derive_display_from_serialize!(ReportDimension);
serde_plain::derive_fromstr_from_deserialize!(ReportDimension);

impl ReportDimension {
    /// Every dimension, in declaration order.
    pub const ALL: [ReportDimension; 3] = [
        ReportDimension::TransactionType,
        ReportDimension::Status,
        ReportDimension::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportDimension::TransactionType => "transaction_type",
            ReportDimension::Status => "status",
            ReportDimension::Year => "year",
        }
    }

    /// Every dimension name, sorted alphabetically.
    pub fn sorted_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::ALL.iter().map(|d| d.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Reads this dimension's value from `transaction`.
    pub fn value_of(&self, transaction: &Transaction) -> DimensionValue {
        match self {
            ReportDimension::TransactionType => {
                DimensionValue::TransactionType(transaction.transaction_type)
            }
            ReportDimension::Status => DimensionValue::Status(transaction.status),
            ReportDimension::Year => DimensionValue::Year(transaction.year),
        }
    }
}

/// The value of one `ReportDimension` for some transaction.
///
/// Values order the way their serialized form does: text values lexicographically and years
/// numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionValue {
    TransactionType(TransactionType),
    Status(Status),
    Year(u16),
}

/// What a `DimensionValue` sorts by.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(u16),
    Text(&'static str),
}

impl DimensionValue {
    pub fn dimension(&self) -> ReportDimension {
        match self {
            DimensionValue::TransactionType(_) => ReportDimension::TransactionType,
            DimensionValue::Status(_) => ReportDimension::Status,
            DimensionValue::Year(_) => ReportDimension::Year,
        }
    }

    fn sort_key(&self) -> SortKey {
        match self {
            DimensionValue::TransactionType(t) => SortKey::Text(t.as_str()),
            DimensionValue::Status(s) => SortKey::Text(s.as_str()),
            DimensionValue::Year(y) => SortKey::Number(*y),
        }
    }
}

impl Ord for DimensionValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.dimension().cmp(&other.dimension()))
    }
}

impl PartialOrd for DimensionValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for DimensionValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DimensionValue::TransactionType(t) => f.write_str(t.as_str()),
            DimensionValue::Status(s) => f.write_str(s.as_str()),
            DimensionValue::Year(y) => write!(f, "{y}"),
        }
    }
}

impl Serialize for DimensionValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            DimensionValue::TransactionType(t) => t.serialize(serializer),
            DimensionValue::Status(s) => s.serialize(serializer),
            DimensionValue::Year(y) => serializer.serialize_u16(*y),
        }
    }
}

/// A mapping from dimension to value that keeps the order its entries were given in. It is used
/// for both the `row_key` and the `column_key` of a report, and serializes as a JSON object whose
/// keys appear in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DimensionKey(Vec<DimensionValue>);

impl DimensionKey {
    pub fn new(values: impl Into<Vec<DimensionValue>>) -> Self {
        Self(values.into())
    }

    /// The value recorded for `dimension`, if any.
    pub fn get(&self, dimension: ReportDimension) -> Option<DimensionValue> {
        self.0.iter().copied().find(|v| v.dimension() == dimension)
    }

    pub fn values(&self) -> &[DimensionValue] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for DimensionKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for value in &self.0 {
            map.serialize_entry(value.dimension().as_str(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use std::str::FromStr;

    #[test]
    fn test_names() {
        assert_eq!(ReportDimension::TransactionType.to_string(), "transaction_type");
        assert_eq!(
            ReportDimension::from_str("year").unwrap(),
            ReportDimension::Year
        );
        assert!(ReportDimension::from_str("amount").is_err());
        assert_eq!(
            ReportDimension::sorted_names(),
            vec!["status", "transaction_type", "year"]
        );
    }

    #[test]
    fn test_value_of() {
        let t = Transaction::new(
            TransactionType::DirectExpense,
            Status::PartiallyPaid,
            "DE-1",
            Amount::from_str("1.00").unwrap(),
            2022,
        );
        assert_eq!(
            ReportDimension::TransactionType.value_of(&t),
            DimensionValue::TransactionType(TransactionType::DirectExpense)
        );
        assert_eq!(
            ReportDimension::Status.value_of(&t),
            DimensionValue::Status(Status::PartiallyPaid)
        );
        assert_eq!(ReportDimension::Year.value_of(&t), DimensionValue::Year(2022));
    }

    #[test]
    fn test_text_values_sort_lexicographically() {
        let mut values = vec![
            DimensionValue::TransactionType(TransactionType::Invoice),
            DimensionValue::TransactionType(TransactionType::DirectExpense),
            DimensionValue::TransactionType(TransactionType::Bill),
        ];
        values.sort();
        let names: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(names, vec!["bill", "direct_expense", "invoice"]);

        let mut statuses = vec![
            DimensionValue::Status(Status::Unpaid),
            DimensionValue::Status(Status::PartiallyPaid),
            DimensionValue::Status(Status::Paid),
        ];
        statuses.sort();
        let names: Vec<String> = statuses.iter().map(|v| v.to_string()).collect();
        assert_eq!(names, vec!["paid", "partially_paid", "unpaid"]);
    }

    #[test]
    fn test_years_sort_numerically() {
        let mut values = vec![
            DimensionValue::Year(2024),
            DimensionValue::Year(1999),
            DimensionValue::Year(2100),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                DimensionValue::Year(1999),
                DimensionValue::Year(2024),
                DimensionValue::Year(2100)
            ]
        );
    }

    #[test]
    fn test_key_serializes_in_given_order() {
        let key = DimensionKey::new(vec![
            DimensionValue::Year(2024),
            DimensionValue::Status(Status::Paid),
        ]);
        assert_eq!(
            serde_json::to_string(&key).unwrap(),
            r#"{"year":2024,"status":"paid"}"#
        );
        assert_eq!(key.get(ReportDimension::Status), Some(DimensionValue::Status(Status::Paid)));
        assert_eq!(key.get(ReportDimension::TransactionType), None);
    }

    #[test]
    fn test_empty_key_serializes_as_empty_object() {
        let key = DimensionKey::default();
        assert!(key.is_empty());
        assert_eq!(serde_json::to_string(&key).unwrap(), "{}");
    }
}
