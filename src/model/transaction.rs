use crate::error::Res;
use crate::model::Amount;
use anyhow::{bail, Context};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The longest `transaction_number` the store accepts.
pub const MAX_TRANSACTION_NUMBER_LEN: usize = 64;

/// The earliest year a transaction may belong to.
pub const MIN_YEAR: u16 = 1900;

/// The latest year a transaction may belong to.
pub const MAX_YEAR: u16 = 2100;

/// The kind of document a transaction was recorded from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Invoice,
    Bill,
    DirectExpense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Invoice => "invoice",
            TransactionType::Bill => "bill",
            TransactionType::DirectExpense => "direct_expense",
        }
    }
}

/// The payment status of a transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Paid,
    Unpaid,
    PartiallyPaid,
}

serde_plain::derive_display_from_serialize!(Status);
serde_plain::derive_fromstr_from_deserialize!(Status);

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Paid => "paid",
            Status::Unpaid => "unpaid",
            Status::PartiallyPaid => "partially_paid",
        }
    }
}

/// A single financial transaction.
///
/// Deserializing a `Transaction` checks the enum choices and the amount's precision; `validate`
/// checks the rest of the constraints that the `transactions` table enforces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_type: TransactionType,
    pub transaction_number: String,
    pub amount: Amount,
    pub status: Status,
    pub year: u16,
}

impl Transaction {
    pub fn new(
        transaction_type: TransactionType,
        status: Status,
        transaction_number: impl Into<String>,
        amount: Amount,
        year: u16,
    ) -> Self {
        Self {
            transaction_type,
            transaction_number: transaction_number.into(),
            amount,
            status,
            year,
        }
    }

    /// Parses and validates one item of a bulk-load JSON document. Surrounding whitespace is
    /// trimmed from `transaction_number`.
    pub fn from_json(value: serde_json::Value) -> Res<Self> {
        let mut transaction: Transaction =
            serde_json::from_value(value).context("Invalid transaction object")?;
        transaction.transaction_number = transaction.transaction_number.trim().to_string();
        transaction.validate()?;
        Ok(transaction)
    }

    /// Checks the constraints that are not expressed by the field types.
    pub fn validate(&self) -> Res<()> {
        let number = self.transaction_number.trim();
        if number.is_empty() {
            bail!("transaction_number may not be blank");
        }
        if self.transaction_number.chars().count() > MAX_TRANSACTION_NUMBER_LEN {
            bail!(
                "transaction_number '{}' is longer than {MAX_TRANSACTION_NUMBER_LEN} characters",
                self.transaction_number
            );
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            bail!(
                "year {} is outside the range {MIN_YEAR} to {MAX_YEAR}",
                self.year
            );
        }
        Ok(())
    }
}

/// A `Transaction` as stored, together with its database identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub id: i64,
    #[serde(flatten)]
    pub transaction: Transaction,
}
