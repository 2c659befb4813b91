//! Builds pivot-style reports from a collection of transactions.
//!
//! A report groups amounts by one row dimension and any number of column dimensions. Each row
//! holds one cell per column key seen in that row, and the report carries row totals, column
//! totals and a grand total. All arithmetic is exact `Decimal` addition.

mod request;

pub use request::{ReportRequest, RequestError};

use crate::model::{DimensionKey, DimensionValue, ReportDimension, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// A pivot report. Every amount is an exact decimal rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportResult {
    pub row_field: ReportDimension,
    pub column_fields: Vec<ReportDimension>,
    /// One entry per distinct row value, in ascending order of that value.
    pub data: Vec<ReportRow>,
    /// One entry per distinct column key across all rows, in the order first encountered.
    pub column_totals: Vec<ReportCell>,
    pub grand_total: String,
}

/// The cells and total for one value of the row dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub row_key: DimensionKey,
    /// In the order first encountered.
    pub cells: Vec<ReportCell>,
    pub row_total: String,
}

/// A total for one column key. Used both for the cells of a row and for the column totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportCell {
    pub column_key: DimensionKey,
    pub total_amount: String,
}

/// Builds the pivot report for `transactions`.
///
/// `transactions` must already be filtered; every transaction given contributes to the totals.
/// The request is not validated here.
pub fn build_report<'a, I>(transactions: I, request: &ReportRequest) -> ReportResult
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let group_by = request.group_by();
    let groups = sum_by_group(transactions, &group_by);
    trace!("Aggregated {} groups by {group_by:?}", groups.len());

    let mut rows: Vec<RowTotals> = Vec::new();
    let mut row_index: HashMap<DimensionValue, usize> = HashMap::new();
    let mut column_totals = OrderedTotals::default();
    let mut grand_total = Decimal::ZERO;

    // The map iterates in ascending key order, row value first, which is what orders `data`.
    for (key, amount) in groups {
        let (row_value, column_values) = match key.split_first() {
            Some((row_value, column_values)) => (*row_value, column_values),
            None => continue,
        };

        let ix = *row_index.entry(row_value).or_insert_with(|| {
            rows.push(RowTotals::new(row_value));
            rows.len() - 1
        });
        let row = &mut rows[ix];
        row.total += amount;
        row.cells.add(column_values, amount);

        column_totals.add(column_values, amount);
        grand_total += amount;
    }

    ReportResult {
        row_field: request.row_field,
        column_fields: request.column_fields.clone(),
        data: rows.into_iter().map(RowTotals::into_row).collect(),
        column_totals: column_totals.into_cells(),
        grand_total: render(grand_total),
    }
}

/// Sums the amounts of `transactions` grouped by the values of `group_by`, like
/// `SELECT ..., SUM(amount) ... GROUP BY ...`. Keys hold one value per entry of `group_by`, in the
/// same order.
pub fn sum_by_group<'a, I>(
    transactions: I,
    group_by: &[ReportDimension],
) -> BTreeMap<Vec<DimensionValue>, Decimal>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut groups: BTreeMap<Vec<DimensionValue>, Decimal> = BTreeMap::new();
    for transaction in transactions {
        let key: Vec<DimensionValue> = group_by.iter().map(|d| d.value_of(transaction)).collect();
        *groups.entry(key).or_insert(Decimal::ZERO) += transaction.amount.value();
    }
    groups
}

/// Renders a total. A `Decimal` keeps the largest scale of its operands, so any sum of amounts
/// prints two fraction digits while a total that nothing was added to prints `0`.
fn render(total: Decimal) -> String {
    total.to_string()
}

/// Running totals keyed by column values, remembering the order keys were first seen in.
#[derive(Debug, Default)]
struct OrderedTotals {
    index: HashMap<Vec<DimensionValue>, usize>,
    entries: Vec<(Vec<DimensionValue>, Decimal)>,
}

impl OrderedTotals {
    fn add(&mut self, key: &[DimensionValue], amount: Decimal) {
        let ix = match self.index.get(key) {
            Some(ix) => *ix,
            None => {
                self.entries.push((key.to_vec(), Decimal::ZERO));
                let ix = self.entries.len() - 1;
                self.index.insert(key.to_vec(), ix);
                ix
            }
        };
        self.entries[ix].1 += amount;
    }

    fn into_cells(self) -> Vec<ReportCell> {
        self.entries
            .into_iter()
            .map(|(key, total)| ReportCell {
                column_key: DimensionKey::new(key),
                total_amount: render(total),
            })
            .collect()
    }
}

#[derive(Debug)]
struct RowTotals {
    value: DimensionValue,
    cells: OrderedTotals,
    total: Decimal,
}

impl RowTotals {
    fn new(value: DimensionValue) -> Self {
        Self {
            value,
            cells: OrderedTotals::default(),
            total: Decimal::ZERO,
        }
    }

    fn into_row(self) -> ReportRow {
        ReportRow {
            row_key: DimensionKey::new(vec![self.value]),
            cells: self.cells.into_cells(),
            row_total: render(self.total),
        }
    }
}
