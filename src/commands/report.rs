use crate::args::ReportArgs;
use crate::commands::{Out, Rows, Tabular};
use crate::db::TransactionSource;
use crate::error::{ErrorType, IntoResult};
use crate::model::{DimensionKey, TransactionFilter};
use crate::report::{build_report, ReportRequest, ReportResult};
use crate::{Config, Result};
use tracing::debug;

const TOTAL: &str = "total";

/// Builds a pivot report of the transactions that match the filters in `args`.
pub async fn report(config: Config, args: ReportArgs) -> Result<Out<Rows>> {
    let request = ReportRequest::parse(Some(&args.row_field), args.column_fields.as_deref())
        .pub_result(ErrorType::Request)?;
    let result = build(config.db(), &args.filter.filter(), &request).await?;

    let message = format!(
        "Report by {} with {} rows, grand total {}",
        result.row_field,
        result.data.len(),
        result.grand_total
    );
    let rows = Rows::render(&result, args.format).pub_result(ErrorType::Io)?;
    Ok(Out::new(message, rows))
}

/// Reads the transactions that match `filter` from `source` and builds the report for `request`.
pub(crate) async fn build<S>(
    source: &S,
    filter: &TransactionFilter,
    request: &ReportRequest,
) -> Result<ReportResult>
where
    S: TransactionSource + Sync + ?Sized,
{
    let transactions = source
        .transactions(filter)
        .await
        .pub_result(ErrorType::Database)?;
    debug!(
        "Building report grouped by {:?} from {} transactions",
        request.group_by(),
        transactions.len()
    );
    Ok(build_report(&transactions, request))
}

fn label(key: &DimensionKey) -> String {
    if key.is_empty() {
        return TOTAL.to_string();
    }
    let values: Vec<String> = key.values().iter().map(|v| v.to_string()).collect();
    values.join(" / ")
}

/// Lays a report out as a grid: one line per row value, one column per column key, and a final
/// line of column totals.
impl Tabular for ReportResult {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec![self.row_field.to_string()];
        if !self.column_fields.is_empty() {
            headers.extend(self.column_totals.iter().map(|c| label(&c.column_key)));
        }
        headers.push(TOTAL.to_string());
        headers
    }

    fn records(&self) -> Vec<Vec<String>> {
        let with_cells = !self.column_fields.is_empty();
        let mut records = Vec::with_capacity(self.data.len() + 1);
        for row in &self.data {
            let mut record = vec![label(&row.row_key)];
            if with_cells {
                for column in &self.column_totals {
                    let amount = row
                        .cells
                        .iter()
                        .find(|c| c.column_key == column.column_key)
                        .map(|c| c.total_amount.clone())
                        .unwrap_or_default();
                    record.push(amount);
                }
            }
            record.push(row.row_total.clone());
            records.push(record);
        }

        let mut totals = vec![TOTAL.to_string()];
        if with_cells {
            totals.extend(self.column_totals.iter().map(|c| c.total_amount.clone()));
        }
        totals.push(self.grand_total.clone());
        records.push(totals);
        records
    }
}
