use crate::args::ListArgs;
use crate::commands::{Out, Rows, Tabular};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{TransactionFilter, TransactionRecord};
use crate::pagination::{Page, PageError, PageNumber, PageRequest};
use crate::{Config, Result};
use serde::Serialize;
use tracing::debug;

/// One page of transactions as shown by the `list` command and the `list_transactions` tool.
/// `next` and `previous` are page numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub count: u64,
    pub page: u64,
    pub num_pages: u64,
    pub next: Option<u64>,
    pub previous: Option<u64>,
    pub results: Vec<TransactionRecord>,
}

impl From<Page<TransactionRecord>> for Listing {
    fn from(page: Page<TransactionRecord>) -> Self {
        Self {
            count: page.count,
            page: page.window.number,
            num_pages: page.window.num_pages,
            next: page.window.next(),
            previous: page.window.previous(),
            results: page.results,
        }
    }
}

impl Tabular for Listing {
    fn headers(&self) -> Vec<String> {
        [
            "id",
            "transaction_type",
            "transaction_number",
            "amount",
            "status",
            "year",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.results
            .iter()
            .map(|r| {
                let t = &r.transaction;
                vec![
                    r.id.to_string(),
                    t.transaction_type.to_string(),
                    t.transaction_number.clone(),
                    t.amount.to_string(),
                    t.status.to_string(),
                    t.year.to_string(),
                ]
            })
            .collect()
    }
}

/// Lists one page of the transactions that match the filters in `args`.
pub async fn list(config: Config, args: ListArgs) -> Result<Out<Rows>> {
    let number = args.page.map_or(PageNumber::Number(1), PageNumber::Number);
    let request = config
        .pagination()
        .page(number, args.page_size)
        .pub_result(ErrorType::NotFound)?;
    let page = list_page(&config, &args.filter.filter(), request).await?;
    let listing = Listing::from(page);

    let message = format!(
        "Showing page {} of {} ({} of {} transactions)",
        listing.page,
        listing.num_pages,
        listing.results.len(),
        listing.count
    );
    let rows = Rows::render(&listing, args.format).pub_result(ErrorType::Io)?;
    Ok(Out::new(message, rows))
}

/// Reads one page of transactions. A page that does not exist is a `NotFound` error.
pub async fn list_page(
    config: &Config,
    filter: &TransactionFilter,
    request: PageRequest,
) -> Result<Page<TransactionRecord>> {
    debug!("Listing transactions matching {filter:?} ({request:?})");
    config
        .db()
        .list_transactions(filter, request)
        .await
        .map_err(|e| {
            let error_type = if e.downcast_ref::<PageError>().is_some() {
                ErrorType::NotFound
            } else {
                ErrorType::Database
            };
            Error::new(error_type, e)
        })
}
