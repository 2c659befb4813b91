use crate::args::LoadArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::Transaction;
use crate::{utils, Config, Result};
use anyhow::{anyhow, Context};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// What the `load` command did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// The number of items in the file.
    pub total: usize,
    /// The number of items that failed validation and were skipped.
    pub skipped: usize,
    /// The number of rows written to the database. Zero for a dry run.
    pub inserted: u64,
    pub dry_run: bool,
    pub reset: bool,
}

/// Loads the JSON array of transactions at `args.path()` into the database.
///
/// Items that fail validation are skipped and logged. Everything else is inserted in a single SQL
/// transaction, after deleting the existing rows when `args.reset()` is set. If any transaction
/// number is already present, in the database or earlier in the file, nothing is inserted.
pub async fn load(config: Config, args: LoadArgs) -> Result<Out<LoadSummary>> {
    let path = args.path();
    if !path.is_file() {
        return Err(anyhow!("JSON file not found: {}", path.display())).pub_result(ErrorType::Io);
    }
    info!("Loading transactions from {}...", path.display());

    let items = read_items(path).await?;
    let total = items.len();
    let transactions = validate(items);
    let skipped = total - transactions.len();
    let mut summary = LoadSummary {
        total,
        skipped,
        inserted: 0,
        dry_run: args.dry_run(),
        reset: args.reset(),
    };

    if transactions.is_empty() {
        return Ok(Out::new("No valid transactions to insert.", summary));
    }

    if args.dry_run() {
        let message = format!(
            "Dry run: validated {} transactions (skipped {skipped} of {total}); no changes written.",
            transactions.len()
        );
        return Ok(Out::new(message, summary));
    }

    summary.inserted = config
        .db()
        .insert_transactions(&transactions, args.reset())
        .await
        .pub_result(ErrorType::Database)?;

    let message = format!(
        "Inserted {} transactions (skipped {skipped} of {total}).",
        summary.inserted
    );
    Ok(Out::new(message, summary))
}

/// Reads the file and checks that its top level is an array.
async fn read_items(path: &Path) -> Result<Vec<Value>> {
    let content = utils::read(path).await.pub_result(ErrorType::Io)?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))
        .pub_result(ErrorType::Request)?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(anyhow!("Expected top-level JSON array of transactions."))
            .pub_result(ErrorType::Request),
    }
}

/// Returns the items that are valid transactions, logging the 1-based index of the rest.
fn validate(items: Vec<Value>) -> Vec<Transaction> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match Transaction::from_json(item) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Skipping item #{}: {e:#}", i + 1);
                None
            }
        })
        .collect()
}
