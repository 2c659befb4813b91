//! These structs provide the CLI interface for the ledger CLI. Several of them double as the
//! parameter types of the MCP tools, which is why they also derive `Deserialize` and `JsonSchema`.

use crate::commands::OutputFormat;
use crate::model::TransactionFilter;
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// ledger: Query and summarize a ledger of financial transactions.
///
/// Transactions (invoices, bills and direct expenses) are loaded from a JSON file into a local
/// SQLite database. From there they can be listed with filters and pagination, or summed into a
/// pivot-style report grouped by transaction type, status and year.
///
/// The same queries are available over HTTP with the serve subcommand and to an AI agent through
/// the mcp subcommand.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory with a default config.json and an empty database.
    ///
    /// This is the first command you should run. The home directory is given by --home and
    /// defaults to $HOME/ledger-report.
    Init,
    /// Load transactions from a JSON file into the database.
    ///
    /// The file must contain a JSON array of transaction objects. Objects that fail validation are
    /// skipped and reported. The load is all or nothing with respect to the database: if any
    /// transaction number already exists, nothing is inserted.
    Load(LoadArgs),
    /// List transactions, newest year first.
    List(ListArgs),
    /// Sum transaction amounts into a pivot-style report.
    Report(ReportArgs),
    /// Serve the transactions API over HTTP.
    Serve(ServeArgs),
    /// Run as an MCP server on stdin and stdout.
    Mcp(McpArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the config file and the database are held. Defaults to
    /// ~/ledger-report
    #[arg(long, env = "LEDGER_REPORT_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// Args for the `ledger load` command.
#[derive(Debug, Parser, Clone)]
pub struct LoadArgs {
    /// Path to a JSON file holding an array of transaction objects.
    #[arg(long)]
    path: PathBuf,

    /// Validate the file and report what would be loaded without writing to the database.
    #[arg(long)]
    dry_run: bool,

    /// Delete all existing transactions before loading.
    #[arg(long)]
    reset: bool,
}

impl LoadArgs {
    pub fn new(path: impl Into<PathBuf>, dry_run: bool, reset: bool) -> Self {
        Self {
            path: path.into(),
            dry_run,
            reset,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn reset(&self) -> bool {
        self.reset
    }
}

/// Equality filters shared by `list` and `report`. Filters are combined with AND.
#[derive(Debug, Default, Clone, PartialEq, Eq, clap::Args, Serialize, Deserialize, JsonSchema)]
pub struct FilterArgs {
    /// Only include transactions of this type: invoice, bill or direct_expense.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,

    /// Only include transactions with this status: paid, unpaid or partially_paid.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Only include transactions from this year. Ignored unless it is a whole number.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl FilterArgs {
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter::from_params(
            self.transaction_type.as_deref(),
            self.status.as_deref(),
            self.year.as_deref(),
        )
    }
}

/// Args for the `ledger list` command and the `list_transactions` MCP tool.
#[derive(Debug, Default, Clone, PartialEq, Eq, Parser, Serialize, Deserialize, JsonSchema)]
pub struct ListArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub filter: FilterArgs,

    /// The 1-based page number to return.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,

    /// The number of transactions on a page. Larger values are capped at the configured maximum.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    /// Output format: json, table or csv.
    #[arg(long, value_enum, default_value_t)]
    #[serde(default)]
    pub format: OutputFormat,
}

/// Args for the `ledger report` command and the `transaction_report` MCP tool.
#[derive(Debug, Default, Clone, PartialEq, Eq, Parser, Serialize, Deserialize, JsonSchema)]
pub struct ReportArgs {
    /// The dimension that each row of the report represents: transaction_type, status or year.
    #[arg(long)]
    pub row_field: String,

    /// Comma-separated dimensions that split each row into cells, e.g. "year,status".
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_fields: Option<String>,

    #[command(flatten)]
    #[serde(flatten)]
    pub filter: FilterArgs,

    /// Output format: json, table or csv.
    #[arg(long, value_enum, default_value_t)]
    #[serde(default)]
    pub format: OutputFormat,
}

/// Args for the `ledger serve` command.
#[derive(Debug, Default, Clone, Parser)]
pub struct ServeArgs {
    /// The address to listen on. Overrides `listen` from config.json.
    #[arg(long)]
    listen: Option<SocketAddr>,
}

impl ServeArgs {
    pub fn new(listen: Option<SocketAddr>) -> Self {
        Self { listen }
    }

    pub fn listen(&self) -> Option<SocketAddr> {
        self.listen
    }
}

/// Args for the `ledger mcp` command.
#[derive(Debug, Default, Clone, Parser)]
pub struct McpArgs {}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger-report"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or LEDGER_REPORT_HOME instead of relying on the default \
                home directory.",
            );
            PathBuf::from("ledger-report")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_report_command() {
        let args = Args::try_parse_from([
            "ledger",
            "--home",
            "/tmp/ledger",
            "report",
            "--row-field",
            "transaction_type",
            "--column-fields",
            "year,status",
            "--status",
            "unpaid",
            "--format",
            "table",
        ])
        .unwrap();
        assert_eq!(args.common().home().path(), Path::new("/tmp/ledger"));
        let Command::Report(report) = args.command() else {
            panic!("expected the report command");
        };
        assert_eq!(report.row_field, "transaction_type");
        assert_eq!(report.column_fields.as_deref(), Some("year,status"));
        assert_eq!(report.filter.status.as_deref(), Some("unpaid"));
        assert_eq!(report.format, OutputFormat::Table);
    }

    #[test]
    fn test_parse_load_command() {
        let args =
            Args::try_parse_from(["ledger", "load", "--path", "data.json", "--reset"]).unwrap();
        let Command::Load(load) = args.command() else {
            panic!("expected the load command");
        };
        assert_eq!(load.path(), Path::new("data.json"));
        assert!(load.reset());
        assert!(!load.dry_run());
    }

    #[test]
    fn test_list_args_from_tool_json() {
        let args: ListArgs = serde_json::from_value(json!({
            "transaction_type": "invoice",
            "year": "2024",
            "page": 2
        }))
        .unwrap();
        assert_eq!(args.page, Some(2));
        assert_eq!(args.format, OutputFormat::Json);
        let filter = args.filter.filter();
        assert_eq!(filter.transaction_type.as_deref(), Some("invoice"));
        assert_eq!(filter.year, Some(2024));
    }

    #[test]
    fn test_report_args_require_row_field() {
        let args: Result<ReportArgs, _> = serde_json::from_value(json!({"column_fields": "year"}));
        assert!(args.is_err());
    }
}
