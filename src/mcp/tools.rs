//! The tools exposed by the MCP server.

use crate::args::{ListArgs, ReportArgs};
use crate::commands::{self, OutputFormat};
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::LedgerServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use tracing::info;

#[tool_router(vis = "pub(super)")]
impl LedgerServer {
    /// Initialize the ledger MCP service for this session and return usage instructions. You
    /// **MUST** call this **ONCE** before using other tools so that you have the full usage
    /// instructions. You **MAY** call it more than once if you have forgotten the usage
    /// instructions.
    #[tool]
    async fn initialize_service(&self) -> Result<CallToolResult, McpError> {
        let mut initialized = self.initialized.lock().await;
        *initialized = true;
        Ok(CallToolResult::success(vec![rmcp::model::Content::text(
            include_str!("docs/INSTRUCTIONS.md"),
        )]))
    }

    /// List transactions, newest year first and then by transaction number, one page at a time.
    ///
    /// # Parameters
    ///
    /// - `transaction_type`, `status`, `year`: optional equality filters, combined with AND. A
    ///   `year` that is not a whole number is ignored. A type or status that does not exist
    ///   matches nothing.
    /// - `page`: the 1-based page to return. Asking for a page past the last one is an error.
    /// - `page_size`: transactions per page, capped at the configured maximum.
    ///
    /// # Returns
    ///
    /// A message and a JSON object with `count` (all matching transactions), `page`,
    /// `num_pages`, `next` and `previous` (page numbers or null) and `results`.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "status": "unpaid",
    ///   "year": "2024",
    ///   "page": 2
    /// }
    /// ```
    #[tool]
    async fn list_transactions(
        &self,
        Parameters(mut args): Parameters<ListArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: list_transactions called");
        args.format = OutputFormat::Json;
        let config = (*self.config).clone();
        tool_result(commands::list(config, args).await)
    }

    /// Sum transaction amounts into a pivot-style report.
    ///
    /// Transactions are grouped by `row_field` and, within each row, by the combination of
    /// `column_fields`. Filters are applied before summing. All amounts are exact decimals returned
    /// as strings.
    ///
    /// # Parameters
    ///
    /// - `row_field` (required): one of `transaction_type`, `status` or `year`.
    /// - `column_fields`: comma-separated list of the same names, without duplicates. May be
    ///   empty, in which case each row has a single cell with an empty `column_key`.
    /// - `transaction_type`, `status`, `year`: the same filters as `list_transactions`.
    ///
    /// # Returns
    ///
    /// `data` (one entry per row value, sorted by that value, each with `cells` and
    /// `row_total`), `column_totals` and `grand_total`.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "row_field": "transaction_type",
    ///   "column_fields": "year,status"
    /// }
    /// ```
    #[tool]
    async fn transaction_report(
        &self,
        Parameters(mut args): Parameters<ReportArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: transaction_report called");
        args.format = OutputFormat::Json;
        let config = (*self.config).clone();
        tool_result(commands::report(config, args).await)
    }
}
