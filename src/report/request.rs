use crate::model::ReportDimension;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The dimensions a report is grouped by: exactly one row dimension and an ordered list of
/// column dimensions.
///
/// `build_report` trusts its `ReportRequest`; use `ReportRequest::parse` to build one from
/// untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    pub row_field: ReportDimension,
    pub column_fields: Vec<ReportDimension>,
}

impl ReportRequest {
    pub fn new(row_field: ReportDimension, column_fields: Vec<ReportDimension>) -> Self {
        Self {
            row_field,
            column_fields,
        }
    }

    /// Validates raw request parameters. `column_fields` is a comma-separated list; blank entries
    /// are dropped.
    pub fn parse(
        row_field: Option<&str>,
        column_fields: Option<&str>,
    ) -> Result<Self, RequestError> {
        let row_field = match row_field {
            None | Some("") => return Err(RequestError::MissingRowField),
            Some(s) => ReportDimension::from_str(s)
                .map_err(|_| RequestError::InvalidRowField(s.to_string()))?,
        };

        let names: Vec<&str> = column_fields
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let dimension = ReportDimension::from_str(name)
                .map_err(|_| RequestError::InvalidColumnField(name.to_string()))?;
            columns.push(dimension);
        }

        let distinct: HashSet<ReportDimension> = columns.iter().copied().collect();
        if distinct.len() != columns.len() {
            return Err(RequestError::DuplicateColumnFields);
        }

        Ok(Self::new(row_field, columns))
    }

    /// The grouping key set: the row dimension followed by the column dimensions.
    pub fn group_by(&self) -> Vec<ReportDimension> {
        let mut group_by = Vec::with_capacity(self.column_fields.len() + 1);
        group_by.push(self.row_field);
        group_by.extend(self.column_fields.iter().copied());
        group_by
    }
}

/// Why a set of report parameters was rejected.
#[derive(Clone, PartialEq, Eq)]
pub enum RequestError {
    MissingRowField,
    InvalidRowField(String),
    InvalidColumnField(String),
    DuplicateColumnFields,
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::MissingRowField => f.write_str("row_field is required."),
            RequestError::InvalidRowField(s) => write!(
                f,
                "Invalid row_field '{s}'. Must be one of {}.",
                allowed_names()
            ),
            RequestError::InvalidColumnField(s) => write!(
                f,
                "Invalid column field '{s}'. Must be one of {}.",
                allowed_names()
            ),
            RequestError::DuplicateColumnFields => {
                f.write_str("Duplicate fields are not allowed in column_fields.")
            }
        }
    }
}

impl Debug for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for RequestError {}

/// e.g. `['status', 'transaction_type', 'year']`
fn allowed_names() -> String {
    let quoted: Vec<String> = ReportDimension::sorted_names()
        .into_iter()
        .map(|n| format!("'{n}'"))
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_row_only() {
        let request = ReportRequest::parse(Some("status"), None).unwrap();
        assert_eq!(request.row_field, ReportDimension::Status);
        assert!(request.column_fields.is_empty());
        assert_eq!(request.group_by(), vec![ReportDimension::Status]);
    }

    #[test]
    fn test_parse_columns_in_order_dropping_blanks() {
        let request =
            ReportRequest::parse(Some("transaction_type"), Some(" year, ,status,")).unwrap();
        assert_eq!(
            request.column_fields,
            vec![ReportDimension::Year, ReportDimension::Status]
        );
        assert_eq!(
            request.group_by(),
            vec![
                ReportDimension::TransactionType,
                ReportDimension::Year,
                ReportDimension::Status
            ]
        );
    }

    #[test]
    fn test_missing_row_field() {
        assert_eq!(
            ReportRequest::parse(None, Some("status")),
            Err(RequestError::MissingRowField)
        );
        assert_eq!(
            ReportRequest::parse(Some(""), None),
            Err(RequestError::MissingRowField)
        );
        assert_eq!(
            RequestError::MissingRowField.to_string(),
            "row_field is required."
        );
    }

    #[test]
    fn test_invalid_row_field() {
        let err = ReportRequest::parse(Some("foo"), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid row_field 'foo'. Must be one of ['status', 'transaction_type', 'year']."
        );
    }

    #[test]
    fn test_invalid_column_field() {
        let err = ReportRequest::parse(Some("status"), Some("year,foo")).unwrap_err();
        assert_eq!(err, RequestError::InvalidColumnField("foo".to_string()));
        assert!(err.to_string().starts_with("Invalid column field 'foo'."));
    }

    #[test]
    fn test_duplicate_column_fields() {
        let err = ReportRequest::parse(Some("status"), Some("year,year")).unwrap_err();
        assert_eq!(err, RequestError::DuplicateColumnFields);
    }

    #[test]
    fn test_row_field_may_repeat_in_columns() {
        let request = ReportRequest::parse(Some("status"), Some("status")).unwrap();
        assert_eq!(request.column_fields, vec![ReportDimension::Status]);
    }
}
