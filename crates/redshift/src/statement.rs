use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RedshiftError;

/// Opaque identifier of one statement execution on the Data API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementHandle {
    pub id: String,
}

impl StatementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for StatementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Execution status as reported by `DescribeStatement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementStatus {
    Submitted,
    Picked,
    Started,
    Finished,
    Failed,
    Aborted,
}

impl StatementStatus {
    /// `Finished`, `Failed` and `Aborted` never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Aborted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Picked => "PICKED",
            Self::Started => "STARTED",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `DescribeStatement` observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementDescription {
    pub status: StatementStatus,
    /// Service-reported error text, present for failed statements.
    pub error: Option<String>,
}

impl StatementDescription {
    pub fn new(status: StatementStatus) -> Self {
        Self { status, error: None }
    }

    pub fn failed(status: StatementStatus, error: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(error.into()),
        }
    }
}

/// A typed result cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Blob(Vec<u8>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
            Self::Blob(_) => "blob",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// One result row; column order matches the query's select list.
pub type Row = Vec<FieldValue>;

/// Read column `column` of `row` as a string.
pub fn string_column(row: &Row, column: usize) -> Result<String, RedshiftError> {
    match row.get(column) {
        Some(value) => value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RedshiftError::UnexpectedField {
                column,
                expected: "string",
                found: value.kind(),
            }),
        None => Err(RedshiftError::UnexpectedField {
            column,
            expected: "string",
            found: "missing",
        }),
    }
}
