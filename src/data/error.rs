use thiserror::Error;

use super::model::CellValue;

/// Failure to turn uploaded bytes into a dataset.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The input has no header row at all.
    #[error("the file has no header row")]
    MissingHeader,

    /// The header lacks one or more designated columns.
    #[error("missing required column(s): {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// The CSV reader failed before any row could be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LoadError {
    /// Header/required-column problems, as opposed to reader failures.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            LoadError::MissingHeader | LoadError::MissingColumns { .. }
        )
    }
}

/// A row the loader dropped. Non-fatal; collected and reported as a count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// Field count differs from the header.
    FieldCount {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A designated timestamp column holds text that is not a date.
    BadTimestamp {
        row: usize,
        column: String,
        value: String,
    },
    /// The CSV reader rejected the record (e.g. invalid UTF-8).
    Malformed { row: usize, message: String },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::FieldCount {
                row,
                expected,
                found,
            } => write!(f, "row {row}: expected {expected} fields, found {found}"),
            ParseWarning::BadTimestamp { row, column, value } => {
                write!(f, "row {row}: '{value}' in column '{column}' is not a date")
            }
            ParseWarning::Malformed { row, message } => write!(f, "row {row}: {message}"),
        }
    }
}

/// Rejected Inclusion State update. The state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("'{0}' is not a filterable column")]
    UnknownAttribute(String),

    #[error("value '{value}' does not occur in column '{attribute}'")]
    UnknownValue { attribute: String, value: CellValue },
}

/// Failure while serializing the filtered view.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
