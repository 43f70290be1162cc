use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDateTime;

/// Display/export format for timestamps. `%.f` prints nothing for whole seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a dataframe would infer.
/// Category values live in `BTreeMap` / `BTreeSet`, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Text(_) => 3,
                Timestamp(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text written to a CSV field on export.
    ///
    /// Whole floats keep one decimal so a re-load infers `Float` again rather
    /// than `Integer`; `Null` becomes an empty field.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                format!("{v:.1}")
            }
            CellValue::Float(v) => v.to_string(),
            CellValue::Timestamp(t) => t.format(TIMESTAMP_FORMAT).to_string(),
            CellValue::Null => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Inferred type of a column. Designated timestamp columns are always `Timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Timestamp,
}

/// Which columns the pipeline singles out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetSchema {
    /// Filterable attributes (`owner`, `type`).
    pub category_columns: Vec<String>,
    /// Columns parsed as timestamps (`created`, `modified`).
    pub timestamp_columns: Vec<String>,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            category_columns: vec!["owner".to_string(), "type".to_string()],
            timestamp_columns: vec!["created".to_string(), "modified".to_string()],
        }
    }
}

impl DatasetSchema {
    /// Every column the input header must contain.
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.category_columns
            .iter()
            .chain(self.timestamp_columns.iter())
            .map(String::as_str)
    }

    pub fn is_timestamp(&self, column: &str) -> bool {
        self.timestamp_columns.iter().any(|c| c == column)
    }
}

// ---------------------------------------------------------------------------
// Row / Dataset
// ---------------------------------------------------------------------------

static NULL_CELL: CellValue = CellValue::Null;

/// One row of the table; `values[i]` belongs to `Dataset::columns[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<CellValue>,
}

impl Row {
    pub fn new(values: Vec<CellValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, column: usize) -> &CellValue {
        self.values.get(column).unwrap_or(&NULL_CELL)
    }
}

/// The full parsed table. Immutable once built; shared behind `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Column names in header order.
    pub columns: Vec<String>,
    /// Inferred kind per column, parallel to `columns`.
    pub kinds: Vec<ColumnKind>,
    /// All rows, in input order. Every row has `columns.len()` values.
    pub rows: Vec<Row>,
    pub schema: DatasetSchema,
    /// For each category column, its distinct values in first-appearance order.
    /// Fixed at load time; never narrowed by the current filter.
    pub category_values: BTreeMap<String, Vec<CellValue>>,
}

impl Dataset {
    /// Build the dataset and extract the category value lists.
    pub fn new(
        columns: Vec<String>,
        kinds: Vec<ColumnKind>,
        rows: Vec<Row>,
        schema: DatasetSchema,
    ) -> Self {
        let mut category_values = BTreeMap::new();
        for col in &schema.category_columns {
            let Some(idx) = columns.iter().position(|c| c == col) else {
                continue;
            };
            let mut seen = BTreeSet::new();
            let mut ordered = Vec::new();
            for row in &rows {
                let val = row.get(idx);
                if seen.insert(val.clone()) {
                    ordered.push(val.clone());
                }
            }
            category_values.insert(col.clone(), ordered);
        }

        Dataset {
            columns,
            kinds,
            rows,
            schema,
            category_values,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
