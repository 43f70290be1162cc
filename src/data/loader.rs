use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::error::{LoadError, ParseWarning};
use super::model::{CellValue, ColumnKind, Dataset, DatasetSchema, Row};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// A parsed upload together with the rows that had to be dropped.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Arc<Dataset>,
    pub warnings: Vec<ParseWarning>,
}

impl LoadedDataset {
    /// Number of input rows skipped as malformed.
    pub fn skipped_rows(&self) -> usize {
        self.warnings.len()
    }
}

/// Parse CSV bytes (header row required) into a [`Dataset`].
///
/// * Spaces and tabs at the start of an unquoted field are dropped before
///   tokenizing, so `a, "b,c"` reads the same as `a,"b,c"`.
/// * Rows whose field count differs from the header are skipped.
/// * The schema's timestamp columns are parsed as dates; rows where such a
///   cell is non-empty but unparseable are skipped. Empty cells are `Null`.
/// * Every other column gets one inferred kind: Integer, Float or Text.
///
/// Skips are reported as [`ParseWarning`]s, never as an error. Only a missing
/// header or missing designated columns fail the load.
pub fn load_csv_bytes(bytes: &[u8], schema: &DatasetSchema) -> Result<LoadedDataset, LoadError> {
    let normalized = skip_initial_space(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(normalized.as_slice());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(LoadError::MissingHeader);
    }

    let missing: Vec<String> = schema
        .required_columns()
        .filter(|req| !columns.iter().any(|c| c == req))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns { missing });
    }

    let timestamp_cols: Vec<bool> = columns.iter().map(|c| schema.is_timestamp(c)).collect();

    let mut pending: Vec<Vec<CellValue>> = Vec::new();
    let mut warnings = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let row_no = i + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warnings.push(ParseWarning::Malformed {
                    row: row_no,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if record.len() != columns.len() {
            warnings.push(ParseWarning::FieldCount {
                row: row_no,
                expected: columns.len(),
                found: record.len(),
            });
            continue;
        }

        match parse_row(&record, &columns, &timestamp_cols, row_no) {
            Ok(cells) => pending.push(cells),
            Err(warning) => warnings.push(warning),
        }
    }

    for warning in &warnings {
        log::debug!("Skipped {warning}");
    }
    if !warnings.is_empty() {
        log::warn!("Skipped {} malformed row(s) while loading CSV", warnings.len());
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|idx| {
            if timestamp_cols[idx] {
                ColumnKind::Timestamp
            } else {
                infer_kind(&pending, idx)
            }
        })
        .collect();

    let rows: Vec<Row> = pending
        .into_iter()
        .map(|cells| {
            Row::new(
                cells
                    .into_iter()
                    .zip(&kinds)
                    .map(|(cell, kind)| retype(cell, *kind))
                    .collect(),
            )
        })
        .collect();

    let dataset = Dataset::new(columns, kinds, rows, schema.clone());
    log::info!(
        "Parsed {} rows with columns {:?}",
        dataset.len(),
        dataset.columns
    );

    Ok(LoadedDataset {
        dataset: Arc::new(dataset),
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// Convert one record: timestamps are parsed, everything else stays text until
/// the column kinds are known.
fn parse_row(
    record: &csv::StringRecord,
    columns: &[String],
    timestamp_cols: &[bool],
    row_no: usize,
) -> Result<Vec<CellValue>, ParseWarning> {
    record
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            if raw.is_empty() {
                return Ok(CellValue::Null);
            }
            if !timestamp_cols[idx] {
                return Ok(CellValue::Text(raw.to_string()));
            }
            parse_timestamp(raw)
                .map(CellValue::Timestamp)
                .ok_or_else(|| ParseWarning::BadTimestamp {
                    row: row_no,
                    column: columns[idx].clone(),
                    value: raw.to_string(),
                })
        })
        .collect()
}

/// Drop spaces and tabs that open an unquoted field.
///
/// The CSV reader only honours a quote as the first byte of a field, so
/// `a, "b,c"` would otherwise split at the inner comma. Quoted content,
/// including doubled quotes and line breaks, is copied through untouched.
fn skip_initial_space(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut at_field_start = true;
    let mut in_quotes = false;
    let mut iter = bytes.iter().copied().peekable();

    while let Some(b) = iter.next() {
        if in_quotes {
            out.push(b);
            if b == b'"' {
                if iter.peek() == Some(&b'"') {
                    iter.next();
                    out.push(b'"');
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        if at_field_start && (b == b' ' || b == b'\t') {
            continue;
        }
        out.push(b);
        match b {
            b',' | b'\n' | b'\r' => at_field_start = true,
            b'"' if at_field_start => {
                in_quotes = true;
                at_field_start = false;
            }
            _ => at_field_start = false,
        }
    }
    out
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse the date formats seen in exported open-data CSVs. Offsets are
/// normalised to UTC.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Column typing
// ---------------------------------------------------------------------------

fn infer_kind(rows: &[Vec<CellValue>], idx: usize) -> ColumnKind {
    let mut all_int = true;
    for row in rows {
        let CellValue::Text(s) = &row[idx] else {
            continue;
        };
        if all_int && s.parse::<i64>().is_err() {
            all_int = false;
        }
        // `inf` and `NaN` parse as f64 but are words in this data.
        if !s.parse::<f64>().is_ok_and(f64::is_finite) {
            return ColumnKind::Text;
        }
    }
    if all_int {
        ColumnKind::Integer
    } else {
        ColumnKind::Float
    }
}

fn retype(cell: CellValue, kind: ColumnKind) -> CellValue {
    let CellValue::Text(s) = cell else {
        return cell;
    };
    match kind {
        ColumnKind::Integer => s.parse().map(CellValue::Integer).unwrap_or(CellValue::Text(s)),
        ColumnKind::Float => s.parse().map(CellValue::Float).unwrap_or(CellValue::Text(s)),
        ColumnKind::Text | ColumnKind::Timestamp => CellValue::Text(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "id,title,owner,type,created,modified\n";

    fn load(body: &str) -> Result<LoadedDataset, LoadError> {
        load_csv_bytes(format!("{HEADER}{body}").as_bytes(), &DatasetSchema::default())
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn short_row_is_skipped_and_counted() {
        let loaded = load(
            "1,Lagoa,Alice,Park,2023-01-01 10:00:00,2023-01-02 10:00:00\n\
             2,Museu,Bob,Museum,2023-02-01 10:00:00\n\
             3,Praia,Bob,Park,2023-03-01 10:00:00,2023-03-02 10:00:00\n",
        )
        .unwrap();
        assert_eq!(loaded.dataset.len(), 2);
        assert_eq!(loaded.skipped_rows(), 1);
        assert_eq!(
            loaded.warnings[0],
            ParseWarning::FieldCount {
                row: 2,
                expected: 6,
                found: 5
            }
        );
    }

    #[test]
    fn unparseable_timestamp_skips_row() {
        let loaded = load(
            "1,Lagoa,Alice,Park,not a date,2023-01-02\n\
             2,Museu,Bob,Museum,2023-02-01,2023-02-02\n",
        )
        .unwrap();
        assert_eq!(loaded.dataset.len(), 1);
        assert!(matches!(
            &loaded.warnings[0],
            ParseWarning::BadTimestamp { row: 1, column, .. } if column == "created"
        ));
    }

    #[test]
    fn empty_timestamp_is_null_not_skipped() {
        let loaded = load("1,Lagoa,Alice,Park,2023-01-01,\n").unwrap();
        assert_eq!(loaded.skipped_rows(), 0);
        let modified = loaded.dataset.column_index("modified").unwrap();
        assert!(loaded.dataset.rows[0].get(modified).is_null());
    }

    #[test]
    fn missing_required_columns_is_a_schema_error() {
        let err = load_csv_bytes(b"id,owner,created\n1,Alice,2023-01-01\n", &DatasetSchema::default())
            .unwrap_err();
        assert!(err.is_schema_error());
        match err {
            LoadError::MissingColumns { missing } => {
                assert_eq!(missing, vec!["type".to_string(), "modified".to_string()])
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = load_csv_bytes(b"", &DatasetSchema::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader));
    }

    #[test]
    fn header_only_gives_empty_dataset() {
        let loaded = load("").unwrap();
        assert!(loaded.dataset.is_empty());
        assert_eq!(loaded.dataset.columns.len(), 6);
        assert!(loaded.dataset.category_values["owner"].is_empty());
    }

    #[test]
    fn leading_whitespace_and_quotes_are_stripped() {
        let loaded = load("1, \"Cristo\", Alice,\"Park\", 2023-01-01, 2023-01-02\n").unwrap();
        let row = &loaded.dataset.rows[0];
        assert_eq!(row.get(1), &text("Cristo"));
        assert_eq!(row.get(2), &text("Alice"));
        assert_eq!(row.get(3), &text("Park"));
    }

    #[test]
    fn quoted_comma_after_space_stays_in_one_field() {
        let loaded = load("1, \"Cristo, Redentor\", Alice, Park, 2023-01-01, 2023-01-02\n").unwrap();
        assert_eq!(loaded.skipped_rows(), 0);
        assert_eq!(loaded.dataset.len(), 1);
        let row = &loaded.dataset.rows[0];
        assert_eq!(row.get(1), &text("Cristo, Redentor"));
        assert_eq!(row.get(2), &text("Alice"));
    }

    #[test]
    fn doubled_quotes_are_decoded_once() {
        let loaded = load("1,\"\"\"Cristo\"\" e \"\"Pao\"\"\",Alice,Park,2023-01-01,2023-01-02\n").unwrap();
        assert_eq!(loaded.dataset.rows[0].get(1), &text("\"Cristo\" e \"Pao\""));
    }

    #[test]
    fn spaces_inside_quotes_are_kept() {
        assert_eq!(skip_initial_space(b"a, \" b, c\",\n d"), b"a,\" b, c\",\nd".to_vec());
        assert_eq!(skip_initial_space(b"\"x\"\" ,y\", z"), b"\"x\"\" ,y\",z".to_vec());
    }

    #[test]
    fn non_finite_words_keep_a_text_column() {
        let loaded = load(
            "1,inf,Alice,Park,2023-01-01,2023-01-02\n\
             2,NaN,Bob,Park,2023-01-01,2023-01-02\n",
        )
        .unwrap();
        assert_eq!(loaded.dataset.kinds[1], ColumnKind::Text);
        assert_eq!(loaded.dataset.rows[0].get(1), &text("inf"));
    }

    #[test]
    fn columns_are_typed_as_a_whole() {
        let loaded = load(
            "1,10,Alice,Park,2023-01-01,2023-01-02\n\
             2,2.5,Bob,Park,2023-01-01,2023-01-02\n",
        )
        .unwrap();
        let ds = &loaded.dataset;
        assert_eq!(ds.kinds[0], ColumnKind::Integer);
        assert_eq!(ds.kinds[1], ColumnKind::Float);
        assert_eq!(ds.kinds[2], ColumnKind::Text);
        assert_eq!(ds.kinds[4], ColumnKind::Timestamp);
        assert_eq!(ds.rows[0].get(1), &CellValue::Float(10.0));
        assert_eq!(ds.rows[1].get(0), &CellValue::Integer(2));
    }

    #[test]
    fn timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 4, 5)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap();
        for input in [
            "2023-04-05 13:30:00",
            "2023-04-05T13:30:00",
            "2023-04-05T13:30:00Z",
            "2023-04-05T10:30:00-03:00",
            "2023-04-05 13:30:00+00:00",
            "2023-04-05 13:30",
            "2023/04/05 13:30:00",
        ] {
            assert_eq!(parse_timestamp(input), Some(expected), "{input}");
        }
        assert_eq!(
            parse_timestamp("2023-04-05"),
            NaiveDate::from_ymd_opt(2023, 4, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
