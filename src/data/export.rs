use std::path::Path;

use super::error::ExportError;
use super::filter::FilteredView;

/// Default download name for the filtered CSV.
pub const EXPORT_FILE_NAME: &str = "filtered_data.csv";

/// Content type of the exported artifact.
pub const EXPORT_MIME: &str = "text/csv";

/// Serialize the view as CSV: the dataset's header, then one record per
/// visible row in view order. An empty view yields the header alone.
pub fn to_csv_bytes(view: &FilteredView) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(view.columns())?;
    for row in view.rows() {
        writer.write_record(row.values.iter().map(|v| v.to_field()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Serialize the view and write it to `path`.
pub fn write_csv_file(view: &FilteredView, path: &Path) -> Result<usize, ExportError> {
    let bytes = to_csv_bytes(view)?;
    std::fs::write(path, &bytes)?;
    log::info!("Exported {} rows to {}", view.len(), path.display());
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::filter::InclusionState;
    use crate::data::loader::load_csv_bytes;
    use crate::data::model::{CellValue, DatasetSchema};

    const INPUT: &str = "\
id,owner,type,created,modified,score
1,Alice,Park,2023-01-01 10:00:00,2023-01-02 10:00:00,1.0
2,Bob,Museum,2023-02-01 10:00:00,,2.5
3,Alice,\"Museum, Historic\",2023-03-01 10:00:00,2023-03-05 08:30:00,
";

    #[test]
    fn header_only_for_empty_view() {
        let loaded = load_csv_bytes(INPUT.as_bytes(), &DatasetSchema::default()).unwrap();
        let mut state = InclusionState::from_dataset(&loaded.dataset);
        state.set_all("type", false).unwrap();
        let bytes = to_csv_bytes(&state.apply(&loaded.dataset)).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "id,owner,type,created,modified,score\n"
        );
    }

    #[test]
    fn exports_rows_in_view_order() {
        let loaded = load_csv_bytes(INPUT.as_bytes(), &DatasetSchema::default()).unwrap();
        let mut state = InclusionState::from_dataset(&loaded.dataset);
        state
            .toggle("owner", &CellValue::Text("Bob".into()), false)
            .unwrap();
        let bytes = to_csv_bytes(&state.apply(&loaded.dataset)).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "id,owner,type,created,modified,score\n\
             1,Alice,Park,2023-01-01 10:00:00,2023-01-02 10:00:00,1.0\n\
             3,Alice,\"Museum, Historic\",2023-03-01 10:00:00,2023-03-05 08:30:00,\n"
        );
    }

    #[test]
    fn reload_reproduces_the_view() {
        let schema = DatasetSchema::default();
        let loaded = load_csv_bytes(INPUT.as_bytes(), &schema).unwrap();
        let view = InclusionState::from_dataset(&loaded.dataset).apply(&loaded.dataset);
        let reloaded = load_csv_bytes(&to_csv_bytes(&view).unwrap(), &schema).unwrap();

        assert_eq!(reloaded.skipped_rows(), 0);
        assert_eq!(reloaded.dataset.kinds, loaded.dataset.kinds);
        let original: Vec<_> = view.rows().cloned().collect();
        assert_eq!(reloaded.dataset.rows, original);
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        let loaded = load_csv_bytes(INPUT.as_bytes(), &DatasetSchema::default()).unwrap();
        let dataset = Arc::clone(&loaded.dataset);
        let written = write_csv_file(&FilteredView::all(&dataset), &path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, written);
    }
}
