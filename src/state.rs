use std::collections::BTreeMap;
use std::sync::Arc;

use crate::color::{ColorMap, Theme};
use crate::config::DashboardConfig;
use crate::data::cache::DatasetCache;
use crate::data::error::{ExportError, FilterError, LoadError};
use crate::data::export::to_csv_bytes;
use crate::data::filter::{FilteredView, InclusionState};
use crate::data::loader::LoadedDataset;
use crate::data::model::{CellValue, DatasetSchema};
use crate::data::summary::Summary;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One session's state, independent of rendering.
///
/// Owns its inclusion flags and view; the parsed dataset itself is shared
/// through the cache.
pub struct AppState {
    pub config: DashboardConfig,
    schema: DatasetSchema,
    cache: Arc<DatasetCache>,

    /// Loaded upload (None until the user opens a file).
    pub loaded: Option<Arc<LoadedDataset>>,

    /// Display name of the loaded file.
    pub source_name: Option<String>,

    /// Per-(attribute, value) include flags.
    pub inclusion: InclusionState,

    /// First rows of the upload, unfiltered.
    pub preview: Option<FilteredView>,

    /// Rows passing the current filter (recomputed on every change).
    pub view: Option<FilteredView>,

    /// Aggregates of `view`.
    pub summary: Option<Summary>,

    /// One colour map per category column.
    pub color_maps: BTreeMap<String, ColorMap>,

    pub theme: Theme,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = Arc::new(DatasetCache::new(config.cache_capacity));
        Self::with_cache(config, cache)
    }

    /// A session backed by a cache shared with other sessions.
    pub fn with_cache(config: DashboardConfig, cache: Arc<DatasetCache>) -> Self {
        Self {
            schema: config.schema(),
            theme: Theme::from_config(&config.theme),
            config,
            cache,
            loaded: None,
            source_name: None,
            inclusion: InclusionState::default(),
            preview: None,
            view: None,
            summary: None,
            color_maps: BTreeMap::new(),
            status_message: None,
        }
    }

    /// Parse (or fetch from cache) an upload and make it the current dataset.
    /// On failure the previous dataset stays loaded.
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<(), LoadError> {
        match self.cache.load(bytes, &self.schema) {
            Ok(loaded) => {
                log::info!(
                    "Loaded {name}: {} rows, {} skipped",
                    loaded.dataset.len(),
                    loaded.skipped_rows()
                );
                self.source_name = Some(name.to_string());
                self.set_dataset(loaded);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {name}: {e}");
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Ingest a newly loaded dataset, reset filters and colours.
    pub fn set_dataset(&mut self, loaded: Arc<LoadedDataset>) {
        let dataset = &loaded.dataset;
        self.inclusion = InclusionState::from_dataset(dataset);
        self.preview = Some(FilteredView::all(dataset).head(self.config.preview_rows));
        self.color_maps = dataset
            .category_values
            .iter()
            .map(|(col, vals)| (col.clone(), ColorMap::new(col, vals)))
            .collect();
        self.status_message = match loaded.skipped_rows() {
            0 => None,
            n => Some(format!("{n} malformed row(s) skipped")),
        };
        self.loaded = Some(loaded);
        self.refilter();
    }

    /// Recompute the view and its summary after a filter change.
    pub fn refilter(&mut self) {
        let Some(loaded) = &self.loaded else {
            return;
        };
        let view = self.inclusion.apply(&loaded.dataset);
        self.summary = Some(Summary::compute(
            &view,
            &self.config.summary_timestamp,
            self.config.histogram_bins,
        ));
        self.view = Some(view);
    }

    /// Include or exclude one category value.
    pub fn toggle(
        &mut self,
        attribute: &str,
        value: &CellValue,
        included: bool,
    ) -> Result<(), FilterError> {
        let before = self.inclusion.revision();
        self.inclusion.toggle(attribute, value, included)?;
        if self.inclusion.revision() != before {
            self.refilter();
        }
        Ok(())
    }

    /// Include or exclude every value of one attribute.
    pub fn set_all(&mut self, attribute: &str, included: bool) -> Result<(), FilterError> {
        let before = self.inclusion.revision();
        self.inclusion.set_all(attribute, included)?;
        if self.inclusion.revision() != before {
            self.refilter();
        }
        Ok(())
    }

    /// Attributes that currently have nothing selected.
    pub fn empty_selections(&self) -> Vec<&str> {
        self.inclusion.empty_attributes()
    }

    /// CSV bytes of the current view; `None` before any file is loaded.
    pub fn export_csv(&self) -> Option<Result<Vec<u8>, ExportError>> {
        self.view.as_ref().map(to_csv_bytes)
    }

    pub fn visible_rows(&self) -> usize {
        self.view.as_ref().map_or(0, FilteredView::len)
    }

    pub fn total_rows(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.dataset.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &[u8] = b"id,owner,type,created,modified\n\
        1,Alice,Park,2023-01-01,2023-01-02\n\
        2,Bob,Museum,2023-02-01,2023-02-02\n\
        3,Alice,Museum,2023-03-01,2023-03-02\n";

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn load_then_filter_updates_view_and_summary() {
        let mut state = AppState::default();
        state.load_bytes("tour.csv", INPUT).unwrap();
        assert_eq!(state.visible_rows(), 3);
        assert_eq!(state.preview.as_ref().unwrap().len(), 3);

        state.toggle("owner", &text("Bob"), false).unwrap();
        assert_eq!(state.visible_rows(), 2);
        assert_eq!(state.summary.as_ref().unwrap().total, 2);

        state.set_all("type", false).unwrap();
        assert_eq!(state.visible_rows(), 0);
        assert_eq!(state.empty_selections(), vec!["type"]);
        assert!(state.summary.as_ref().unwrap().date_range.is_none());
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut state = AppState::default();
        state.load_bytes("tour.csv", INPUT).unwrap();
        assert!(state.load_bytes("bad.csv", b"a,b\n1,2\n").is_err());
        assert_eq!(state.total_rows(), 3);
        assert!(state.status_message.as_deref().unwrap().contains("type"));
    }

    #[test]
    fn new_upload_resets_filters() {
        let mut state = AppState::default();
        state.load_bytes("tour.csv", INPUT).unwrap();
        state.set_all("owner", false).unwrap();
        state.load_bytes("tour.csv", INPUT).unwrap();
        assert_eq!(state.visible_rows(), 3);
        assert_eq!(state.preview.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn sessions_share_parsed_dataset() {
        let cache = Arc::new(DatasetCache::new(4));
        let mut a = AppState::with_cache(DashboardConfig::default(), Arc::clone(&cache));
        let mut b = AppState::with_cache(DashboardConfig::default(), Arc::clone(&cache));
        a.load_bytes("a.csv", INPUT).unwrap();
        b.load_bytes("b.csv", INPUT).unwrap();
        assert!(Arc::ptr_eq(a.loaded.as_ref().unwrap(), b.loaded.as_ref().unwrap()));

        a.set_all("owner", false).unwrap();
        assert_eq!(a.visible_rows(), 0);
        assert_eq!(b.visible_rows(), 3);
    }

    #[test]
    fn export_before_load_is_none() {
        let state = AppState::default();
        assert!(state.export_csv().is_none());
    }
}
