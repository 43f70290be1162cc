use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::error::FilterError;
use super::model::{CellValue, Dataset, Row};

// ---------------------------------------------------------------------------
// Inclusion state: which category values are selected per attribute
// ---------------------------------------------------------------------------

/// Per-(attribute, value) include flags for the designated category columns.
///
/// Every value starts included. Keys are fixed when the state is built from a
/// dataset; updates naming anything else are rejected with [`FilterError`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InclusionState {
    flags: BTreeMap<String, BTreeMap<CellValue, bool>>,
    /// Bumped once per update that changed at least one flag.
    revision: u64,
}

impl InclusionState {
    /// Initialise with all category values of `dataset` included.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let flags = dataset
            .category_values
            .iter()
            .map(|(col, vals)| {
                let included = vals.iter().map(|v| (v.clone(), true)).collect();
                (col.clone(), included)
            })
            .collect();
        Self { flags, revision: 0 }
    }

    /// Set one flag. Setting a flag to its current value is a no-op.
    pub fn toggle(
        &mut self,
        attribute: &str,
        value: &CellValue,
        included: bool,
    ) -> Result<(), FilterError> {
        let values = self
            .flags
            .get_mut(attribute)
            .ok_or_else(|| FilterError::UnknownAttribute(attribute.to_string()))?;
        let flag = values
            .get_mut(value)
            .ok_or_else(|| FilterError::UnknownValue {
                attribute: attribute.to_string(),
                value: value.clone(),
            })?;
        if *flag != included {
            *flag = included;
            self.revision += 1;
            log::debug!("{attribute}={value} included={included} (rev {})", self.revision);
        }
        Ok(())
    }

    /// Set every flag of one attribute as a single update.
    pub fn set_all(&mut self, attribute: &str, included: bool) -> Result<(), FilterError> {
        let values = self
            .flags
            .get_mut(attribute)
            .ok_or_else(|| FilterError::UnknownAttribute(attribute.to_string()))?;
        let mut changed = false;
        for flag in values.values_mut() {
            changed |= *flag != included;
            *flag = included;
        }
        if changed {
            self.revision += 1;
            log::debug!("{attribute}=* included={included} (rev {})", self.revision);
        }
        Ok(())
    }

    /// `None` when the attribute or value is unknown.
    pub fn is_included(&self, attribute: &str, value: &CellValue) -> Option<bool> {
        self.flags.get(attribute)?.get(value).copied()
    }

    /// Whether every value of `attribute` is included (drives "select all").
    pub fn all_included(&self, attribute: &str) -> bool {
        self.flags
            .get(attribute)
            .is_some_and(|vals| vals.values().all(|&f| f))
    }

    pub fn included_values(&self, attribute: &str) -> BTreeSet<CellValue> {
        self.flags
            .get(attribute)
            .map(|vals| {
                vals.iter()
                    .filter(|(_, f)| **f)
                    .map(|(v, _)| v.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Attributes with nothing selected. Any entry here empties the view.
    /// An attribute with no values at all (empty dataset) does not count.
    pub fn empty_attributes(&self) -> Vec<&str> {
        self.flags
            .iter()
            .filter(|(_, vals)| !vals.is_empty() && !vals.values().any(|&f| f))
            .map(|(col, _)| col.as_str())
            .collect()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The row predicate for the current flags, resolved against `dataset`'s columns.
    pub fn current_filter(&self, dataset: &Dataset) -> RowFilter {
        let clauses = self
            .flags
            .keys()
            .filter_map(|col| {
                let column = dataset.column_index(col)?;
                Some(Clause {
                    column,
                    included: self.included_values(col),
                })
            })
            .collect();
        RowFilter { clauses }
    }

    /// Evaluate the current filter over every row, keeping input order.
    pub fn apply(&self, dataset: &Arc<Dataset>) -> FilteredView {
        self.current_filter(dataset).apply(dataset)
    }
}

// ---------------------------------------------------------------------------
// Row predicate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    column: usize,
    included: BTreeSet<CellValue>,
}

/// AND over attributes of "value is one of the included values".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    clauses: Vec<Clause>,
}

impl RowFilter {
    pub fn matches(&self, row: &Row) -> bool {
        self.clauses
            .iter()
            .all(|c| c.included.contains(row.get(c.column)))
    }

    /// True when some attribute has an empty included set, so no row can match.
    pub fn is_unsatisfiable(&self) -> bool {
        self.clauses.iter().any(|c| c.included.is_empty())
    }

    pub fn apply(&self, dataset: &Arc<Dataset>) -> FilteredView {
        if self.is_unsatisfiable() {
            return FilteredView::empty(dataset);
        }
        let indices = dataset
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.matches(row))
            .map(|(i, _)| i)
            .collect();
        FilteredView {
            dataset: Arc::clone(dataset),
            indices,
        }
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// The rows of a dataset that pass a filter, as indices into the shared table.
#[derive(Debug, Clone)]
pub struct FilteredView {
    dataset: Arc<Dataset>,
    indices: Vec<usize>,
}

impl FilteredView {
    /// Every row of `dataset`.
    pub fn all(dataset: &Arc<Dataset>) -> Self {
        Self {
            dataset: Arc::clone(dataset),
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn empty(dataset: &Arc<Dataset>) -> Self {
        Self {
            dataset: Arc::clone(dataset),
            indices: Vec::new(),
        }
    }

    /// The first `n` rows of this view.
    pub fn head(&self, n: usize) -> Self {
        Self {
            dataset: Arc::clone(&self.dataset),
            indices: self.indices.iter().copied().take(n).collect(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn columns(&self) -> &[String] {
        &self.dataset.columns
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The `n`-th visible row.
    pub fn row(&self, n: usize) -> Option<&Row> {
        self.indices.get(n).map(|&i| &self.dataset.rows[i])
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.indices.iter().map(move |&i| &self.dataset.rows[i])
    }

    /// Values of one column across the visible rows; empty if the column is unknown.
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a CellValue> + 'a {
        let idx = self.dataset.column_index(column);
        self.rows()
            .filter_map(move |row| idx.map(|i| row.get(i)))
    }
}
