use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};

use super::filter::FilteredView;
use super::model::CellValue;

/// Earliest and latest timestamp of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub min: NaiveDateTime,
    pub max: NaiveDateTime,
}

/// Number of rows in the view.
pub fn count(view: &FilteredView) -> usize {
    view.len()
}

/// Min/max of a timestamp column over the view.
///
/// `None` when there is nothing to measure: the view is empty, the column is
/// unknown, or every cell is `Null`.
pub fn extrema(view: &FilteredView, column: &str) -> Option<DateRange> {
    view.column_values(column)
        .filter_map(CellValue::as_timestamp)
        .fold(None, |acc, t| {
            Some(match acc {
                None => DateRange { min: t, max: t },
                Some(r) => DateRange {
                    min: r.min.min(t),
                    max: r.max.max(t),
                },
            })
        })
}

/// Row count per distinct value of `column`, in first-appearance order.
pub fn counts_by(view: &FilteredView, column: &str) -> Vec<(CellValue, usize)> {
    let mut position: BTreeMap<&CellValue, usize> = BTreeMap::new();
    let mut counts: Vec<(CellValue, usize)> = Vec::new();
    for val in view.column_values(column) {
        match position.get(val) {
            Some(&i) => counts[i].1 += 1,
            None => {
                position.insert(val, counts.len());
                counts.push((val.clone(), 1));
            }
        }
    }
    counts
}

/// One equal-width histogram bucket; `end` is exclusive except for the last bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramBin {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub count: usize,
}

/// Split the column's date range into `bins` equal buckets and count rows in each.
///
/// Empty when the column has no timestamps or `bins` is zero. A range with a
/// single instant yields one one-second bucket.
pub fn histogram(view: &FilteredView, column: &str, bins: usize) -> Vec<HistogramBin> {
    let Some(range) = extrema(view, column) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }

    let span_ms = (range.max - range.min).num_milliseconds();
    if span_ms == 0 {
        return vec![HistogramBin {
            start: range.min,
            end: range.min + Duration::seconds(1),
            count: view
                .column_values(column)
                .filter(|v| v.as_timestamp().is_some())
                .count(),
        }];
    }

    let width_ms = (span_ms as f64 / bins as f64).max(1.0);
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: range.min + Duration::milliseconds((i as f64 * width_ms) as i64),
            end: range.min + Duration::milliseconds(((i + 1) as f64 * width_ms) as i64),
            count: 0,
        })
        .collect();

    for t in view.column_values(column).filter_map(CellValue::as_timestamp) {
        let offset = (t - range.min).num_milliseconds() as f64;
        let idx = ((offset / width_ms) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// (timestamp, category) pairs for a scatter plot; rows with a `Null` timestamp are left out.
pub fn scatter(view: &FilteredView, x_column: &str, y_column: &str) -> Vec<(NaiveDateTime, CellValue)> {
    let (Some(xi), Some(yi)) = (
        view.dataset().column_index(x_column),
        view.dataset().column_index(y_column),
    ) else {
        return Vec::new();
    };
    view.rows()
        .filter_map(|row| Some((row.get(xi).as_timestamp()?, row.get(yi).clone())))
        .collect()
}

// ---------------------------------------------------------------------------
// Summary – everything the dashboard shows for one filter state
// ---------------------------------------------------------------------------

/// Aggregates of one filtered view, computed once per filter change.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub date_range: Option<DateRange>,
    /// Category column → counts, for bar and pie charts.
    pub by_category: BTreeMap<String, Vec<(CellValue, usize)>>,
    pub histogram: Vec<HistogramBin>,
}

impl Summary {
    pub fn compute(view: &FilteredView, timestamp_column: &str, bins: usize) -> Self {
        let by_category = view
            .dataset()
            .schema
            .category_columns
            .iter()
            .map(|col| (col.clone(), counts_by(view, col)))
            .collect();
        Summary {
            total: count(view),
            date_range: extrema(view, timestamp_column),
            by_category,
            histogram: histogram(view, timestamp_column, bins),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::data::filter::InclusionState;
    use crate::data::model::{ColumnKind, Dataset, DatasetSchema, Row};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn dataset() -> Arc<Dataset> {
        let rows = vec![
            Row::new(vec![text("Alice"), text("Park"), CellValue::Timestamp(day(5))]),
            Row::new(vec![text("Bob"), text("Museum"), CellValue::Timestamp(day(1))]),
            Row::new(vec![text("Alice"), text("Museum"), CellValue::Timestamp(day(9))]),
            Row::new(vec![text("Alice"), text("Park"), CellValue::Null]),
        ];
        Arc::new(Dataset::new(
            vec!["owner".into(), "type".into(), "created".into()],
            vec![ColumnKind::Text, ColumnKind::Text, ColumnKind::Timestamp],
            rows,
            DatasetSchema::default(),
        ))
    }

    #[test]
    fn extrema_skips_nulls() {
        let ds = dataset();
        let view = FilteredView::all(&ds);
        assert_eq!(
            extrema(&view, "created"),
            Some(DateRange {
                min: day(1),
                max: day(9)
            })
        );
    }

    #[test]
    fn empty_view_has_no_extrema() {
        let ds = dataset();
        let view = FilteredView::empty(&ds);
        assert_eq!(count(&view), 0);
        assert_eq!(extrema(&view, "created"), None);
        assert!(histogram(&view, "created", 10).is_empty());
    }

    #[test]
    fn counts_follow_the_filter() {
        let ds = dataset();
        let mut state = InclusionState::from_dataset(&ds);
        state.toggle("owner", &text("Bob"), false).unwrap();
        let view = state.apply(&ds);
        assert_eq!(counts_by(&view, "owner"), vec![(text("Alice"), 3)]);
        assert_eq!(
            counts_by(&view, "type"),
            vec![(text("Park"), 2), (text("Museum"), 1)]
        );
    }

    #[test]
    fn histogram_covers_every_timestamp() {
        let ds = dataset();
        let view = FilteredView::all(&ds);
        let bins = histogram(&view, "created", 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[3].count, 1);
        assert_eq!(bins[0].start, day(1));
    }

    #[test]
    fn scatter_pairs_dates_with_categories() {
        let ds = dataset();
        let view = FilteredView::all(&ds);
        let points = scatter(&view, "created", "type");
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], (day(1), text("Museum")));
    }

    #[test]
    fn summary_bundles_everything() {
        let ds = dataset();
        let summary = Summary::compute(&FilteredView::all(&ds), "created", 5);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.by_category["owner"].len(), 2);
        assert_eq!(summary.date_range.map(|r| r.max), Some(day(9)));
    }
}
