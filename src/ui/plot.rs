use std::f32::consts::{FRAC_PI_2, TAU};

use chrono::{DateTime, NaiveDateTime};
use eframe::egui::{self, Color32, RichText, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

use crate::color::ColorMap;
use crate::data::model::CellValue;
use crate::data::summary::HistogramBin;

const PLOT_HEIGHT: f32 = 260.0;

fn to_seconds(t: NaiveDateTime) -> f64 {
    t.and_utc().timestamp() as f64
}

fn date_label(seconds: f64) -> String {
    DateTime::from_timestamp(seconds as i64, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Label for the category at integer position `value`, blank between ticks.
fn category_label(labels: &[String], value: f64) -> String {
    if value < 0.0 || value.fract() != 0.0 {
        return String::new();
    }
    labels.get(value as usize).cloned().unwrap_or_default()
}

fn color_of(color_map: Option<&ColorMap>, value: &CellValue) -> Color32 {
    color_map.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(value))
}

// ---------------------------------------------------------------------------
// Simple charts
// ---------------------------------------------------------------------------

/// One bar per category value with its row count.
pub fn count_bar_chart(
    ui: &mut Ui,
    id: &str,
    counts: &[(CellValue, usize)],
    color_map: Option<&ColorMap>,
) {
    let labels: Vec<String> = counts.iter().map(|(v, _)| v.to_string()).collect();
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (value, n))| {
            Bar::new(i as f64, *n as f64)
                .name(value.to_string())
                .fill(color_of(color_map, value))
                .width(0.7)
        })
        .collect();

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .y_axis_label("Records")
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Records"));
        });
}

/// Pie chart of category shares, drawn directly with the painter.
pub fn pie_chart(ui: &mut Ui, counts: &[(CellValue, usize)], color_map: Option<&ColorMap>) {
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        ui.label("No records to chart.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        let size = PLOT_HEIGHT - 20.0;
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(size), Sense::hover());
        let painter = ui.painter_at(rect);
        let center = rect.center();
        let radius = size * 0.45;

        let mut start = -FRAC_PI_2;
        for (value, n) in counts {
            let sweep = *n as f32 / total as f32 * TAU;
            let color = color_of(color_map, value);
            // Triangle fan; each piece stays convex.
            let steps = ((sweep / TAU) * 96.0).ceil().max(1.0) as usize;
            for s in 0..steps {
                let a0 = start + sweep * s as f32 / steps as f32;
                let a1 = start + sweep * (s + 1) as f32 / steps as f32;
                painter.add(Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * Vec2::angled(a0),
                        center + radius * Vec2::angled(a1),
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
            start += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for (value, n) in counts {
                let pct = *n as f64 / total as f64 * 100.0;
                ui.label(
                    RichText::new(format!("■ {value}: {n} ({pct:.1}%)"))
                        .color(color_of(color_map, value)),
                );
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Advanced charts
// ---------------------------------------------------------------------------

/// Histogram of a timestamp column.
pub fn date_histogram(ui: &mut Ui, id: &str, bins: &[HistogramBin]) {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|bin| {
            let start = to_seconds(bin.start);
            let end = to_seconds(bin.end);
            Bar::new((start + end) / 2.0, bin.count as f64)
                .width((end - start).max(1.0))
                .name(format!("{} – {}", date_label(start), date_label(end)))
        })
        .collect();

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .y_axis_label("Records")
        .x_axis_formatter(|mark, _range| date_label(mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE).name("Records"));
        });
}

/// Timestamp on x, category on y, one coloured series per category.
pub fn category_scatter(
    ui: &mut Ui,
    id: &str,
    points: &[(NaiveDateTime, CellValue)],
    categories: &[CellValue],
    color_map: Option<&ColorMap>,
) {
    let labels: Vec<String> = categories.iter().map(|c| c.to_string()).collect();

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(|mark, _range| date_label(mark.value))
        .y_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .show(ui, |plot_ui| {
            for (y, category) in categories.iter().enumerate() {
                let series: Vec<[f64; 2]> = points
                    .iter()
                    .filter(|(_, c)| c == category)
                    .map(|(t, _)| [to_seconds(*t), y as f64])
                    .collect();
                if series.is_empty() {
                    continue;
                }
                plot_ui.points(
                    Points::new(PlotPoints::new(series))
                        .name(category.to_string())
                        .color(color_of(color_map, category))
                        .radius(3.0),
                );
            }
        });
}

/// Small framed metric: caption above a large value.
pub fn metric(ui: &mut Ui, caption: &str, value: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(caption);
            ui.heading(value);
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_only_on_integer_ticks() {
        let labels = vec!["Park".to_string(), "Museum".to_string()];
        assert_eq!(category_label(&labels, 1.0), "Museum");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, -1.0), "");
        assert_eq!(category_label(&labels, 7.0), "");
    }

    #[test]
    fn date_labels_use_utc_seconds() {
        assert_eq!(date_label(0.0), "1970-01-01");
        assert_eq!(date_label(86_400.0 * 365.0), "1971-01-01");
    }
}
