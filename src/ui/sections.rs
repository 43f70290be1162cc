use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::data::export::EXPORT_MIME;
use crate::data::model::CellValue;
use crate::data::summary::scatter;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

const METRIC_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Central panel – the dashboard body
// ---------------------------------------------------------------------------

/// Render every dashboard section top to bottom.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if state.loaded.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.heading("Open a CSV file to explore it  (File → Open CSV…, or drop it here)");
                if ui.button("Open CSV…").clicked() {
                    panels::open_file_dialog(state);
                }
            });
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            preview_section(ui, state);
            filtered_section(ui, state);
            download_section(ui, state);
            charts_section(ui, state);
            advanced_section(ui, state);
            metrics_section(ui, state);
        });
}

fn preview_section(ui: &mut Ui, state: &AppState) {
    let Some(preview) = &state.preview else {
        return;
    };
    ui.heading("Uploaded data");
    ui.label(format!("First {} rows", preview.len()));
    table::data_table(ui, "preview_table", preview, 140.0);
    ui.separator();
}

fn filtered_section(ui: &mut Ui, state: &AppState) {
    ui.heading("Filtered data");
    let empty = state.empty_selections();
    if !empty.is_empty() {
        ui.label(format!(
            "Select at least one value for: {}",
            empty.join(", ")
        ));
        ui.separator();
        return;
    }
    if let Some(view) = &state.view {
        table::data_table(ui, "filtered_table", view, 320.0);
    }
    ui.separator();
}

fn download_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Download filtered data");
    let enabled = state.empty_selections().is_empty();
    let button = egui::Button::new(format!("Download {}", state.config.export_file_name));
    if ui
        .add_enabled(enabled, button)
        .on_hover_text(format!("Save the filtered rows as {EXPORT_MIME}"))
        .clicked()
    {
        panels::save_export_dialog(state);
    }
    if !enabled {
        ui.label("Select at least one value per filter to download.");
    }
    ui.separator();
}

fn charts_section(ui: &mut Ui, state: &AppState) {
    let Some(summary) = &state.summary else {
        return;
    };
    let categories = &state.config.category_columns;

    ui.heading("Charts");
    if let Some(first) = categories.first() {
        ui.strong(format!("Records per {first}"));
        let counts = summary.by_category.get(first).map_or(&[][..], Vec::as_slice);
        plot::count_bar_chart(ui, "count_bar", counts, state.color_maps.get(first));
    }
    if let Some(second) = categories.get(1) {
        ui.strong(format!("Distribution of {second}"));
        let counts = summary.by_category.get(second).map_or(&[][..], Vec::as_slice);
        plot::pie_chart(ui, counts, state.color_maps.get(second));
    }
    ui.separator();
}

fn advanced_section(ui: &mut Ui, state: &AppState) {
    let (Some(summary), Some(view)) = (&state.summary, &state.view) else {
        return;
    };
    let ts = &state.config.summary_timestamp;

    ui.heading("Advanced charts");
    ui.strong(format!("Histogram of {ts}"));
    plot::date_histogram(ui, "date_histogram", &summary.histogram);

    if let Some(category) = state.config.category_columns.get(1) {
        ui.strong(format!("{category} × {ts}"));
        let points = scatter(view, ts, category);
        let values: &[CellValue] = view
            .dataset()
            .category_values
            .get(category)
            .map_or(&[][..], Vec::as_slice);
        plot::category_scatter(
            ui,
            "category_scatter",
            &points,
            values,
            state.color_maps.get(category),
        );
    }
    ui.separator();
}

fn metrics_section(ui: &mut Ui, state: &AppState) {
    let Some(summary) = &state.summary else {
        return;
    };
    let (oldest, newest) = match summary.date_range {
        Some(range) => (
            range.min.format(METRIC_DATE_FORMAT).to_string(),
            range.max.format(METRIC_DATE_FORMAT).to_string(),
        ),
        None => ("—".to_string(), "—".to_string()),
    };

    ui.heading("Metrics");
    ui.horizontal(|ui: &mut Ui| {
        plot::metric(ui, "Total records", &summary.total.to_string());
        plot::metric(ui, "Oldest date", &oldest);
        plot::metric(ui, "Newest date", &newest);
    });
    if let Some(loaded) = &state.loaded {
        if loaded.skipped_rows() > 0 {
            ui.label(
                RichText::new(format!(
                    "{} malformed row(s) were skipped while loading",
                    loaded.skipped_rows()
                ))
                .weak(),
            );
        }
    }
}
