use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::export::write_csv_file;
use crate::data::model::CellValue;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(loaded) = &state.loaded else {
        ui.label("No dataset loaded.");
        customize(ui, state);
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let dataset = std::sync::Arc::clone(&loaded.dataset);
    let categories: Vec<(String, Vec<CellValue>)> = dataset
        .schema
        .category_columns
        .iter()
        .filter_map(|col| Some((col.clone(), dataset.category_values.get(col)?.clone())))
        .collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .max_height((ui.available_height() - 110.0).max(120.0))
        .show(ui, |ui: &mut Ui| {
            for (col, values) in &categories {
                let n_selected = state.inclusion.included_values(col).len();
                let header_text = format!("{col}  ({n_selected}/{})", values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        let mut all = state.inclusion.all_included(col);
                        if ui.checkbox(&mut all, "Select / deselect all").changed() {
                            if let Err(e) = state.set_all(col, all) {
                                log::warn!("{e}");
                            }
                        }
                        ui.separator();

                        for val in values {
                            let mut checked = state.inclusion.is_included(col, val).unwrap_or(false);

                            let mut text = RichText::new(val.to_string());
                            if let Some(cm) = state.color_maps.get(col) {
                                text = text.color(cm.color_for(val));
                            }

                            if ui.checkbox(&mut checked, text).changed() {
                                if let Err(e) = state.toggle(col, val, checked) {
                                    log::warn!("{e}");
                                }
                            }
                        }
                    });
            }
        });

    customize(ui, state);
}

/// Background / font colour pickers.
fn customize(ui: &mut Ui, state: &mut AppState) {
    ui.separator();
    ui.strong("Customize");
    egui::Grid::new("theme_grid").num_columns(2).show(ui, |ui: &mut Ui| {
        ui.label("Background");
        ui.color_edit_button_srgba(&mut state.theme.background);
        ui.end_row();
        ui.label("Font");
        ui.color_edit_button_srgba(&mut state.theme.font);
        ui.end_row();
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open CSV…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.view.is_some() && state.empty_selections().is_empty();
            if ui
                .add_enabled(can_export, egui::Button::new("Export filtered CSV…"))
                .clicked()
            {
                save_export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(name) = &state.source_name {
            ui.label(format!(
                "{name}: {} rows loaded, {} visible",
                state.total_rows(),
                state.visible_rows()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tourism data")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = load_path(state, &path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

/// Read a file from disk and hand its bytes to the session.
pub fn load_path(state: &mut AppState, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    state
        .load_bytes(&name, &bytes)
        .with_context(|| format!("loading {name}"))
}

pub fn save_export_dialog(state: &mut AppState) {
    let Some(view) = &state.view else {
        return;
    };
    let target = rfd::FileDialog::new()
        .set_title("Save filtered data")
        .set_file_name(&state.config.export_file_name)
        .add_filter("CSV", &["csv"])
        .save_file();

    let Some(path) = target else {
        return;
    };
    match write_csv_file(view, &path).with_context(|| format!("writing {}", path.display())) {
        Ok(_) => {
            state.status_message = Some(format!("Saved {} rows to {}", view.len(), path.display()));
        }
        Err(e) => {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
