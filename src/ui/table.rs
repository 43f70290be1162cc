use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::filter::FilteredView;
use crate::data::model::CellValue;

const ROW_HEIGHT: f32 = 18.0;

/// Scrollable table of a view; only visible rows are laid out.
pub fn data_table(ui: &mut Ui, id: &str, view: &FilteredView, max_height: f32) {
    let n_cols = view.columns().len();
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(max_height)
            .columns(Column::auto().at_least(60.0).clip(true), n_cols)
            .header(20.0, |mut header| {
                for name in view.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, view.len(), |mut row| {
                    let Some(data) = view.row(row.index()) else {
                        return;
                    };
                    for value in &data.values {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell_text(value));
                        });
                    }
                });
            });
    });
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        other => other.to_string(),
    }
}
