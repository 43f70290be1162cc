use eframe::egui;

use crate::color::Theme;
use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui::{panels, sections};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
    /// Theme last pushed into egui's style.
    applied_theme: Option<Theme>,
}

impl DashboardApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
            applied_theme: None,
        }
    }

    /// Files dropped onto the window count as uploads; the first CSV wins.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        let result = match (&file.bytes, &file.path) {
            (Some(bytes), _) => self
                .state
                .load_bytes(&file.name, bytes)
                .map_err(anyhow::Error::from),
            (None, Some(path)) => panels::load_path(&mut self.state, path),
            (None, None) => return,
        };
        if let Err(e) = result {
            log::error!("Failed to load dropped file: {e:#}");
            self.state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

impl Default for DashboardApp {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.applied_theme != Some(self.state.theme) {
            self.state.theme.apply(ctx);
            self.applied_theme = Some(self.state.theme);
        }

        self.handle_dropped_files(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters and colours ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tables, charts, metrics ----
        egui::CentralPanel::default().show(ctx, |ui| {
            sections::dashboard(ui, &mut self.state);
        });
    }
}
