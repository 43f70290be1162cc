use eframe::egui;
use rio_dashboard::app::DashboardApp;
use rio_dashboard::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load().unwrap_or_else(|e| {
        log::error!("Ignoring config, using defaults: {e:#}");
        DashboardConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Rio Tourism Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(config)))),
    )
}
