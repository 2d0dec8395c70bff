mod app;
mod state;
mod ui;

use std::path::PathBuf;

use app::HarmonicsApp;
use eframe::egui;
use rusty_harmonics::AnalysisConfig;

fn load_config() -> AnalysisConfig {
    let mut config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => AnalysisConfig::load(&path).unwrap_or_else(|e| {
            log::error!("{e:#}; falling back to defaults");
            AnalysisConfig::default()
        }),
        None => AnalysisConfig::default(),
    };
    config.apply_env();
    config
}

fn main() -> eframe::Result {
    env_logger::init();

    let config = load_config();
    log::info!("Methods: {}", config.methods.join(", "));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Harmonics: PSD comparison",
        options,
        Box::new(|_cc| Ok(Box::new(HarmonicsApp::new(config)))),
    )
}
