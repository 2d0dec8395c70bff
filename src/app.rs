use eframe::egui::{self, Key};

use rusty_harmonics::AnalysisConfig;

use crate::state::AppState;
use crate::ui::{panels, plot};

const KEY_BINDINGS: &[(Key, &str)] = &[
    (Key::C, "c"),
    (Key::R, "r"),
    (Key::A, "a"),
    (Key::D, "d"),
    (Key::M, "m"),
];

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct HarmonicsApp {
    pub state: AppState,
}

impl HarmonicsApp {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed: Vec<&str> = ctx.input(|i| {
            KEY_BINDINGS
                .iter()
                .filter(|(key, _)| i.key_pressed(*key))
                .map(|(_, name)| *name)
                .collect()
        });
        for key in pressed {
            self.state.key(key);
        }
    }
}

impl eframe::App for HarmonicsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: methods and controls ----
        egui::SidePanel::left("method_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: results grid ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::results_grid(ui, &mut self.state);
        });
    }
}
