use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use rusty_harmonics::color::generate_palette;
use rusty_harmonics::spectral::Method;

use crate::state::AppState;

const KEY_HELP: &[(&str, &str)] = &[
    ("left click", "select peak"),
    ("left double", "remove peak and its pairs"),
    ("left triple", "clear everything"),
    ("right click", "pair last two selected"),
    ("right double", "unpair peak"),
    ("right triple", "remove all edges"),
    ("c", "clear selection"),
    ("r", "reset all"),
    ("a", "connect all"),
    ("d", "toggle dB / linear"),
    ("m", "ratio matrix"),
];

// ---------------------------------------------------------------------------
// Left side panel – methods, files, help
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Methods");
    ui.separator();

    let swatches = generate_palette(Method::ALL.len());
    for (method, swatch) in Method::ALL.iter().zip(&swatches) {
        let mut checked = state.methods.contains(method);
        let text = RichText::new(method.name())
            .color(Color32::from_rgb(swatch.red, swatch.green, swatch.blue));
        if ui.checkbox(&mut checked, text).changed() {
            state.toggle_method(*method);
        }
    }

    ui.add_space(4.0);
    ui.checkbox(&mut state.show_spectrograms, "Spectrogram per file");

    ui.add_space(8.0);
    ui.heading("Files");
    ui.separator();
    if state.files.is_empty() {
        ui.label("No files selected.");
    }
    ScrollArea::vertical()
        .id_salt("file_list")
        .max_height(160.0)
        .show(ui, |ui: &mut Ui| {
            for path in &state.files {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                ui.label(name);
            }
        });

    ui.add_space(8.0);
    egui::CollapsingHeader::new(RichText::new("Controls").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("key_help").striped(true).show(ui, |ui: &mut Ui| {
                for (input, action) in KEY_HELP {
                    ui.monospace(*input);
                    ui.label(*action);
                    ui.end_row();
                }
            });
        });

    if let Some(matrix) = &state.last_matrix {
        ui.add_space(8.0);
        egui::CollapsingHeader::new(RichText::new("Ratio matrix").strong())
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                ScrollArea::both().id_salt("matrix").show(ui, |ui: &mut Ui| {
                    ui.monospace(matrix);
                });
            });
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_files_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export pairs").clicked() {
                state.export();
                ui.close_menu();
            }
        });

        ui.separator();

        let can_run = !state.files.is_empty() && !state.methods.is_empty();
        if ui.add_enabled(can_run, egui::Button::new("Analyse")).clicked() {
            state.analyse();
        }

        ui.separator();

        if !state.cells.is_empty() {
            let failed = state.cells.iter().filter(|c| c.session.is_err()).count();
            ui.label(format!("{} plots, {failed} failed", state.cells.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_files_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open audio clips")
        .add_filter("WAV audio", &["wav"])
        .pick_files();

    if let Some(paths) = files {
        state.set_files(paths);
    }
}
