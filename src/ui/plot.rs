use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Line, Plot, PlotPoints, Points, VLine};

use rusty_harmonics::batch::SpectrogramCell;
use rusty_harmonics::color::{heat, EdgeColor};
use rusty_harmonics::harmonic::{Button, HarmonicGraphEngine};

use crate::state::AppState;

const PLOT_WIDTH: f32 = 420.0;
const PLOT_HEIGHT: f32 = 260.0;
const SPECTROGRAM_HEIGHT: f32 = 110.0;
const SPECTROGRAM_RANGE_DB: f64 = 80.0;

fn to_color32(color: EdgeColor) -> Color32 {
    let c = color.srgb();
    Color32::from_rgb(c.red, c.green, c.blue)
}

// ---------------------------------------------------------------------------
// Results grid (central panel)
// ---------------------------------------------------------------------------

/// One row per file, one plot per method.
pub fn results_grid(ui: &mut Ui, state: &mut AppState) {
    if state.cells.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open WAV files and press Analyse  (File → Open…)");
        });
        return;
    }

    let per_row = state.methods.len().max(1);
    let (fmin, fmax) = (state.config.plot_fmin, state.config.plot_fmax);
    let mut clicks = Vec::new();

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (row, chunk) in state.cells.chunks(per_row).enumerate() {
                ui.horizontal_top(|ui: &mut Ui| {
                    for (col, cell) in chunk.iter().enumerate() {
                        let index = row * per_row + col;
                        ui.vertical(|ui: &mut Ui| {
                            ui.set_width(PLOT_WIDTH);
                            ui.strong(format!("{} / {}", cell.filename, cell.method));
                            match &cell.session {
                                Ok(engine) => {
                                    if let Some(click) = cell_plot(ui, &cell.id(), engine, fmin, fmax) {
                                        clicks.push((index, click));
                                    }
                                    pairs_legend(ui, engine);
                                }
                                Err(marker) => {
                                    ui.add_sized(
                                        [PLOT_WIDTH, PLOT_HEIGHT],
                                        egui::Label::new(RichText::new(marker).color(Color32::RED)),
                                    );
                                }
                            }
                        });
                    }
                });
                if let Some(spectrogram) = state.spectrograms.get(row) {
                    let width = PLOT_WIDTH * chunk.len() as f32;
                    spectrogram_strip(ui, spectrogram, fmin, fmax, width);
                }
                ui.add_space(8.0);
            }
        });

    let time = ui.input(|i| i.time);
    for (index, (button, x)) in clicks {
        state.click(index, button, time, x);
    }
}

/// Draw one engine's view; returns the click (button, frequency) if any.
fn cell_plot(
    ui: &mut Ui,
    id: &str,
    engine: &HarmonicGraphEngine,
    fmin: f64,
    fmax: f64,
) -> Option<(Button, f64)> {
    let view = engine.view();
    let (y_lo, y_hi) = view.y_limits();

    let response = Plot::new(id)
        .width(PLOT_WIDTH)
        .height(PLOT_HEIGHT)
        .x_axis_label("Frequency (Hz)")
        .y_axis_label(view.scale().label())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .include_x(fmin)
        .include_x(fmax)
        .include_y(y_lo)
        .include_y(y_hi)
        .show(ui, |plot_ui| {
            let curve: PlotPoints = view
                .frequencies()
                .iter()
                .zip(view.current())
                .filter(|(&f, _)| f >= fmin && f <= fmax)
                .map(|(&f, &p)| [f, p])
                .collect();
            plot_ui.line(Line::new(curve).color(Color32::from_gray(40)).width(1.0));

            let peaks: PlotPoints = view
                .peaks()
                .iter()
                .map(|p| [p.frequency, view.peak_power(p)])
                .collect();
            plot_ui.points(Points::new(peaks).radius(2.5).color(Color32::GRAY));
            for p in view.peaks() {
                plot_ui.vline(
                    VLine::new(p.frequency)
                        .color(Color32::from_rgba_unmultiplied(255, 150, 180, 120))
                        .width(0.5),
                );
            }

            for pair in engine.pairs() {
                let ends: PlotPoints = [pair.f0, pair.f1]
                    .iter()
                    .map(|&f| [f, view.power_at(f)])
                    .collect();
                plot_ui.line(Line::new(ends).color(to_color32(pair.color)).width(2.0));
            }

            let selected: PlotPoints = engine
                .selected_peaks()
                .iter()
                .map(|&f| [f, view.power_at(f)])
                .collect();
            plot_ui.points(Points::new(selected).radius(5.0).color(Color32::BLUE));

            plot_ui.pointer_coordinate()
        });

    let x = response.inner?.x;
    if response.response.clicked() {
        Some((Button::Left, x))
    } else if response.response.secondary_clicked() {
        Some((Button::Right, x))
    } else {
        None
    }
}

/// Dual-resolution spectrogram of one file, time left to right.
fn spectrogram_strip(ui: &mut Ui, cell: &SpectrogramCell, fmin: f64, fmax: f64, width: f32) {
    let dual = match &cell.outcome {
        Ok(dual) => dual,
        Err(e) => {
            let text = format!("{} spectrogram: {e}", cell.filename);
            ui.label(RichText::new(text).color(Color32::RED));
            return;
        }
    };
    let duration = dual.times.last().copied().unwrap_or_default();
    ui.small(format!(
        "{}: spectrogram {fmin:.0}-{fmax:.0} Hz over {duration:.2} s",
        cell.filename
    ));

    let columns = (width as usize / 2).max(1);
    let rows = (SPECTROGRAM_HEIGHT as usize / 2).max(1);
    let levels = dual.heatmap(fmin, fmax, columns, rows, SPECTROGRAM_RANGE_DB);
    let (rect, _) =
        ui.allocate_exact_size(egui::vec2(width, SPECTROGRAM_HEIGHT), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, Color32::BLACK);

    let Some(n_bins) = levels.first().map(Vec::len) else {
        return;
    };
    let col_w = rect.width() / levels.len() as f32;
    let row_h = rect.height() / n_bins.max(1) as f32;
    for (t, frame) in levels.iter().enumerate() {
        for (k, &level) in frame.iter().enumerate() {
            let min = egui::pos2(
                rect.left() + t as f32 * col_w,
                rect.bottom() - (k + 1) as f32 * row_h,
            );
            let c = heat(level);
            painter.rect_filled(
                egui::Rect::from_min_size(min, egui::vec2(col_w.ceil(), row_h.ceil())),
                0.0,
                Color32::from_rgb(c.red, c.green, c.blue),
            );
        }
    }
}

fn pairs_legend(ui: &mut Ui, engine: &HarmonicGraphEngine) {
    for pair in engine.pairs() {
        ui.label(
            RichText::new(format!(
                "{:.1} Hz - {:.1} Hz  ratio {:.3}",
                pair.f0, pair.f1, pair.ratio
            ))
            .color(to_color32(pair.color)),
        );
    }
}
