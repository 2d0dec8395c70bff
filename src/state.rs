use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;

use rusty_harmonics::batch::{Batch, BatchOutput, SpectrogramCell};
use rusty_harmonics::export::{export_session, timestamp_now, ExportPaths};
use rusty_harmonics::frontend;
use rusty_harmonics::harmonic::{Button, Command, HarmonicGraphEngine, Outcome};
use rusty_harmonics::spectral::{parse_methods, Method};
use rusty_harmonics::{build_session, AnalysisConfig};

// ---------------------------------------------------------------------------
// One (file, method) cell of the results grid
// ---------------------------------------------------------------------------

pub struct PlotCell {
    pub filename: String,
    pub method: Method,
    /// `Err` holds the failure marker shown instead of a plot.
    pub session: Result<HarmonicGraphEngine, String>,
}

impl PlotCell {
    pub fn id(&self) -> String {
        format!("{}::{}", self.filename, self.method)
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AnalysisConfig,

    /// WAV files picked by the user.
    pub files: Vec<PathBuf>,

    /// Methods ticked in the side panel.
    pub methods: BTreeSet<Method>,

    /// Results grid, file-major.
    pub cells: Vec<PlotCell>,

    /// Draw a dual-resolution spectrogram under each file's row.
    pub show_spectrograms: bool,

    /// One per analysed file, same order as the grid rows.
    pub spectrograms: Vec<SpectrogramCell>,

    /// Where exports are written.
    pub export_dir: PathBuf,

    /// Last ratio matrix requested with `m`, for the side panel.
    pub last_matrix: Option<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AnalysisConfig) -> Self {
        let methods = parse_methods(&config.methods).into_iter().collect();
        Self {
            config,
            files: Vec::new(),
            methods,
            cells: Vec::new(),
            show_spectrograms: true,
            spectrograms: Vec::new(),
            export_dir: PathBuf::from("artifacts"),
            last_matrix: None,
            status_message: None,
        }
    }

    pub fn set_files(&mut self, files: Vec<PathBuf>) {
        log::info!("Selected {} audio files", files.len());
        self.files = files;
        self.cells.clear();
        self.spectrograms.clear();
        self.status_message = None;
    }

    pub fn toggle_method(&mut self, method: Method) {
        if !self.methods.remove(&method) {
            self.methods.insert(method);
        }
    }

    /// Run every ticked method on every file and rebuild the grid.
    pub fn analyse(&mut self) {
        let mut config = self.config.clone();
        config.methods = self.methods.iter().map(|m| m.name().to_string()).collect();

        let output = Batch::new(&config).and_then(|batch| {
            if self.show_spectrograms {
                batch.run_files_with_spectrograms(&self.files)
            } else {
                batch.run_files(&self.files).map(|cells| BatchOutput {
                    cells,
                    spectrograms: Vec::new(),
                })
            }
        });
        match output {
            Ok(output) => {
                self.cells = output
                    .cells
                    .into_iter()
                    .map(|cell| {
                        let session = cell
                            .outcome
                            .and_then(|spectrum| build_session(&spectrum, &config))
                            .map_err(|e| format!("{}: {e}", e.kind()));
                        PlotCell {
                            filename: cell.filename,
                            method: cell.method,
                            session,
                        }
                    })
                    .collect();
                self.spectrograms = output.spectrograms;
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Analysis not started: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Pointer click inside one plot.
    pub fn click(&mut self, cell: usize, button: Button, time: f64, x: f64) {
        if let Some(Ok(engine)) = self.cells.get_mut(cell).map(|c| c.session.as_mut()) {
            engine.apply(frontend::pointer_command(button, time, x));
        }
    }

    /// Keyboard commands go to every plot, as in the document view.
    pub fn key(&mut self, key: &str) {
        let Some(command) = frontend::key_command(key) else {
            return;
        };
        let mut matrices = Vec::new();
        for cell in &mut self.cells {
            let title = cell.id();
            if let Ok(engine) = &mut cell.session {
                if let Outcome::Matrix(m) = engine.apply(command) {
                    matrices.push(format!("{title}\n{m}"));
                }
            }
        }
        if command == Command::RatioMatrix {
            self.last_matrix = (!matrices.is_empty()).then(|| matrices.join("\n"));
        }
    }

    pub fn export(&mut self) {
        match self.write_exports() {
            Ok(paths) => {
                self.status_message = Some(format!("Exported to {}", paths.pairs_json.display()));
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    fn write_exports(&self) -> Result<ExportPaths> {
        let engines = self.cells.iter().filter_map(|c| {
            c.session
                .as_ref()
                .ok()
                .map(|e| (c.filename.as_str(), c.method.name(), e))
        });
        let (pairs, graphs): (Vec<_>, Vec<_>) = engines
            .map(|(file, method, e)| (e.pairs_export(file, method), e.graph_export(file, method)))
            .unzip();
        export_session(&self.export_dir, "psd_analysis", &timestamp_now(), &pairs, &graphs)
    }
}
