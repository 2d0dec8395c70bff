//! Parallel (file × method) analysis.
//!
//! Every cell is computed independently on the rayon pool and carries its own
//! `Result`, so one failing file or method never hides its neighbours. The
//! dual-resolution view (PSD plus spectrogram) is computed once per file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::config::{AnalysisConfig, EstimatorParams};
use crate::data::audio::{load_wav, AudioClip};
use crate::data::model::{DualResolution, Spectrum};
use crate::error::{AnalysisError, AnalysisResult};
use crate::spectral::dual::dual_resolution;
use crate::spectral::{estimate, parse_methods, Method};

/// Result of one (file, method) computation.
#[derive(Debug, Clone)]
pub struct Cell {
    pub filename: String,
    pub method: Method,
    pub outcome: AnalysisResult<Spectrum>,
}

impl Cell {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Dual-resolution analysis of one file.
#[derive(Debug, Clone)]
pub struct SpectrogramCell {
    pub filename: String,
    pub outcome: AnalysisResult<DualResolution>,
}

/// Everything one analysis run produces, both file-major in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub cells: Vec<Cell>,
    pub spectrograms: Vec<SpectrogramCell>,
}

type Loaded<'a> = (String, AnalysisResult<&'a AudioClip>);

pub struct Batch {
    methods: Vec<Method>,
    params: EstimatorParams,
    cancel: AtomicBool,
}

impl Batch {
    /// Validate `config` and resolve its method names. Unknown names are
    /// dropped; if none are left that is a `ConfigError`.
    pub fn new(config: &AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        let methods = parse_methods(&config.methods);
        if methods.is_empty() {
            return Err(AnalysisError::config(format!(
                "no valid methods in {:?}",
                config.methods
            )));
        }
        Ok(Self {
            methods,
            params: config.resolved_estimator(),
            cancel: AtomicBool::new(false),
        })
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Every cell that has not started yet reports
    /// [`AnalysisError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Analyse already decoded clips. Cells come back file-major, in input
    /// order.
    pub fn run_clips(&self, clips: &[AudioClip]) -> AnalysisResult<Vec<Cell>> {
        let loaded: Vec<Loaded> = clips.iter().map(|c| (c.name.clone(), Ok(c))).collect();
        self.run(&loaded)
    }

    /// Decode and analyse WAV files. A file that fails to load yields one
    /// failed cell per method.
    pub fn run_files(&self, paths: &[PathBuf]) -> AnalysisResult<Vec<Cell>> {
        let decoded = decode(paths);
        self.run(&borrow_clips(&decoded))
    }

    /// Dual-resolution view of each clip.
    pub fn run_spectrograms(&self, clips: &[AudioClip]) -> Vec<SpectrogramCell> {
        let loaded: Vec<Loaded> = clips.iter().map(|c| (c.name.clone(), Ok(c))).collect();
        self.spectrograms(&loaded)
    }

    /// Decode each file once, then run every method and the dual-resolution
    /// view on it.
    pub fn run_files_with_spectrograms(&self, paths: &[PathBuf]) -> AnalysisResult<BatchOutput> {
        let decoded = decode(paths);
        let loaded = borrow_clips(&decoded);
        let cells = self.run(&loaded)?;
        Ok(BatchOutput {
            cells,
            spectrograms: self.spectrograms(&loaded),
        })
    }

    fn spectrograms(&self, files: &[Loaded]) -> Vec<SpectrogramCell> {
        files
            .par_iter()
            .map(|(filename, clip)| {
                let outcome = if self.cancel.load(Ordering::Relaxed) {
                    Err(AnalysisError::Cancelled)
                } else {
                    clip.clone().and_then(|clip| {
                        dual_resolution(&clip.samples, clip.sample_rate as f64, &self.params)
                    })
                };
                if let Err(e) = &outcome {
                    log::warn!("{filename} / spectrogram: {e}");
                }
                SpectrogramCell {
                    filename: filename.clone(),
                    outcome,
                }
            })
            .collect()
    }

    fn run(&self, files: &[Loaded]) -> AnalysisResult<Vec<Cell>> {
        if files.is_empty() {
            return Err(AnalysisError::config("no files selected"));
        }
        let started = Instant::now();
        let jobs: Vec<(usize, Method)> = (0..files.len())
            .flat_map(|f| self.methods.iter().map(move |&m| (f, m)))
            .collect();

        let cells: Vec<Cell> = jobs
            .par_iter()
            .map(|&(f, method)| {
                let (filename, clip) = &files[f];
                let outcome = if self.cancel.load(Ordering::Relaxed) {
                    Err(AnalysisError::Cancelled)
                } else {
                    clip.clone().and_then(|clip| {
                        estimate(&clip.samples, clip.sample_rate as f64, method, &self.params)
                    })
                };
                if let Err(e) = &outcome {
                    log::warn!("{filename} / {method}: {e}");
                }
                Cell {
                    filename: filename.clone(),
                    method,
                    outcome,
                }
            })
            .collect();

        let failed = cells.iter().filter(|c| !c.is_ok()).count();
        log::info!(
            "Analysed {} files × {} methods in {:.2}s ({failed} failed)",
            files.len(),
            self.methods.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(cells)
    }
}

fn decode(paths: &[PathBuf]) -> Vec<(String, AnalysisResult<AudioClip>)> {
    paths
        .par_iter()
        .map(|p| (display_name(p), load_wav(p)))
        .collect()
}

fn borrow_clips(decoded: &[(String, AnalysisResult<AudioClip>)]) -> Vec<Loaded<'_>> {
    decoded
        .iter()
        .map(|(name, clip)| (name.clone(), clip.as_ref().map_err(Clone::clone)))
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
