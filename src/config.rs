//! Analysis configuration.
//!
//! Every section is a serde struct with `#[serde(default)]`, so a JSON file
//! only needs to mention the values it changes:
//!
//! ```json
//! { "methods": ["FFT", "Stationary Wavelet"], "peaks": { "fmin": 200.0 } }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::EdgeColor;
use crate::error::{AnalysisError, AnalysisResult};
use crate::spectral::wavelet::WaveletKind;

// ---------------------------------------------------------------------------
// Top-level configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Method names as shown to users ("FFT", "Multi-Res", ...).
    pub methods: Vec<String>,
    pub estimator: EstimatorParams,
    pub peaks: PeakConfig,
    pub engine: EngineConfig,
    /// Displayed frequency range.
    pub plot_fmin: f64,
    pub plot_fmax: f64,
    /// Initial scale of every session.
    pub use_db_scale: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            methods: ["FFT", "CQT", "Multi-Res", "Chirplet Zero"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            estimator: EstimatorParams::default(),
            peaks: PeakConfig::default(),
            engine: EngineConfig::default(),
            plot_fmin: 100.0,
            plot_fmax: 6000.0,
            use_db_scale: true,
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON configuration file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AnalysisConfig =
            serde_json::from_str(&text).context("parsing config JSON")?;
        Ok(config)
    }

    /// Apply `PEAK_FMIN`, `PEAK_FMAX`, `PLOT_FMIN`, `PLOT_FMAX` overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env`](Self::apply_env) with an arbitrary lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| -> Option<f64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    log::warn!("Ignoring {key}={raw:?}: not a number");
                    None
                }
            }
        };
        if let Some(v) = read("PEAK_FMIN") {
            self.peaks.fmin = v;
        }
        if let Some(v) = read("PEAK_FMAX") {
            self.peaks.fmax = v;
        }
        if let Some(v) = read("PLOT_FMIN") {
            self.plot_fmin = v;
        }
        if let Some(v) = read("PLOT_FMAX") {
            self.plot_fmax = v;
        }
    }

    /// Estimator parameters with derived values filled in.
    ///
    /// The chirplet upper frequency defaults to 1.2 × the plot maximum.
    pub fn resolved_estimator(&self) -> EstimatorParams {
        let mut params = self.estimator.clone();
        if params.chirp_max_freq.is_none() {
            params.chirp_max_freq = Some(self.plot_fmax * 1.2);
        }
        params
    }

    /// Reject parameter combinations no method could run with.
    pub fn validate(&self) -> AnalysisResult<()> {
        self.estimator.validate()?;
        self.peaks.validate()?;
        self.engine.validate()?;
        if !(self.plot_fmin < self.plot_fmax) {
            return Err(AnalysisError::config(format!(
                "plot range {}..{} is empty",
                self.plot_fmin, self.plot_fmax
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Estimator parameters
// ---------------------------------------------------------------------------

/// The parameter bag handed to every spectral method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorParams {
    /// Main window size (FFT method, wavelet depth cap, chirplet padding).
    pub n_fft: usize,
    /// STFT hop = `n_fft / hop_ratio`.
    pub hop_ratio: usize,

    /// Dual-resolution: frequency-optimised PSD window.
    pub psd_n_fft: usize,
    /// Dual-resolution: time-optimised spectrogram window.
    pub spec_n_fft: usize,
    /// Dual-resolution hop = window / `dual_hop_ratio`.
    pub dual_hop_ratio: usize,

    pub cqt_bins_per_octave: usize,
    pub cqt_n_bins: usize,
    pub cqt_fmin: f64,

    /// Ascending window sizes for multi-resolution stitching.
    pub fft_sizes: Vec<usize>,

    pub wavelet: WaveletKind,
    pub packet_max_level: usize,
    pub stationary_max_level: usize,

    pub n_chirps: usize,
    pub chirp_min_freq: f64,
    /// `None` resolves to 1.2 × `plot_fmax`.
    pub chirp_max_freq: Option<f64>,

    /// Optional post-hoc frequency filter applied to every method's output.
    pub output_band: Option<(f64, f64)>,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            n_fft: 1024,
            hop_ratio: 4,
            psd_n_fft: 2048,
            spec_n_fft: 1024,
            dual_hop_ratio: 16,
            cqt_bins_per_octave: 36,
            cqt_n_bins: 150,
            cqt_fmin: 600.0,
            fft_sizes: vec![512, 1024, 2048, 4096],
            wavelet: WaveletKind::Sym8,
            packet_max_level: 6,
            stationary_max_level: 4,
            n_chirps: 100,
            chirp_min_freq: 20.0,
            chirp_max_freq: None,
            output_band: None,
        }
    }
}

impl EstimatorParams {
    /// Hop used by the plain STFT method.
    pub fn hop(&self) -> usize {
        (self.n_fft / self.hop_ratio.max(1)).max(1)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        for (name, size) in [
            ("n_fft", self.n_fft),
            ("psd_n_fft", self.psd_n_fft),
            ("spec_n_fft", self.spec_n_fft),
        ] {
            if size < 2 || !size.is_power_of_two() {
                return Err(AnalysisError::config(format!(
                    "{name} must be a power of two >= 2, got {size}"
                )));
            }
        }
        if self.hop_ratio == 0 || self.dual_hop_ratio == 0 {
            return Err(AnalysisError::config("hop ratios must be positive"));
        }
        if self.fft_sizes.is_empty() || self.fft_sizes.iter().any(|&n| n < 2) {
            return Err(AnalysisError::config(
                "fft_sizes must list at least one window of 2+ samples",
            ));
        }
        if self.cqt_bins_per_octave == 0 || self.cqt_n_bins == 0 || !(self.cqt_fmin > 0.0) {
            return Err(AnalysisError::config("CQT needs bins and a positive fmin"));
        }
        if self.n_chirps == 0 {
            return Err(AnalysisError::config("n_chirps must be positive"));
        }
        if let Some(max) = self.chirp_max_freq {
            if !(self.chirp_min_freq > 0.0 && self.chirp_min_freq < max) {
                return Err(AnalysisError::config(format!(
                    "chirp range {}..{} is invalid",
                    self.chirp_min_freq, max
                )));
            }
        }
        if let Some((lo, hi)) = self.output_band {
            if !(lo < hi) {
                return Err(AnalysisError::config(format!(
                    "output band {lo}..{hi} is empty"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Peak detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Detection band.
    pub fmin: f64,
    pub fmax: f64,
    /// Initial height threshold as a fraction (0..1) percentile of band power.
    pub height_percentile: f64,
    /// Initial prominence threshold as a multiple of the band's std-dev.
    pub prominence_factor: f64,
    /// Minimum width in bins (raised to at least 1).
    pub min_width: f64,
    pub max_peaks: usize,
    /// Target count; the relaxation loop runs while fewer are found.
    pub min_desired_peaks: usize,
    pub percentile_floor: f64,
    pub percentile_step: f64,
    /// Prominence factor is divided by this on every relaxation.
    pub prominence_shrink: f64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            fmin: 100.0,
            fmax: 6000.0,
            height_percentile: 0.6,
            prominence_factor: 0.05,
            min_width: 0.6,
            max_peaks: 40,
            min_desired_peaks: 10,
            percentile_floor: 0.2,
            percentile_step: 0.05,
            prominence_shrink: 1.5,
        }
    }
}

impl PeakConfig {
    /// The relaxation target never exceeds `max_peaks`.
    pub fn target_count(&self) -> usize {
        self.min_desired_peaks.min(self.max_peaks)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if !(self.fmin < self.fmax) {
            return Err(AnalysisError::config(format!(
                "peak band {}..{} is empty",
                self.fmin, self.fmax
            )));
        }
        if self.max_peaks == 0 {
            return Err(AnalysisError::config("max_peaks must be positive"));
        }
        if !(0.0..=1.0).contains(&self.height_percentile) {
            return Err(AnalysisError::config(
                "height_percentile must lie in 0..=1",
            ));
        }
        if !(self.prominence_shrink > 1.0) || !(self.percentile_step > 0.0) {
            return Err(AnalysisError::config(
                "relaxation must strictly loosen thresholds",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harmonic engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Max distance (Hz) between cursor and peak for a click to resolve.
    pub click_tolerance: f64,
    pub max_pairs: usize,
    /// Seconds between same-button clicks that count as a double click.
    pub double_click_window: f64,
    /// Seconds after a double click within which a third click is a triple.
    pub triple_click_window: f64,
    /// Edge colours, assigned cyclically.
    pub palette: Vec<EdgeColor>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            click_tolerance: 150.0,
            max_pairs: 5,
            double_click_window: 0.3,
            triple_click_window: 0.5,
            palette: EdgeColor::DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> AnalysisResult<()> {
        if !(self.click_tolerance > 0.0) {
            return Err(AnalysisError::config("click_tolerance must be positive"));
        }
        if !(self.double_click_window > 0.0)
            || self.triple_click_window < self.double_click_window
        {
            return Err(AnalysisError::config(
                "click windows must satisfy 0 < double <= triple",
            ));
        }
        if self.palette.is_empty() {
            return Err(AnalysisError::config("palette must not be empty"));
        }
        Ok(())
    }
}
