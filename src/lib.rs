//! Headless core of the harmonic spectrum viewer.
//!
//! ```text
//!   data::audio ──► spectral::estimate ──► scale ──► peaks ──► harmonic
//!                       (batch: rayon over file × method)          │
//!                                                   frontend ◄─────┤
//!                                                   export   ◄─────┘
//! ```

pub mod batch;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod frontend;
pub mod harmonic;
pub mod peaks;
pub mod scale;
pub mod spectral;

pub use config::AnalysisConfig;
pub use data::model::{Peak, PeakSet, Spectrum};
pub use error::{AnalysisError, AnalysisResult};
pub use harmonic::{Command, HarmonicGraphEngine};
pub use spectral::{estimate, Method};

use scale::{Scale, ScaleConverter};

/// Scale views, peaks and a fresh engine for one analysed spectrum.
///
/// Peaks are detected once, on the dB view, whichever scale is shown first.
pub fn build_session(spectrum: &Spectrum, config: &AnalysisConfig) -> AnalysisResult<HarmonicGraphEngine> {
    let scale = if config.use_db_scale { Scale::Db } else { Scale::Linear };
    let mut view = ScaleConverter::new(spectrum, scale);
    let peaks = peaks::detect_peaks(view.frequencies(), view.db(), &config.peaks)?;
    view.set_peaks(&peaks);
    Ok(HarmonicGraphEngine::new(view, config.engine.clone()))
}
