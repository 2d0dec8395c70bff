//! Linear / dB views of one spectrum and its detected peaks.

use serde::{Deserialize, Serialize};

use crate::data::model::{nearest_index, Peak, PeakSet, Spectrum};

/// Floor applied before taking logarithms.
pub const LINEAR_EPSILON: f64 = 1e-15;

/// Headroom above the loudest bin in the dB view.
pub const TOP_PADDING_DB: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    Db,
}

impl Scale {
    pub fn toggled(self) -> Scale {
        match self {
            Scale::Linear => Scale::Db,
            Scale::Db => Scale::Linear,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scale::Linear => "PSD (linear)",
            Scale::Db => "PSD (dB)",
        }
    }
}

pub fn to_db(linear: f64) -> f64 {
    10.0 * linear.max(LINEAR_EPSILON).log10()
}

/// Both representations of a spectrum, kept in sync.
///
/// Peak powers are looked up by nearest frequency on construction and never
/// recomputed; switching scale only changes which array is returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleConverter {
    frequencies: Vec<f64>,
    linear: Vec<f64>,
    db: Vec<f64>,
    peaks: Vec<Peak>,
    active: Scale,
}

impl ScaleConverter {
    pub fn new(spectrum: &Spectrum, active: Scale) -> Self {
        let linear: Vec<f64> = spectrum
            .power()
            .iter()
            .map(|&p| p.max(LINEAR_EPSILON))
            .collect();
        let db = linear.iter().map(|&p| 10.0 * p.log10()).collect();
        Self {
            frequencies: spectrum.frequencies().to_vec(),
            linear,
            db,
            peaks: Vec::new(),
            active,
        }
    }

    /// Attach detector output. Powers come from the nearest bin of each
    /// peak frequency; widths default to 0 when missing.
    pub fn set_peaks(&mut self, peaks: &PeakSet) {
        self.peaks = peaks
            .frequencies
            .iter()
            .enumerate()
            .map(|(n, &frequency)| {
                let i = nearest_index(&self.frequencies, frequency);
                Peak {
                    frequency,
                    linear_power: self.linear[i],
                    db_power: self.db[i],
                    width: peaks.widths.get(n).copied().unwrap_or(0.0),
                }
            })
            .collect();
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn linear(&self) -> &[f64] {
        &self.linear
    }

    pub fn db(&self) -> &[f64] {
        &self.db
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn scale(&self) -> Scale {
        self.active
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.active = scale;
    }

    pub fn toggle(&mut self) -> Scale {
        self.active = self.active.toggled();
        self.active
    }

    /// The curve in the active scale.
    pub fn current(&self) -> &[f64] {
        match self.active {
            Scale::Linear => &self.linear,
            Scale::Db => &self.db,
        }
    }

    pub fn peak_power(&self, peak: &Peak) -> f64 {
        match self.active {
            Scale::Linear => peak.linear_power,
            Scale::Db => peak.db_power,
        }
    }

    /// Peak powers in the active scale, parallel to [`peaks`](Self::peaks).
    pub fn current_peak_powers(&self) -> Vec<f64> {
        self.peaks.iter().map(|p| self.peak_power(p)).collect()
    }

    /// Active-scale power at the bin nearest `frequency`.
    pub fn power_at(&self, frequency: f64) -> f64 {
        let curve = self.current();
        if curve.is_empty() {
            return 0.0;
        }
        curve[nearest_index(&self.frequencies, frequency)]
    }

    /// Y-axis limits for the active scale: dB gets a fixed headroom, linear
    /// gets 10 % of its range.
    pub fn y_limits(&self) -> (f64, f64) {
        let (min, max) = min_max(self.current());
        match self.active {
            Scale::Db => (min, max + TOP_PADDING_DB),
            Scale::Linear => (min, max + (max - min) * 0.1),
        }
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
