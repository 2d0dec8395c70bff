use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Floor applied to every returned power value.
pub const POWER_FLOOR: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Spectrum – one (file, method, parameters) result
// ---------------------------------------------------------------------------

/// A validated frequency/power curve.
///
/// Construction goes through [`Spectrum::new`], which checks the axis and
/// clamps the powers, so a `Spectrum` value is always complete: equal
/// lengths, strictly increasing finite frequencies, finite powers at or
/// above [`POWER_FLOOR`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    power: Vec<f64>,
}

impl Spectrum {
    pub fn new(frequencies: Vec<f64>, power: Vec<f64>) -> AnalysisResult<Self> {
        if frequencies.len() != power.len() {
            return Err(AnalysisError::transform(format!(
                "axis has {} bins but power has {}",
                frequencies.len(),
                power.len()
            )));
        }
        if frequencies.is_empty() {
            return Err(AnalysisError::range("spectrum has no bins"));
        }
        if frequencies.iter().any(|f| !f.is_finite()) {
            return Err(AnalysisError::transform("non-finite frequency on axis"));
        }
        if frequencies.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AnalysisError::transform(
                "frequency axis is not strictly increasing",
            ));
        }
        Ok(Spectrum {
            frequencies,
            power: clamp_power(power),
        })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Linear power, same length as [`frequencies`](Self::frequencies).
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Keep only bins with `lo <= f <= hi`.
    pub fn restrict(&self, lo: f64, hi: f64) -> AnalysisResult<Spectrum> {
        let (frequencies, power): (Vec<f64>, Vec<f64>) = self
            .frequencies
            .iter()
            .zip(&self.power)
            .filter(|(&f, _)| f >= lo && f <= hi)
            .map(|(&f, &p)| (f, p))
            .unzip();
        if frequencies.is_empty() {
            return Err(AnalysisError::range(format!(
                "no bins between {lo} and {hi} Hz"
            )));
        }
        Ok(Spectrum { frequencies, power })
    }

    /// Index of the bin whose frequency is closest to `freq`.
    pub fn nearest_index(&self, freq: f64) -> usize {
        nearest_index(&self.frequencies, freq)
    }
}

/// Index of the value in `axis` closest to `target` (first one on ties).
pub fn nearest_index(axis: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &f) in axis.iter().enumerate() {
        let d = (f - target).abs();
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// NaN and -inf become the floor, +inf the largest finite value (or 1.0),
/// everything is then floored.
pub fn clamp_power(mut power: Vec<f64>) -> Vec<f64> {
    let max_finite = power
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.max(p))));
    let pos_inf = max_finite.filter(|m| *m > POWER_FLOOR).unwrap_or(1.0);
    let mut clamped = 0usize;
    for p in power.iter_mut() {
        if p.is_nan() || *p == f64::NEG_INFINITY {
            *p = POWER_FLOOR;
            clamped += 1;
        } else if *p == f64::INFINITY {
            *p = pos_inf;
            clamped += 1;
        }
        if *p < POWER_FLOOR {
            *p = POWER_FLOOR;
        }
    }
    if clamped > 0 {
        log::warn!("Clamped {clamped} non-finite power values");
    }
    power
}

// ---------------------------------------------------------------------------
// Peaks
// ---------------------------------------------------------------------------

/// Detector output: positions into the analysed spectrum plus widths in Hz.
///
/// The three vectors are parallel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakSet {
    pub indices: Vec<usize>,
    pub frequencies: Vec<f64>,
    pub widths: Vec<f64>,
}

impl PeakSet {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A detected peak in both scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub frequency: f64,
    pub linear_power: f64,
    pub db_power: f64,
    /// Width in Hz; 0 when the detector produced none.
    pub width: f64,
}

// ---------------------------------------------------------------------------
// Dual-resolution surface
// ---------------------------------------------------------------------------

/// PSD plus a spectrogram resampled onto the PSD's frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DualResolution {
    /// Shared axis (the PSD window's bins).
    pub frequencies: Vec<f64>,
    /// Frame times of the spectrogram, seconds.
    pub times: Vec<f64>,
    /// `surface[t][k]`: power of frame `t` at `frequencies[k]`.
    pub surface: Vec<Vec<f64>>,
    /// Time-averaged power on the shared axis.
    pub psd: Vec<f64>,
}

impl DualResolution {
    /// Spectrogram cells inside `[fmin, fmax]`, max-pooled down to at most
    /// `max_frames × max_bins` and mapped to `0..=1` over the top `range_db`
    /// decibels. Rows are frames; columns ascend in frequency.
    pub fn heatmap(
        &self,
        fmin: f64,
        fmax: f64,
        max_frames: usize,
        max_bins: usize,
        range_db: f64,
    ) -> Vec<Vec<f64>> {
        let band: Vec<usize> = self
            .frequencies
            .iter()
            .enumerate()
            .filter(|(_, &f)| f >= fmin && f <= fmax)
            .map(|(i, _)| i)
            .collect();
        if band.is_empty() || self.surface.is_empty() || max_frames == 0 || max_bins == 0 {
            return Vec::new();
        }
        let frame_step = self.surface.len().div_ceil(max_frames);
        let bin_step = band.len().div_ceil(max_bins);

        let pooled: Vec<Vec<f64>> = self
            .surface
            .chunks(frame_step)
            .map(|frames| {
                band.chunks(bin_step)
                    .map(|bins| {
                        let loudest = frames
                            .iter()
                            .flat_map(|row| bins.iter().map(move |&k| row[k]))
                            .fold(POWER_FLOOR, f64::max);
                        10.0 * loudest.log10()
                    })
                    .collect()
            })
            .collect();

        let top = pooled
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let range = range_db.max(f64::EPSILON);
        pooled
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|db| ((db - (top - range)) / range).clamp(0.0, 1.0))
                    .collect()
            })
            .collect()
    }
}
