//! Adaptive peak picking on the dB view of a spectrum.
//!
//! Candidates are local maxima (plateaus resolve to their middle sample)
//! that pass three filters, evaluated in this order:
//!
//! 1. height ≥ the `p`-th percentile of the band
//! 2. prominence ≥ `factor · σ(band)`
//! 3. width at half prominence ≥ `max(min_width, 1)` samples
//!
//! When fewer than the target count survive, `p` is lowered and `factor`
//! shrunk and the band is searched again.

use std::cmp::Ordering;

use crate::config::PeakConfig;
use crate::data::model::PeakSet;
use crate::error::{AnalysisError, AnalysisResult};

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Linear-interpolated percentile, `q` in `0..=1`.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Indices of strict local maxima; a flat top yields its middle sample.
/// The first and last samples never qualify.
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

/// Prominence of `peak` plus the indices of its left and right bases.
pub fn prominence(x: &[f64], peak: usize) -> (f64, usize, usize) {
    let top = x[peak];

    let mut left_min = top;
    let mut left_base = peak;
    let mut i = peak as isize;
    while i >= 0 && x[i as usize] <= top {
        if x[i as usize] < left_min {
            left_min = x[i as usize];
            left_base = i as usize;
        }
        i -= 1;
    }

    let mut right_min = top;
    let mut right_base = peak;
    let mut j = peak;
    while j < x.len() && x[j] <= top {
        if x[j] < right_min {
            right_min = x[j];
            right_base = j;
        }
        j += 1;
    }

    (top - left_min.max(right_min), left_base, right_base)
}

/// Width in samples at `top − rel_height · prominence`, linearly
/// interpolated between samples and bounded by the bases.
pub fn width_at(
    x: &[f64],
    peak: usize,
    prom: f64,
    bases: (usize, usize),
    rel_height: f64,
) -> f64 {
    let level = x[peak] - prom * rel_height;
    let (left_base, right_base) = bases;

    let mut i = peak;
    while left_base < i && level < x[i] {
        i -= 1;
    }
    let mut left = i as f64;
    if x[i] < level {
        left += (level - x[i]) / (x[i + 1] - x[i]);
    }

    let mut j = peak;
    while j < right_base && level < x[j] {
        j += 1;
    }
    let mut right = j as f64;
    if x[j] < level {
        right -= (level - x[j]) / (x[j - 1] - x[j]);
    }

    right - left
}

/// One pass of height, prominence and width filtering.
///
/// Returns `(peak index, width in samples)` pairs in ascending index order.
pub fn find_peaks(x: &[f64], min_height: f64, min_prominence: f64, min_width: f64) -> Vec<(usize, f64)> {
    local_maxima(x)
        .into_iter()
        .filter(|&p| x[p] >= min_height)
        .filter_map(|p| {
            let (prom, left, right) = prominence(x, p);
            (prom >= min_prominence).then_some((p, prom, left, right))
        })
        .filter_map(|(p, prom, left, right)| {
            let width = width_at(x, p, prom, (left, right), 0.5);
            (width >= min_width).then_some((p, width))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Adaptive detector
// ---------------------------------------------------------------------------

/// Axis step around bin `i`: centred inside the axis, one-sided at the ends.
fn local_spacing(frequencies: &[f64], i: usize) -> f64 {
    let n = frequencies.len();
    if n < 2 {
        return 1.0;
    }
    let lo = i.saturating_sub(1);
    let hi = (i + 1).min(n - 1);
    (frequencies[hi] - frequencies[lo]) / (hi - lo) as f64
}

/// Detect peaks of `db_power` inside `[config.fmin, config.fmax]`.
///
/// Returned indices point into the full arrays. Widths are in Hz, using the
/// bin spacing around each peak, so log-spaced axes (CQT, chirplet) get
/// widths in their local resolution. At most `config.max_peaks` peaks are
/// returned; when truncation happens the survivors are the loudest ones,
/// ordered loudest first.
pub fn detect_peaks(
    frequencies: &[f64],
    db_power: &[f64],
    config: &PeakConfig,
) -> AnalysisResult<PeakSet> {
    let band: Vec<usize> = frequencies
        .iter()
        .enumerate()
        .filter(|(_, &f)| f >= config.fmin && f <= config.fmax)
        .map(|(i, _)| i)
        .collect();
    if band.is_empty() {
        return Err(AnalysisError::range(format!(
            "no bins between {} and {} Hz for peak detection",
            config.fmin, config.fmax
        )));
    }
    let values: Vec<f64> = band.iter().map(|&i| db_power[i]).collect();
    let sigma = std_dev(&values);
    let min_width = config.min_width.max(1.0);
    let target = config.target_count();

    let mut p = config.height_percentile;
    let mut factor = config.prominence_factor;
    let mut found;
    loop {
        found = find_peaks(&values, percentile(&values, p), factor * sigma, min_width);
        if found.len() >= target || p <= config.percentile_floor {
            break;
        }
        log::debug!(
            "Found {} peaks at percentile {:.2}, relaxing thresholds",
            found.len(),
            p
        );
        p -= config.percentile_step;
        factor /= config.prominence_shrink;
    }

    let mut picked: Vec<(usize, f64)> = found
        .into_iter()
        .map(|(local, w)| {
            let i = band[local];
            (i, w * local_spacing(frequencies, i))
        })
        .collect();

    if picked.len() > config.max_peaks {
        // stable: equal powers keep ascending-frequency order
        picked.sort_by(|a, b| {
            db_power[b.0]
                .partial_cmp(&db_power[a.0])
                .unwrap_or(Ordering::Equal)
        });
        picked.truncate(config.max_peaks);
    }

    log::info!(
        "Detected {} peaks in {:.0}-{:.0} Hz",
        picked.len(),
        config.fmin,
        config.fmax
    );

    Ok(PeakSet {
        frequencies: picked.iter().map(|&(i, _)| frequencies[i]).collect(),
        indices: picked.iter().map(|&(i, _)| i).collect(),
        widths: picked.iter().map(|&(_, w)| w).collect(),
    })
}
