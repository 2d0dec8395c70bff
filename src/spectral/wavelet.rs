//! Wavelet-based PSD estimates.
//!
//! Three estimators share one orthogonal filter bank:
//!
//! - **packet** (basic): full packet tree to level `L`, one band per leaf,
//!   centres shifted by an empirical per-wavelet correction factor.
//! - **packet** (improved): same tree on a power-of-two padded signal, leaf
//!   energies interpolated onto a uniform axis and Savitzky–Golay smoothed.
//! - **stationary**: undecimated (à trous) transform, one band per detail
//!   level plus the deepest approximation.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

use super::interp::{interp1d, linspace, savgol, smoothing_window, Fill};
use crate::data::model::{nearest_index, POWER_FLOOR};

// ---------------------------------------------------------------------------
// Filter banks
// ---------------------------------------------------------------------------

const SYM8_DEC_LO: [f64; 16] = [
    -0.0033824159510061256,
    -0.0005421323317911481,
    0.03169508781149298,
    0.007607487324917605,
    -0.1432942383508097,
    -0.061273359067658524,
    0.4813596512583722,
    0.7771857517005235,
    0.3644418948353314,
    -0.05194583810770904,
    -0.027219029917056003,
    0.049137179673607506,
    0.003808752013890615,
    -0.01495225833704823,
    -0.0003029205147213668,
    0.0018899503327594609,
];

const DB4_DEC_LO: [f64; 8] = [
    -0.010597401784997278,
    0.032883011666982945,
    0.030841381835986965,
    -0.18703481171888114,
    -0.02798376941698385,
    0.6308807679295904,
    0.7148465705525415,
    0.23037781330885523,
];

/// Supported orthogonal wavelets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveletKind {
    #[default]
    Sym8,
    Db4,
}

impl WaveletKind {
    pub fn name(self) -> &'static str {
        match self {
            WaveletKind::Sym8 => "sym8",
            WaveletKind::Db4 => "db4",
        }
    }

    /// Empirical factor applied to basic packet band centres.
    pub fn band_correction(self) -> f64 {
        match self {
            WaveletKind::Sym8 => 1.05,
            WaveletKind::Db4 => 1.15,
        }
    }

    fn dec_lo(self) -> &'static [f64] {
        match self {
            WaveletKind::Sym8 => &SYM8_DEC_LO,
            WaveletKind::Db4 => &DB4_DEC_LO,
        }
    }

    /// Decomposition low/high-pass pair. The high-pass is the quadrature
    /// mirror of the low-pass.
    pub fn filters(self) -> FilterBank {
        let lo = self.dec_lo().to_vec();
        let len = lo.len();
        // rec_lo = reverse(lo); rec_hi[k] = (-1)^k rec_lo[len-1-k] = (-1)^k lo[k]
        // dec_hi = reverse(rec_hi)
        let hi = (0..len)
            .rev()
            .map(|k| if k % 2 == 0 { lo[k] } else { -lo[k] })
            .collect();
        FilterBank { lo, hi }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank {
    pub lo: Vec<f64>,
    pub hi: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// Half-sample symmetric extension: `x[-1] = x[0]`, `x[n] = x[n-1]`.
fn symmetric_at(x: &[f64], i: isize) -> f64 {
    let n = x.len() as isize;
    let m = i.rem_euclid(2 * n);
    let idx = if m < n { m } else { 2 * n - 1 - m };
    x[idx as usize]
}

/// One decimated analysis step with symmetric boundary handling.
///
/// Output length is `(N + F - 1) / 2` per band.
pub fn dwt_step(x: &[f64], bank: &FilterBank) -> (Vec<f64>, Vec<f64>) {
    if x.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let f = bank.lo.len();
    let out_len = (x.len() + f - 1) / 2;
    let mut approx = Vec::with_capacity(out_len);
    let mut detail = Vec::with_capacity(out_len);
    for o in 0..out_len {
        let mut a = 0.0;
        let mut d = 0.0;
        for j in 0..f {
            let v = symmetric_at(x, (2 * o + 1) as isize - j as isize);
            a += bank.lo[j] * v;
            d += bank.hi[j] * v;
        }
        approx.push(a);
        detail.push(d);
    }
    (approx, detail)
}

/// Leaves of a full packet tree at `level`, in natural (filter-bank) order.
pub fn packet_leaves(x: &[f64], bank: &FilterBank, level: usize) -> Vec<Vec<f64>> {
    let mut nodes = vec![x.to_vec()];
    for _ in 0..level {
        nodes = nodes
            .iter()
            .flat_map(|node| {
                let (a, d) = dwt_step(node, bank);
                [a, d]
            })
            .collect();
    }
    nodes
}

/// Undecimated periodic transform.
///
/// Returns `(detail_levels, deepest_approx)` where `detail_levels[j-1]` holds
/// the level-`j` details. Every band keeps the input length.
pub fn swt(x: &[f64], bank: &FilterBank, level: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let n = x.len();
    let mut approx = x.to_vec();
    let mut details = Vec::with_capacity(level);
    for j in 0..level {
        let step = 1usize << j;
        let mut next_a = vec![0.0; n];
        let mut next_d = vec![0.0; n];
        for i in 0..n {
            let mut a = 0.0;
            let mut d = 0.0;
            for (k, (&lo, &hi)) in bank.lo.iter().zip(&bank.hi).enumerate() {
                let v = approx[(i + k * step) % n];
                a += lo * v;
                d += hi * v;
            }
            next_a[i] = a;
            next_d[i] = d;
        }
        details.push(next_d);
        approx = next_a;
    }
    (details, approx)
}

fn log2_floor(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        (usize::BITS - 1 - n.leading_zeros()) as usize
    }
}

fn mean_square(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64
}

fn normalise(values: &mut [f64]) -> AnalysisResult<()> {
    let total: f64 = values.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return Err(AnalysisError::transform("total band energy is zero"));
    }
    values.iter_mut().for_each(|v| *v /= total);
    Ok(())
}

fn smooth_and_floor(mut psd: Vec<f64>) -> Vec<f64> {
    let window = smoothing_window(psd.len());
    if window > 3 && window % 2 == 1 {
        psd = savgol(&psd, window, 2);
    }
    psd.iter_mut().for_each(|p| *p = p.max(POWER_FLOOR));
    psd
}

// ---------------------------------------------------------------------------
// Estimators
// ---------------------------------------------------------------------------

/// Shared parameters of the wavelet estimators.
#[derive(Debug, Clone, Copy)]
pub struct WaveletParams {
    pub kind: WaveletKind,
    pub max_level: usize,
    pub n_fft: usize,
}

/// Basic packet PSD: mean squared coefficient per leaf, normalised, with
/// corrected equal-width band centres.
pub fn packet_psd(
    samples: &[f64],
    sample_rate: f64,
    params: WaveletParams,
) -> AnalysisResult<(Vec<f64>, Vec<f64>)> {
    let padded_len = samples.len().next_power_of_two();
    let level = params
        .max_level
        .min(log2_floor(params.n_fft))
        .min(log2_floor(padded_len).saturating_sub(2));
    if level < 1 {
        return Err(AnalysisError::transform(format!(
            "{} samples are too few for a packet decomposition",
            samples.len()
        )));
    }
    if level < params.max_level {
        log::warn!("Wavelet: max level {} reduced to {level}", params.max_level);
    }

    let mut signal = samples.to_vec();
    if signal.len() < params.n_fft {
        signal.resize(params.n_fft, 0.0);
    }

    let leaves = packet_leaves(&signal, &params.kind.filters(), level);
    let mut power: Vec<f64> = leaves.iter().map(|leaf| mean_square(leaf)).collect();
    if power.iter().all(|&p| p == 0.0) {
        return Err(AnalysisError::transform("all packet leaves have zero energy"));
    }
    power.iter_mut().for_each(|p| *p = p.max(POWER_FLOOR));
    normalise(&mut power)?;

    let bands = power.len();
    let width = sample_rate / 2.0 / bands as f64;
    let correction = params.kind.band_correction();
    let frequencies = (0..bands)
        .map(|i| (i as f64 + 0.5) * width * correction)
        .collect();

    log::debug!("Wavelet: level {level}, {bands} bands");
    Ok((frequencies, power))
}

/// Improved packet PSD on `linspace(20, sr/2, n_fft/2)`.
pub fn improved_packet_psd(
    samples: &[f64],
    sample_rate: f64,
    params: WaveletParams,
) -> AnalysisResult<(Vec<f64>, Vec<f64>)> {
    let mut signal = samples.to_vec();
    signal.resize(samples.len().next_power_of_two(), 0.0);

    let level = params
        .max_level
        .min(log2_floor(params.n_fft))
        .min(log2_floor(signal.len()).saturating_sub(2));
    if level < 1 {
        return Err(AnalysisError::transform(format!(
            "{} samples are too few for a packet decomposition",
            samples.len()
        )));
    }

    let leaves = packet_leaves(&signal, &params.kind.filters(), level);
    let mut energy: Vec<f64> = leaves
        .iter()
        .map(|leaf| leaf.iter().map(|v| v * v).sum::<f64>().max(1e-20))
        .collect();
    normalise(&mut energy)?;

    let bands = energy.len();
    let width = sample_rate / (2.0 * bands as f64);
    let centres: Vec<f64> = (0..bands).map(|i| i as f64 * width + width / 2.0).collect();

    let axis = linspace(20.0, sample_rate / 2.0, params.n_fft / 2);
    let psd = interp1d(&centres, &energy, &axis, Fill::Edge);
    Ok((axis, smooth_and_floor(psd)))
}

/// Stationary wavelet PSD on `linspace(20, sr/2, n_fft/2)`.
///
/// Detail level `j` is centred at `1.5 · sr / 2^(j+1)`, the deepest
/// approximation at `sr / 2^(L+2)`. Band powers are placed at their nearest
/// axis bin and the gaps interpolated.
pub fn stationary_psd(
    samples: &[f64],
    sample_rate: f64,
    params: WaveletParams,
) -> AnalysisResult<(Vec<f64>, Vec<f64>)> {
    let mut signal = samples.to_vec();
    signal.resize(samples.len().next_power_of_two(), 0.0);
    let depth = log2_floor(signal.len());

    let optimal = (log2_floor(params.n_fft) as isize).min(depth as isize - 3);
    let level = if params.max_level as isize > optimal {
        optimal.max(1) as usize
    } else {
        params.max_level
    };
    if level >= depth {
        return Err(AnalysisError::transform(format!(
            "level {level} exceeds what {} samples support",
            signal.len()
        )));
    }

    let (details, approx) = swt(&signal, &params.kind.filters(), level);
    let mut bands: Vec<(f64, f64)> = details
        .iter()
        .enumerate()
        .map(|(j, d)| {
            let lvl = (j + 1) as i32;
            (1.5 * sample_rate / 2f64.powi(lvl + 1), mean_square(d))
        })
        .collect();
    bands.push((
        sample_rate / 2f64.powi(level as i32 + 2),
        mean_square(&approx),
    ));

    let mut powers: Vec<f64> = bands.iter().map(|b| b.1).collect();
    normalise(&mut powers)?;

    let axis = linspace(20.0, sample_rate / 2.0, params.n_fft / 2);
    let mut psd = vec![0.0; axis.len()];
    for (&(centre, _), &p) in bands.iter().zip(&powers) {
        psd[nearest_index(&axis, centre)] = p;
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = axis
        .iter()
        .zip(&psd)
        .filter(|(_, &p)| p > 0.0)
        .map(|(&f, &p)| (f, p))
        .unzip();
    if xs.len() > 1 {
        psd = interp1d(&xs, &ys, &axis, Fill::Edge);
    }

    log::debug!("Stationary Wavelet: level {level}, {} bands", bands.len());
    Ok((axis, smooth_and_floor(psd)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(freq: f64, sr: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / sr).sin()).collect()
    }

    fn params() -> WaveletParams {
        WaveletParams {
            kind: WaveletKind::Sym8,
            max_level: 6,
            n_fft: 1024,
        }
    }

    #[test]
    fn filter_banks_are_orthonormal() {
        for kind in [WaveletKind::Sym8, WaveletKind::Db4] {
            let bank = kind.filters();
            let lo_sum: f64 = bank.lo.iter().sum();
            let hi_sum: f64 = bank.hi.iter().sum();
            let lo_energy: f64 = bank.lo.iter().map(|v| v * v).sum();
            let cross: f64 = bank.lo.iter().zip(&bank.hi).map(|(a, b)| a * b).sum();
            assert!((lo_sum - 2f64.sqrt()).abs() < 1e-9, "{}", kind.name());
            assert!(hi_sum.abs() < 1e-9);
            assert!((lo_energy - 1.0).abs() < 1e-9);
            assert!(cross.abs() < 1e-9);
        }
    }

    #[test]
    fn dwt_output_length_and_constant_signal() {
        let bank = WaveletKind::Db4.filters();
        let (a, d) = dwt_step(&[1.0; 32], &bank);
        assert_eq!(a.len(), (32 + 8 - 1) / 2);
        // symmetric extension of a constant is constant: details vanish
        assert!(d.iter().all(|v| v.abs() < 1e-9));
        assert!(a.iter().all(|v| (v - 2f64.sqrt()).abs() < 1e-9));
    }

    #[test]
    fn packet_tree_has_power_of_two_leaves() {
        let leaves = packet_leaves(&tone(100.0, 8000.0, 256), &WaveletKind::Sym8.filters(), 3);
        assert_eq!(leaves.len(), 8);
    }

    #[test]
    fn basic_packet_bands_are_corrected_and_normalised() {
        let sr = 8000.0;
        let (freqs, power) = packet_psd(&tone(300.0, sr, 4096), sr, params()).unwrap();
        assert_eq!(freqs.len(), 64);
        let width = 4000.0 / 64.0;
        assert!((freqs[0] - 0.5 * width * 1.05).abs() < 1e-9);
        assert!((power.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // a 300 Hz tone sits in the lowest few bands
        let loudest = power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!(loudest < 8, "loudest leaf {loudest}");
    }

    #[test]
    fn silent_input_is_transform_error() {
        assert!(matches!(
            packet_psd(&[0.0; 2048], 8000.0, params()),
            Err(AnalysisError::Transform(_))
        ));
        assert!(matches!(
            stationary_psd(&[0.0; 2048], 8000.0, params()),
            Err(AnalysisError::Transform(_))
        ));
    }

    #[test]
    fn too_short_input_is_transform_error() {
        assert!(matches!(
            packet_psd(&[1.0, -1.0], 8000.0, params()),
            Err(AnalysisError::Transform(_))
        ));
        assert!(matches!(
            stationary_psd(&[1.0, -1.0], 8000.0, params()),
            Err(AnalysisError::Transform(_))
        ));
    }

    #[test]
    fn improved_packet_is_uniform_and_floored() {
        let sr = 8000.0;
        let (freqs, psd) = improved_packet_psd(&tone(500.0, sr, 3000), sr, params()).unwrap();
        assert_eq!(freqs.len(), 512);
        assert_eq!(freqs[0], 20.0);
        assert_eq!(*freqs.last().unwrap(), 4000.0);
        assert!(psd.iter().all(|&p| p >= POWER_FLOOR));
    }

    #[test]
    fn swt_keeps_length_and_stationary_psd_covers_axis() {
        let sr = 8000.0;
        let x = tone(1000.0, sr, 1024);
        let (details, approx) = swt(&x, &WaveletKind::Sym8.filters(), 3);
        assert_eq!(details.len(), 3);
        assert!(details.iter().all(|d| d.len() == 1024));
        assert_eq!(approx.len(), 1024);

        let (freqs, psd) = stationary_psd(&x, sr, WaveletParams { max_level: 4, ..params() }).unwrap();
        assert_eq!(freqs.len(), psd.len());
        assert!(psd.iter().all(|&p| p >= POWER_FLOOR && p.is_finite()));
    }

    #[test]
    fn wavelet_kind_serde_names() {
        assert_eq!(serde_json::to_string(&WaveletKind::Db4).unwrap(), "\"db4\"");
        let k: WaveletKind = serde_json::from_str("\"sym8\"").unwrap();
        assert_eq!(k, WaveletKind::Sym8);
    }
}
