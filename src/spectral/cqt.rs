//! Constant-Q transform power, averaged over time.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;

use crate::error::{AnalysisError, AnalysisResult};

use super::stft::hann_symmetric;

/// One analysis bin: centre frequency and its windowed complex kernel.
struct CqtKernel {
    frequency: f64,
    taps: Vec<Complex<f64>>,
}

/// Geometrically spaced bin centres `fmin · 2^(k / bins_per_octave)`.
pub fn cqt_frequencies(fmin: f64, n_bins: usize, bins_per_octave: usize) -> Vec<f64> {
    (0..n_bins)
        .map(|k| fmin * 2f64.powf(k as f64 / bins_per_octave as f64))
        .collect()
}

fn build_kernels(
    sample_rate: f64,
    fmin: f64,
    n_bins: usize,
    bins_per_octave: usize,
) -> Vec<CqtKernel> {
    let q = 1.0 / (2f64.powf(1.0 / bins_per_octave as f64) - 1.0);
    let nyquist = sample_rate / 2.0;
    cqt_frequencies(fmin, n_bins, bins_per_octave)
        .into_iter()
        .take_while(|&f| f < nyquist)
        .map(|frequency| {
            let len = ((q * sample_rate / frequency).ceil() as usize).max(1);
            let window = hann_symmetric(len);
            let norm: f64 = window.iter().sum::<f64>().max(f64::EPSILON);
            let taps = window
                .iter()
                .enumerate()
                .map(|(n, &w)| {
                    let phase = -2.0 * PI * frequency * n as f64 / sample_rate;
                    Complex::from_polar(w / norm, phase)
                })
                .collect();
            CqtKernel { frequency, taps }
        })
        .collect()
}

/// Time-averaged CQT power on the log-spaced bin centres.
///
/// Bins at or above Nyquist are dropped; if none remain the request is a
/// `RangeError`.
pub fn cqt_psd(
    samples: &[f64],
    sample_rate: f64,
    fmin: f64,
    n_bins: usize,
    bins_per_octave: usize,
    hop: usize,
) -> AnalysisResult<(Vec<f64>, Vec<f64>)> {
    let kernels = build_kernels(sample_rate, fmin, n_bins, bins_per_octave);
    if kernels.is_empty() {
        return Err(AnalysisError::range(format!(
            "CQT fmin {fmin} Hz is above Nyquist ({} Hz)",
            sample_rate / 2.0
        )));
    }
    if kernels.len() < n_bins {
        log::debug!(
            "CQT: dropped {} bins above Nyquist",
            n_bins - kernels.len()
        );
    }

    let hop = hop.max(1);
    let n_frames = 1 + samples.len() / hop;
    let len = samples.len() as isize;

    let mut power = vec![0.0; kernels.len()];
    for t in 0..n_frames {
        let centre = (t * hop) as isize;
        for (acc, kernel) in power.iter_mut().zip(&kernels) {
            let start = centre - (kernel.taps.len() / 2) as isize;
            let mut sum = Complex::new(0.0, 0.0);
            for (n, tap) in kernel.taps.iter().enumerate() {
                let idx = start + n as isize;
                if idx >= 0 && idx < len {
                    sum += tap * samples[idx as usize];
                }
            }
            *acc += sum.norm_sqr();
        }
    }
    power.iter_mut().for_each(|p| *p /= n_frames as f64);

    let frequencies = kernels.iter().map(|k| k.frequency).collect();
    Ok((frequencies, power))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_are_log_spaced() {
        let f = cqt_frequencies(100.0, 25, 12);
        assert!((f[12] - 200.0).abs() < 1e-9);
        assert!((f[24] - 400.0).abs() < 1e-9);
    }

    #[test]
    fn tone_lands_in_matching_bin() {
        let sr = 8000.0;
        let samples: Vec<f64> = (0..8000)
            .map(|i| (2.0 * PI * 880.0 * i as f64 / sr).sin())
            .collect();
        let (freqs, power) = cqt_psd(&samples, sr, 220.0, 48, 12, 256).unwrap();
        let best = power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| freqs[i])
            .unwrap();
        assert!((best - 880.0).abs() < 1.0);
    }

    #[test]
    fn bins_above_nyquist_are_dropped() {
        let (freqs, _) = cqt_psd(&[0.0; 512], 8000.0, 1000.0, 48, 12, 128).unwrap();
        assert!(freqs.iter().all(|&f| f < 4000.0));
        assert_eq!(freqs.len(), 24);
        assert!(matches!(
            cqt_psd(&[0.0; 512], 8000.0, 5000.0, 12, 12, 128),
            Err(AnalysisError::Range(_))
        ));
    }
}
