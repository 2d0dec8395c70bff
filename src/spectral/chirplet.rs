//! Chirp matched-filter energy estimate.
//!
//! This is a simplified adaptive energy estimate, not a chirplet
//! decomposition: each candidate centre frequency `fc` gets one
//! Hann-windowed logarithmic sweep from `0.8·fc` to `1.2·fc` spanning the
//! whole clip, and its energy is the peak squared cross-correlation between
//! that probe and the signal.

use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use super::interp::logspace;
use super::stft::hann_symmetric;

/// Logarithmic sweep `cos(φ(t))` with
/// `φ(t) = 2π f0 T / ln(f1/f0) · ((f1/f0)^(t/T) − 1)`.
pub fn log_chirp(n: usize, sample_rate: f64, f0: f64, f1: f64) -> Vec<f64> {
    let duration = n as f64 / sample_rate;
    let ratio = f1 / f0;
    let scale = 2.0 * PI * f0 * duration / ratio.ln();
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (scale * (ratio.powf(t / duration) - 1.0)).cos()
        })
        .collect()
}

/// Cross-correlates one signal against many probes of the same length.
struct Correlator {
    len: usize,
    fft_len: usize,
    signal_spectrum: Vec<Complex<f64>>,
    planner: FftPlanner<f64>,
}

impl Correlator {
    fn new(signal: &[f64]) -> Self {
        let len = signal.len();
        let fft_len = (2 * len).saturating_sub(1).max(1).next_power_of_two();
        let mut planner = FftPlanner::new();
        let mut signal_spectrum: Vec<Complex<f64>> = signal
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(fft_len)
            .collect();
        planner.plan_fft_forward(fft_len).process(&mut signal_spectrum);
        Self {
            len,
            fft_len,
            signal_spectrum,
            planner,
        }
    }

    /// Largest `|corr|²` over the centred `len` lags of the full correlation.
    fn peak_energy(&mut self, probe: &[f64]) -> f64 {
        // correlation = convolution with the reversed probe
        let mut buf: Vec<Complex<f64>> = probe
            .iter()
            .rev()
            .map(|&v| Complex::new(v, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(self.fft_len)
            .collect();
        self.planner.plan_fft_forward(self.fft_len).process(&mut buf);
        for (b, s) in buf.iter_mut().zip(&self.signal_spectrum) {
            *b *= s;
        }
        self.planner.plan_fft_inverse(self.fft_len).process(&mut buf);

        let norm = self.fft_len as f64;
        let offset = (probe.len().saturating_sub(1)) / 2;
        buf[offset..offset + self.len]
            .iter()
            .map(|c| (c.re / norm).powi(2))
            .fold(0.0, f64::max)
    }
}

/// Energy at `n_chirps` log-spaced centres between `fmin` and `fmax`.
///
/// With `pad_to = Some(n)` the signal is zero-padded to at least `n`
/// samples first, which lengthens the probes for very short clips.
pub fn chirplet_psd(
    samples: &[f64],
    sample_rate: f64,
    n_chirps: usize,
    fmin: f64,
    fmax: f64,
    pad_to: Option<usize>,
) -> (Vec<f64>, Vec<f64>) {
    let mut signal = samples.to_vec();
    if let Some(n) = pad_to {
        if signal.len() < n {
            signal.resize(n, 0.0);
        }
    }
    let centres = logspace(fmin, fmax, n_chirps);
    if signal.is_empty() {
        return (centres.clone(), vec![0.0; centres.len()]);
    }

    let window = hann_symmetric(signal.len());
    let mut correlator = Correlator::new(&signal);
    let energies = centres
        .iter()
        .map(|&fc| {
            let probe: Vec<f64> = log_chirp(signal.len(), sample_rate, 0.8 * fc, 1.2 * fc)
                .iter()
                .zip(&window)
                .map(|(c, w)| c * w)
                .collect();
            correlator.peak_energy(&probe)
        })
        .collect();

    log::debug!(
        "Chirplet: {n_chirps} probes over {} samples ({fmin:.0}-{fmax:.0} Hz)",
        signal.len()
    );
    (centres, energies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chirp_starts_at_phase_zero_and_sweeps_up() {
        let c = log_chirp(8000, 8000.0, 400.0, 600.0);
        assert!((c[0] - 1.0).abs() < 1e-12);
        let crossings = |s: &[f64]| s.windows(2).filter(|w| w[0].signum() != w[1].signum()).count();
        assert!(crossings(&c[6000..8000]) > crossings(&c[0..2000]));
    }

    #[test]
    fn correlation_matches_direct_sum() {
        let signal = [1.0, 2.0, 3.0, 4.0];
        let probe = [0.0, 1.0, 0.5, 0.0];
        let mut corr = Correlator::new(&signal);
        // direct 'same' cross-correlation, lags -2..=1
        let n = signal.len() as isize;
        let direct = (-2..=1)
            .map(|lag: isize| {
                (0..n)
                    .filter_map(|i| {
                        let j = i + lag;
                        (0..n).contains(&j).then(|| signal[j as usize] * probe[i as usize])
                    })
                    .sum::<f64>()
                    .powi(2)
            })
            .fold(0.0, f64::max);
        assert!((corr.peak_energy(&probe) - direct).abs() < 1e-9);
    }

    #[test]
    fn probe_near_tone_wins() {
        let sr = 8000.0;
        let samples: Vec<f64> = (0..4000)
            .map(|i| (2.0 * PI * 1000.0 * i as f64 / sr).sin())
            .collect();
        let (freqs, energy) = chirplet_psd(&samples, sr, 40, 100.0, 3000.0, None);
        assert_eq!(freqs.len(), 40);
        let best = energy
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| freqs[i])
            .unwrap();
        assert!(best > 800.0 && best < 1250.0, "best probe {best}");
    }

    #[test]
    fn zero_padding_extends_short_input() {
        let (freqs, energy) = chirplet_psd(&[1.0; 10], 8000.0, 5, 20.0, 2000.0, Some(256));
        assert_eq!(freqs.len(), 5);
        assert!(energy.iter().all(|e| e.is_finite()));
    }
}
