//! Short-time Fourier transform power and its time average.

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Periodic Hann window (the STFT convention).
pub fn hann_periodic(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Symmetric Hann window (zero at both ends).
pub fn hann_symmetric(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Bin centre frequencies `0, sr/n, …, sr/2` of an `n_fft`-point transform.
pub fn fft_frequencies(sample_rate: f64, n_fft: usize) -> Vec<f64> {
    (0..=n_fft / 2)
        .map(|k| k as f64 * sample_rate / n_fft as f64)
        .collect()
}

/// A planned, windowed STFT of fixed size.
pub struct Stft {
    n_fft: usize,
    hop: usize,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl Stft {
    pub fn new(n_fft: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            n_fft,
            hop: hop.max(1),
            window: hann_periodic(n_fft),
            fft: planner.plan_fft_forward(n_fft),
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// `|X[t, k]|²` for every frame `t` and bin `k <= n_fft/2`.
    ///
    /// Frames are centred: the signal is zero-padded by `n_fft/2` on both
    /// sides (and further to one full window when shorter than that).
    pub fn power_frames(&self, samples: &[f64]) -> Vec<Vec<f64>> {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0; pad];
        padded.extend_from_slice(samples);
        padded.extend(std::iter::repeat(0.0).take(pad));
        if padded.len() < self.n_fft {
            padded.resize(self.n_fft, 0.0);
        }

        let n_frames = 1 + (padded.len() - self.n_fft) / self.hop;
        let n_bins = self.n_fft / 2 + 1;
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
        let mut frames = Vec::with_capacity(n_frames);

        for t in 0..n_frames {
            let start = t * self.hop;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
            }
            self.fft.process(&mut buffer);
            frames.push(buffer[..n_bins].iter().map(|c| c.norm_sqr()).collect());
        }
        frames
    }

    /// Per-bin mean of [`power_frames`](Self::power_frames).
    pub fn mean_power(&self, samples: &[f64]) -> Vec<f64> {
        time_average(&self.power_frames(samples), self.n_fft / 2 + 1)
    }
}

/// Average a `frames × bins` matrix over frames.
pub fn time_average(frames: &[Vec<f64>], n_bins: usize) -> Vec<f64> {
    let mut acc = vec![0.0; n_bins];
    if frames.is_empty() {
        return acc;
    }
    for frame in frames {
        for (a, &p) in acc.iter_mut().zip(frame) {
            *a += p;
        }
    }
    let n = frames.len() as f64;
    acc.iter_mut().for_each(|a| *a /= n);
    acc
}

/// Time-averaged STFT power on the `n_fft` bin grid.
pub fn stft_psd(samples: &[f64], sample_rate: f64, n_fft: usize, hop: usize) -> (Vec<f64>, Vec<f64>) {
    let stft = Stft::new(n_fft, hop);
    (fft_frequencies(sample_rate, n_fft), stft.mean_power(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, sr: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / sr).sin()).collect()
    }

    #[test]
    fn hann_windows() {
        let p = hann_periodic(8);
        assert_eq!(p[0], 0.0);
        assert!((p[4] - 1.0).abs() < 1e-12);
        let s = hann_symmetric(9);
        assert!(s[8].abs() < 1e-12);
        assert!((s[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn frequency_grid() {
        let f = fft_frequencies(8000.0, 8);
        assert_eq!(f, vec![0.0, 1000.0, 2000.0, 3000.0, 4000.0]);
    }

    #[test]
    fn psd_peaks_at_tone_bin() {
        let sr = 8000.0;
        let (freqs, psd) = stft_psd(&tone(1000.0, sr, 4000), sr, 256, 64);
        assert_eq!(freqs.len(), psd.len());
        let peak = psd
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!((freqs[peak] - 1000.0).abs() <= sr / 256.0);
    }

    #[test]
    fn short_signal_still_yields_one_frame() {
        let stft = Stft::new(1024, 256);
        let frames = stft.power_frames(&[1.0; 10]);
        assert!(!frames.is_empty());
        assert_eq!(frames[0].len(), 513);
    }
}
