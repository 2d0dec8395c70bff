//! Multi-resolution PSD: short windows above each crossover, long ones below.

use super::interp::{interp1d, Fill};
use super::stft::{fft_frequencies, stft_psd};

/// Crossover between adjacent sizes is the geometric mean of their bin
/// widths. One entry per adjacent pair, followed by Nyquist.
pub fn crossovers(sample_rate: f64, sizes: &[usize]) -> Vec<f64> {
    let mut cuts: Vec<f64> = sizes
        .windows(2)
        .map(|w| (sample_rate / w[0] as f64 * sample_rate / w[1] as f64).sqrt())
        .collect();
    cuts.push(sample_rate / 2.0);
    cuts
}

/// Stitch PSDs of every window in `sizes` onto the largest window's axis.
///
/// With ascending sizes `N_0 < … < N_{k-1}` and crossovers `c_i`, window `i`
/// owns `(c_i, c_{i-1}]` (the smallest one owns everything above `c_0`) and
/// the largest owns `[0, c_{k-2}]`. Bins left at exactly zero afterwards are
/// filled from the largest window.
pub fn multi_resolution_psd(
    samples: &[f64],
    sample_rate: f64,
    sizes: &[usize],
    hop: usize,
) -> (Vec<f64>, Vec<f64>) {
    let mut sizes = sizes.to_vec();
    sizes.sort_unstable();
    sizes.dedup();
    let Some(&largest) = sizes.last() else {
        return (Vec::new(), Vec::new());
    };

    let cuts = crossovers(sample_rate, &sizes);
    let axis = fft_frequencies(sample_rate, largest);
    let mut out = vec![0.0; axis.len()];
    let mut fallback = Vec::new();

    for (i, &n_fft) in sizes.iter().enumerate() {
        let (freqs, psd) = stft_psd(samples, sample_rate, n_fft, hop);
        let resampled = interp1d(&freqs, &psd, &axis, Fill::Edge);

        let last = i + 1 == sizes.len();
        let upper = if i == 0 { f64::INFINITY } else { cuts[i - 1] };
        let lower = if last { f64::NEG_INFINITY } else { cuts[i] };

        for ((slot, &f), &p) in out.iter_mut().zip(&axis).zip(&resampled) {
            if f > lower && f <= upper {
                *slot = p;
            }
        }
        log::debug!("Multi-Res: window {n_fft} covers ({lower:.1}, {upper:.1}] Hz");

        if last {
            fallback = resampled;
        }
    }

    let mut filled = 0usize;
    for (slot, &p) in out.iter_mut().zip(&fallback) {
        if *slot == 0.0 {
            *slot = p;
            filled += 1;
        }
    }
    if filled > 0 {
        log::debug!("Multi-Res: back-filled {filled} empty bins");
    }

    (axis, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn crossover_is_geometric_mean_of_bin_widths() {
        let cuts = crossovers(8000.0, &[256, 1024]);
        // bin widths 31.25 and 7.8125
        assert!((cuts[0] - 15.625).abs() < 1e-9);
        assert_eq!(cuts[1], 4000.0);
    }

    #[test]
    fn output_uses_largest_axis_and_has_no_zero_bins() {
        let sr = 8000.0;
        let samples: Vec<f64> = (0..8000)
            .map(|i| (2.0 * PI * 440.0 * i as f64 / sr).sin() + 0.2 * (2.0 * PI * 1320.0 * i as f64 / sr).sin())
            .collect();
        let (axis, psd) = multi_resolution_psd(&samples, sr, &[2048, 512, 1024], 256);
        assert_eq!(axis.len(), 1025);
        assert_eq!(psd.len(), axis.len());
        assert!(psd.iter().all(|&p| p != 0.0));
        let loudest = psd
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| axis[i])
            .unwrap();
        assert!((loudest - 440.0).abs() < 20.0);
    }

    #[test]
    fn silent_bins_are_back_filled_from_largest_window() {
        // all-zero input: every band stays zero, so every bin comes from the fallback
        let (axis, psd) = multi_resolution_psd(&[0.0; 1000], 8000.0, &[256, 512], 64);
        assert_eq!(axis.len(), 257);
        assert!(psd.iter().all(|&p| p == 0.0));
    }
}
