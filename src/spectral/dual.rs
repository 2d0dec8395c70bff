//! Dual-resolution PSD + spectrogram.
//!
//! The PSD comes from a long window (fine frequency bins), the spectrogram
//! from a short one (fine time steps). Each spectrogram frame is resampled
//! onto the PSD's bins so both views share one frequency axis. Both outputs
//! are floored like every other estimator's power.

use crate::config::EstimatorParams;
use crate::data::model::{clamp_power, DualResolution};
use crate::error::{AnalysisError, AnalysisResult};

use super::interp::{interp1d, Fill};
use super::stft::{fft_frequencies, Stft};

pub fn dual_resolution(
    samples: &[f64],
    sample_rate: f64,
    params: &EstimatorParams,
) -> AnalysisResult<DualResolution> {
    if samples.is_empty() {
        return Err(AnalysisError::load("no samples to analyse"));
    }
    let psd_hop = (params.psd_n_fft / params.dual_hop_ratio.max(1)).max(1);
    let spec_hop = (params.spec_n_fft / params.dual_hop_ratio.max(1)).max(1);

    let psd_stft = Stft::new(params.psd_n_fft, psd_hop);
    let frequencies = fft_frequencies(sample_rate, params.psd_n_fft);
    let psd = clamp_power(psd_stft.mean_power(samples));

    let spec_stft = Stft::new(params.spec_n_fft, spec_hop);
    let spec_frequencies = fft_frequencies(sample_rate, params.spec_n_fft);
    let frames = spec_stft.power_frames(samples);

    log::debug!(
        "Interpolating spectrogram from {} to {} freq bins ({} frames)",
        spec_frequencies.len(),
        frequencies.len(),
        frames.len()
    );

    let surface: Vec<Vec<f64>> = frames
        .iter()
        .map(|frame| {
            clamp_power(interp1d(
                &spec_frequencies,
                frame,
                &frequencies,
                Fill::Value(0.0),
            ))
        })
        .collect();
    let times = (0..frames.len())
        .map(|t| (t * spec_hop) as f64 / sample_rate)
        .collect();

    Ok(DualResolution {
        frequencies,
        times,
        surface,
        psd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::POWER_FLOOR;
    use std::f64::consts::PI;

    #[test]
    fn surface_is_aligned_to_psd_axis() {
        let sr = 8000.0;
        let samples: Vec<f64> = (0..8000)
            .map(|i| (2.0 * PI * 500.0 * i as f64 / sr).sin())
            .collect();
        let params = EstimatorParams {
            psd_n_fft: 1024,
            spec_n_fft: 256,
            ..EstimatorParams::default()
        };
        let dual = dual_resolution(&samples, sr, &params).unwrap();
        assert_eq!(dual.frequencies.len(), 513);
        assert_eq!(dual.psd.len(), 513);
        assert_eq!(dual.surface.len(), dual.times.len());
        assert!(dual.surface.iter().all(|row| row.len() == 513));
        // hop = 256 / 16 = 16 samples
        assert!((dual.times[1] - 16.0 / sr).abs() < 1e-12);

        let mid = dual.surface.len() / 2;
        let loudest = dual.surface[mid]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| dual.frequencies[i])
            .unwrap();
        assert!((loudest - 500.0).abs() < 40.0);
    }

    #[test]
    fn silence_is_floored_not_zero() {
        let params = EstimatorParams {
            psd_n_fft: 512,
            spec_n_fft: 128,
            ..EstimatorParams::default()
        };
        let dual = dual_resolution(&[0.0; 4000], 8000.0, &params).unwrap();
        assert!(dual.psd.iter().all(|&p| p == POWER_FLOOR));
        assert!(dual
            .surface
            .iter()
            .flatten()
            .all(|&p| p == POWER_FLOOR));
    }

    #[test]
    fn empty_input_is_load_error() {
        let err = dual_resolution(&[], 8000.0, &EstimatorParams::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Load(_)));
    }
}
