/// Spectral estimators: samples in, validated [`Spectrum`] out.
///
/// ```text
///   samples + sample rate
///     │
///     ▼  estimate(method, params)
///   ┌───────────────────────────────────────────┐
///   │ stft      FFT                              │
///   │ cqt       CQT                              │
///   │ multires  Multi-Res                        │
///   │ chirplet  Chirplet / Chirplet Zero         │
///   │ wavelet   Wavelet / Improved / Stationary  │
///   └───────────────────────────────────────────┘
///     │
///     ▼  finalise: clamp, floor, optional band
///   Spectrum
/// ```
///
/// `dual` is not a `Method`: it produces a time–frequency surface for the
/// detail view rather than a single curve.
pub mod chirplet;
pub mod cqt;
pub mod dual;
pub mod interp;
pub mod multires;
pub mod stft;
pub mod wavelet;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EstimatorParams;
use crate::data::model::Spectrum;
use crate::error::{AnalysisError, AnalysisResult};

use self::wavelet::WaveletParams;

// ---------------------------------------------------------------------------
// Method identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "FFT")]
    Fft,
    #[serde(rename = "CQT")]
    Cqt,
    #[serde(rename = "Multi-Res")]
    MultiRes,
    #[serde(rename = "Chirplet")]
    Chirplet,
    #[serde(rename = "Chirplet Zero")]
    ChirpletZero,
    #[serde(rename = "Wavelet")]
    Wavelet,
    #[serde(rename = "Improved Wavelet")]
    ImprovedWavelet,
    #[serde(rename = "Stationary Wavelet")]
    StationaryWavelet,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Fft,
        Method::Cqt,
        Method::MultiRes,
        Method::Chirplet,
        Method::ChirpletZero,
        Method::Wavelet,
        Method::ImprovedWavelet,
        Method::StationaryWavelet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Method::Fft => "FFT",
            Method::Cqt => "CQT",
            Method::MultiRes => "Multi-Res",
            Method::Chirplet => "Chirplet",
            Method::ChirpletZero => "Chirplet Zero",
            Method::Wavelet => "Wavelet",
            Method::ImprovedWavelet => "Improved Wavelet",
            Method::StationaryWavelet => "Stationary Wavelet",
        }
    }

    /// Exact, case-sensitive match on the display name.
    pub fn from_name(name: &str) -> Option<Method> {
        Method::ALL.iter().copied().find(|m| m.name() == name)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve user-facing names, silently skipping unknown ones and duplicates.
pub fn parse_methods<S: AsRef<str>>(names: &[S]) -> Vec<Method> {
    let mut methods = Vec::new();
    for name in names {
        match Method::from_name(name.as_ref()) {
            Some(m) if !methods.contains(&m) => methods.push(m),
            Some(_) => {}
            None => log::debug!("Skipping unknown method {:?}", name.as_ref()),
        }
    }
    methods
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run `method` on mono `samples`.
///
/// `params.chirp_max_freq` must already be resolved (see
/// [`AnalysisConfig::resolved_estimator`](crate::config::AnalysisConfig::resolved_estimator));
/// when it is not, Nyquist is used.
pub fn estimate(
    samples: &[f64],
    sample_rate: f64,
    method: Method,
    params: &EstimatorParams,
) -> AnalysisResult<Spectrum> {
    if samples.is_empty() {
        return Err(AnalysisError::load("no samples to analyse"));
    }
    if !(sample_rate > 0.0) {
        return Err(AnalysisError::load(format!("invalid sample rate {sample_rate}")));
    }

    let wavelet = |max_level| WaveletParams {
        kind: params.wavelet,
        max_level,
        n_fft: params.n_fft,
    };
    let chirp_max = params.chirp_max_freq.unwrap_or(sample_rate / 2.0);

    let (frequencies, power) = match method {
        Method::Fft => stft::stft_psd(samples, sample_rate, params.n_fft, params.hop()),
        Method::Cqt => cqt::cqt_psd(
            samples,
            sample_rate,
            params.cqt_fmin,
            params.cqt_n_bins,
            params.cqt_bins_per_octave,
            params.hop(),
        )?,
        Method::MultiRes => {
            multires::multi_resolution_psd(samples, sample_rate, &params.fft_sizes, params.hop())
        }
        Method::Chirplet => chirplet::chirplet_psd(
            samples,
            sample_rate,
            params.n_chirps,
            params.chirp_min_freq,
            chirp_max,
            None,
        ),
        Method::ChirpletZero => chirplet::chirplet_psd(
            samples,
            sample_rate,
            params.n_chirps,
            params.chirp_min_freq,
            chirp_max,
            Some(params.n_fft),
        ),
        Method::Wavelet => {
            wavelet::packet_psd(samples, sample_rate, wavelet(params.packet_max_level))?
        }
        Method::ImprovedWavelet => {
            wavelet::improved_packet_psd(samples, sample_rate, wavelet(params.packet_max_level))?
        }
        Method::StationaryWavelet => {
            wavelet::stationary_psd(samples, sample_rate, wavelet(params.stationary_max_level))?
        }
    };

    let spectrum = Spectrum::new(frequencies, power)?;
    match params.output_band {
        Some((lo, hi)) => spectrum.restrict(lo, hi),
        None => Ok(spectrum),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::POWER_FLOOR;
    use std::f64::consts::PI;

    fn clip() -> Vec<f64> {
        (0..8000)
            .map(|i| {
                let t = i as f64 / 8000.0;
                (2.0 * PI * 440.0 * t).sin() + 0.5 * (2.0 * PI * 880.0 * t).sin()
            })
            .collect()
    }

    fn params() -> EstimatorParams {
        EstimatorParams {
            cqt_fmin: 200.0,
            cqt_n_bins: 72,
            n_chirps: 20,
            chirp_max_freq: Some(3000.0),
            ..EstimatorParams::default()
        }
    }

    #[test]
    fn names_round_trip_and_unknown_are_skipped() {
        for m in Method::ALL {
            assert_eq!(Method::from_name(m.name()), Some(m));
            let json = serde_json::to_string(&m).unwrap();
            assert_eq!(json, format!("\"{}\"", m.name()));
        }
        let parsed = parse_methods(&["FFT", "Bogus", "fft", "CQT", "FFT"]);
        assert_eq!(parsed, vec![Method::Fft, Method::Cqt]);
    }

    #[test]
    fn every_method_yields_a_valid_spectrum() {
        let samples = clip();
        for m in Method::ALL {
            let sp = estimate(&samples, 8000.0, m, &params())
                .unwrap_or_else(|e| panic!("{m}: {e}"));
            assert!(!sp.is_empty(), "{m}");
            assert!(sp.frequencies().windows(2).all(|w| w[0] < w[1]), "{m}");
            assert!(sp.power().iter().all(|&p| p.is_finite() && p >= POWER_FLOOR), "{m}");
        }
    }

    #[test]
    fn empty_samples_are_load_error() {
        assert!(matches!(
            estimate(&[], 8000.0, Method::Fft, &params()),
            Err(AnalysisError::Load(_))
        ));
    }

    #[test]
    fn output_band_filters_and_empty_band_is_range_error() {
        let mut p = params();
        p.output_band = Some((300.0, 1000.0));
        let sp = estimate(&clip(), 8000.0, Method::Fft, &p).unwrap();
        assert!(sp.frequencies().iter().all(|&f| (300.0..=1000.0).contains(&f)));

        p.output_band = Some((5000.0, 6000.0));
        assert!(matches!(
            estimate(&clip(), 8000.0, Method::Fft, &p),
            Err(AnalysisError::Range(_))
        ));
    }
}
