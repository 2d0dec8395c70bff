/// Data layer: decoded audio and the validated result types.
///
/// Architecture:
/// ```text
///   .wav
///     │
///     ▼
///   ┌──────────┐
///   │  audio    │  decode → AudioClip (mono f64 + sample rate)
///   └──────────┘
///     │
///     ▼  spectral::estimate
///   ┌──────────┐
///   │  model    │  Spectrum, PeakSet, Peak, DualResolution
///   └──────────┘
/// ```

pub mod audio;
pub mod model;
