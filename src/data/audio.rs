use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};

use crate::error::{AnalysisError, AnalysisResult};

// ---------------------------------------------------------------------------
// Decoded mono audio
// ---------------------------------------------------------------------------

/// Mono samples plus their sample rate, shared read-only by every method.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Display name (file stem).
    pub name: String,
    pub samples: Vec<f64>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(name: impl Into<String>, samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode a WAV file to mono `f64` samples.
///
/// Channels are averaged; integer PCM is scaled to `[-1, 1)`. A missing path
/// without a `.wav` extension is retried with its extension replaced by
/// `.wav` (`take.mp3` → `take.wav`, `take` → `take.wav`).
pub fn load_wav(path: &Path) -> AnalysisResult<AudioClip> {
    let path = resolve_wav_path(path)?;
    let mut reader = WavReader::open(&path)
        .map_err(|e| AnalysisError::load(format!("{}: {e}", path.display())))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>(),
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 * scale))
                .collect::<Result<_, _>>()
        }
    }
    .map_err(|e| AnalysisError::load(format!("{}: {e}", path.display())))?;

    let samples: Vec<f64> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
        .collect();

    if samples.is_empty() {
        return Err(AnalysisError::load(format!(
            "audio file is empty: {}",
            path.display()
        )));
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();

    let clip = AudioClip::new(name, samples, spec.sample_rate);
    log::info!(
        "Loaded {} ({} samples, {:.2} s @ {} Hz, {} ch)",
        path.display(),
        clip.samples.len(),
        clip.duration_secs(),
        spec.sample_rate,
        channels
    );

    Ok(clip)
}

fn resolve_wav_path(path: &Path) -> AnalysisResult<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    let has_wav_suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if !has_wav_suffix {
        let candidate = path.with_extension("wav");
        if candidate.exists() {
            return Ok(candidate);
        }
        return Err(AnalysisError::load(format!(
            "WAV file not found: {} or {}",
            path.display(),
            candidate.display()
        )));
    }
    Err(AnalysisError::load(format!(
        "WAV file not found: {}",
        path.display()
    )))
}
