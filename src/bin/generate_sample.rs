//! Writes a handful of synthetic harmonic WAV clips for trying the viewer.

use std::f64::consts::PI;
use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};

const SAMPLE_RATE: u32 = 44_100;
const DURATION_SECS: f64 = 2.0;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

/// Sum of partials `(frequency, amplitude)` with a short fade in/out and noise.
fn synthesize(partials: &[(f64, f64)], noise_level: f64, rng: &mut SimpleRng) -> Vec<f64> {
    let n = (DURATION_SECS * SAMPLE_RATE as f64) as usize;
    let fade = (0.02 * SAMPLE_RATE as f64) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            let tone: f64 = partials
                .iter()
                .map(|&(f, a)| a * (2.0 * PI * f * t).sin())
                .sum();
            let envelope = (i.min(n - 1 - i) as f64 / fade as f64).min(1.0);
            envelope * tone + rng.gauss(0.0, noise_level)
        })
        .collect()
}

fn write_wav(path: &Path, samples: &[f64]) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer =
        WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;
    let peak = samples.iter().fold(0.0f64, |m, s| m.max(s.abs())).max(1e-12);
    for &s in samples {
        let v = (s / peak * 0.9 * i16::MAX as f64).round() as i16;
        writer.write_sample(v)?;
    }
    writer.finalize()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let out_dir = Path::new("sample_audio");
    std::fs::create_dir_all(out_dir)?;

    // Harmonic series, a slightly inharmonic bell and a perfect fifth.
    let clips: Vec<(&str, Vec<(f64, f64)>)> = vec![
        (
            "harmonic_220",
            (1..=8).map(|k| (220.0 * k as f64, 1.0 / k as f64)).collect(),
        ),
        (
            "bell_500",
            vec![(500.0, 1.0), (1190.0, 0.6), (2040.0, 0.4), (2870.0, 0.25), (4010.0, 0.15)],
        ),
        (
            "fifth_330_495",
            vec![(330.0, 1.0), (495.0, 0.8), (660.0, 0.4), (990.0, 0.3), (1485.0, 0.15)],
        ),
    ];

    for (name, partials) in &clips {
        let samples = synthesize(partials, 0.002, &mut rng);
        let path = out_dir.join(format!("{name}.wav"));
        write_wav(&path, &samples)?;
        println!("Wrote {} ({} partials)", path.display(), partials.len());
    }
    Ok(())
}
