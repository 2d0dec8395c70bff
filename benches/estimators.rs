//! Estimator timings on a synthetic one-second harmonic tone.
//!
//! Run with: cargo bench

use std::f64::consts::PI;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rusty_harmonics::config::PeakConfig;
use rusty_harmonics::peaks::detect_peaks;
use rusty_harmonics::scale::to_db;
use rusty_harmonics::spectral::dual::dual_resolution;
use rusty_harmonics::{estimate, AnalysisConfig, Method};

const SAMPLE_RATE: f64 = 22_050.0;

fn tone() -> Vec<f64> {
    (0..SAMPLE_RATE as usize)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            (1..=6)
                .map(|k| (2.0 * PI * 220.0 * k as f64 * t).sin() / k as f64)
                .sum()
        })
        .collect()
}

fn bench_estimators(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimators");
    group.sample_size(10);
    let samples = tone();
    let params = AnalysisConfig::default().resolved_estimator();

    for method in Method::ALL {
        group.bench_with_input(BenchmarkId::new("estimate", method.name()), &method, |b, &m| {
            b.iter(|| estimate(black_box(&samples), SAMPLE_RATE, m, &params))
        });
    }
    group.bench_function("dual_resolution", |b| {
        b.iter(|| dual_resolution(black_box(&samples), SAMPLE_RATE, &params))
    });
    group.finish();
}

fn bench_peaks(c: &mut Criterion) {
    let samples = tone();
    let params = AnalysisConfig::default().resolved_estimator();
    let Ok(spectrum) = estimate(&samples, SAMPLE_RATE, Method::Fft, &params) else {
        return;
    };
    let db: Vec<f64> = spectrum.power().iter().map(|&p| to_db(p)).collect();
    let config = PeakConfig::default();

    c.bench_function("peaks/detect", |b| {
        b.iter(|| detect_peaks(black_box(spectrum.frequencies()), black_box(&db), &config))
    });
}

criterion_group!(benches, bench_estimators, bench_peaks);
criterion_main!(benches);
