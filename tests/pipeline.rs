//! Audio → spectrum → peaks → session → export, plus front-end equivalence.

use std::f64::consts::PI;
use std::path::PathBuf;

use hound::{SampleFormat, WavSpec, WavWriter};

use rusty_harmonics::batch::Batch;
use rusty_harmonics::config::PeakConfig;
use rusty_harmonics::data::audio::AudioClip;
use rusty_harmonics::data::model::POWER_FLOOR;
use rusty_harmonics::export::{export_session, read_graph_json, read_pairs_json};
use rusty_harmonics::frontend::{parse_event_log, pointer_command, replay};
use rusty_harmonics::harmonic::Button;
use rusty_harmonics::peaks::detect_peaks;
use rusty_harmonics::scale::{Scale, ScaleConverter, LINEAR_EPSILON};
use rusty_harmonics::spectral::multires::multi_resolution_psd;
use rusty_harmonics::{
    build_session, estimate, AnalysisConfig, AnalysisError, Command, Method, PeakSet, Spectrum,
};
use rusty_harmonics::HarmonicGraphEngine;

const SR: u32 = 22_050;

fn tone(seconds: f64) -> Vec<f64> {
    let n = (seconds * SR as f64) as usize;
    let mut noise = 0x2545_f491_u64;
    (0..n)
        .map(|i| {
            let t = i as f64 / SR as f64;
            noise ^= noise << 13;
            noise ^= noise >> 7;
            noise ^= noise << 17;
            let jitter = (noise >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            (2.0 * PI * 440.0 * t).sin()
                + 0.5 * (2.0 * PI * 880.0 * t).sin()
                + 0.25 * (2.0 * PI * 1320.0 * t).sin()
                + 1e-3 * jitter
        })
        .collect()
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "rusty_harmonics_it_{}_{name}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_wav(path: &PathBuf, samples: &[f64]) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SR,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s as f32 * 0.5).unwrap();
    }
    writer.finalize().unwrap();
}

fn fft_config() -> AnalysisConfig {
    AnalysisConfig {
        methods: vec!["FFT".into(), "Multi-Res".into()],
        ..AnalysisConfig::default()
    }
}

#[test]
fn failing_file_does_not_hide_other_cells() {
    let dir = temp_dir("batch");
    let good = dir.join("good.wav");
    write_wav(&good, &tone(0.5));
    let missing = dir.join("missing.wav");

    let batch = Batch::new(&fft_config()).unwrap();
    let cells = batch.run_files(&[good, missing]).unwrap();

    assert_eq!(cells.len(), 4);
    assert!(cells[0].is_ok() && cells[1].is_ok());
    for cell in &cells[2..] {
        assert!(matches!(cell.outcome, Err(AnalysisError::Load(_))));
    }
    assert_eq!(cells[0].filename, cells[1].filename);
    assert_eq!(cells[0].method, Method::Fft);
    assert_eq!(cells[1].method, Method::MultiRes);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn spectrogram_per_file_is_floored_and_isolated() {
    let dir = temp_dir("spectrogram");
    let good = dir.join("good.wav");
    write_wav(&good, &tone(0.5));

    let batch = Batch::new(&fft_config()).unwrap();
    let output = batch
        .run_files_with_spectrograms(&[good, dir.join("missing.wav")])
        .unwrap();

    assert_eq!(output.cells.len(), 4);
    assert_eq!(output.spectrograms.len(), 2);
    assert!(matches!(
        output.spectrograms[1].outcome,
        Err(AnalysisError::Load(_))
    ));

    let dual = output.spectrograms[0].outcome.as_ref().unwrap();
    assert!(dual
        .psd
        .iter()
        .chain(dual.surface.iter().flatten())
        .all(|&p| p >= POWER_FLOOR));
    let loudest = dual
        .psd
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| dual.frequencies[i])
        .unwrap();
    assert!((loudest - 440.0).abs() < 25.0, "loudest bin at {loudest} Hz");

    let map = dual.heatmap(100.0, 6000.0, 50, 40, 80.0);
    assert!(!map.is_empty() && map.len() <= 50);
    assert!(map.iter().all(|row| row.len() <= 40));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn cancelled_batch_reports_cancelled_cells() {
    let batch = Batch::new(&fft_config()).unwrap();
    batch.cancel();
    let clips = [AudioClip::new("tone", tone(0.25), SR)];
    let cells = batch.run_clips(&clips).unwrap();
    assert!(cells
        .iter()
        .all(|c| c.outcome == Err(AnalysisError::Cancelled)));
}

#[test]
fn batch_rejects_unknown_methods_and_empty_input() {
    let config = AnalysisConfig {
        methods: vec!["Bogus".into()],
        ..AnalysisConfig::default()
    };
    assert!(matches!(Batch::new(&config), Err(AnalysisError::Config(_))));

    let batch = Batch::new(&fft_config()).unwrap();
    assert!(matches!(batch.run_clips(&[]), Err(AnalysisError::Config(_))));
}

#[test]
fn db_view_matches_linear_power() {
    let params = AnalysisConfig::default().resolved_estimator();
    let spectrum = estimate(&tone(0.5), SR as f64, Method::Fft, &params).unwrap();
    let view = ScaleConverter::new(&spectrum, Scale::Db);
    for (&lin, &db) in spectrum.power().iter().zip(view.db()) {
        let expected = 10.0 * lin.max(LINEAR_EPSILON).log10();
        assert!((db - expected).abs() < 1e-9);
    }
    assert!(spectrum.frequencies().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn stitched_spectrum_has_no_zero_bins() {
    let (freqs, power) = multi_resolution_psd(&tone(1.0), SR as f64, &[512, 1024, 2048, 4096], 256);
    assert_eq!(freqs.len(), power.len());
    assert_eq!(freqs.len(), 4096 / 2 + 1);
    assert!(power.iter().all(|&p| p != 0.0));
}

#[test]
fn detector_respects_peak_limit() {
    let params = AnalysisConfig::default().resolved_estimator();
    let spectrum = estimate(&tone(1.0), SR as f64, Method::Fft, &params).unwrap();
    let view = ScaleConverter::new(&spectrum, Scale::Db);
    let config = PeakConfig {
        max_peaks: 3,
        ..PeakConfig::default()
    };
    let peaks = detect_peaks(view.frequencies(), view.db(), &config).unwrap();
    assert!(peaks.len() <= 3);
    assert_eq!(peaks.widths.len(), peaks.len());
    assert_eq!(peaks.frequencies.len(), peaks.len());
}

#[test]
fn detected_harmonics_can_be_paired() {
    let config = AnalysisConfig::default();
    let spectrum = estimate(
        &tone(1.0),
        SR as f64,
        Method::Fft,
        &config.resolved_estimator(),
    )
    .unwrap();
    let mut engine = build_session(&spectrum, &config).unwrap();

    let a = engine.resolve(440.0).expect("peak near 440 Hz");
    let b = engine.resolve(880.0).expect("peak near 880 Hz");
    engine.apply(pointer_command(Button::Left, 1.0, a));
    engine.apply(pointer_command(Button::Left, 2.0, b));
    engine.apply(pointer_command(Button::Right, 3.0, b));

    assert_eq!(engine.pairs().len(), 1);
    assert!((engine.pairs()[0].ratio - 2.0).abs() < 0.1);
}

// ---------------------------------------------------------------------------
// Front ends and export
// ---------------------------------------------------------------------------

fn synthetic_engine() -> HarmonicGraphEngine {
    let frequencies: Vec<f64> = (0..800).map(|i| i as f64 * 5.0).collect();
    let mut power = vec![1e-6; frequencies.len()];
    let peaks = [200.0, 400.0, 600.0, 1000.0];
    let indices: Vec<usize> = peaks.iter().map(|&f| (f / 5.0) as usize).collect();
    for &i in &indices {
        power[i] = 0.5;
    }
    let spectrum = Spectrum::new(frequencies, power).unwrap();
    let peak_set = PeakSet {
        indices,
        frequencies: peaks.to_vec(),
        widths: vec![5.0; peaks.len()],
    };
    HarmonicGraphEngine::from_spectrum(
        &spectrum,
        &peak_set,
        Scale::Db,
        AnalysisConfig::default().engine,
    )
}

const EVENT_LOG: &str = r#"[
    {"type": "click", "button": 0, "timeStamp": 1000.0, "x": 205.0},
    {"type": "click", "button": 0, "timeStamp": 2000.0, "x": 398.0},
    {"type": "click", "button": 2, "timeStamp": 3000.0, "x": 398.0},
    {"type": "click", "button": 1, "timeStamp": 3500.0, "x": 398.0},
    {"type": "click", "button": 0, "timeStamp": 4000.0, "x": 610.0},
    {"type": "click", "button": 0, "timeStamp": 5000.0, "x": 990.0},
    {"type": "keypress", "key": "q"},
    {"type": "keypress", "key": "a"},
    {"type": "keypress", "key": "d"}
]"#;

#[test]
fn document_events_and_native_commands_agree() {
    let mut native = synthetic_engine();
    let commands = [
        pointer_command(Button::Left, 1.0, 205.0),
        pointer_command(Button::Left, 2.0, 398.0),
        pointer_command(Button::Right, 3.0, 398.0),
        pointer_command(Button::Left, 4.0, 610.0),
        pointer_command(Button::Left, 5.0, 990.0),
        Command::FullyConnect,
        Command::ToggleScale,
    ];
    for command in commands {
        native.apply(command);
    }

    let mut document = synthetic_engine();
    let events = parse_event_log(EVENT_LOG).unwrap();
    let outcomes = replay(&mut document, &events);

    assert_eq!(outcomes.len(), commands.len());
    assert_eq!(document.session_snapshot(), native.session_snapshot());
    assert_eq!(native.scale(), Scale::Linear);
    assert_eq!(native.graph().node_count(), 4);
}

#[test]
fn export_round_trips_through_json() {
    let mut engine = synthetic_engine();
    replay(&mut engine, &parse_event_log(EVENT_LOG).unwrap());
    let pairs = [engine.pairs_export("clip.wav", "FFT")];
    let graphs = [engine.graph_export("clip.wav", "FFT")];

    let dir = temp_dir("export");
    let paths = export_session(&dir, "psd_analysis", "20240101_000000", &pairs, &graphs).unwrap();

    assert_eq!(
        paths.pairs_json.file_name().unwrap(),
        "psd_analysis_pairs_20240101_000000.json"
    );
    assert_eq!(read_pairs_json(&paths.pairs_json).unwrap(), pairs);
    assert_eq!(read_graph_json(&paths.graph_json).unwrap(), graphs);

    let csv = std::fs::read_to_string(&paths.pairs_csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("filename,method,f0,f1,ratio"));
    assert_eq!(lines.count(), pairs[0].pairs.len());
    std::fs::remove_dir_all(&dir).ok();
}
