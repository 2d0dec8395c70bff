//! Replays a recorded document-view event log against one analysed clip and
//! writes the export artifacts.
//!
//! ```text
//! replay_session <clip.wav> <method> <events.json> [out_dir] [config.json]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use rusty_harmonics::data::audio::load_wav;
use rusty_harmonics::export::{export_session, timestamp_now};
use rusty_harmonics::frontend::{parse_event_log, replay};
use rusty_harmonics::harmonic::Outcome;
use rusty_harmonics::{build_session, estimate, AnalysisConfig, Method};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        bail!("usage: replay_session <clip.wav> <method> <events.json> [out_dir] [config.json]");
    }
    let wav = PathBuf::from(&args[0]);
    let Some(method) = Method::from_name(&args[1]) else {
        let known: Vec<&str> = Method::ALL.iter().map(|m| m.name()).collect();
        bail!("unknown method {:?}; expected one of {}", args[1], known.join(", "));
    };
    let events_path = Path::new(&args[2]);
    let out_dir = args.get(3).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("artifacts"));

    let mut config = match args.get(4) {
        Some(path) => AnalysisConfig::load(Path::new(path))?,
        None => AnalysisConfig::default(),
    };
    config.apply_env();
    config.validate()?;

    let clip = load_wav(&wav)?;
    let spectrum = estimate(
        &clip.samples,
        clip.sample_rate as f64,
        method,
        &config.resolved_estimator(),
    )
    .with_context(|| format!("{} / {method}", clip.name))?;
    let mut engine = build_session(&spectrum, &config)?;
    log::info!(
        "{} / {method}: {} bins, {} peaks",
        clip.name,
        spectrum.len(),
        engine.view().peaks().len()
    );

    let text = std::fs::read_to_string(events_path)
        .with_context(|| format!("reading {}", events_path.display()))?;
    let events = parse_event_log(&text).context("parsing event log")?;

    let outcomes = replay(&mut engine, &events);
    let applied = outcomes.iter().filter(|o| o.is_applied()).count();
    for outcome in &outcomes {
        match outcome {
            Outcome::Matrix(matrix) => println!("{matrix}"),
            Outcome::Ignored(diagnostic) => log::info!("ignored: {diagnostic}"),
            Outcome::Applied => {}
        }
    }
    println!(
        "{applied}/{} commands applied, {} pairs, {} nodes",
        outcomes.len(),
        engine.pairs().len(),
        engine.graph().node_count()
    );

    let timestamp = timestamp_now();
    let paths = export_session(
        &out_dir,
        &clip.name,
        &timestamp,
        &[engine.pairs_export(&clip.name, method.name())],
        &[engine.graph_export(&clip.name, method.name())],
    )?;
    println!("Wrote {}", paths.pairs_json.display());
    Ok(())
}
