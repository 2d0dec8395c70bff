//! Export artifacts: pairs JSON, graph JSON and a flat pairs CSV.
//!
//! File names are `{base}_{kind}_{timestamp}.{ext}` with a `%Y%m%d_%H%M%S`
//! timestamp. The caller supplies it so repeated exports of one session
//! line up; [`timestamp_now`] gives the local wall-clock value.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::harmonic::{GraphExport, PairsExport};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time as an export suffix.
pub fn timestamp_now() -> String {
    format_timestamp(&Local::now())
}

/// Paths of one export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub pairs_json: PathBuf,
    pub graph_json: PathBuf,
    pub pairs_csv: PathBuf,
}

impl ExportPaths {
    pub fn new(dir: &Path, base: &str, timestamp: &str) -> Self {
        Self {
            pairs_json: dir.join(format!("{base}_pairs_{timestamp}.json")),
            graph_json: dir.join(format!("{base}_graph_{timestamp}.json")),
            pairs_csv: dir.join(format!("{base}_pairs_{timestamp}.csv")),
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    filename: &'a str,
    method: &'a str,
    f0: f64,
    f1: f64,
    ratio: f64,
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn write_pairs_json(path: &Path, exports: &[PairsExport]) -> Result<()> {
    write_json(path, exports)
}

pub fn write_graph_json(path: &Path, exports: &[GraphExport]) -> Result<()> {
    write_json(path, exports)
}

/// One row per pair: `filename,method,f0,f1,ratio`.
pub fn write_pairs_csv(path: &Path, exports: &[PairsExport]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for export in exports {
        for pair in &export.pairs {
            writer.serialize(CsvRow {
                filename: &export.filename,
                method: &export.method,
                f0: pair.f0,
                f1: pair.f1,
                ratio: pair.ratio,
            })?;
        }
    }
    writer.flush().context("flushing pairs CSV")?;
    Ok(())
}

/// Write all three artifacts into `dir`, creating it if needed.
pub fn export_session(
    dir: &Path,
    base: &str,
    timestamp: &str,
    pairs: &[PairsExport],
    graphs: &[GraphExport],
) -> Result<ExportPaths> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let paths = ExportPaths::new(dir, base, timestamp);
    write_pairs_json(&paths.pairs_json, pairs)?;
    write_graph_json(&paths.graph_json, graphs)?;
    write_pairs_csv(&paths.pairs_csv, pairs)?;
    let total: usize = pairs.iter().map(|p| p.pairs.len()).sum();
    log::info!(
        "Exported {total} pairs from {} plots to {}",
        pairs.len(),
        dir.display()
    );
    Ok(paths)
}

pub fn read_pairs_json(path: &Path) -> Result<Vec<PairsExport>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).context("parsing pairs JSON")
}

pub fn read_graph_json(path: &Path) -> Result<Vec<GraphExport>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).context("parsing graph JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn timestamp_is_date_then_time() {
        let time = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(format_timestamp(&time), "20240305_140709");
        assert_eq!(timestamp_now().len(), "20240305_140709".len());
    }

    #[test]
    fn paths_carry_kind_and_timestamp() {
        let paths = ExportPaths::new(Path::new("out"), "psd_analysis", "20240305_140709");
        assert_eq!(
            paths.graph_json,
            Path::new("out").join("psd_analysis_graph_20240305_140709.json")
        );
        assert_eq!(
            paths.pairs_csv,
            Path::new("out").join("psd_analysis_pairs_20240305_140709.csv")
        );
    }
}
