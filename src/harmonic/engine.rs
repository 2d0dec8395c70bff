use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::EdgeColor;
use crate::config::EngineConfig;
use crate::data::model::{PeakSet, Spectrum};
use crate::scale::{Scale, ScaleConverter};

use super::click::{Button, ClickClassifier, ClickKind};
use super::graph::{FreqKey, HarmonicGraph};
use super::snapshot::{GraphExport, GraphSnapshot, Pair, PairRecord, PairsExport, SessionSnapshot};

// ---------------------------------------------------------------------------
// Command vocabulary
// ---------------------------------------------------------------------------

/// Everything a front end can ask of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Pointer click at `frequency` (Hz, the x data coordinate); `time` in
    /// seconds on any monotonic clock.
    Click {
        button: Button,
        time: f64,
        frequency: f64,
    },
    ClearSelection,
    ResetAll,
    FullyConnect,
    ToggleScale,
    RatioMatrix,
}

/// Why a command left the state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Diagnostic {
    NoPeakNearby { frequency: f64 },
    AlreadySelected { frequency: f64 },
    NothingToRemove { frequency: f64 },
    NoPairForPeak { frequency: f64 },
    NotEnoughSelected { selected: usize },
    PairLimitReached { max_pairs: usize },
    TooFewNodes { nodes: usize },
    EmptyGraph,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoPeakNearby { frequency } => {
                write!(f, "no peak near {frequency:.1} Hz")
            }
            Diagnostic::AlreadySelected { frequency } => {
                write!(f, "{frequency:.1} Hz is already selected")
            }
            Diagnostic::NothingToRemove { frequency } => {
                write!(f, "{frequency:.1} Hz is not selected, paired or in the graph")
            }
            Diagnostic::NoPairForPeak { frequency } => {
                write!(f, "no pair contains {frequency:.1} Hz")
            }
            Diagnostic::NotEnoughSelected { selected } => {
                write!(f, "need 2 selected peaks to pair, have {selected}")
            }
            Diagnostic::PairLimitReached { max_pairs } => {
                write!(f, "pair limit of {max_pairs} reached")
            }
            Diagnostic::TooFewNodes { nodes } => {
                write!(f, "need at least 2 points to connect, have {nodes}")
            }
            Diagnostic::EmptyGraph => write!(f, "no nodes in graph"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    Ignored(Diagnostic),
    /// Answer to [`Command::RatioMatrix`]; state is untouched.
    Matrix(RatioMatrix),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

// ---------------------------------------------------------------------------
// Ratio matrix
// ---------------------------------------------------------------------------

/// Node-by-node ratio table: 1 on the diagonal, the edge ratio where an edge
/// exists (in both cells), empty elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioMatrix {
    pub frequencies: Vec<f64>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl fmt::Display for RatioMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "     ")?;
        for freq in &self.frequencies {
            write!(f, "{freq:>9.0}")?;
        }
        writeln!(f)?;
        writeln!(f, "     {}", "-".repeat(9 * self.frequencies.len()))?;
        for (freq, row) in self.frequencies.iter().zip(&self.cells) {
            write!(f, "{freq:>4.0}|")?;
            for cell in row {
                match cell {
                    Some(r) => write!(f, "{r:>9.3}")?,
                    None => write!(f, "{:>9}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session state + engine
// ---------------------------------------------------------------------------

/// Mutable per-view state. Only [`HarmonicGraphEngine`] changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    selected_peaks: Vec<f64>,
    pairs: Vec<Pair>,
    graph: HarmonicGraph,
    clicks: ClickClassifier,
}

impl SessionState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            selected_peaks: Vec::new(),
            pairs: Vec::new(),
            graph: HarmonicGraph::new(),
            clicks: ClickClassifier::new(config.double_click_window, config.triple_click_window),
        }
    }

    fn is_selected(&self, frequency: f64) -> bool {
        let key = FreqKey::from_hz(frequency);
        self.selected_peaks.iter().any(|&s| FreqKey::from_hz(s) == key)
    }

    fn select(&mut self, frequency: f64) -> bool {
        if self.is_selected(frequency) {
            return false;
        }
        self.selected_peaks.push(frequency);
        true
    }

    fn deselect(&mut self, frequency: f64) -> bool {
        let key = FreqKey::from_hz(frequency);
        let before = self.selected_peaks.len();
        self.selected_peaks.retain(|&s| FreqKey::from_hz(s) != key);
        before != self.selected_peaks.len()
    }
}

/// Curates frequency nodes and ratio pairs from a fixed set of peaks.
///
/// One engine per displayed spectrum. Every front end (native plot, replayed
/// document events, tests) goes through [`apply`](Self::apply), so the same
/// command sequence always produces the same state.
#[derive(Debug, Clone)]
pub struct HarmonicGraphEngine {
    config: EngineConfig,
    view: ScaleConverter,
    state: SessionState,
}

impl HarmonicGraphEngine {
    pub fn new(view: ScaleConverter, config: EngineConfig) -> Self {
        let state = SessionState::new(&config);
        Self { config, view, state }
    }

    /// Build the scale views of `spectrum`, attach `peaks` and start empty.
    pub fn from_spectrum(
        spectrum: &Spectrum,
        peaks: &PeakSet,
        scale: Scale,
        config: EngineConfig,
    ) -> Self {
        let mut view = ScaleConverter::new(spectrum, scale);
        view.set_peaks(peaks);
        Self::new(view, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn view(&self) -> &ScaleConverter {
        &self.view
    }

    pub fn scale(&self) -> Scale {
        self.view.scale()
    }

    pub fn selected_peaks(&self) -> &[f64] {
        &self.state.selected_peaks
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.state.pairs
    }

    pub fn graph(&self) -> &HarmonicGraph {
        &self.state.graph
    }

    pub fn apply(&mut self, command: Command) -> Outcome {
        let outcome = match command {
            Command::Click {
                button,
                time,
                frequency,
            } => self.click(button, time, frequency),
            Command::ClearSelection => {
                self.state.selected_peaks.clear();
                log::info!("Cleared selection");
                Outcome::Applied
            }
            Command::ResetAll => self.reset_all(),
            Command::FullyConnect => self.fully_connect(),
            Command::ToggleScale => self.toggle_scale(),
            Command::RatioMatrix => match self.ratio_matrix() {
                Some(matrix) => {
                    log::info!("Frequency ratio matrix:\n{matrix}");
                    Outcome::Matrix(matrix)
                }
                None => Outcome::Ignored(Diagnostic::EmptyGraph),
            },
        };
        if let Outcome::Ignored(diag) = &outcome {
            log::debug!("Ignored {command:?}: {diag}");
        }
        outcome
    }

    /// Classify the click, then dispatch on button × kind.
    pub fn click(&mut self, button: Button, time: f64, frequency: f64) -> Outcome {
        let kind = self.state.clicks.classify(button, time);
        log::debug!("{button:?} {kind:?} click at {frequency:.1} Hz");
        match (button, kind) {
            (Button::Left, ClickKind::Single) => self.select_peak(frequency),
            (Button::Left, ClickKind::Double) => self.remove_peak(frequency),
            (Button::Left, ClickKind::Triple) => self.reset_all(),
            (Button::Right, ClickKind::Single) => self.pair_last_two(),
            (Button::Right, ClickKind::Double) => self.unpair(frequency),
            (Button::Right, ClickKind::Triple) => self.remove_all_edges(),
        }
    }

    /// Nearest detected peak strictly within `click_tolerance` of `frequency`.
    pub fn resolve(&self, frequency: f64) -> Option<f64> {
        if !frequency.is_finite() {
            return None;
        }
        self.view
            .peaks()
            .iter()
            .map(|p| (p.frequency, (p.frequency - frequency).abs()))
            .fold(None, |best: Option<(f64, f64)>, cand| match best {
                Some(b) if b.1 <= cand.1 => Some(b),
                _ => Some(cand),
            })
            .filter(|&(_, dist)| dist < self.config.click_tolerance)
            .map(|(f, _)| f)
    }

    fn color(&self, index: usize) -> EdgeColor {
        EdgeColor::cycle(&self.config.palette, index)
    }

    // -- left button --------------------------------------------------------

    fn select_peak(&mut self, frequency: f64) -> Outcome {
        let Some(f) = self.resolve(frequency) else {
            return Outcome::Ignored(Diagnostic::NoPeakNearby { frequency });
        };
        if !self.state.select(f) {
            return Outcome::Ignored(Diagnostic::AlreadySelected { frequency: f });
        }
        let power = node_power(&self.view, f);
        self.state.graph.upsert_node(f, power);
        log::info!("Added peak at {f:.1} Hz");
        Outcome::Applied
    }

    fn remove_peak(&mut self, frequency: f64) -> Outcome {
        let Some(f) = self.resolve(frequency) else {
            return Outcome::Ignored(Diagnostic::NoPeakNearby { frequency });
        };
        let key = FreqKey::from_hz(f);
        let mut changed = false;

        if let Some(dropped) = self.state.graph.remove_node(f) {
            log::info!("Removed node {f:.1} Hz with {dropped} connections");
            changed = true;
        }

        let mut survivors = Vec::new();
        self.state.pairs.retain(|p| {
            if FreqKey::from_hz(p.f0) == key {
                survivors.push(p.f1);
                false
            } else if FreqKey::from_hz(p.f1) == key {
                survivors.push(p.f0);
                false
            } else {
                true
            }
        });
        for other in survivors {
            self.state.select(other);
            log::info!("Removed pair containing {f:.1} Hz, kept {other:.1} Hz");
            changed = true;
        }

        if self.state.deselect(f) {
            log::info!("Removed selected peak at {f:.1} Hz");
            changed = true;
        }

        if changed {
            Outcome::Applied
        } else {
            Outcome::Ignored(Diagnostic::NothingToRemove { frequency: f })
        }
    }

    fn reset_all(&mut self) -> Outcome {
        log::info!(
            "Removed all {} nodes and {} pairs",
            self.state.graph.node_count(),
            self.state.pairs.len()
        );
        self.state.graph.clear();
        self.state.pairs.clear();
        self.state.selected_peaks.clear();
        Outcome::Applied
    }

    // -- right button -------------------------------------------------------

    fn pair_last_two(&mut self) -> Outcome {
        let selected = self.state.selected_peaks.len();
        if selected < 2 {
            return Outcome::Ignored(Diagnostic::NotEnoughSelected { selected });
        }
        if self.state.pairs.len() >= self.config.max_pairs {
            return Outcome::Ignored(Diagnostic::PairLimitReached {
                max_pairs: self.config.max_pairs,
            });
        }
        let a = self.state.selected_peaks[selected - 2];
        let b = self.state.selected_peaks[selected - 1];
        let pair = Pair::new(a, b, self.color(self.state.pairs.len()));

        for f in [pair.f0, pair.f1] {
            if !self.state.graph.has_node(f) {
                let power = node_power(&self.view, f);
                self.state.graph.upsert_node(f, power);
            }
        }
        self.state.graph.add_edge(pair.f0, pair.f1, pair.color);
        self.state.pairs.push(pair);
        self.state.deselect(pair.f0);
        self.state.deselect(pair.f1);

        log::info!(
            "Created pair: {:.1} Hz and {:.1} Hz, ratio: {:.3}",
            pair.f0,
            pair.f1,
            pair.ratio
        );
        Outcome::Applied
    }

    fn unpair(&mut self, frequency: f64) -> Outcome {
        let Some(f) = self.resolve(frequency) else {
            return Outcome::Ignored(Diagnostic::NoPeakNearby { frequency });
        };
        let key = FreqKey::from_hz(f);
        let Some(idx) = self
            .state
            .pairs
            .iter()
            .position(|p| FreqKey::from_hz(p.f0) == key || FreqKey::from_hz(p.f1) == key)
        else {
            return Outcome::Ignored(Diagnostic::NoPairForPeak { frequency: f });
        };

        let pair = self.state.pairs.remove(idx);
        self.state.select(pair.f0);
        self.state.select(pair.f1);
        if self.state.graph.remove_edge(pair.f0, pair.f1).is_some() {
            log::info!(
                "Removed graph edge between {:.1} Hz and {:.1} Hz",
                pair.f0,
                pair.f1
            );
        }
        log::info!("Removed pair containing {f:.1} Hz, kept peaks");
        Outcome::Applied
    }

    fn remove_all_edges(&mut self) -> Outcome {
        let edges = self.state.graph.edge_count();
        let pairs = self.state.pairs.len();
        self.state.graph.clear_edges();
        self.state.pairs.clear();
        for f in self.state.graph.node_frequencies() {
            self.state.select(f);
        }
        log::info!(
            "Removed all {edges} edges and {pairs} pairs, kept {} nodes",
            self.state.graph.node_count()
        );
        Outcome::Applied
    }

    // -- keyboard -----------------------------------------------------------

    /// Connect every pair of selected peaks and graph nodes that is not
    /// connected yet. The selection is left as it is.
    fn fully_connect(&mut self) -> Outcome {
        let mut nodes: Vec<f64> = self.state.graph.node_frequencies();
        for &f in &self.state.selected_peaks {
            let key = FreqKey::from_hz(f);
            if !nodes.iter().any(|&n| FreqKey::from_hz(n) == key) {
                nodes.push(f);
            }
        }
        nodes.sort_by(|a, b| a.total_cmp(b));
        if nodes.len() < 2 {
            return Outcome::Ignored(Diagnostic::TooFewNodes { nodes: nodes.len() });
        }

        for &f in &nodes {
            if !self.state.graph.has_node(f) {
                let power = node_power(&self.view, f);
                self.state.graph.upsert_node(f, power);
            }
        }

        let mut added = 0usize;
        for (i, &f0) in nodes.iter().enumerate() {
            for &f1 in &nodes[i + 1..] {
                if self.state.graph.has_edge(f0, f1) {
                    continue;
                }
                let color = self.color(added);
                let edge = self.state.graph.add_edge(f0, f1, color);
                if self.state.pairs.len() < self.config.max_pairs {
                    self.state.pairs.push(Pair::new(edge.source, edge.target, color));
                }
                added += 1;
            }
        }
        log::info!(
            "Added {added} new connections between {} nodes",
            nodes.len()
        );
        Outcome::Applied
    }

    /// Swap the active scale; node powers follow by lookup.
    fn toggle_scale(&mut self) -> Outcome {
        let scale = self.view.toggle();
        let view = &self.view;
        for node in self.state.graph.nodes_mut() {
            node.power = node_power(view, node.frequency);
        }
        log::info!("Toggled to {scale:?} scale");
        Outcome::Applied
    }

    // -- read side ----------------------------------------------------------

    pub fn ratio_matrix(&self) -> Option<RatioMatrix> {
        let frequencies = self.state.graph.node_frequencies();
        if frequencies.is_empty() {
            return None;
        }
        let cells = frequencies
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                frequencies
                    .iter()
                    .enumerate()
                    .map(|(j, &b)| {
                        if i == j {
                            Some(1.0)
                        } else {
                            self.state.graph.edge(a, b).map(|e| e.ratio)
                        }
                    })
                    .collect()
            })
            .collect();
        Some(RatioMatrix { frequencies, cells })
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::from(&self.state.graph)
    }

    pub fn session_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            selected_peaks: self.state.selected_peaks.clone(),
            pairs: self.state.pairs.clone(),
            graph: self.snapshot(),
            scale: self.view.scale(),
        }
    }

    pub fn pairs_export(&self, filename: &str, method: &str) -> PairsExport {
        PairsExport {
            filename: filename.to_string(),
            method: method.to_string(),
            pairs: self.state.pairs.iter().map(PairRecord::from).collect(),
        }
    }

    pub fn graph_export(&self, filename: &str, method: &str) -> GraphExport {
        GraphExport {
            filename: filename.to_string(),
            method: method.to_string(),
            graph: self.snapshot(),
        }
    }
}

/// Active-scale power of the detected peak at `frequency`, or of the nearest
/// spectrum bin when no peak matches.
fn node_power(view: &ScaleConverter, frequency: f64) -> f64 {
    let key = FreqKey::from_hz(frequency);
    view.peaks()
        .iter()
        .find(|p| FreqKey::from_hz(p.frequency) == key)
        .map(|p| view.peak_power(p))
        .unwrap_or_else(|| view.power_at(frequency))
}
