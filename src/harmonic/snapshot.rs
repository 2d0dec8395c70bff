//! Serializable views of an engine, consumed by renderers and exporters.

use serde::{Deserialize, Serialize};

use crate::color::EdgeColor;
use crate::scale::Scale;

use super::graph::{Edge, HarmonicGraph, Node};

/// `{nodes: [{frequency, power}], edges: [{source, target, ratio, color}]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl From<&HarmonicGraph> for GraphSnapshot {
    fn from(graph: &HarmonicGraph) -> Self {
        GraphSnapshot {
            nodes: graph.nodes().copied().collect(),
            edges: graph.edges().copied().collect(),
        }
    }
}

/// A user-made pair, `f0 < f1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub f0: f64,
    pub f1: f64,
    pub ratio: f64,
    pub color: EdgeColor,
}

impl Pair {
    pub fn new(a: f64, b: f64, color: EdgeColor) -> Self {
        let (f0, f1) = if a <= b { (a, b) } else { (b, a) };
        Pair {
            f0,
            f1,
            ratio: f1 / f0,
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub f0: f64,
    pub f1: f64,
    pub ratio: f64,
}

impl From<&Pair> for PairRecord {
    fn from(p: &Pair) -> Self {
        PairRecord {
            f0: p.f0,
            f1: p.f1,
            ratio: p.ratio,
        }
    }
}

/// `{filename, method, pairs: [{f0, f1, ratio}]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairsExport {
    pub filename: String,
    pub method: String,
    pub pairs: Vec<PairRecord>,
}

/// `{filename, method, graph: {nodes, edges}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub filename: String,
    pub method: String,
    pub graph: GraphSnapshot,
}

/// Everything observable about a session; two engines driven by the same
/// commands produce equal snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub selected_peaks: Vec<f64>,
    pub pairs: Vec<Pair>,
    pub graph: GraphSnapshot,
    pub scale: Scale,
}
