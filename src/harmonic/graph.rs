//! Frequency nodes and ratio-labelled edges.
//!
//! Nodes are keyed by [`FreqKey`], a millihertz bucket of the (already
//! snapped) frequency, so float noise never creates a second node for the
//! same peak. Edges are keyed by the sorted key pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::EdgeColor;

/// Bucketed frequency used for node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FreqKey(i64);

impl FreqKey {
    pub fn from_hz(frequency: f64) -> Self {
        FreqKey((frequency * 1000.0).round() as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub frequency: f64,
    pub power: f64,
}

/// Undirected edge with `source < target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: f64,
    pub target: f64,
    pub ratio: f64,
    pub color: EdgeColor,
}

impl Edge {
    /// Orders the endpoints so the ratio is always ≥ 1.
    pub fn new(a: f64, b: f64, color: EdgeColor) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Edge {
            source,
            target,
            ratio: target / source,
            color,
        }
    }

    pub fn touches(&self, key: FreqKey) -> bool {
        FreqKey::from_hz(self.source) == key || FreqKey::from_hz(self.target) == key
    }
}

fn edge_key(a: f64, b: f64) -> (FreqKey, FreqKey) {
    let (ka, kb) = (FreqKey::from_hz(a), FreqKey::from_hz(b));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarmonicGraph {
    nodes: BTreeMap<FreqKey, Node>,
    edges: BTreeMap<(FreqKey, FreqKey), Edge>,
}

impl HarmonicGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Insert a node, or update the power of an existing one.
    pub fn upsert_node(&mut self, frequency: f64, power: f64) {
        self.nodes
            .entry(FreqKey::from_hz(frequency))
            .and_modify(|n| n.power = power)
            .or_insert(Node { frequency, power });
    }

    pub fn has_node(&self, frequency: f64) -> bool {
        self.nodes.contains_key(&FreqKey::from_hz(frequency))
    }

    /// Remove a node together with its incident edges. Returns the number of
    /// edges dropped, or `None` when there was no such node.
    pub fn remove_node(&mut self, frequency: f64) -> Option<usize> {
        let key = FreqKey::from_hz(frequency);
        self.nodes.remove(&key)?;
        let before = self.edges.len();
        self.edges.retain(|_, edge| !edge.touches(key));
        Some(before - self.edges.len())
    }

    pub fn has_edge(&self, a: f64, b: f64) -> bool {
        self.edges.contains_key(&edge_key(a, b))
    }

    /// Insert or replace the edge between `a` and `b`. Endpoints must
    /// already be nodes; missing ones are created with zero power.
    pub fn add_edge(&mut self, a: f64, b: f64, color: EdgeColor) -> Edge {
        for f in [a, b] {
            self.nodes
                .entry(FreqKey::from_hz(f))
                .or_insert(Node { frequency: f, power: 0.0 });
        }
        let edge = Edge::new(a, b, color);
        self.edges.insert(edge_key(a, b), edge);
        edge
    }

    pub fn remove_edge(&mut self, a: f64, b: f64) -> Option<Edge> {
        self.edges.remove(&edge_key(a, b))
    }

    pub fn edge(&self, a: f64, b: f64) -> Option<&Edge> {
        self.edges.get(&edge_key(a, b))
    }

    pub fn clear_edges(&mut self) {
        self.edges.clear();
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Nodes in ascending frequency.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Edges ordered by `(source, target)`.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_frequencies(&self) -> Vec<f64> {
        self.nodes.values().map(|n| n.frequency).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_absorb_float_noise() {
        assert_eq!(FreqKey::from_hz(100.0), FreqKey::from_hz(100.0 + 1e-9));
        assert_ne!(FreqKey::from_hz(100.0), FreqKey::from_hz(100.01));
    }

    #[test]
    fn edges_are_unordered_and_ratio_is_target_over_source() {
        let mut g = HarmonicGraph::new();
        g.upsert_node(200.0, -3.0);
        g.upsert_node(100.0, -1.0);
        let e = g.add_edge(200.0, 100.0, EdgeColor::Red);
        assert_eq!((e.source, e.target, e.ratio), (100.0, 200.0, 2.0));
        assert!(g.has_edge(100.0, 200.0));
        assert!(g.has_edge(200.0, 100.0));
        assert_eq!(g.node_frequencies(), vec![100.0, 200.0]);
    }

    #[test]
    fn removing_a_node_drops_incident_edges() {
        let mut g = HarmonicGraph::new();
        for f in [50.0, 100.0, 150.0] {
            g.upsert_node(f, 0.0);
        }
        g.add_edge(50.0, 100.0, EdgeColor::Red);
        g.add_edge(100.0, 150.0, EdgeColor::Green);
        g.add_edge(50.0, 150.0, EdgeColor::Purple);
        assert_eq!(g.remove_node(100.0), Some(2));
        assert_eq!(g.edge_count(), 1);
        let survivor = g.edge(50.0, 150.0).unwrap();
        assert!(survivor.touches(FreqKey::from_hz(150.0)));
        assert!(!survivor.touches(FreqKey::from_hz(100.0)));
        assert_eq!(g.remove_node(100.0), None);
    }

    #[test]
    fn upsert_updates_power_in_place() {
        let mut g = HarmonicGraph::new();
        g.upsert_node(440.0, 1.0);
        g.upsert_node(440.0, 2.0);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.nodes().next().map(|n| n.power), Some(2.0));
    }
}
