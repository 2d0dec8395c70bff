//! Interactive harmonic graph: click/key commands in, nodes and ratio pairs
//! out.
//!
//! ```text
//!   front end (egui plot, replayed document events, tests)
//!     │  Command
//!     ▼
//!   ┌────────────────────┐   click  → single / double / triple
//!   │ HarmonicGraphEngine │   graph  → nodes keyed by FreqKey, sorted-pair edges
//!   └────────────────────┘
//!     │  GraphSnapshot / PairsExport
//!     ▼
//!   renderer, export
//! ```

pub mod click;
pub mod engine;
pub mod graph;
pub mod snapshot;

pub use click::{Button, ClickClassifier, ClickKind};
pub use engine::{Command, Diagnostic, HarmonicGraphEngine, Outcome, RatioMatrix};
pub use graph::{Edge, FreqKey, HarmonicGraph, Node};
pub use snapshot::{GraphExport, GraphSnapshot, Pair, PairRecord, PairsExport, SessionSnapshot};
