//! Covering reachability for networks of timed automata: waiting
//! containers, the covering visited index, the zone graph and the search.

pub mod covreach;
pub mod graph;
pub mod state;
pub mod stats;
pub mod waiting;
pub mod zg;

pub use covreach::{
    Covreach, CovreachConfig, CovreachError, CovreachReport, CovreachResult, SearchOrder, Verdict,
};
pub use graph::{CoverGraph, EdgeKind, ExploredGraph, GraphEdge, GraphNode, InsertOutcome};
pub use state::{DiscreteState, Node};
pub use stats::Stats;
pub use waiting::{Fifo, Filter, Lifo, Waiting};
pub use zg::{AcceptingLabels, ZoneGraph};
