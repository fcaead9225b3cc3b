//! Graph Data Structure
//!
//! The capability traits ([`Graph`], [`Preds`], [`Succs`], [`Edges`],
//! [`Adjacent`]) describe what an algorithm needs from a graph, and
//! [`DiGraph`] is the intrusive directed graph implementing them.

use core::fmt;
use core::hash::Hash;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;

mod digraph;
mod edge;
pub mod iter;
mod node;
mod tagged;

pub use digraph::{DiGraph, EdgeData, GraphConfig, GraphId, GraphUid, NodeData};
pub use edge::EdgePtr;
pub use node::NodePtr;
pub use tagged::Tagged;

/// A graph.
pub trait Graph {
    /// The type of nodes in the graph.
    ///
    /// Nodes should just be a lightweight handle/key to the actual data.
    /// Typically, the node is an [`ArenaPtr`](crate::core::storage::ArenaPtr)
    /// or a handle wrapping one, like [`NodePtr`].
    type Node: Copy + Eq + Hash;

    /// Check if the graph is empty.
    fn is_empty(&self) -> bool;
}

/// A directed graph with predecessors (incoming edges).
pub trait Preds: Graph {
    /// Get an iterator over the predecessors of a node.
    fn preds(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node>;
}

/// A directed graph with successors (outgoing edges).
pub trait Succs: Graph {
    /// Get an iterator over the successors of a node.
    fn succs(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node>;
}

/// A graph with edges.
pub trait Edges: Graph {
    /// The type of edge data.
    type Edge;

    /// Get the edge data between two nodes.
    ///
    /// There can be multiple edges between two nodes, so this method returns an
    /// iterator.
    fn edges(&self, src: Self::Node, dst: Self::Node) -> impl IntoIterator<Item = &Self::Edge>;
}

/// A graph that can iterate over all adjacent nodes, typically used for
/// undirected graphs.
pub trait Adjacent: Graph {
    /// Get an iterator over all adjacent nodes of a node.
    fn adjacent(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node>;
}

/// The direction of an edge end.
///
/// [`Up`](GraphDir::Up) is the predecessor end and
/// [`Down`](GraphDir::Down) is the successor end. The list of edges of a node
/// in direction `dir` holds the edges whose `dir.rev()` end is the node, e.g.
/// the `Up` list of a node holds its incoming edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphDir {
    /// Towards the predecessor.
    Up,
    /// Towards the successor.
    Down,
}

impl GraphDir {
    /// Both directions.
    pub const ALL: [GraphDir; 2] = [GraphDir::Up, GraphDir::Down];

    /// The reversed direction.
    pub fn rev(self) -> Self {
        match self {
            GraphDir::Up => GraphDir::Down,
            GraphDir::Down => GraphDir::Up,
        }
    }

    /// The index of the direction, used for per-direction storage.
    pub fn index(self) -> usize {
        match self {
            GraphDir::Up => 0,
            GraphDir::Down => 1,
        }
    }
}

impl fmt::Display for GraphDir {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GraphDir::Up => write!(f, "up"),
            GraphDir::Down => write!(f, "down"),
        }
    }
}
