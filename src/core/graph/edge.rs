//! Edge handles.

use core::fmt;

use super::digraph::{adjacency_list, EdgeSlot, EDGE_LIST_GRAPH};
use super::{DiGraph, GraphDir, GraphId, GraphUid, NodePtr};
use crate::core::storage::SlabPtr;

/// A handle of an edge in a [`DiGraph`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgePtr {
    graph: GraphId,
    uid: GraphUid,
    raw: u32,
}

impl EdgePtr {
    pub(super) fn new<N, E>(graph: GraphId, uid: GraphUid, slot: EdgeSlot<N, E>) -> Self {
        Self {
            graph,
            uid,
            raw: slot.raw(),
        }
    }

    /// The id recorded when the handle was issued.
    pub(super) fn uid(self) -> GraphUid { self.uid }

    pub(super) fn slot<N, E>(self) -> EdgeSlot<N, E> { SlabPtr::from_raw(self.raw) }

    /// The graph the edge belongs to.
    pub fn graph(self) -> GraphId { self.graph }

    /// The unique id of the edge.
    pub fn id<N, E>(self, g: &DiGraph<N, E>) -> GraphUid { g.edge_record(self).id }

    /// The predecessor, i.e. the source of the edge.
    pub fn pred<N, E>(self, g: &DiGraph<N, E>) -> NodePtr { self.node(g, GraphDir::Up) }

    /// The successor, i.e. the target of the edge.
    pub fn succ<N, E>(self, g: &DiGraph<N, E>) -> NodePtr { self.node(g, GraphDir::Down) }

    /// The end of the edge in direction `dir`.
    pub fn node<N, E>(self, g: &DiGraph<N, E>, dir: GraphDir) -> NodePtr {
        g.node_ptr(g.edge_record(self).nodes[dir.index()])
    }

    /// The next edge in the edge list of the graph.
    pub fn next_edge<N, E>(self, g: &DiGraph<N, E>) -> Option<EdgePtr> {
        self.next_in_list(g, EDGE_LIST_GRAPH)
    }

    /// The previous edge in the edge list of the graph.
    pub fn prev_edge<N, E>(self, g: &DiGraph<N, E>) -> Option<EdgePtr> {
        g.edge_record(self)
            .links
            .prev(EDGE_LIST_GRAPH)
            .map(|slot| g.edge_ptr(slot))
    }

    /// The next outgoing edge of the predecessor.
    pub fn next_succ<N, E>(self, g: &DiGraph<N, E>) -> Option<EdgePtr> {
        self.next_edge_in_dir(g, GraphDir::Down)
    }

    /// The next incoming edge of the successor.
    pub fn next_pred<N, E>(self, g: &DiGraph<N, E>) -> Option<EdgePtr> {
        self.next_edge_in_dir(g, GraphDir::Up)
    }

    /// The next edge in the `dir` list the edge is linked in, i.e. the list
    /// of its `dir.rev()` end.
    pub fn next_edge_in_dir<N, E>(self, g: &DiGraph<N, E>, dir: GraphDir) -> Option<EdgePtr> {
        self.next_in_list(g, adjacency_list(dir))
    }

    /// Split the edge with a new node, see [`DiGraph::insert_node`].
    pub fn insert_node<N, E>(self, g: &mut DiGraph<N, E>, node_data: N, edge_data: E) -> NodePtr {
        g.insert_node(self, node_data, edge_data)
    }

    fn next_in_list<N, E>(self, g: &DiGraph<N, E>, list: usize) -> Option<EdgePtr> {
        g.edge_record(self)
            .links
            .next(list)
            .map(|slot| g.edge_ptr(slot))
    }
}

impl fmt::Debug for EdgePtr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let slot: EdgeSlot<(), ()> = self.slot();
        write!(f, "{}/edge{}", self.graph, slot)
    }
}
