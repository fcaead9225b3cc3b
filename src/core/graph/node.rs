//! Node handles.

use core::fmt;

use super::digraph::{NodeSlot, NODE_LIST_GRAPH};
use super::iter::{EdgeCursorUndir, EdgeIter, PredCursor, PredWalk, SuccCursor, SuccWalk, UndirWalk};
use super::{DiGraph, EdgePtr, GraphDir, GraphId, GraphUid};
use crate::core::storage::SlabPtr;

/// A handle of a node in a [`DiGraph`].
///
/// The handle is a plain copyable value. It is only meaningful together with
/// the graph that created it, and all accessors take that graph. It also
/// records the id of the node, so a handle outliving its node is rejected
/// even after the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePtr {
    graph: GraphId,
    uid: GraphUid,
    raw: u32,
}

impl NodePtr {
    pub(super) fn new<N, E>(graph: GraphId, uid: GraphUid, slot: NodeSlot<N, E>) -> Self {
        Self {
            graph,
            uid,
            raw: slot.raw(),
        }
    }

    /// The id recorded when the handle was issued.
    pub(super) fn uid(self) -> GraphUid { self.uid }

    pub(super) fn slot<N, E>(self) -> NodeSlot<N, E> { SlabPtr::from_raw(self.raw) }

    /// The graph the node belongs to.
    pub fn graph(self) -> GraphId { self.graph }

    /// The unique id of the node.
    pub fn id<N, E>(self, g: &DiGraph<N, E>) -> GraphUid { g.node_record(self).id }

    /// The most recently attached outgoing edge.
    pub fn first_succ<N, E>(self, g: &DiGraph<N, E>) -> Option<EdgePtr> {
        self.first_edge_in_dir(g, GraphDir::Down)
    }

    /// The most recently attached incoming edge.
    pub fn first_pred<N, E>(self, g: &DiGraph<N, E>) -> Option<EdgePtr> {
        self.first_edge_in_dir(g, GraphDir::Up)
    }

    /// The first edge in direction `dir`: incoming for
    /// [`Up`](GraphDir::Up), outgoing for [`Down`](GraphDir::Down).
    pub fn first_edge_in_dir<N, E>(self, g: &DiGraph<N, E>, dir: GraphDir) -> Option<EdgePtr> {
        g.node_record(self).first_edge[dir.index()]
            .unpack()
            .map(|slot| g.edge_ptr(slot))
    }

    /// The next node in the node list of the graph.
    pub fn next_node<N, E>(self, g: &DiGraph<N, E>) -> Option<NodePtr> {
        g.node_record(self)
            .links
            .next(NODE_LIST_GRAPH)
            .map(|slot| g.node_ptr(slot))
    }

    /// The previous node in the node list of the graph.
    pub fn prev_node<N, E>(self, g: &DiGraph<N, E>) -> Option<NodePtr> {
        g.node_record(self)
            .links
            .prev(NODE_LIST_GRAPH)
            .map(|slot| g.node_ptr(slot))
    }

    /// A cursor at the first outgoing edge.
    pub fn succs_begin<N, E>(self, g: &DiGraph<N, E>) -> SuccCursor { SuccCursor::new(g, self) }

    /// The end of the outgoing edges.
    pub fn succs_end(self) -> SuccCursor { SuccCursor::end() }

    /// A cursor at the first incoming edge.
    pub fn preds_begin<N, E>(self, g: &DiGraph<N, E>) -> PredCursor { PredCursor::new(g, self) }

    /// The end of the incoming edges.
    pub fn preds_end(self) -> PredCursor { PredCursor::end() }

    /// A cursor at the first incident edge, incoming edges come first.
    pub fn edges_begin<N, E>(self, g: &DiGraph<N, E>) -> EdgeCursorUndir {
        EdgeCursorUndir::new(g, self)
    }

    /// The end of the incident edges.
    pub fn edges_end(self) -> EdgeCursorUndir { EdgeCursorUndir::end() }

    /// Iterate over the outgoing edges.
    pub fn succs<N, E>(self, g: &DiGraph<N, E>) -> EdgeIter<'_, SuccWalk, N, E> {
        self.succs_begin(g).iter(g)
    }

    /// Iterate over the incoming edges.
    pub fn preds<N, E>(self, g: &DiGraph<N, E>) -> EdgeIter<'_, PredWalk, N, E> {
        self.preds_begin(g).iter(g)
    }

    /// Iterate over all incident edges, incoming edges first.
    ///
    /// A self-loop is visited twice, once from each end.
    pub fn edges<N, E>(self, g: &DiGraph<N, E>) -> EdgeIter<'_, UndirWalk, N, E> {
        self.edges_begin(g).iter(g)
    }
}

impl fmt::Debug for NodePtr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let slot: NodeSlot<(), ()> = self.slot();
        write!(f, "{}/node{}", self.graph, slot)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::core::graph::{DiGraph, GraphDir};

    #[test]
    fn test_first_edge_in_dir() {
        let mut g = DiGraph::<(), ()>::new();
        let a = g.new_node(());
        let b = g.new_node(());
        let e1 = g.new_edge(a, b, ());
        let e2 = g.new_edge(a, b, ());
        assert_eq!(a.first_edge_in_dir(&g, GraphDir::Down), Some(e2));
        assert_eq!(a.first_edge_in_dir(&g, GraphDir::Up), None);
        assert_eq!(b.first_edge_in_dir(&g, GraphDir::Up), Some(e2));
        assert_eq!(a.succs(&g).collect::<Vec<_>>(), vec![e2, e1]);
        assert_eq!(b.preds(&g).collect::<Vec<_>>(), vec![e2, e1]);
    }

    #[test]
    fn test_node_list() {
        let mut g = DiGraph::<(), ()>::new();
        let nodes = (0..4).map(|_| g.new_node(())).collect::<Vec<_>>();
        g.delete_node(nodes[2]);
        assert_eq!(g.nodes().collect::<Vec<_>>(), vec![nodes[3], nodes[1], nodes[0]]);
        assert_eq!(nodes[3].next_node(&g), Some(nodes[1]));
        assert_eq!(nodes[1].prev_node(&g), Some(nodes[3]));
        assert_eq!(nodes[0].next_node(&g), None);
        assert_eq!(nodes[3].prev_node(&g), None);
    }

    #[test]
    fn test_debug_format() {
        let mut g = DiGraph::<(), ()>::new();
        let a = g.new_node(());
        assert_eq!(format!("{:?}", a), format!("{}/node*0:0", g.id()));
    }
}
