//! Direction-aware Edge Iteration
//!
//! An [`EdgeCursor`] walks the edges of one node. The walk is selected by a
//! type implementing [`EdgeWalk`]:
//!
//! - [`PredWalk`]: incoming edges ([`PredCursor`]).
//! - [`SuccWalk`]: outgoing edges ([`SuccCursor`]).
//! - [`UndirWalk`]: incoming edges, then outgoing edges
//!   ([`EdgeCursorUndir`]).
//!
//! The default cursor is the end of every walk, so a cursor can be compared
//! against `node.succs_end()` and friends. Cursors are detached from the
//! graph and have to be given the graph on every move. For `for` loops,
//! [`EdgeCursor::iter`] turns a cursor into an [`Iterator`].

use core::fmt;

use super::{DiGraph, EdgePtr, NodePtr};

/// A strategy of walking the edges of a node.
pub trait EdgeWalk: Copy + Default + Eq + fmt::Debug {
    /// The first position of the walk.
    fn start<N, E>(g: &DiGraph<N, E>, node: NodePtr) -> (Option<EdgePtr>, Self);

    /// The position after `edge`.
    fn step<N, E>(self, g: &DiGraph<N, E>, edge: EdgePtr) -> (Option<EdgePtr>, Self);

    /// The node on the other side of `edge`, as seen from the walked node.
    fn neighbour<N, E>(self, g: &DiGraph<N, E>, edge: EdgePtr) -> NodePtr;
}

/// Walk over the incoming edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredWalk;

impl EdgeWalk for PredWalk {
    fn start<N, E>(g: &DiGraph<N, E>, node: NodePtr) -> (Option<EdgePtr>, Self) {
        (node.first_pred(g), PredWalk)
    }

    fn step<N, E>(self, g: &DiGraph<N, E>, edge: EdgePtr) -> (Option<EdgePtr>, Self) {
        (edge.next_pred(g), self)
    }

    fn neighbour<N, E>(self, g: &DiGraph<N, E>, edge: EdgePtr) -> NodePtr { edge.pred(g) }
}

/// Walk over the outgoing edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuccWalk;

impl EdgeWalk for SuccWalk {
    fn start<N, E>(g: &DiGraph<N, E>, node: NodePtr) -> (Option<EdgePtr>, Self) {
        (node.first_succ(g), SuccWalk)
    }

    fn step<N, E>(self, g: &DiGraph<N, E>, edge: EdgePtr) -> (Option<EdgePtr>, Self) {
        (edge.next_succ(g), self)
    }

    fn neighbour<N, E>(self, g: &DiGraph<N, E>, edge: EdgePtr) -> NodePtr { edge.succ(g) }
}

/// Walk over the incoming edges, then the outgoing edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UndirWalk {
    /// Whether the walk is still in the incoming edges.
    in_preds: bool,
}

impl UndirWalk {
    /// Check if the walk is in the incoming half.
    pub fn in_preds(self) -> bool { self.in_preds }
}

impl EdgeWalk for UndirWalk {
    fn start<N, E>(g: &DiGraph<N, E>, node: NodePtr) -> (Option<EdgePtr>, Self) {
        match node.first_pred(g) {
            Some(edge) => (Some(edge), UndirWalk { in_preds: true }),
            None => (node.first_succ(g), UndirWalk { in_preds: false }),
        }
    }

    fn step<N, E>(self, g: &DiGraph<N, E>, edge: EdgePtr) -> (Option<EdgePtr>, Self) {
        if !self.in_preds {
            return (edge.next_succ(g), self);
        }
        match edge.next_pred(g) {
            Some(next) => (Some(next), self),
            // the successor of an incoming edge is the walked node
            None => (edge.succ(g).first_succ(g), UndirWalk { in_preds: false }),
        }
    }

    fn neighbour<N, E>(self, g: &DiGraph<N, E>, edge: EdgePtr) -> NodePtr {
        if self.in_preds {
            edge.pred(g)
        } else {
            edge.succ(g)
        }
    }
}

/// A cursor over the edges of a node.
///
/// Two cursors are equal if they are at the same edge (and, for
/// [`UndirWalk`], in the same half of the walk). All cursors at the end are
/// equal to [`EdgeCursor::end`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeCursor<W: EdgeWalk> {
    edge: Option<EdgePtr>,
    walk: W,
}

/// A cursor over the incoming edges of a node.
pub type PredCursor = EdgeCursor<PredWalk>;

/// A cursor over the outgoing edges of a node.
pub type SuccCursor = EdgeCursor<SuccWalk>;

/// A cursor over all edges of a node, incoming edges first.
pub type EdgeCursorUndir = EdgeCursor<UndirWalk>;

impl<W: EdgeWalk> EdgeCursor<W> {
    /// A cursor at the first edge of `node`.
    pub fn new<N, E>(g: &DiGraph<N, E>, node: NodePtr) -> Self {
        let (edge, walk) = W::start(g, node);
        let cursor = Self { edge, walk };
        if cursor.edge.is_none() {
            Self::end()
        } else {
            cursor
        }
    }

    /// The end cursor.
    pub fn end() -> Self { Self::default() }

    /// Check if the cursor is at the end.
    pub fn is_end(&self) -> bool { self.edge.is_none() }

    /// The current edge.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is at the end.
    pub fn edge(&self) -> EdgePtr {
        self.edge
            .unwrap_or_else(|| panic!("dereferencing an end edge cursor"))
    }

    /// The current edge, [`None`] at the end.
    pub fn try_edge(&self) -> Option<EdgePtr> { self.edge }

    /// The node on the other side of the current edge.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is at the end.
    pub fn node<N, E>(&self, g: &DiGraph<N, E>) -> NodePtr { self.walk.neighbour(g, self.edge()) }

    /// The walk state of the cursor.
    pub fn walk(&self) -> W { self.walk }

    /// Move to the next edge.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is at the end.
    pub fn advance<N, E>(&mut self, g: &DiGraph<N, E>) -> &mut Self {
        let edge = self
            .edge
            .unwrap_or_else(|| panic!("advancing an end edge cursor"));
        let (next, walk) = self.walk.step(g, edge);
        *self = match next {
            Some(_) => Self { edge: next, walk },
            None => Self::end(),
        };
        self
    }

    /// Move to the next edge and return the cursor before the move.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is at the end.
    pub fn post_advance<N, E>(&mut self, g: &DiGraph<N, E>) -> Self {
        let old = *self;
        self.advance(g);
        old
    }

    /// Turn the cursor into an iterator over the remaining edges.
    pub fn iter<N, E>(self, g: &DiGraph<N, E>) -> EdgeIter<'_, W, N, E> {
        EdgeIter {
            graph: g,
            cursor: self,
        }
    }
}

/// An iterator over the edges of a node.
pub struct EdgeIter<'g, W: EdgeWalk, N, E> {
    graph: &'g DiGraph<N, E>,
    cursor: EdgeCursor<W>,
}

impl<'g, W: EdgeWalk, N, E> EdgeIter<'g, W, N, E> {
    /// The cursor at the next edge to yield.
    pub fn cursor(&self) -> EdgeCursor<W> { self.cursor }
}

impl<'g, W: EdgeWalk, N, E> Iterator for EdgeIter<'g, W, N, E> {
    type Item = EdgePtr;

    fn next(&mut self) -> Option<EdgePtr> {
        if self.cursor.is_end() {
            return None;
        }
        Some(self.cursor.post_advance(self.graph).edge())
    }
}

/// An iterator over the nodes of a graph, in list order.
pub struct NodeListIter<'g, N, E> {
    graph: &'g DiGraph<N, E>,
    next: Option<NodePtr>,
}

impl<'g, N, E> NodeListIter<'g, N, E> {
    pub(super) fn new(graph: &'g DiGraph<N, E>, first: Option<NodePtr>) -> Self {
        Self { graph, next: first }
    }
}

impl<'g, N, E> Iterator for NodeListIter<'g, N, E> {
    type Item = NodePtr;

    fn next(&mut self) -> Option<NodePtr> {
        let node = self.next?;
        self.next = node.next_node(self.graph);
        Some(node)
    }
}

/// An iterator over the edges of a graph, in list order.
pub struct EdgeListIter<'g, N, E> {
    graph: &'g DiGraph<N, E>,
    next: Option<EdgePtr>,
}

impl<'g, N, E> EdgeListIter<'g, N, E> {
    pub(super) fn new(graph: &'g DiGraph<N, E>, first: Option<EdgePtr>) -> Self {
        Self { graph, next: first }
    }
}

impl<'g, N, E> Iterator for EdgeListIter<'g, N, E> {
    type Item = EdgePtr;

    fn next(&mut self) -> Option<EdgePtr> {
        let edge = self.next?;
        self.next = edge.next_edge(self.graph);
        Some(edge)
    }
}
