//! Fuzzing Facilities for Graphs.
//!
//! A fuzz input is decoded into a sequence of [`GraphOp`]s, which is applied
//! to a [`DiGraph`] and to a plain model of it side by side. After every
//! operation the structure of the graph is verified and compared against the
//! model.

use alloc::vec::Vec;

use libfuzzer_sys::arbitrary::{self, Unstructured};

use super::{DiGraph, EdgePtr, NodePtr, Tagged};
use crate::core::marker::{Marker, MarkerHost, MAX_MARKERS};
use crate::HashSet;

/// An operation on a graph.
///
/// The operands are indices into the live entities of the model, taken
/// modulo their number. Operations on an empty set are skipped.
#[derive(Debug, Clone, Copy)]
pub enum GraphOp {
    /// Create a node.
    NewNode,
    /// Create an edge between two nodes.
    NewEdge(usize, usize),
    /// Delete a node and its edges.
    DeleteNode(usize),
    /// Delete an edge.
    DeleteEdge(usize),
    /// Split an edge with a new node.
    InsertNode(usize),
    /// Retarget the predecessor of an edge.
    SetPred(usize, usize),
    /// Retarget the successor of an edge.
    SetSucc(usize, usize),
    /// Grant a marker.
    NewMarker,
    /// Free a marker.
    FreeMarker(usize),
    /// Mark a node.
    Mark(usize, usize),
    /// Unmark a node.
    Unmark(usize, usize),
}

/// Generate an arbitrary sequence of operations for fuzzing.
///
/// # Parameters
///
/// - `u`: The unstructured fuzzer input.
/// - `with_markers`: Whether to generate marker operations.
pub fn arbitrary_ops(u: &mut Unstructured, with_markers: bool) -> arbitrary::Result<Vec<GraphOp>> {
    let count = u.int_in_range(0..=1023)?;
    let max_kind = if with_markers { 10 } else { 6 };

    let mut ops = Vec::with_capacity(count);
    for _ in 0..count {
        let a = u.arbitrary::<u16>()? as usize;
        let b = u.arbitrary::<u16>()? as usize;
        let op = match u.int_in_range(0..=max_kind)? {
            0 => GraphOp::NewNode,
            1 => GraphOp::NewEdge(a, b),
            2 => GraphOp::DeleteNode(a),
            3 => GraphOp::DeleteEdge(a),
            4 => GraphOp::InsertNode(a),
            5 => GraphOp::SetPred(a, b),
            6 => GraphOp::SetSucc(a, b),
            7 => GraphOp::NewMarker,
            8 => GraphOp::FreeMarker(a),
            9 => GraphOp::Mark(a, b),
            _ => GraphOp::Unmark(a, b),
        };
        ops.push(op);
    }

    Ok(ops)
}

/// The plain model of a graph.
#[derive(Default)]
struct Model {
    nodes: Vec<NodePtr>,
    /// `(edge, pred, succ)`
    edges: Vec<(EdgePtr, NodePtr, NodePtr)>,
    markers: Vec<Marker>,
    marked: HashSet<(Marker, NodePtr)>,
}

impl Model {
    fn node(&self, i: usize) -> Option<NodePtr> {
        (!self.nodes.is_empty()).then(|| self.nodes[i % self.nodes.len()])
    }

    fn edge_index(&self, i: usize) -> Option<usize> {
        (!self.edges.is_empty()).then(|| i % self.edges.len())
    }

    fn marker(&self, i: usize) -> Option<Marker> {
        (!self.markers.is_empty()).then(|| self.markers[i % self.markers.len()])
    }
}

/// Apply the operations to a graph and check it against the model after every
/// step.
pub fn check_ops(ops: &[GraphOp]) {
    let mut g = DiGraph::<u64, u64>::new();
    let mut model = Model::default();

    for &op in ops {
        apply(&mut g, &mut model, op);
        g.verify();
        check_model(&g, &model);
    }

    for marker in model.markers.drain(..) {
        g.free_marker(marker);
    }
}

fn apply(g: &mut DiGraph<u64, u64>, model: &mut Model, op: GraphOp) {
    match op {
        GraphOp::NewNode => {
            let node = g.new_node(model.nodes.len() as u64);
            model.nodes.push(node);
        }
        GraphOp::NewEdge(pred, succ) => {
            if let (Some(pred), Some(succ)) = (model.node(pred), model.node(succ)) {
                let edge = g.new_edge(pred, succ, model.edges.len() as u64);
                model.edges.push((edge, pred, succ));
            }
        }
        GraphOp::DeleteNode(i) => {
            if let Some(node) = model.node(i) {
                g.delete_node(node);
                model.nodes.retain(|&n| n != node);
                model
                    .edges
                    .retain(|&(_, pred, succ)| pred != node && succ != node);
                model.marked.retain(|&(_, n)| n != node);
            }
        }
        GraphOp::DeleteEdge(i) => {
            if let Some(i) = model.edge_index(i) {
                let (edge, ..) = model.edges.swap_remove(i);
                g.delete_edge(edge);
            }
        }
        GraphOp::InsertNode(i) => {
            if let Some(i) = model.edge_index(i) {
                let (edge, pred, succ) = model.edges[i];
                let node = g.insert_node(edge, 0, 0);
                let tail = node.first_succ(g).expect("inserted node has an outgoing edge");
                model.nodes.push(node);
                model.edges[i] = (edge, pred, node);
                model.edges.push((tail, node, succ));
            }
        }
        GraphOp::SetPred(i, n) => {
            if let (Some(i), Some(node)) = (model.edge_index(i), model.node(n)) {
                g.set_pred(model.edges[i].0, node);
                model.edges[i].1 = node;
            }
        }
        GraphOp::SetSucc(i, n) => {
            if let (Some(i), Some(node)) = (model.edge_index(i), model.node(n)) {
                g.set_succ(model.edges[i].0, node);
                model.edges[i].2 = node;
            }
        }
        GraphOp::NewMarker => match g.new_marker() {
            Ok(marker) => model.markers.push(marker),
            Err(_) => assert_eq!(model.markers.len(), MAX_MARKERS),
        },
        GraphOp::FreeMarker(i) => {
            if let Some(marker) = model.marker(i) {
                g.free_marker(marker);
                model.markers.retain(|&m| m != marker);
                model.marked.retain(|&(m, _)| m != marker);
            }
        }
        GraphOp::Mark(i, n) => {
            if let (Some(marker), Some(node)) = (model.marker(i), model.node(n)) {
                assert_eq!(node.mark(g, marker), model.marked.insert((marker, node)));
            }
        }
        GraphOp::Unmark(i, n) => {
            if let (Some(marker), Some(node)) = (model.marker(i), model.node(n)) {
                assert_eq!(
                    node.unmark(g, marker),
                    model.marked.remove(&(marker, node))
                );
            }
        }
    }
}

fn check_model(g: &DiGraph<u64, u64>, model: &Model) {
    assert_eq!(g.num_nodes(), model.nodes.len());
    assert_eq!(g.num_edges(), model.edges.len());

    for &(edge, pred, succ) in &model.edges {
        assert_eq!(edge.pred(g), pred);
        assert_eq!(edge.succ(g), succ);
    }

    for &node in &model.nodes {
        let succs = model.edges.iter().filter(|e| e.1 == node).count();
        let preds = model.edges.iter().filter(|e| e.2 == node).count();
        assert_eq!(node.succs(g).count(), succs);
        assert_eq!(node.preds(g).count(), preds);
        assert_eq!(node.edges(g).count(), succs + preds);

        for &marker in &model.markers {
            assert_eq!(
                node.is_marked(g, marker),
                model.marked.contains(&(marker, node))
            );
        }
    }
}
