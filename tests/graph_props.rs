use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use scl_graph::core::graph::{DiGraph, EdgePtr, GraphConfig, NodePtr};
use scl_graph::core::storage::{PoolObject, SlabPool, SlabPtr};

#[derive(Debug, Clone)]
enum Op {
    NewNode,
    NewEdge(usize, usize),
    DeleteNode(usize),
    DeleteEdge(usize),
    InsertNode(usize),
    SetPred(usize, usize),
    SetSucc(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::NewNode),
        4 => (any::<usize>(), any::<usize>()).prop_map(|(p, s)| Op::NewEdge(p, s)),
        1 => any::<usize>().prop_map(Op::DeleteNode),
        1 => any::<usize>().prop_map(Op::DeleteEdge),
        1 => any::<usize>().prop_map(Op::InsertNode),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(e, n)| Op::SetPred(e, n)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(e, n)| Op::SetSucc(e, n)),
    ]
}

/// Nodes and `(edge, pred, succ)` triples the graph should contain.
#[derive(Default)]
struct Model {
    nodes: Vec<NodePtr>,
    edges: Vec<(EdgePtr, NodePtr, NodePtr)>,
}

impl Model {
    fn node(&self, i: usize) -> Option<NodePtr> {
        (!self.nodes.is_empty()).then(|| self.nodes[i % self.nodes.len()])
    }

    fn edge(&self, i: usize) -> Option<usize> {
        (!self.edges.is_empty()).then(|| i % self.edges.len())
    }

    fn apply(&mut self, g: &mut DiGraph<usize, usize>, op: Op) {
        match op {
            Op::NewNode => self.nodes.push(g.new_node(self.nodes.len())),
            Op::NewEdge(p, s) => {
                if let (Some(p), Some(s)) = (self.node(p), self.node(s)) {
                    let e = g.new_edge(p, s, self.edges.len());
                    self.edges.push((e, p, s));
                }
            }
            Op::DeleteNode(i) => {
                if let Some(n) = self.node(i) {
                    g.delete_node(n);
                    self.nodes.retain(|&m| m != n);
                    self.edges.retain(|&(_, p, s)| p != n && s != n);
                }
            }
            Op::DeleteEdge(i) => {
                if let Some(i) = self.edge(i) {
                    let (e, ..) = self.edges.remove(i);
                    g.delete_edge(e);
                }
            }
            Op::InsertNode(i) => {
                if let Some(i) = self.edge(i) {
                    let (e, p, s) = self.edges[i];
                    let b = g.insert_node(e, 0, 0);
                    let tail = b.first_succ(g).unwrap();
                    self.nodes.push(b);
                    self.edges[i] = (e, p, b);
                    self.edges.push((tail, b, s));
                }
            }
            Op::SetPred(i, n) => {
                if let (Some(i), Some(n)) = (self.edge(i), self.node(n)) {
                    g.set_pred(self.edges[i].0, n);
                    self.edges[i].1 = n;
                }
            }
            Op::SetSucc(i, n) => {
                if let (Some(i), Some(n)) = (self.edge(i), self.node(n)) {
                    g.set_succ(self.edges[i].0, n);
                    self.edges[i].2 = n;
                }
            }
        }
    }
}

struct Counted {
    _this: SlabPtr<Counted>,
    drops: Rc<Cell<usize>>,
}

impl PoolObject for Counted {
    type Args = Rc<Cell<usize>>;

    fn construct(ptr: SlabPtr<Self>, drops: Self::Args) -> Self { Self { _this: ptr, drops } }
}

impl Drop for Counted {
    fn drop(&mut self) { self.drops.set(self.drops.get() + 1); }
}

proptest! {
    #[test]
    fn test_graph_matches_model(
        ops in prop::collection::vec(op(), 0..200),
        node_chunk_capacity in 1u8..=8,
        edge_chunk_capacity in 1u8..=8
    ) {
        let mut g = DiGraph::with_config(GraphConfig {
            node_chunk_capacity,
            edge_chunk_capacity,
        });
        let mut model = Model::default();

        for op in ops {
            model.apply(&mut g, op);
            g.verify();
        }

        prop_assert_eq!(g.num_nodes(), model.nodes.len());
        prop_assert_eq!(g.num_edges(), model.edges.len());
        for &(e, p, s) in &model.edges {
            prop_assert_eq!(e.pred(&g), p);
            prop_assert_eq!(e.succ(&g), s);
        }
        for &n in &model.nodes {
            let succs = model.edges.iter().filter(|e| e.1 == n).count();
            let preds = model.edges.iter().filter(|e| e.2 == n).count();
            prop_assert_eq!(n.succs(&g).count(), succs);
            prop_assert_eq!(n.preds(&g).count(), preds);
        }
        prop_assert_eq!(g.node_pool_stats().live, model.nodes.len());
        prop_assert_eq!(g.edge_pool_stats().live, model.edges.len());
    }

    #[test]
    fn test_undirected_walk_is_preds_then_succs(
        edges in prop::collection::vec((0usize..6, 0usize..6), 0..30)
    ) {
        let mut g = DiGraph::<(), ()>::new();
        let nodes = (0..6).map(|_| g.new_node(())).collect::<Vec<_>>();
        for (p, s) in edges {
            g.new_edge(nodes[p], nodes[s], ());
        }

        for &n in &nodes {
            let expected = n.preds(&g).chain(n.succs(&g)).collect::<Vec<_>>();
            prop_assert_eq!(n.edges(&g).collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn test_pool_round_trip(
        order in Just((0..100usize).collect::<Vec<_>>()).prop_shuffle(),
        capacity in 1u8..=255
    ) {
        let drops = Rc::new(Cell::new(0));
        let mut pool = SlabPool::<Counted>::with_chunk_capacity(capacity);
        let ptrs = (0..order.len())
            .map(|_| pool.construct(drops.clone()))
            .collect::<Vec<_>>();
        prop_assert_eq!(pool.len(), ptrs.len());

        for i in order {
            pool.destroy(ptrs[i]);
        }
        prop_assert_eq!(drops.get(), ptrs.len());
        prop_assert!(pool.is_empty());
        // emptied chunks are kept for reuse
        prop_assert_eq!(pool.num_chunks(), pool.num_free_chunks());
    }
}

#[test]
fn test_path_iteration() {
    let mut g = DiGraph::<(), ()>::new();
    let n1 = g.new_node(());
    let n2 = g.new_node(());
    let n3 = g.new_node(());
    let e1 = g.new_edge(n1, n2, ());
    let e2 = g.new_edge(n2, n3, ());

    assert_eq!(n1.succs(&g).collect::<Vec<_>>(), vec![e1]);
    assert_eq!(n2.preds(&g).collect::<Vec<_>>(), vec![e1]);
    assert_eq!(n2.succs(&g).collect::<Vec<_>>(), vec![e2]);
    assert_eq!(n2.edges(&g).collect::<Vec<_>>(), vec![e1, e2]);

    let mut cursor = n2.edges_begin(&g);
    let mut neighbours = Vec::new();
    while cursor != n2.edges_end() {
        neighbours.push(cursor.node(&g));
        cursor.advance(&g);
    }
    assert_eq!(neighbours, vec![n1, n3]);
}
