//! The intrusive directed graph.

use alloc::string::{String, ToString};
use core::sync::atomic::{AtomicU32, Ordering};
use core::{fmt, ops};

use tracing::{debug, trace};

use super::iter::{EdgeListIter, NodeListIter};
use super::{Adjacent, EdgePtr, Edges, Graph, GraphDir, NodePtr, Preds, Succs};
use crate::core::marker::{Marked, MarkerHost, MarkerManager};
use crate::core::multi_list::{MultiListLinks, MultiListPtr};
use crate::core::numeration::{NumHost, NumManager, Numbered};
use crate::core::storage::{
    Arena, ChunkPos, PoolObject, PoolStats, SlabPool, SlabPtr, MAX_CHUNK_ENTRIES,
};
use crate::core::utils::PackedOption;
use crate::HashSet;

/// The unique id of a node or an edge inside its graph.
///
/// Ids are never reused, even after the entity is deleted.
pub type GraphUid = u64;

/// The only list of nodes: all nodes of the graph.
pub(super) const NODE_LIST_GRAPH: usize = 0;
const NODE_LISTS_NUM: usize = 1;

/// The incoming edges of a node, i.e. the `Up` list.
pub(super) const EDGE_LIST_PREDS: usize = 0;
/// The outgoing edges of a node, i.e. the `Down` list.
pub(super) const EDGE_LIST_SUCCS: usize = 1;
/// All edges of the graph.
pub(super) const EDGE_LIST_GRAPH: usize = 2;
const EDGE_LISTS_NUM: usize = 3;

pub(super) type NodeSlot<N, E> = SlabPtr<NodeData<N, E>>;
pub(super) type EdgeSlot<N, E> = SlabPtr<EdgeData<N, E>>;

/// The adjacency list slot of the edges in direction `dir` of a node.
pub(super) fn adjacency_list(dir: GraphDir) -> usize {
    match dir {
        GraphDir::Up => EDGE_LIST_PREDS,
        GraphDir::Down => EDGE_LIST_SUCCS,
    }
}

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(0);

/// A process-unique identifier of a [`DiGraph`].
///
/// Every handle carries the id of the graph that issued it, so that handles
/// used with the wrong graph are caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u32);

impl GraphId {
    fn fresh() -> Self { Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed)) }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "g{}", self.0) }
}

/// The runtime configuration of a [`DiGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphConfig {
    /// Number of node records per chunk of the node pool.
    pub node_chunk_capacity: ChunkPos,
    /// Number of edge records per chunk of the edge pool.
    pub edge_chunk_capacity: ChunkPos,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            node_chunk_capacity: MAX_CHUNK_ENTRIES,
            edge_chunk_capacity: MAX_CHUNK_ENTRIES,
        }
    }
}

/// The record of a node, stored in the node pool of a [`DiGraph`].
pub struct NodeData<N, E> {
    pub(super) id: GraphUid,
    pub(super) graph: GraphId,
    /// Heads of the incoming (`Up`) and outgoing (`Down`) edge lists.
    pub(super) first_edge: [PackedOption<EdgeSlot<N, E>>; 2],
    pub(super) links: MultiListLinks<NodeSlot<N, E>, NODE_LISTS_NUM>,
    pub(super) marked: Marked,
    pub(super) numbered: Numbered,
    pub(super) data: N,
}

impl<N, E> PoolObject for NodeData<N, E> {
    type Args = (GraphId, GraphUid, N);

    fn construct(_: NodeSlot<N, E>, (graph, id, data): Self::Args) -> Self {
        Self {
            id,
            graph,
            first_edge: [PackedOption::none(), PackedOption::none()],
            links: MultiListLinks::default(),
            marked: Marked::default(),
            numbered: Numbered::default(),
            data,
        }
    }
}

/// The record of an edge, stored in the edge pool of a [`DiGraph`].
pub struct EdgeData<N, E> {
    pub(super) id: GraphUid,
    pub(super) graph: GraphId,
    /// The predecessor (`Up`) and successor (`Down`) ends.
    pub(super) nodes: [NodeSlot<N, E>; 2],
    pub(super) links: MultiListLinks<EdgeSlot<N, E>, EDGE_LISTS_NUM>,
    pub(super) marked: Marked,
    pub(super) numbered: Numbered,
    pub(super) data: E,
}

impl<N, E> PoolObject for EdgeData<N, E> {
    type Args = (GraphId, GraphUid, [NodeSlot<N, E>; 2], E);

    fn construct(_: EdgeSlot<N, E>, (graph, id, nodes, data): Self::Args) -> Self {
        Self {
            id,
            graph,
            nodes,
            links: MultiListLinks::default(),
            marked: Marked::default(),
            numbered: Numbered::default(),
            data,
        }
    }
}

impl<N, E> MultiListPtr<SlabPool<NodeData<N, E>>, NODE_LISTS_NUM> for NodeSlot<N, E> {
    fn links(self, storage: &SlabPool<NodeData<N, E>>) -> &MultiListLinks<Self, NODE_LISTS_NUM> {
        &storage[self].links
    }

    fn links_mut(
        self,
        storage: &mut SlabPool<NodeData<N, E>>,
    ) -> &mut MultiListLinks<Self, NODE_LISTS_NUM> {
        &mut storage[self].links
    }
}

impl<N, E> MultiListPtr<SlabPool<EdgeData<N, E>>, EDGE_LISTS_NUM> for EdgeSlot<N, E> {
    fn links(self, storage: &SlabPool<EdgeData<N, E>>) -> &MultiListLinks<Self, EDGE_LISTS_NUM> {
        &storage[self].links
    }

    fn links_mut(
        self,
        storage: &mut SlabPool<EdgeData<N, E>>,
    ) -> &mut MultiListLinks<Self, EDGE_LISTS_NUM> {
        &mut storage[self].links
    }
}

/// An intrusive directed graph.
///
/// Nodes and edges are allocated in two [`SlabPool`]s owned by the graph and
/// addressed by [`NodePtr`] and [`EdgePtr`] handles. Every edge is linked in
/// three lists: the edge list of the graph, the outgoing list of its
/// predecessor and the incoming list of its successor. All lists are
/// intrusive, so adding or removing an edge is O(1).
///
/// # Type Parameters
///
/// - `N`: The payload of nodes.
/// - `E`: The payload of edges.
///
/// # Examples
///
/// ```
/// use scl_graph::core::graph::DiGraph;
///
/// let mut g = DiGraph::<&str, ()>::new();
/// let a = g.new_node("a");
/// let b = g.new_node("b");
/// let e = g.new_edge(a, b, ());
///
/// assert_eq!(a.first_succ(&g), Some(e));
/// assert_eq!(b.first_pred(&g), Some(e));
/// assert_eq!(g[e.succ(&g)], "b");
///
/// let c = g.insert_node(e, "c", ());
/// assert_eq!(e.succ(&g), c);
/// assert_eq!(g.num_edges(), 2);
/// ```
pub struct DiGraph<N = (), E = ()> {
    id: GraphId,
    nodes: SlabPool<NodeData<N, E>>,
    edges: SlabPool<EdgeData<N, E>>,
    first_node: PackedOption<NodeSlot<N, E>>,
    first_edge: PackedOption<EdgeSlot<N, E>>,
    num_nodes: usize,
    num_edges: usize,
    next_node_id: GraphUid,
    next_edge_id: GraphUid,
    markers: MarkerManager,
    nums: NumManager,
}

impl<N, E> Default for DiGraph<N, E> {
    fn default() -> Self { Self::new() }
}

impl<N, E> DiGraph<N, E> {
    /// Create an empty graph.
    pub fn new() -> Self { Self::with_config(GraphConfig::default()) }

    /// Create an empty graph with the given pool configuration.
    ///
    /// # Panics
    ///
    /// Panics if a chunk capacity is out of range, see
    /// [`SlabPool::with_chunk_capacity`].
    pub fn with_config(config: GraphConfig) -> Self {
        let id = GraphId::fresh();
        debug!(graph = %id, ?config, "new graph");
        Self {
            id,
            nodes: SlabPool::with_chunk_capacity(config.node_chunk_capacity),
            edges: SlabPool::with_chunk_capacity(config.edge_chunk_capacity),
            first_node: PackedOption::none(),
            first_edge: PackedOption::none(),
            num_nodes: 0,
            num_edges: 0,
            next_node_id: 0,
            next_edge_id: 0,
            markers: MarkerManager::new(),
            nums: NumManager::new(),
        }
    }

    /// The id of the graph.
    pub fn id(&self) -> GraphId { self.id }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize { self.num_nodes }

    /// Number of edges.
    pub fn num_edges(&self) -> usize { self.num_edges }

    /// The first node of the node list, which is the most recently created.
    pub fn first_node(&self) -> Option<NodePtr> {
        self.first_node.unpack().map(|slot| self.node_ptr(slot))
    }

    /// The first edge of the edge list, which is the most recently created.
    pub fn first_edge(&self) -> Option<EdgePtr> {
        self.first_edge.unpack().map(|slot| self.edge_ptr(slot))
    }

    /// Iterate over all nodes, most recently created first.
    pub fn nodes(&self) -> NodeListIter<'_, N, E> { NodeListIter::new(self, self.first_node()) }

    /// Iterate over all edges, most recently created first.
    pub fn edges(&self) -> EdgeListIter<'_, N, E> { EdgeListIter::new(self, self.first_edge()) }

    /// Statistics of the node pool.
    pub fn node_pool_stats(&self) -> PoolStats { self.nodes.stats() }

    /// Statistics of the edge pool.
    pub fn edge_pool_stats(&self) -> PoolStats { self.edges.stats() }

    /// Check if the handle addresses a live node of this graph.
    ///
    /// A handle of a deleted node is not live, even if its slot has been
    /// reused by a newer node.
    pub fn contains_node(&self, node: NodePtr) -> bool { self.try_node_record(node).is_some() }

    /// Check if the handle addresses a live edge of this graph.
    pub fn contains_edge(&self, edge: EdgePtr) -> bool { self.try_edge_record(edge).is_some() }

    /// Get the payload of a node, [`None`] if the handle is not live.
    pub fn node_data(&self, node: NodePtr) -> Option<&N> {
        self.try_node_record(node).map(|record| &record.data)
    }

    /// Get the payload of a node mutably, [`None`] if the handle is not live.
    pub fn node_data_mut(&mut self, node: NodePtr) -> Option<&mut N> {
        if !self.contains_node(node) {
            return None;
        }
        self.nodes
            .try_deref_mut(node.slot())
            .map(|record| &mut record.data)
    }

    /// Get the payload of an edge, [`None`] if the handle is not live.
    pub fn edge_data(&self, edge: EdgePtr) -> Option<&E> {
        self.try_edge_record(edge).map(|record| &record.data)
    }

    /// Get the payload of an edge mutably, [`None`] if the handle is not live.
    pub fn edge_data_mut(&mut self, edge: EdgePtr) -> Option<&mut E> {
        if !self.contains_edge(edge) {
            return None;
        }
        self.edges
            .try_deref_mut(edge.slot())
            .map(|record| &mut record.data)
    }

    /// Create a new node with the payload.
    ///
    /// The node gets the next node id and becomes the head of the node list.
    pub fn new_node(&mut self, data: N) -> NodePtr {
        let id = self.next_node_id;
        self.next_node_id += 1;

        let slot = self.nodes.construct((self.id, id, data));
        slot.push_front(&mut self.nodes, NODE_LIST_GRAPH, &mut self.first_node);
        self.num_nodes += 1;

        trace!(graph = %self.id, node = id, "new node");
        self.node_ptr(slot)
    }

    /// Create a new edge from `pred` to `succ` with the payload.
    ///
    /// The edge becomes the head of the edge list of the graph, the outgoing
    /// list of `pred` and the incoming list of `succ`.
    ///
    /// # Panics
    ///
    /// Panics if `pred` or `succ` is not a live node of this graph.
    pub fn new_edge(&mut self, pred: NodePtr, succ: NodePtr, data: E) -> EdgePtr {
        let pred = self.check_node(pred);
        let succ = self.check_node(succ);

        let id = self.next_edge_id;
        self.next_edge_id += 1;

        let slot = self.edges.construct((self.id, id, [pred, succ], data));
        slot.push_front(&mut self.edges, EDGE_LIST_GRAPH, &mut self.first_edge);
        for dir in GraphDir::ALL {
            self.link_edge_end(slot, dir);
        }
        self.num_edges += 1;

        trace!(
            graph = %self.id,
            edge = id,
            pred = self.nodes[pred].id,
            succ = self.nodes[succ].id,
            "new edge"
        );
        self.edge_ptr(slot)
    }

    /// Delete an edge and return its payload.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is not a live edge of this graph.
    pub fn delete_edge(&mut self, edge: EdgePtr) -> E {
        let slot = self.check_edge(edge);
        let EdgeData { id, data, .. } = self.remove_edge(slot);
        trace!(graph = %self.id, edge = id, "delete edge");
        data
    }

    /// Delete a node and return its payload.
    ///
    /// All edges incident to the node are deleted first, outgoing edges
    /// before incoming ones.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a live node of this graph.
    pub fn delete_node(&mut self, node: NodePtr) -> N {
        let slot = self.check_node(node);
        for dir in [GraphDir::Down, GraphDir::Up] {
            while let Some(edge) = self.nodes[slot].first_edge[dir.index()].unpack() {
                drop(self.remove_edge(edge));
            }
        }

        slot.unlink(&mut self.nodes, NODE_LIST_GRAPH, &mut self.first_node);
        self.num_nodes -= 1;

        let NodeData { id, data, .. } = self.nodes.dealloc(slot);
        trace!(graph = %self.id, node = id, "delete node");
        data
    }

    /// Retarget the `dir` end of an edge to `node`.
    ///
    /// The edge is moved to the head of the corresponding list of `node`, the
    /// other end and all other edges are untouched.
    ///
    /// # Panics
    ///
    /// Panics if `edge` or `node` is not live in this graph.
    pub fn set_node(&mut self, edge: EdgePtr, dir: GraphDir, node: NodePtr) {
        let slot = self.check_edge(edge);
        let node = self.check_node(node);
        self.unlink_edge_end(slot, dir);
        self.edges[slot].nodes[dir.index()] = node;
        self.link_edge_end(slot, dir);
    }

    /// Retarget the predecessor of an edge.
    pub fn set_pred(&mut self, edge: EdgePtr, node: NodePtr) {
        self.set_node(edge, GraphDir::Up, node)
    }

    /// Retarget the successor of an edge.
    pub fn set_succ(&mut self, edge: EdgePtr, node: NodePtr) {
        self.set_node(edge, GraphDir::Down, node)
    }

    /// Split an edge with a new node.
    ///
    /// For `edge: A -> C`, a new node `B` is created, `edge` becomes
    /// `A -> B` and a new edge `B -> C` is created. Other edges of `A` and
    /// `C` are untouched.
    ///
    /// # Returns
    ///
    /// The new node `B`.
    pub fn insert_node(&mut self, edge: EdgePtr, node_data: N, edge_data: E) -> NodePtr {
        let succ = edge.succ(self);
        let node = self.new_node(node_data);
        self.set_succ(edge, node);
        self.new_edge(node, succ, edge_data);
        node
    }

    /// Delete all nodes and edges.
    ///
    /// Ids keep increasing, handles issued before are dangling afterwards.
    pub fn clear(&mut self) {
        if self.num_nodes != 0 {
            debug!(
                graph = %self.id,
                nodes = self.num_nodes,
                edges = self.num_edges,
                "clear graph"
            );
        }
        self.edges.clear();
        self.nodes.clear();
        self.first_node = PackedOption::none();
        self.first_edge = PackedOption::none();
        self.num_nodes = 0;
        self.num_edges = 0;
    }

    /// Render the graph in the textual dump format.
    ///
    /// The dump is `digraph{`, one `<id>;` line per node, one
    /// `<pred id>-><succ id>;` line per edge and a closing `}`, nodes and
    /// edges in list order.
    pub fn debug_print(&self) -> String { self.to_string() }

    /// Check the structural invariants of the graph.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violation found.
    pub fn verify(&self) {
        let mut num_preds = 0;
        let mut num_succs = 0;

        let mut ids = HashSet::new();
        let mut prev = None;
        let mut num_nodes = 0;
        for slot in self.node_slots() {
            let node = &self.nodes[slot];
            assert_eq!(node.graph, self.id, "node {} has a foreign graph", node.id);
            assert!(ids.insert(node.id), "duplicated node id {}", node.id);
            assert_eq!(
                node.links.prev(NODE_LIST_GRAPH),
                prev,
                "broken node list at node {}",
                node.id
            );

            for dir in GraphDir::ALL {
                let mut prev_edge = None;
                for edge_slot in self.adjacent_slots(slot, dir) {
                    let edge = &self.edges[edge_slot];
                    assert_eq!(
                        edge.nodes[dir.rev().index()],
                        slot,
                        "edge {} is in the {} list of node {} but not incident",
                        edge.id,
                        dir,
                        node.id
                    );
                    assert_eq!(
                        edge.links.prev(adjacency_list(dir)),
                        prev_edge,
                        "broken {} list of node {} at edge {}",
                        dir,
                        node.id,
                        edge.id
                    );
                    prev_edge = Some(edge_slot);
                    match dir {
                        GraphDir::Up => num_preds += 1,
                        GraphDir::Down => num_succs += 1,
                    }
                }
            }

            prev = Some(slot);
            num_nodes += 1;
        }
        assert_eq!(num_nodes, self.num_nodes, "node count mismatch");
        assert_eq!(self.nodes.len(), self.num_nodes, "node pool mismatch");

        let mut ids = HashSet::new();
        let mut prev = None;
        let mut num_edges = 0;
        for slot in self.edge_slots() {
            let edge = &self.edges[slot];
            assert_eq!(edge.graph, self.id, "edge {} has a foreign graph", edge.id);
            assert!(ids.insert(edge.id), "duplicated edge id {}", edge.id);
            assert_eq!(
                edge.links.prev(EDGE_LIST_GRAPH),
                prev,
                "broken edge list at edge {}",
                edge.id
            );
            for dir in GraphDir::ALL {
                let end = edge.nodes[dir.index()];
                assert!(
                    self.nodes.try_deref(end).is_some(),
                    "edge {} has a deleted {} end",
                    edge.id,
                    dir
                );
                assert!(
                    self.adjacent_slots(end, dir.rev()).any(|s| s == slot),
                    "edge {} is missing from the list of its {} end",
                    edge.id,
                    dir
                );
            }

            prev = Some(slot);
            num_edges += 1;
        }
        assert_eq!(num_edges, self.num_edges, "edge count mismatch");
        assert_eq!(self.edges.len(), self.num_edges, "edge pool mismatch");
        assert_eq!(num_preds, self.num_edges, "incoming lists mismatch");
        assert_eq!(num_succs, self.num_edges, "outgoing lists mismatch");
    }

    pub(super) fn node_ptr(&self, slot: NodeSlot<N, E>) -> NodePtr {
        NodePtr::new(self.id, self.nodes[slot].id, slot)
    }

    pub(super) fn edge_ptr(&self, slot: EdgeSlot<N, E>) -> EdgePtr {
        EdgePtr::new(self.id, self.edges[slot].id, slot)
    }

    /// Get the record of a live node.
    pub(super) fn node_record(&self, node: NodePtr) -> &NodeData<N, E> {
        &self.nodes[self.check_node(node)]
    }

    pub(super) fn node_record_mut(&mut self, node: NodePtr) -> &mut NodeData<N, E> {
        let slot = self.check_node(node);
        &mut self.nodes[slot]
    }

    /// Get the record of a live edge.
    pub(super) fn edge_record(&self, edge: EdgePtr) -> &EdgeData<N, E> {
        &self.edges[self.check_edge(edge)]
    }

    pub(super) fn edge_record_mut(&mut self, edge: EdgePtr) -> &mut EdgeData<N, E> {
        let slot = self.check_edge(edge);
        &mut self.edges[slot]
    }

    pub(super) fn markers(&self) -> &MarkerManager { &self.markers }

    pub(super) fn nums(&self) -> &NumManager { &self.nums }

    fn try_node_record(&self, node: NodePtr) -> Option<&NodeData<N, E>> {
        if node.graph() != self.id {
            return None;
        }
        self.nodes
            .try_deref(node.slot())
            .filter(|record| record.id == node.uid())
    }

    fn try_edge_record(&self, edge: EdgePtr) -> Option<&EdgeData<N, E>> {
        if edge.graph() != self.id {
            return None;
        }
        self.edges
            .try_deref(edge.slot())
            .filter(|record| record.id == edge.uid())
    }

    fn check_node(&self, node: NodePtr) -> NodeSlot<N, E> {
        assert!(
            node.graph() == self.id,
            "node {:?} does not belong to graph {}",
            node,
            self.id
        );
        assert!(self.contains_node(node), "node {:?} is deleted", node);
        node.slot()
    }

    fn check_edge(&self, edge: EdgePtr) -> EdgeSlot<N, E> {
        assert!(
            edge.graph() == self.id,
            "edge {:?} does not belong to graph {}",
            edge,
            self.id
        );
        assert!(self.contains_edge(edge), "edge {:?} is deleted", edge);
        edge.slot()
    }

    /// Link the edge into the list of its `dir` end.
    fn link_edge_end(&mut self, slot: EdgeSlot<N, E>, dir: GraphDir) {
        let node = self.edges[slot].nodes[dir.index()];
        let list = dir.rev();
        slot.push_front(
            &mut self.edges,
            adjacency_list(list),
            &mut self.nodes[node].first_edge[list.index()],
        );
    }

    /// Unlink the edge from the list of its `dir` end.
    fn unlink_edge_end(&mut self, slot: EdgeSlot<N, E>, dir: GraphDir) {
        let node = self.edges[slot].nodes[dir.index()];
        let list = dir.rev();
        slot.unlink(
            &mut self.edges,
            adjacency_list(list),
            &mut self.nodes[node].first_edge[list.index()],
        );
    }

    fn remove_edge(&mut self, slot: EdgeSlot<N, E>) -> EdgeData<N, E> {
        for dir in GraphDir::ALL {
            self.unlink_edge_end(slot, dir);
        }
        slot.unlink(&mut self.edges, EDGE_LIST_GRAPH, &mut self.first_edge);
        self.num_edges -= 1;
        self.edges.dealloc(slot)
    }

    fn node_slots(&self) -> impl Iterator<Item = NodeSlot<N, E>> + '_ {
        self.first_node
            .unpack()
            .into_iter()
            .flat_map(move |head| head.iter(&self.nodes, NODE_LIST_GRAPH))
    }

    fn edge_slots(&self) -> impl Iterator<Item = EdgeSlot<N, E>> + '_ {
        self.first_edge
            .unpack()
            .into_iter()
            .flat_map(move |head| head.iter(&self.edges, EDGE_LIST_GRAPH))
    }

    /// The edges in the `dir` list of a node.
    fn adjacent_slots(
        &self,
        node: NodeSlot<N, E>,
        dir: GraphDir,
    ) -> impl Iterator<Item = EdgeSlot<N, E>> + '_ {
        self.nodes[node].first_edge[dir.index()]
            .unpack()
            .into_iter()
            .flat_map(move |head| head.iter(&self.edges, adjacency_list(dir)))
    }
}

impl<N, E> Drop for DiGraph<N, E> {
    fn drop(&mut self) { self.clear() }
}

impl<N, E> fmt::Display for DiGraph<N, E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "digraph{{")?;
        for slot in self.node_slots() {
            writeln!(f, "{};", self.nodes[slot].id)?;
        }
        for slot in self.edge_slots() {
            let [pred, succ] = self.edges[slot].nodes;
            writeln!(f, "{}->{};", self.nodes[pred].id, self.nodes[succ].id)?;
        }
        writeln!(f, "}}")
    }
}

impl<N, E> fmt::Debug for DiGraph<N, E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DiGraph")
            .field("id", &self.id)
            .field("num_nodes", &self.num_nodes)
            .field("num_edges", &self.num_edges)
            .finish_non_exhaustive()
    }
}

impl<N, E> ops::Index<NodePtr> for DiGraph<N, E> {
    type Output = N;

    fn index(&self, node: NodePtr) -> &N { &self.node_record(node).data }
}

impl<N, E> ops::IndexMut<NodePtr> for DiGraph<N, E> {
    fn index_mut(&mut self, node: NodePtr) -> &mut N { &mut self.node_record_mut(node).data }
}

impl<N, E> ops::Index<EdgePtr> for DiGraph<N, E> {
    type Output = E;

    fn index(&self, edge: EdgePtr) -> &E { &self.edge_record(edge).data }
}

impl<N, E> ops::IndexMut<EdgePtr> for DiGraph<N, E> {
    fn index_mut(&mut self, edge: EdgePtr) -> &mut E { &mut self.edge_record_mut(edge).data }
}

impl<N, E> MarkerHost for DiGraph<N, E> {
    fn marker_manager(&self) -> &MarkerManager { &self.markers }

    fn marker_manager_mut(&mut self) -> &mut MarkerManager { &mut self.markers }

    fn clear_markers_in_objects(&mut self) {
        debug!(graph = %self.id, "sweeping marker stamps");
        for node in self.nodes.iter_mut() {
            node.marked.clear_unused(&self.markers);
        }
        for edge in self.edges.iter_mut() {
            edge.marked.clear_unused(&self.markers);
        }
    }
}

impl<N, E> NumHost for DiGraph<N, E> {
    fn num_manager(&self) -> &NumManager { &self.nums }

    fn num_manager_mut(&mut self) -> &mut NumManager { &mut self.nums }

    fn clear_nums_in_objects(&mut self) {
        debug!(graph = %self.id, "sweeping numeration stamps");
        for node in self.nodes.iter_mut() {
            node.numbered.clear_unused(&self.nums);
        }
        for edge in self.edges.iter_mut() {
            edge.numbered.clear_unused(&self.nums);
        }
    }
}

impl<N, E> Graph for DiGraph<N, E> {
    type Node = NodePtr;

    fn is_empty(&self) -> bool { self.num_nodes == 0 }
}

impl<N, E> Preds for DiGraph<N, E> {
    fn preds(&self, node: NodePtr) -> impl IntoIterator<Item = NodePtr> {
        node.preds(self).map(move |edge| edge.pred(self))
    }
}

impl<N, E> Succs for DiGraph<N, E> {
    fn succs(&self, node: NodePtr) -> impl IntoIterator<Item = NodePtr> {
        node.succs(self).map(move |edge| edge.succ(self))
    }
}

impl<N, E> Adjacent for DiGraph<N, E> {
    fn adjacent(&self, node: NodePtr) -> impl IntoIterator<Item = NodePtr> {
        node.preds(self)
            .map(move |edge| edge.pred(self))
            .chain(node.succs(self).map(move |edge| edge.succ(self)))
    }
}

impl<N, E> Edges for DiGraph<N, E> {
    type Edge = E;

    fn edges(&self, src: NodePtr, dst: NodePtr) -> impl IntoIterator<Item = &E> {
        src.succs(self)
            .filter(move |edge| edge.succ(self) == dst)
            .map(move |edge| &self[edge])
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;

    use super::*;

    /// The path `n1 -> n2 -> n3`.
    fn path() -> (DiGraph, [NodePtr; 3], [EdgePtr; 2]) {
        let mut g = DiGraph::new();
        let n1 = g.new_node(());
        let n2 = g.new_node(());
        let n3 = g.new_node(());
        let e1 = g.new_edge(n1, n2, ());
        let e2 = g.new_edge(n2, n3, ());
        (g, [n1, n2, n3], [e1, e2])
    }

    #[test]
    fn test_new_node() {
        let mut g = DiGraph::<u32, ()>::new();
        assert!(g.is_empty());
        let a = g.new_node(1);
        assert_eq!(g.num_nodes(), 1);
        assert_eq!(a.graph(), g.id());
        assert_eq!(a.id(&g), 0);
        assert_eq!(g[a], 1);
        let b = g.new_node(2);
        assert_eq!(b.id(&g), 1);
        assert_eq!(g.first_node(), Some(b));
        assert_eq!(b.next_node(&g), Some(a));
        assert_eq!(a.prev_node(&g), Some(b));
        assert_eq!(a.first_succ(&g), None);
        assert_eq!(a.first_pred(&g), None);
        g.verify();
    }

    #[test]
    fn test_new_edge() {
        let mut g = DiGraph::<(), &str>::new();
        let p = g.new_node(());
        let s = g.new_node(());
        let e = g.new_edge(p, s, "e");
        assert_eq!(p.first_succ(&g), Some(e));
        assert_eq!(s.first_pred(&g), Some(e));
        assert_eq!(p.first_pred(&g), None);
        assert_eq!(s.first_succ(&g), None);
        assert_eq!(e.pred(&g), p);
        assert_eq!(e.succ(&g), s);
        assert_eq!(e.node(&g, GraphDir::Up), p);
        assert_eq!(e.node(&g, GraphDir::Down), s);
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.first_edge(), Some(e));
        assert_eq!(g[e], "e");
        g.verify();
    }

    #[test]
    fn test_delete_edge() {
        let (mut g, [n1, n2, n3], [e1, e2]) = path();
        g.delete_edge(e1);
        assert_eq!(g.num_edges(), 1);
        assert_eq!(n1.first_succ(&g), None);
        assert_eq!(n2.first_pred(&g), None);
        assert_eq!(n2.first_succ(&g), Some(e2));
        assert_eq!(n3.first_pred(&g), Some(e2));
        assert!(!g.contains_edge(e1));
        g.verify();
    }

    #[test]
    fn test_delete_node_cascades() {
        let (mut g, [n1, n2, n3], _) = path();
        let loop_edge = g.new_edge(n2, n2, ());
        g.new_edge(n3, n2, ());
        assert_eq!(g.num_edges(), 4);

        g.delete_node(n2);
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 0);
        assert!(!g.contains_node(n2));
        assert!(!g.contains_edge(loop_edge));
        assert_eq!(n1.first_succ(&g), None);
        assert_eq!(n3.first_pred(&g), None);
        assert_eq!(n3.first_succ(&g), None);
        g.verify();
    }

    #[test]
    fn test_delete_returns_payload() {
        let mut g = DiGraph::<String, u8>::new();
        let a = g.new_node("a".to_string());
        let b = g.new_node("b".to_string());
        let e = g.new_edge(a, b, 7);
        assert_eq!(g.delete_edge(e), 7);
        assert_eq!(g.delete_node(a), "a");
        assert_eq!(g.num_nodes(), 1);
    }

    #[test]
    fn test_insert_node() {
        let (mut g, [n1, n2, n3], [e1, e2]) = path();
        let other = g.new_edge(n1, n3, ());

        let b = g.insert_node(e1, (), ());
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_edges(), 4);
        assert_eq!(e1.pred(&g), n1);
        assert_eq!(e1.succ(&g), b);
        assert_eq!(b.first_pred(&g), Some(e1));

        let new_edge = b.first_succ(&g).unwrap();
        assert_ne!(new_edge, e1);
        assert_eq!(new_edge.succ(&g), n2);
        assert_eq!(n2.first_pred(&g), Some(new_edge));
        assert_eq!(new_edge.next_pred(&g), None);
        assert!(new_edge.id(&g) > other.id(&g));

        // other edges are untouched
        assert_eq!(e2.pred(&g), n2);
        assert_eq!(other.pred(&g), n1);
        assert_eq!(other.succ(&g), n3);
        assert_eq!(n1.succs(&g).collect::<Vec<_>>(), vec![other, e1]);
        g.verify();
    }

    #[test]
    fn test_set_pred_succ() {
        let (mut g, [n1, n2, n3], [e1, _]) = path();
        g.set_pred(e1, n3);
        assert_eq!(e1.pred(&g), n3);
        assert_eq!(n1.first_succ(&g), None);
        assert_eq!(n3.first_succ(&g), Some(e1));
        g.set_succ(e1, n1);
        assert_eq!(e1.succ(&g), n1);
        assert_eq!(n1.first_pred(&g), Some(e1));
        assert_eq!(n2.first_pred(&g), None);
        g.verify();
    }

    #[test]
    fn test_debug_print() {
        let (g, _, _) = path();
        assert_eq!(g.debug_print(), "digraph{\n2;\n1;\n0;\n1->2;\n0->1;\n}\n");
        assert_eq!(DiGraph::<(), ()>::new().debug_print(), "digraph{\n}\n");
    }

    #[test]
    fn test_graph_traits() {
        let (mut g, [n1, n2, n3], _) = path();
        g.new_edge(n1, n2, ());
        assert_eq!(
            Succs::succs(&g, n1).into_iter().collect::<Vec<_>>(),
            vec![n2, n2]
        );
        assert_eq!(Preds::preds(&g, n3).into_iter().collect::<Vec<_>>(), vec![n2]);
        assert_eq!(
            Adjacent::adjacent(&g, n2).into_iter().collect::<Vec<_>>(),
            vec![n1, n1, n3]
        );
        assert_eq!(Edges::edges(&g, n1, n2).into_iter().count(), 2);
        assert_eq!(Edges::edges(&g, n1, n3).into_iter().count(), 0);
    }

    #[test]
    fn test_payload_access() {
        let mut g = DiGraph::<u32, u32>::new();
        let a = g.new_node(1);
        let b = g.new_node(2);
        let e = g.new_edge(a, b, 3);
        g[a] += 10;
        g[e] *= 2;
        *g.node_data_mut(b).unwrap() = 20;
        assert_eq!(g.node_data(a), Some(&11));
        assert_eq!(g.node_data(b), Some(&20));
        assert_eq!(g.edge_data(e), Some(&6));
        if let Some(data) = g.edge_data_mut(e) {
            *data = 0;
        }
        assert_eq!(g[e], 0);

        let other = DiGraph::<u32, u32>::new();
        assert_eq!(other.node_data(a), None);
        assert!(!other.contains_node(a));
    }

    #[test]
    fn test_small_chunks() {
        let mut g = DiGraph::<usize, ()>::with_config(GraphConfig {
            node_chunk_capacity: 2,
            edge_chunk_capacity: 3,
        });
        let nodes = (0..10).map(|i| g.new_node(i)).collect::<Vec<_>>();
        for pair in nodes.windows(2) {
            g.new_edge(pair[0], pair[1], ());
        }
        assert_eq!(g.node_pool_stats().chunks, 5);
        assert_eq!(g.edge_pool_stats().chunks, 3);
        for &node in nodes.iter().step_by(3) {
            g.delete_node(node);
        }
        g.verify();
        assert_eq!(g.node_pool_stats().live, g.num_nodes());
        assert_eq!(g.edge_pool_stats().live, g.num_edges());
    }

    #[test]
    fn test_clear_drops_payloads() {
        let drops = Rc::new(Cell::new(0));

        struct Payload(Rc<Cell<usize>>);

        impl Drop for Payload {
            fn drop(&mut self) { self.0.set(self.0.get() + 1); }
        }

        let mut g = DiGraph::new();
        let a = g.new_node(Payload(drops.clone()));
        let b = g.new_node(Payload(drops.clone()));
        g.new_edge(a, b, Payload(drops.clone()));
        g.clear();
        assert_eq!(drops.get(), 3);
        assert!(g.is_empty());
        assert_eq!(g.num_edges(), 0);

        let c = g.new_node(Payload(drops.clone()));
        assert_eq!(c.id(&g), 2);
        drop(g);
        assert_eq!(drops.get(), 4);
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn test_cross_graph_edge_panics() {
        let mut g1 = DiGraph::<(), ()>::new();
        let mut g2 = DiGraph::<(), ()>::new();
        let a = g1.new_node(());
        let b = g2.new_node(());
        g1.new_edge(a, b, ());
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut g = DiGraph::<&str, u8>::new();
        let a = g.new_node("a");
        let x = g.new_node("x");
        let e = g.new_edge(a, x, 1);
        g.delete_node(a);

        // `b` and `f` take the slots of `a` and `e`
        let b = g.new_node("b");
        let f = g.new_edge(b, x, 2);
        assert_ne!(a, b);
        assert_ne!(e, f);
        assert!(!g.contains_node(a));
        assert!(!g.contains_edge(e));
        assert_eq!(g.node_data(a), None);
        assert_eq!(g.node_data_mut(a), None);
        assert_eq!(g.edge_data(e), None);
        assert_eq!(g.edge_data_mut(e), None);
        assert_eq!(g[b], "b");
        assert_eq!(g[f], 2);
    }

    #[test]
    #[should_panic(expected = "is deleted")]
    fn test_stale_node_after_reuse_panics() {
        let mut g = DiGraph::<&str, ()>::new();
        let a = g.new_node("a");
        g.delete_node(a);
        let _b = g.new_node("b");
        g.delete_node(a);
    }

    #[test]
    #[should_panic(expected = "is deleted")]
    fn test_stale_edge_after_reuse_panics() {
        let (mut g, [n1, n2, _], [e1, _]) = path();
        g.delete_edge(e1);
        let _e = g.new_edge(n2, n1, ());
        g.set_succ(e1, n1);
    }

    #[test]
    #[should_panic(expected = "is deleted")]
    fn test_stale_node_panics() {
        let (mut g, [n1, _, _], _) = path();
        g.delete_node(n1);
        g.delete_node(n1);
    }
}
