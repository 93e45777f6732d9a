//! Graph structure.
//!
//! The graph provides:
//! - **Arena-based storage**: nodes live in an append-only table indexed by
//!   id; deleted nodes leave holes and ids are never reused
//! - **Back-edges**: every input edge is mirrored in the target's usages and
//!   every successor edge in the target's predecessor
//! - **Per-type lists**: ascending id lists for iterable node types
//! - **Value numbering**: [`Graph::unique`] returns an existing equal node
//!   instead of adding a new one
//! - **Duplication**: [`Graph::add_duplicate`] copies a region of nodes
//!
//! # Design Principles
//!
//! - **Ids, not pointers**: node relations are plain [`NodeId`]s
//! - **Graph-mediated mutation**: alive nodes are never handed out mutably,
//!   so forward edges and back-edges cannot drift apart
//! - **Validate, then mutate**: a failing call leaves the graph unchanged

mod cursor;
mod duplicate;
mod gvn;
mod verify;

pub use cursor::{NodeCursor, TypeCursor};
pub use verify::{VerificationFailure, VerificationListener};

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::arena::Arena;
use crate::config::GraphConfig;
use crate::error::{GraphError, GraphResult};
use crate::node::{Node, NodeId};
use crate::schema::{NodeSchema, NodeType};

// =============================================================================
// Graph Identity
// =============================================================================

/// Process-unique identity of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(u32);

impl GraphId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        GraphId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph{}", self.0)
    }
}

// =============================================================================
// Per-type Lists
// =============================================================================

/// Ids of one iterable type in ascending order. Deleted ids stay until the
/// list is compacted; `dead` counts them.
#[derive(Debug, Clone, Default)]
struct TypeList {
    ids: Vec<NodeId>,
    dead: usize,
}

// =============================================================================
// Graph Structure
// =============================================================================

/// A graph of nodes connected by input and successor edges.
pub struct Graph {
    id: GraphId,

    /// Node table; holes are deleted nodes.
    nodes: Arena<Node>,

    /// Per-type lists, indexed by the schema's iterable id.
    type_lists: Vec<TypeList>,

    /// Table length at the last `mark()`.
    mark: usize,

    /// Value number to live edgeless nodes, for `unique`.
    cache: FxHashMap<u64, SmallVec<[NodeId; 2]>>,

    root: NodeId,

    config: GraphConfig,
}

impl Graph {
    /// Create a graph whose first node (id 0) is `root`.
    pub fn new(root: Node) -> GraphResult<Self> {
        Self::with_config(root, GraphConfig::default())
    }

    /// Create a graph with an explicit configuration.
    pub fn with_config(root: Node, config: GraphConfig) -> GraphResult<Self> {
        let mut graph = Graph {
            id: GraphId::next(),
            nodes: Arena::with_capacity(config.initial_capacity),
            type_lists: Vec::new(),
            mark: 0,
            cache: FxHashMap::default(),
            root: NodeId::INVALID,
            config,
        };
        graph.root = graph.add(root)?;
        Ok(graph)
    }

    /// Identity of this graph.
    #[inline]
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// The root node passed at construction.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The configuration this graph was built with.
    #[inline]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // =========================================================================
    // Node Access
    // =========================================================================

    /// Get a live node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not alive in this graph.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Get a node by id, `None` for deleted or unknown ids.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether `id` names a live node of this graph.
    #[inline]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub(crate) fn live(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.get(id).ok_or(GraphError::NotAlive(id))
    }

    pub(crate) fn live_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes.get_mut(id).ok_or(GraphError::NotAlive(id))
    }

    /// Number of live nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of ids handed out so far, deleted ones included.
    #[inline]
    pub fn node_id_count(&self) -> usize {
        self.nodes.slot_count()
    }

    /// Number of deleted nodes.
    #[inline]
    pub fn deleted_count(&self) -> usize {
        self.nodes.hole_count()
    }

    // =========================================================================
    // Adding Nodes
    // =========================================================================

    /// Add an initial node: assign the next id and wire the back-edges of
    /// every edge the node already holds.
    ///
    /// Fails without changing anything if the node was added before, if
    /// one of its edges points at a node that is not alive here, or if one
    /// of its successors already has a predecessor.
    pub fn add(&mut self, node: Node) -> GraphResult<NodeId> {
        self.check_addable(&node)?;
        let id = self.register(node);
        self.initialize(id)?;
        log::trace!("{}: added {:?} {:?}", self.id, id, self.nodes[id]);
        Ok(id)
    }

    fn check_addable(&self, node: &Node) -> GraphResult<()> {
        if !matches!(node.state(), crate::node::NodeState::Initial) {
            return Err(GraphError::AlreadyAdded(node.id()));
        }
        let pending = self.nodes.next_id();
        for target in node.inputs() {
            if !self.is_alive(target) {
                return Err(GraphError::DanglingEdge {
                    node: pending,
                    target,
                });
            }
        }
        let mut seen: SmallVec<[NodeId; 4]> = SmallVec::new();
        for target in node.successors() {
            let successor = self.nodes.get(target).ok_or(GraphError::DanglingEdge {
                node: pending,
                target,
            })?;
            let existing = successor.predecessor().or_else(|| {
                // A node can only appear once among the successors of another.
                seen.contains(&target).then_some(pending)
            });
            if let Some(existing) = existing {
                return Err(GraphError::PredecessorAlreadySet {
                    node: pending,
                    target,
                    existing,
                });
            }
            seen.push(target);
        }
        Ok(())
    }

    /// Store `node` under the next id and link it into its type list.
    pub(crate) fn register(&mut self, mut node: Node) -> NodeId {
        let id = self.nodes.next_id();
        node.attach(id, self.id);
        if let Some(slot) = node.schema().iterable_id() {
            let slot = slot as usize;
            if self.type_lists.len() <= slot {
                self.type_lists.resize_with(slot + 1, TypeList::default);
            }
            self.type_lists[slot].ids.push(id);
        }
        self.nodes.alloc(node)
    }

    /// Remove `id` from the table and account for it in its type list.
    pub(crate) fn unregister(&mut self, id: NodeId) -> GraphResult<Node> {
        let mut node = self.nodes.remove(id).ok_or(GraphError::NotAlive(id))?;
        if let Some(slot) = node.schema().iterable_id() {
            if let Some(list) = self.type_lists.get_mut(slot as usize) {
                list.dead += 1;
                if self.config.should_compact(list.ids.len(), list.dead) {
                    let before = list.ids.len();
                    let nodes = &self.nodes;
                    list.ids.retain(|&id| nodes.contains(id));
                    list.dead = 0;
                    log::debug!(
                        "{}: compacted {} list from {} to {} ids",
                        self.id,
                        node.short_name(),
                        before,
                        list.ids.len()
                    );
                }
            }
        }
        node.mark_deleted();
        Ok(node)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Live node ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.ids()
    }

    /// Live nodes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().map(|(_, node)| node)
    }

    /// A cursor over all live nodes that tolerates mutation between steps.
    pub fn cursor(&self) -> NodeCursor {
        NodeCursor::starting_at(0)
    }

    /// Remember the current table length; see [`new_nodes`](Graph::new_nodes).
    pub fn mark(&mut self) {
        self.mark = self.nodes.slot_count();
    }

    /// Live nodes added since the last [`mark`](Graph::mark).
    pub fn new_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter_from(self.mark).map(|(_, node)| node)
    }

    /// A mutation-tolerant cursor over the nodes added since the last mark.
    pub fn new_nodes_cursor(&self) -> NodeCursor {
        NodeCursor::starting_at(self.mark)
    }

    fn type_slot(schema: &NodeSchema) -> GraphResult<usize> {
        schema
            .iterable_id()
            .map(|id| id as usize)
            .ok_or(GraphError::NotIterable(schema.name()))
    }

    /// Live nodes of exactly the iterable type `schema`, in id order.
    pub fn nodes_of(&self, schema: &NodeSchema) -> GraphResult<TypedNodes<'_>> {
        let slot = Self::type_slot(schema)?;
        let ids = self
            .type_lists
            .get(slot)
            .map(|list| list.ids.as_slice())
            .unwrap_or(&[]);
        Ok(TypedNodes {
            nodes: &self.nodes,
            ids: ids.iter(),
        })
    }

    /// Live nodes of the iterable type `T`.
    pub fn nodes_of_type<T: NodeType>(&self) -> GraphResult<TypedNodes<'_>> {
        self.nodes_of(NodeSchema::of::<T>())
    }

    /// Whether any live node of the iterable type `schema` exists.
    pub fn has_nodes_of(&self, schema: &NodeSchema) -> GraphResult<bool> {
        Ok(self.nodes_of(schema)?.next().is_some())
    }

    /// A mutation-tolerant cursor over the nodes of one iterable type.
    pub fn type_cursor(&self, schema: &NodeSchema) -> GraphResult<TypeCursor> {
        Ok(TypeCursor::new(Self::type_slot(schema)?))
    }

    pub(crate) fn type_list_ids(&self, slot: usize) -> &[NodeId] {
        self.type_lists
            .get(slot)
            .map(|list| list.ids.as_slice())
            .unwrap_or(&[])
    }
}

/// Iterator over the live nodes of one type.
pub struct TypedNodes<'a> {
    nodes: &'a Arena<Node>,
    ids: std::slice::Iter<'a, NodeId>,
}

impl<'a> Iterator for TypedNodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        self.ids.by_ref().find_map(|&id| nodes.get(id))
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Graph {} ({} nodes, {} deleted):",
            self.id,
            self.node_count(),
            self.deleted_count()
        )?;
        for (id, node) in self.nodes.iter() {
            write!(f, "  {:?}: {:?}", id, node)?;
            if let Some(pred) = node.predecessor() {
                write!(f, " (pred {:?})", pred)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeState;
    use crate::schema::Position;
    use crate::test_types::*;

    fn graph() -> Graph {
        Graph::with_config(Node::of::<StartNode>(), GraphConfig::for_testing()).unwrap()
    }

    #[test]
    fn test_root_is_node_zero() {
        let g = graph();
        assert_eq!(g.root(), NodeId::new(0));
        assert!(g.node(g.root()).is::<StartNode>());
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.node(g.root()).graph_id(), Some(g.id()));
    }

    #[test]
    fn test_graph_ids_are_distinct() {
        assert_ne!(graph().id(), graph().id());
    }

    #[test]
    fn test_add_wires_back_edges() {
        let mut g = graph();
        let a = g.add(constant(1)).unwrap();
        let b = g.add(constant(2)).unwrap();
        let sum = g.add(add(a, b)).unwrap();
        assert_eq!(g.node(a).usages(), &[sum]);
        assert_eq!(g.node(b).usages(), &[sum]);

        let begin = g.add(Node::of::<BeginNode>()).unwrap();
        let branch = g
            .add(Node::of::<IfNode>().with_input(0, a).unwrap().with_successor(0, begin).unwrap())
            .unwrap();
        assert_eq!(g.node(begin).predecessor(), Some(branch));
        assert_eq!(g.node(a).usages(), &[sum, branch]);
    }

    #[test]
    fn test_add_twice_fails() {
        let mut g = graph();
        let a = g.add(constant(1)).unwrap();
        let copy = g.node(a).clone();
        assert_eq!(g.add(copy), Err(GraphError::AlreadyAdded(a)));
    }

    #[test]
    fn test_add_with_dangling_edge_fails() {
        let mut g = graph();
        let count = g.node_count();
        let result = g.add(add(NodeId::new(40), NodeId::new(41)));
        assert!(matches!(result, Err(GraphError::DanglingEdge { .. })));
        assert_eq!(g.node_count(), count);
    }

    #[test]
    fn test_add_rejects_second_predecessor() {
        let mut g = graph();
        let begin = g.add(Node::of::<BeginNode>()).unwrap();
        g.add(Node::of::<BeginNode>().with_successor(0, begin).unwrap())
            .unwrap();
        let result = g.add(Node::of::<BeginNode>().with_successor(0, begin).unwrap());
        assert!(matches!(
            result,
            Err(GraphError::PredecessorAlreadySet { .. })
        ));

        let other = g.add(Node::of::<BeginNode>()).unwrap();
        let branch = Node::of::<IfNode>()
            .with_successor(0, other)
            .and_then(|n| n.with_successor(1, other))
            .unwrap();
        assert!(g.add(branch).is_err());
        assert_eq!(g.node(other).predecessor(), None);
    }

    #[test]
    fn test_deleted_node_state() {
        let mut g = graph();
        let a = g.add(constant(1)).unwrap();
        let node = g.delete(a).unwrap();
        assert_eq!(node.state(), NodeState::Deleted);
        assert!(g.get(a).is_none());
        assert_eq!(g.deleted_count(), 1);
        assert_eq!(g.node_id_count(), 2);
    }

    #[test]
    fn test_nodes_of_skips_deleted() {
        let mut g = graph();
        let ids: Vec<_> = (0..3).map(|i| g.add(constant(i)).unwrap()).collect();
        g.delete(ids[1]).unwrap();
        let seen: Vec<_> = g
            .nodes_of_type::<ConstNode>()
            .unwrap()
            .map(Node::id)
            .collect();
        assert_eq!(seen, vec![ids[0], ids[2]]);
        assert!(g.has_nodes_of(NodeSchema::of::<ConstNode>()).unwrap());
        assert!(!g.has_nodes_of(NodeSchema::of::<BeginNode>()).unwrap());
    }

    #[test]
    fn test_nodes_of_non_iterable_type() {
        let g = graph();
        assert_eq!(
            g.nodes_of_type::<AddNode>().err(),
            Some(GraphError::NotIterable("AddNode"))
        );
    }

    #[test]
    fn test_type_list_compaction() {
        let mut g = graph();
        let ids: Vec<_> = (0..4).map(|i| g.add(constant(i)).unwrap()).collect();
        for &id in &ids[..3] {
            g.delete(id).unwrap();
        }
        let slot = NodeSchema::of::<ConstNode>().iterable_id().unwrap() as usize;
        assert_eq!(g.type_list_ids(slot), &[ids[3]]);
    }

    #[test]
    fn test_no_compaction_when_disabled() {
        let config = GraphConfig {
            compact_type_lists: false,
            ..GraphConfig::for_testing()
        };
        let mut g = Graph::with_config(Node::of::<StartNode>(), config).unwrap();
        let ids: Vec<_> = (0..2).map(|i| g.add(constant(i)).unwrap()).collect();
        g.delete(ids[0]).unwrap();
        g.delete(ids[1]).unwrap();
        let slot = NodeSchema::of::<ConstNode>().iterable_id().unwrap() as usize;
        assert_eq!(g.type_list_ids(slot).len(), 2);
        assert_eq!(g.nodes_of_type::<ConstNode>().unwrap().count(), 0);
    }

    #[test]
    fn test_mark_and_new_nodes() {
        let mut g = graph();
        g.add(constant(0)).unwrap();
        g.mark();
        let a = g.add(constant(1)).unwrap();
        let b = g.add(constant(2)).unwrap();
        let seen: Vec<_> = g.new_nodes().map(Node::id).collect();
        assert_eq!(seen, vec![a, b]);
        g.mark();
        assert_eq!(g.new_nodes().count(), 0);
    }

    #[test]
    fn test_iter_and_ids_skip_holes() {
        let mut g = graph();
        let a = g.add(constant(1)).unwrap();
        let b = g.add(constant(2)).unwrap();
        g.delete(a).unwrap();
        assert_eq!(g.ids().collect::<Vec<_>>(), vec![g.root(), b]);
        assert_eq!(g.iter().count(), 2);
    }

    #[test]
    fn test_debug_dump() {
        let mut g = graph();
        let begin = g.add(Node::of::<BeginNode>()).unwrap();
        g.set_edge(g.root(), Position::successor(0), Some(begin))
            .unwrap();
        let dump = format!("{:?}", g);
        assert!(dump.contains("2 nodes"));
        assert!(dump.contains("StartNode -> [#1]"));
        assert!(dump.contains("(pred #0)"));
    }
}
