//! IR node definitions.
//!
//! A node is one operation or value of the graph. Its shape (edge slots and
//! data fields) comes from its [`NodeSchema`]; the node itself stores:
//!
//! - **Identity**: id within its graph and the graph it belongs to
//! - **Edges**: input and successor slots
//! - **Back-edges**: usages (nodes using this one as input) and the single
//!   predecessor (node having this one as successor)
//! - **Values**: data and plain fields
//! - **Modification counter**: detects edge mutation under an [`EdgeCursor`]
//!
//! # Lifecycle
//!
//! A node starts **Initial**: built with [`Node::new`] or [`Node::of`], not
//! yet in a graph, edges set freely. [`Graph::add`](crate::Graph::add) makes
//! it **Alive** and wires the back-edges of the edges it already has. From
//! then on it is only changed through the graph, which keeps back-edges
//! symmetric. [`Graph::delete`](crate::Graph::delete) makes it **Deleted**.

mod cursor;
mod edges;
mod edit;

pub use cursor::EdgeCursor;
pub use edges::{EdgePositions, EdgeSlots, Edges, NodeList};

use smallvec::SmallVec;

use crate::arena::Id;
use crate::error::{GraphError, GraphResult};
use crate::graph::GraphId;
use crate::schema::{DataValue, EdgeKind, NodeSchema, NodeType, Position};

// =============================================================================
// Node ID Type Alias
// =============================================================================

/// Unique identifier for a node in the graph.
pub type NodeId = Id<Node>;

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Built but not yet added to a graph.
    Initial,
    /// Registered in a graph.
    Alive,
    /// Removed from its graph.
    Deleted,
}

// =============================================================================
// Node
// =============================================================================

/// A node of the graph.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    graph: Option<GraphId>,
    schema: &'static NodeSchema,
    pub(crate) inputs: EdgeSlots,
    pub(crate) successors: EdgeSlots,
    /// Data fields, then plain fields, in schema order.
    pub(crate) values: SmallVec<[DataValue; 2]>,
    pub(crate) usages: SmallVec<[NodeId; 4]>,
    pub(crate) predecessor: Option<NodeId>,
    mod_count: u32,
}

impl Node {
    /// Create a detached node of the given type, all edges null and all
    /// values defaulted.
    pub fn new(schema: &'static NodeSchema) -> Self {
        Node {
            id: NodeId::INVALID,
            graph: None,
            schema,
            inputs: EdgeSlots::for_layout(schema.inputs()),
            successors: EdgeSlots::for_layout(schema.successors()),
            values: schema.default_values().collect(),
            usages: SmallVec::new(),
            predecessor: None,
            mod_count: 0,
        }
    }

    /// Create a detached node of type `T`.
    pub fn of<T: NodeType>() -> Self {
        Self::new(NodeSchema::of::<T>())
    }

    /// A detached copy: same type and values, every edge null, no back-edges.
    pub fn detached_copy(&self) -> Self {
        Node {
            values: self.values.clone(),
            ..Node::new(self.schema)
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Id in the owning graph (a sentinel unless alive).
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Owning graph, set once when the node is added.
    #[inline]
    pub fn graph_id(&self) -> Option<GraphId> {
        self.graph
    }

    /// Lifecycle state.
    pub fn state(&self) -> NodeState {
        if self.id == NodeId::INVALID {
            NodeState::Initial
        } else if self.id == NodeId::DELETED {
            NodeState::Deleted
        } else {
            NodeState::Alive
        }
    }

    /// Whether the node is registered in a graph.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state() == NodeState::Alive
    }

    /// Whether the node was deleted from its graph.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.state() == NodeState::Deleted
    }

    /// Schema of the node's type.
    #[inline]
    pub fn schema(&self) -> &'static NodeSchema {
        self.schema
    }

    /// Short type name.
    #[inline]
    pub fn short_name(&self) -> &'static str {
        self.schema.short_name()
    }

    /// Whether the node is of type `T`.
    pub fn is<T: NodeType>(&self) -> bool {
        std::ptr::eq(self.schema, NodeSchema::of::<T>())
    }

    /// Structural modification counter.
    #[inline]
    pub fn mod_count(&self) -> u32 {
        self.mod_count
    }

    #[inline]
    pub(crate) fn bump_mod_count(&mut self) {
        self.mod_count = self.mod_count.wrapping_add(1);
    }

    pub(crate) fn attach(&mut self, id: NodeId, graph: GraphId) {
        self.id = id;
        self.graph = Some(graph);
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.id = NodeId::DELETED;
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// Non-null inputs in slot order.
    #[inline]
    pub fn inputs(&self) -> Edges<'_> {
        Edges::new(&self.inputs, EdgeKind::Input)
    }

    /// Non-null successors in slot order.
    #[inline]
    pub fn successors(&self) -> Edges<'_> {
        Edges::new(&self.successors, EdgeKind::Successor)
    }

    /// Non-null inputs with their positions.
    #[inline]
    pub fn input_positions(&self) -> EdgePositions<'_> {
        EdgePositions::new(&self.inputs, EdgeKind::Input)
    }

    /// Non-null successors with their positions.
    #[inline]
    pub fn successor_positions(&self) -> EdgePositions<'_> {
        EdgePositions::new(&self.successors, EdgeKind::Successor)
    }

    /// Raw input slots.
    #[inline]
    pub fn input_slots(&self) -> &EdgeSlots {
        &self.inputs
    }

    /// Raw successor slots.
    #[inline]
    pub fn successor_slots(&self) -> &EdgeSlots {
        &self.successors
    }

    /// Target at `position`.
    pub fn edge(&self, position: Position) -> GraphResult<Option<NodeId>> {
        self.schema.get(self, position)
    }

    /// Direct input slot `index`, or `None` if it is null or out of range.
    pub fn input(&self, index: usize) -> Option<NodeId> {
        self.inputs.direct.get(index).copied().flatten()
    }

    /// Direct successor slot `index`, or `None` if it is null or out of range.
    pub fn successor(&self, index: usize) -> Option<NodeId> {
        self.successors.direct.get(index).copied().flatten()
    }

    /// Input list slot `index` (schema slot index, not list index).
    pub fn input_list(&self, index: usize) -> Option<&NodeList> {
        let direct = self.inputs.direct.len();
        index.checked_sub(direct).and_then(|i| self.inputs.lists.get(i))
    }

    /// Successor list slot `index` (schema slot index, not list index).
    pub fn successor_list(&self, index: usize) -> Option<&NodeList> {
        let direct = self.successors.direct.len();
        index.checked_sub(direct).and_then(|i| self.successors.lists.get(i))
    }

    /// Whether any slot of the node holds an edge.
    pub fn has_edges(&self) -> bool {
        !self.inputs.is_all_null() || !self.successors.is_all_null()
    }

    // =========================================================================
    // Back-edges
    // =========================================================================

    /// Nodes holding an input edge to this node, once per edge.
    #[inline]
    pub fn usages(&self) -> &[NodeId] {
        &self.usages
    }

    /// Number of input edges pointing at this node.
    #[inline]
    pub fn usage_count(&self) -> usize {
        self.usages.len()
    }

    /// The node holding the successor edge to this node.
    #[inline]
    pub fn predecessor(&self) -> Option<NodeId> {
        self.predecessor
    }

    pub(crate) fn remove_usage(&mut self, user: NodeId) -> bool {
        match self.usages.iter().position(|&u| u == user) {
            Some(pos) => {
                self.usages.remove(pos);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Detached Construction
    // =========================================================================

    fn ensure_initial(&self) -> GraphResult<()> {
        match self.state() {
            NodeState::Initial => Ok(()),
            _ => Err(GraphError::AlreadyAdded(self.id)),
        }
    }

    /// Set an edge of a node that has not been added yet.
    pub fn set_edge(&mut self, position: Position, target: Option<NodeId>) -> GraphResult<()> {
        self.ensure_initial()?;
        let schema = self.schema;
        schema.set(self, position, target)?;
        Ok(())
    }

    /// Append to a list slot of a node that has not been added yet.
    pub fn push_edge(&mut self, kind: EdgeKind, index: usize, target: NodeId) -> GraphResult<()> {
        let len = self.list_len(kind, index)?;
        self.set_edge(
            Position {
                kind,
                index,
                sub_index: Some(len),
            },
            Some(target),
        )
    }

    pub(crate) fn list_len(&self, kind: EdgeKind, index: usize) -> GraphResult<usize> {
        let list = match kind {
            EdgeKind::Input => self.input_list(index),
            EdgeKind::Successor => self.successor_list(index),
        };
        list.map(NodeList::len).ok_or(GraphError::InvalidPosition {
            type_name: self.schema.name(),
            position: Position {
                kind,
                index,
                sub_index: Some(0),
            },
        })
    }

    /// Builder form of [`set_edge`](Node::set_edge) for direct input slots.
    pub fn with_input(mut self, index: usize, target: NodeId) -> GraphResult<Self> {
        self.set_edge(Position::input(index), Some(target))?;
        Ok(self)
    }

    /// Builder form of [`push_edge`](Node::push_edge) for input lists.
    pub fn with_list_input(mut self, index: usize, target: NodeId) -> GraphResult<Self> {
        self.push_edge(EdgeKind::Input, index, target)?;
        Ok(self)
    }

    /// Builder form of [`set_edge`](Node::set_edge) for direct successor slots.
    pub fn with_successor(mut self, index: usize, target: NodeId) -> GraphResult<Self> {
        self.set_edge(Position::successor(index), Some(target))?;
        Ok(self)
    }

    /// Builder form of [`set_data`](Node::set_data).
    pub fn with_data(mut self, name: &str, value: impl Into<DataValue>) -> GraphResult<Self> {
        self.set_data(name, value)?;
        Ok(self)
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Value of the data or plain field `name`.
    pub fn data(&self, name: &str) -> GraphResult<&DataValue> {
        let index = self.value_index(name)?;
        Ok(&self.values[index])
    }

    /// Data field values, in value-numbering order.
    pub fn data_values(&self) -> &[DataValue] {
        &self.values[..self.schema.data_fields().len()]
    }

    /// Write the data or plain field `name`; the value must match the
    /// declared type.
    pub fn set_data(&mut self, name: &str, value: impl Into<DataValue>) -> GraphResult<DataValue> {
        let index = self.value_index(name)?;
        let value = value.into();
        let schema = self.schema;
        let field = &schema.value_fields()[index];
        if value.field_type() != field.ty {
            return Err(GraphError::DataTypeMismatch {
                field: field.name,
                expected: field.ty,
                found: value.field_type(),
            });
        }
        Ok(std::mem::replace(&mut self.values[index], value))
    }

    fn value_index(&self, name: &str) -> GraphResult<usize> {
        self.schema
            .value_index(name)
            .ok_or_else(|| GraphError::UnknownField {
                type_name: self.schema.name(),
                field: name.to_string(),
            })
    }

    /// Whether `name` is a data (value-numbered) field rather than plain.
    pub fn is_data_field(&self, name: &str) -> bool {
        self.schema
            .data_fields()
            .iter()
            .any(|f| f.name == name)
    }

    // =========================================================================
    // Equality
    // =========================================================================

    /// Value number (0 for types without value numbering).
    #[inline]
    pub fn value_number(&self) -> u64 {
        self.schema.value_number(self)
    }

    /// GVN equality: nodes of a value-numberable type are equal when their
    /// data and edges match; any other node is only equal to itself.
    pub fn value_equals(&self, other: &Node) -> bool {
        if !std::ptr::eq(self.schema, other.schema) {
            return false;
        }
        if !self.schema.is_value_numberable() {
            return std::ptr::eq(self, other)
                || (self.is_alive() && self.id == other.id && self.graph == other.graph);
        }
        self.schema.structural_equal(self, other) && self.schema.edges_equal(self, other)
    }

    /// Data fields as `("data.<name>", value)` pairs.
    pub fn debug_properties(&self) -> Vec<(String, DataValue)> {
        self.schema.debug_properties(self)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name())?;
        for value in self.data_values() {
            write!(f, " {}", value)?;
        }
        if !self.inputs.is_all_null() {
            write!(f, " {:?}", self.inputs().collect::<Vec<_>>())?;
        }
        if !self.successors.is_all_null() {
            write!(f, " -> {:?}", self.successors().collect::<Vec<_>>())?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
