//! Error types for graph and schema operations.
//!
//! Every `GraphError` signals a defect in the calling pass. Operations check
//! their preconditions before mutating, so a failed check leaves the graph
//! unchanged. Verification problems are not
//! errors of a mutation; they are collected by a
//! [`VerificationListener`](crate::graph::VerificationListener) and only
//! surface here when [`Graph::verify`](crate::Graph::verify) wraps them.

use thiserror::Error;

use crate::graph::VerificationFailure;
use crate::node::NodeId;
use crate::schema::{EdgeKind, FieldKind, FieldType, Position};

/// Failures of graph and node operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The id does not name a live node of this graph.
    #[error("node {0:?} is not alive in this graph")]
    NotAlive(NodeId),

    /// The node was already added to a graph (or deleted from one).
    #[error("node {0:?} is not in the initial state")]
    AlreadyAdded(NodeId),

    /// An edge of a node being added points at a node that is not alive.
    #[error("node {node:?} has an edge to {target:?}, which is not alive")]
    DanglingEdge {
        /// The node holding the edge.
        node: NodeId,
        /// The missing target.
        target: NodeId,
    },

    /// `delete` was called on a node that is still used as an input.
    #[error("cannot delete {node:?}: still used by {usages:?}")]
    HasUsages {
        /// The node that was to be deleted.
        node: NodeId,
        /// Nodes that still hold input edges to it.
        usages: Vec<NodeId>,
    },

    /// `delete` was called on a node that is still a successor of another.
    #[error("cannot delete {node:?}: still the successor of {predecessor:?}")]
    HasPredecessor {
        /// The node that was to be deleted.
        node: NodeId,
        /// Its predecessor.
        predecessor: NodeId,
    },

    /// A successor edge would give `target` a second predecessor.
    #[error("{target:?} already has predecessor {existing:?}; cannot also follow {node:?}")]
    PredecessorAlreadySet {
        /// The node that tried to wire the successor edge.
        node: NodeId,
        /// The successor.
        target: NodeId,
        /// The predecessor it already has.
        existing: NodeId,
    },

    /// A scan for an edge to replace found nothing.
    #[error("{node:?} has no {kind:?} edge to {expected:?}")]
    EdgeNotFound {
        /// The node that was scanned.
        node: NodeId,
        /// Input or successor.
        kind: EdgeKind,
        /// The target that should have been there.
        expected: Option<NodeId>,
    },

    /// The node was structurally modified while a cursor walked its edges.
    #[error("{0:?} was modified during edge iteration")]
    ConcurrentModification(NodeId),

    /// `unique` or `find_duplicate` was called for a type without value numbering.
    #[error("node type {0} is not value-numberable")]
    NotValueNumberable(&'static str),

    /// Per-type iteration was requested for a non-iterable type.
    #[error("node type {0} is not iterable")]
    NotIterable(&'static str),

    /// The position does not exist in the node's schema.
    #[error("{position} is not a valid position for {type_name}")]
    InvalidPosition {
        /// The schema the position was resolved against.
        type_name: &'static str,
        /// The offending position.
        position: Position,
    },

    /// Two nodes of different types were used where one type is required.
    #[error("expected a node of type {expected}, found {found}")]
    TypeMismatch {
        /// Required type.
        expected: &'static str,
        /// Actual type.
        found: &'static str,
    },

    /// No data or plain field of that name exists.
    #[error("node type {type_name} has no field `{field}`")]
    UnknownField {
        /// The schema that was searched.
        type_name: &'static str,
        /// The name that was looked up.
        field: String,
    },

    /// A data value does not match the declared field type.
    #[error("field `{field}` is declared {expected:?}, got a {found:?} value")]
    DataTypeMismatch {
        /// The field that was written.
        field: &'static str,
        /// Declared type.
        expected: FieldType,
        /// Type of the supplied value.
        found: FieldType,
    },

    /// One or more nodes failed verification.
    #[error("graph verification failed with {} problem(s)", .0.len())]
    Verification(Vec<VerificationFailure>),
}

/// Failures while building a [`NodeSchema`](crate::schema::NodeSchema).
///
/// These describe a malformed node type declaration and are fatal when they
/// reach [`NodeSchema::of`](crate::schema::NodeSchema::of).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The declared kind cannot hold a value of the declared type.
    #[error("{type_name}.{field}: a {kind:?} field cannot have type {ty:?}")]
    IncompatibleField {
        /// Type being registered.
        type_name: &'static str,
        /// Offending field.
        field: &'static str,
        /// Declared kind.
        kind: FieldKind,
        /// Declared type.
        ty: FieldType,
    },

    /// A field name occurs twice across the type and its supertypes.
    #[error("{type_name}.{field} is declared more than once")]
    DuplicateField {
        /// Type being registered.
        type_name: &'static str,
        /// Repeated field name.
        field: &'static str,
    },
}

/// Result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
