//! Mutable sea-of-nodes graph core for Prism's optimizing tiers.
//!
//! Graph engine with:
//! - Schema-described node types (edge slots and data fields)
//! - Back-edges kept symmetric on every edge mutation
//! - Global value numbering
//! - Subgraph duplication within and across graphs
//!
//! # Example
//!
//! ```
//! use prism_graph::schema::{FieldDescriptor, FieldType};
//! use prism_graph::{Graph, Node, NodeType};
//!
//! struct StartNode;
//! impl NodeType for StartNode {
//!     const NAME: &'static str = "StartNode";
//!     fn fields() -> Vec<FieldDescriptor> {
//!         vec![FieldDescriptor::successor("next")]
//!     }
//! }
//!
//! struct ConstNode;
//! impl NodeType for ConstNode {
//!     const NAME: &'static str = "ConstNode";
//!     const VALUE_NUMBERABLE: bool = true;
//!     fn fields() -> Vec<FieldDescriptor> {
//!         vec![FieldDescriptor::data("value", FieldType::Int)]
//!     }
//! }
//!
//! let mut graph = Graph::new(Node::of::<StartNode>()).unwrap();
//! let a = graph.unique(Node::of::<ConstNode>().with_data("value", 1i64).unwrap()).unwrap();
//! let b = graph.unique(Node::of::<ConstNode>().with_data("value", 1i64).unwrap()).unwrap();
//! assert_eq!(a, b);
//! assert_eq!(graph.node_count(), 2);
//! ```

pub mod arena;
pub mod config;
pub mod error;
pub mod graph;
pub mod node;
pub mod schema;

#[cfg(test)]
mod test_types;

pub use config::{DuplicateSearch, GraphConfig};
pub use error::{GraphError, GraphResult, SchemaError};
pub use graph::{
    Graph, GraphId, NodeCursor, TypeCursor, TypedNodes, VerificationFailure, VerificationListener,
};
pub use node::{EdgeCursor, Node, NodeId, NodeState};
pub use schema::{DataValue, EdgeKind, NodeSchema, NodeType, Position};
