//! Node types shared by the integration tests.

#![allow(dead_code)]

use prism_graph::schema::{FieldDescriptor, FieldType};
use prism_graph::{Graph, GraphConfig, Node, NodeId, NodeSchema, NodeType};

pub struct StartNode;

impl NodeType for StartNode {
    const NAME: &'static str = "StartNode";
    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::successor("next")]
    }
}

pub struct ConstantNode;

impl NodeType for ConstantNode {
    const NAME: &'static str = "ConstantNode";
    const VALUE_NUMBERABLE: bool = true;
    const ITERABLE: bool = true;
    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::data("value", FieldType::Int)]
    }
}

pub struct ArithmeticNode;

impl NodeType for ArithmeticNode {
    const NAME: &'static str = "ArithmeticNode";
    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::input("x"), FieldDescriptor::input("y")]
    }
}

pub struct MulNode;

impl NodeType for MulNode {
    const NAME: &'static str = "MulNode";
    const VALUE_NUMBERABLE: bool = true;
    const ITERABLE: bool = true;
    fn supertype() -> Option<&'static NodeSchema> {
        Some(NodeSchema::of::<ArithmeticNode>())
    }
    fn fields() -> Vec<FieldDescriptor> {
        Vec::new()
    }
}

/// Fixed node with a value input and one control successor.
pub struct GuardNode;

impl NodeType for GuardNode {
    const NAME: &'static str = "GuardNode";
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::input("condition"),
            FieldDescriptor::successor("next"),
        ]
    }
}

pub struct MergeNode;

impl NodeType for MergeNode {
    const NAME: &'static str = "MergeNode";
    const ITERABLE: bool = true;
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::input_list("ends", 0),
            FieldDescriptor::successor("next"),
        ]
    }
}

pub struct ReturnNode;

impl NodeType for ReturnNode {
    const NAME: &'static str = "ReturnNode";
    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::input("result")]
    }
}

pub fn new_graph() -> Graph {
    Graph::with_config(Node::of::<StartNode>(), GraphConfig::for_testing())
        .expect("empty root is always addable")
}

pub fn constant(value: i64) -> Node {
    Node::of::<ConstantNode>()
        .with_data("value", value)
        .expect("ConstantNode has a value field")
}

pub fn mul(x: NodeId, y: NodeId) -> Node {
    Node::of::<MulNode>()
        .with_input(0, x)
        .and_then(|n| n.with_input(1, y))
        .expect("MulNode has two inputs")
}

pub fn guard(condition: NodeId) -> Node {
    Node::of::<GuardNode>()
        .with_input(0, condition)
        .expect("GuardNode has a condition input")
}

/// Every input edge has a matching usage and every successor edge a
/// matching predecessor, checked from the public API only.
pub fn assert_back_edges_symmetric(graph: &Graph) {
    for node in graph.iter() {
        for target in node.inputs() {
            let edges = node.inputs().filter(|&t| t == target).count();
            let usages = graph
                .node(target)
                .usages()
                .iter()
                .filter(|&&u| u == node.id())
                .count();
            assert_eq!(edges, usages, "{:?} -> {:?}", node.id(), target);
        }
        for target in node.successors() {
            assert_eq!(graph.node(target).predecessor(), Some(node.id()));
        }
    }
    assert_eq!(graph.verify(), Ok(()));
}
