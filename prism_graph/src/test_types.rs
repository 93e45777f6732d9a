//! Node types shared by the unit tests.

use crate::node::{Node, NodeId};
use crate::schema::{FieldDescriptor, FieldType, NodeSchema, NodeType};

/// Graph root with a single control successor.
pub struct StartNode;

impl NodeType for StartNode {
    const NAME: &'static str = "StartNode";
    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::successor("next")]
    }
}

/// Integer constant; edgeless and value-numbered.
pub struct ConstNode;

impl NodeType for ConstNode {
    const NAME: &'static str = "ConstNode";
    const VALUE_NUMBERABLE: bool = true;
    const ITERABLE: bool = true;
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::data("value", FieldType::Int),
            FieldDescriptor::plain("label", FieldType::Symbol),
        ]
    }
}

/// Common supertype of binary operations.
pub struct BinaryNode;

impl NodeType for BinaryNode {
    const NAME: &'static str = "BinaryNode";
    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::input("x"), FieldDescriptor::input("y")]
    }
}

/// Value-numbered addition.
pub struct AddNode;

impl NodeType for AddNode {
    const NAME: &'static str = "AddNode";
    const VALUE_NUMBERABLE: bool = true;
    fn supertype() -> Option<&'static NodeSchema> {
        Some(NodeSchema::of::<BinaryNode>())
    }
    fn fields() -> Vec<FieldDescriptor> {
        Vec::new()
    }
}

/// Two-way branch.
pub struct IfNode;

impl NodeType for IfNode {
    const NAME: &'static str = "IfNode";
    const SHORT_NAME: Option<&'static str> = Some("Branch");
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::input("condition"),
            FieldDescriptor::successor("true_next"),
            FieldDescriptor::successor("false_next"),
        ]
    }
}

/// Value merge; the list slot is declared before the direct slot.
pub struct PhiNode;

impl NodeType for PhiNode {
    const NAME: &'static str = "PhiNode";
    const VALUE_NUMBERABLE: bool = true;
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::input_list("values", 0),
            FieldDescriptor::input("merge"),
        ]
    }
}

/// Multi-way branch whose case list starts with two null entries.
pub struct SwitchNode;

impl NodeType for SwitchNode {
    const NAME: &'static str = "SwitchNode";
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::input("value"),
            FieldDescriptor::successor_list("cases", 2),
        ]
    }
}

/// Iterable control node with one successor.
pub struct BeginNode;

impl NodeType for BeginNode {
    const NAME: &'static str = "BeginNode";
    const ITERABLE: bool = true;
    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::successor("next")]
    }
}

/// Value-numbered node with only a successor edge.
pub struct AnchorNode;

impl NodeType for AnchorNode {
    const NAME: &'static str = "AnchorNode";
    const VALUE_NUMBERABLE: bool = true;
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::input("guard"),
            FieldDescriptor::successor("next"),
        ]
    }
}

/// Detached integer constant.
pub fn constant(value: i64) -> Node {
    Node::of::<ConstNode>()
        .with_data("value", value)
        .expect("ConstNode declares `value`")
}

/// Detached addition of `x` and `y`.
pub fn add(x: NodeId, y: NodeId) -> Node {
    Node::of::<AddNode>()
        .with_input(0, x)
        .and_then(|n| n.with_input(1, y))
        .expect("AddNode has two direct inputs")
}
