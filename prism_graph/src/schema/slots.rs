//! Schema-driven edge primitives.
//!
//! These operate on a single node's slots and never touch back-edges; the
//! graph calls them and keeps usages and predecessors in sync itself.

use super::{EdgeKind, NodeSchema, Position};
use crate::error::{GraphError, GraphResult};
use crate::node::{EdgeSlots, Node, NodeId};

impl NodeSchema {
    #[inline]
    fn slots_of<'a>(&self, node: &'a Node, kind: EdgeKind) -> &'a EdgeSlots {
        debug_assert!(std::ptr::eq(self, node.schema()));
        match kind {
            EdgeKind::Input => &node.inputs,
            EdgeKind::Successor => &node.successors,
        }
    }

    #[inline]
    fn slots_of_mut<'a>(&self, node: &'a mut Node, kind: EdgeKind) -> &'a mut EdgeSlots {
        debug_assert!(std::ptr::eq(self, node.schema()));
        match kind {
            EdgeKind::Input => &mut node.inputs,
            EdgeKind::Successor => &mut node.successors,
        }
    }

    fn invalid(&self, position: Position) -> GraphError {
        GraphError::InvalidPosition {
            type_name: self.name(),
            position,
        }
    }

    /// Check that `position` names a slot of this schema with the right
    /// shape (direct slots take no sub-index, list slots need one).
    pub fn check_position(&self, position: Position) -> GraphResult<()> {
        let layout = self.layout(position.kind);
        let shape_ok = match position.sub_index {
            None => position.index < layout.direct_count(),
            Some(_) => layout.is_list(position.index),
        };
        if shape_ok {
            Ok(())
        } else {
            Err(self.invalid(position))
        }
    }

    /// Target at `position`. List positions past the end are invalid.
    pub fn get(&self, node: &Node, position: Position) -> GraphResult<Option<NodeId>> {
        self.check_position(position)?;
        let slots = self.slots_of(node, position.kind);
        match position.sub_index {
            None => Ok(slots.direct[position.index]),
            Some(sub) => {
                let list = &slots.lists[position.index - slots.direct.len()];
                if sub < list.len() {
                    Ok(list.get(sub))
                } else {
                    Err(self.invalid(position))
                }
            }
        }
    }

    /// Write `value` at `position` and return the previous target. List
    /// slots grow with null padding as needed.
    pub fn set(
        &self,
        node: &mut Node,
        position: Position,
        value: Option<NodeId>,
    ) -> GraphResult<Option<NodeId>> {
        self.check_position(position)?;
        node.bump_mod_count();
        let slots = self.slots_of_mut(node, position.kind);
        let old = match position.sub_index {
            None => std::mem::replace(&mut slots.direct[position.index], value),
            Some(sub) => {
                let direct = slots.direct.len();
                slots.lists[position.index - direct].set(sub, value)
            }
        };
        Ok(old)
    }

    /// Replace the first edge of `kind` that targets `old`, scanning direct
    /// slots and then list slots. Returns where the replacement happened.
    pub fn replace_first(
        &self,
        node: &mut Node,
        kind: EdgeKind,
        old: NodeId,
        new: Option<NodeId>,
    ) -> Option<Position> {
        let slots = self.slots_of_mut(node, kind);
        let position = if let Some(index) = slots.direct.iter().position(|t| *t == Some(old)) {
            slots.direct[index] = new;
            Position {
                kind,
                index,
                sub_index: None,
            }
        } else {
            let direct = slots.direct.len();
            slots
                .lists
                .iter_mut()
                .enumerate()
                .find_map(|(i, list)| {
                    list.replace_first(old, new).map(|sub| Position {
                        kind,
                        index: direct + i,
                        sub_index: Some(sub),
                    })
                })?
        };
        node.bump_mod_count();
        Some(position)
    }

    /// Replace the first input edge to `old`; `false` if there is none.
    pub fn replace_first_input(&self, node: &mut Node, old: NodeId, new: Option<NodeId>) -> bool {
        self.replace_first(node, EdgeKind::Input, old, new).is_some()
    }

    /// Replace the first successor edge to `old`; `false` if there is none.
    pub fn replace_first_successor(
        &self,
        node: &mut Node,
        old: NodeId,
        new: Option<NodeId>,
    ) -> bool {
        self.replace_first(node, EdgeKind::Successor, old, new).is_some()
    }

    /// Null every direct slot and replace every list with a fresh one of
    /// its declared initial size.
    pub fn clear_edges(&self, node: &mut Node, kind: EdgeKind) {
        let slots = self.slots_of_mut(node, kind);
        slots.direct.iter_mut().for_each(|t| *t = None);
        for list in slots.lists.iter_mut() {
            *list = list.fresh();
        }
        node.bump_mod_count();
    }

    /// Clear all input slots.
    pub fn clear_inputs(&self, node: &mut Node) {
        self.clear_edges(node, EdgeKind::Input);
    }

    /// Clear all successor slots.
    pub fn clear_successors(&self, node: &mut Node) {
        self.clear_edges(node, EdgeKind::Successor);
    }

    /// Copy the slots of `kind` from `from` into `into`; both must be of
    /// this type.
    pub fn copy_edges(&self, from: &Node, into: &mut Node, kind: EdgeKind) -> GraphResult<()> {
        for schema in [from.schema(), into.schema()] {
            if !std::ptr::eq(schema, self) {
                return Err(GraphError::TypeMismatch {
                    expected: self.name(),
                    found: schema.name(),
                });
            }
        }
        let source = self.slots_of(from, kind).clone();
        *self.slots_of_mut(into, kind) = source;
        into.bump_mod_count();
        Ok(())
    }

    /// Copy input slots from `from` into `into`.
    pub fn copy_inputs(&self, from: &Node, into: &mut Node) -> GraphResult<()> {
        self.copy_edges(from, into, EdgeKind::Input)
    }

    /// Copy successor slots from `from` into `into`.
    pub fn copy_successors(&self, from: &Node, into: &mut Node) -> GraphResult<()> {
        self.copy_edges(from, into, EdgeKind::Successor)
    }

    /// Every input and successor slot of `a` and `b` holds the same targets
    /// in the same order, nulls included.
    pub fn edges_equal(&self, a: &Node, b: &Node) -> bool {
        std::ptr::eq(a.schema(), b.schema())
            && self.slots_of(a, EdgeKind::Input) == self.slots_of(b, EdgeKind::Input)
            && self.slots_of(a, EdgeKind::Successor) == self.slots_of(b, EdgeKind::Successor)
    }

    /// Whether some input of `node` is `target`.
    pub fn input_contains(&self, node: &Node, target: NodeId) -> bool {
        self.slots_of(node, EdgeKind::Input).contains(target)
    }

    /// Whether some successor of `node` is `target`.
    pub fn successor_contains(&self, node: &Node, target: NodeId) -> bool {
        self.slots_of(node, EdgeKind::Successor).contains(target)
    }
}
