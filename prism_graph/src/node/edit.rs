//! Node mutation.
//!
//! Alive nodes are edited through the graph so that every forward edge
//! change is mirrored in the back-edges of the old and new targets. Each
//! operation checks everything it needs before touching the graph.

use smallvec::SmallVec;

use super::{EdgeCursor, Node, NodeId};
use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;
use crate::schema::{DataValue, EdgeKind, Position};

impl Graph {
    // =========================================================================
    // Back-edges
    // =========================================================================

    /// Wire the back-edges of a freshly registered node.
    pub(crate) fn initialize(&mut self, id: NodeId) -> GraphResult<()> {
        let node = self.live(id)?;
        let inputs: SmallVec<[NodeId; 4]> = node.inputs().collect();
        let successors: SmallVec<[NodeId; 4]> = node.successors().collect();
        for target in inputs {
            self.live_mut(target)?.usages.push(id);
        }
        for target in successors {
            self.live_mut(target)?.predecessor = Some(id);
        }
        Ok(())
    }

    fn remove_usage(&mut self, target: NodeId, user: NodeId) {
        if let Ok(node) = self.live_mut(target) {
            let removed = node.remove_usage(user);
            debug_assert!(removed, "{:?} was not a usage of {:?}", user, target);
        }
    }

    fn clear_predecessor(&mut self, target: NodeId, pred: NodeId) {
        if let Ok(node) = self.live_mut(target) {
            debug_assert_eq!(node.predecessor, Some(pred));
            node.predecessor = None;
        }
    }

    pub(crate) fn check_target(&self, target: Option<NodeId>) -> GraphResult<()> {
        match target {
            Some(target) => self.live(target).map(|_| ()),
            None => Ok(()),
        }
    }

    /// `node` may take `target` as a new successor only if nothing else
    /// precedes it.
    pub(crate) fn check_free_successor(&self, node: NodeId, target: NodeId) -> GraphResult<()> {
        match self.live(target)?.predecessor() {
            Some(existing) => Err(GraphError::PredecessorAlreadySet {
                node,
                target,
                existing,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn check_deletable(&self, id: NodeId) -> GraphResult<()> {
        let node = self.live(id)?;
        if !node.usages().is_empty() {
            return Err(GraphError::HasUsages {
                node: id,
                usages: node.usages().to_vec(),
            });
        }
        if let Some(predecessor) = node.predecessor() {
            return Err(GraphError::HasPredecessor {
                node: id,
                predecessor,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Edge Mutation
    // =========================================================================

    /// Set the edge at `position` of `id` to `target`, updating back-edges
    /// of the old and new target. Returns the previous target.
    pub fn set_edge(
        &mut self,
        id: NodeId,
        position: Position,
        target: Option<NodeId>,
    ) -> GraphResult<Option<NodeId>> {
        let node = self.live(id)?;
        let schema = node.schema();
        schema.check_position(position)?;
        // List positions past the end read as null; `set` pads them.
        let old = schema.get(node, position).unwrap_or(None);
        if old == target {
            return Ok(old);
        }
        self.check_target(target)?;
        if let (EdgeKind::Successor, Some(target)) = (position.kind, target) {
            self.check_free_successor(id, target)?;
        }

        schema.set(self.live_mut(id)?, position, target)?;
        match position.kind {
            EdgeKind::Input => {
                if let Some(old) = old {
                    self.remove_usage(old, id);
                }
                if let Some(target) = target {
                    self.live_mut(target)?.usages.push(id);
                }
            }
            EdgeKind::Successor => {
                if let Some(old) = old {
                    self.clear_predecessor(old, id);
                }
                if let Some(target) = target {
                    self.live_mut(target)?.predecessor = Some(id);
                }
            }
        }
        Ok(old)
    }

    /// Append `target` to the list slot `index` of `id`.
    pub fn push_edge(
        &mut self,
        id: NodeId,
        kind: EdgeKind,
        index: usize,
        target: NodeId,
    ) -> GraphResult<Position> {
        let len = self.live(id)?.list_len(kind, index)?;
        let position = Position {
            kind,
            index,
            sub_index: Some(len),
        };
        self.set_edge(id, position, Some(target))?;
        Ok(position)
    }

    /// Write a data or plain field of an alive node.
    ///
    /// A node found by [`unique`](Graph::unique) stays findable under its
    /// new value.
    pub fn set_data(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<DataValue>,
    ) -> GraphResult<DataValue> {
        let node = self.live_mut(id)?;
        let before = node.value_number();
        let old = node.set_data(name, value)?;
        let after = node.value_number();
        if before != after {
            self.rekey(id, before, after);
        }
        Ok(old)
    }

    fn replace_first(
        &mut self,
        id: NodeId,
        kind: EdgeKind,
        old: NodeId,
        new: Option<NodeId>,
    ) -> GraphResult<Position> {
        let node = self.live(id)?;
        let mut positions = match kind {
            EdgeKind::Input => node.input_positions(),
            EdgeKind::Successor => node.successor_positions(),
        };
        let (position, _) = positions
            .find(|&(_, target)| target == old)
            .ok_or(GraphError::EdgeNotFound {
                node: id,
                kind,
                expected: Some(old),
            })?;
        self.set_edge(id, position, new)?;
        Ok(position)
    }

    /// Redirect the first input of `id` that targets `old` to `new`.
    pub fn replace_first_input(
        &mut self,
        id: NodeId,
        old: NodeId,
        new: Option<NodeId>,
    ) -> GraphResult<Position> {
        self.replace_first(id, EdgeKind::Input, old, new)
    }

    /// Redirect the first successor of `id` that targets `old` to `new`.
    pub fn replace_first_successor(
        &mut self,
        id: NodeId,
        old: NodeId,
        new: Option<NodeId>,
    ) -> GraphResult<Position> {
        self.replace_first(id, EdgeKind::Successor, old, new)
    }

    /// Null every input of `id`, removing it from its inputs' usages.
    pub fn clear_inputs(&mut self, id: NodeId) -> GraphResult<()> {
        let node = self.live(id)?;
        let schema = node.schema();
        let targets: SmallVec<[NodeId; 4]> = node.inputs().collect();
        schema.clear_inputs(self.live_mut(id)?);
        for target in targets {
            self.remove_usage(target, id);
        }
        Ok(())
    }

    /// Null every successor of `id`, clearing their predecessor.
    pub fn clear_successors(&mut self, id: NodeId) -> GraphResult<()> {
        let node = self.live(id)?;
        let schema = node.schema();
        let targets: SmallVec<[NodeId; 4]> = node.successors().collect();
        schema.clear_successors(self.live_mut(id)?);
        for target in targets {
            self.clear_predecessor(target, id);
        }
        Ok(())
    }

    // =========================================================================
    // Replacement
    // =========================================================================

    /// Make every node that uses `id` as an input use `other` instead.
    /// `id` ends up with no usages; `other` gains all of them.
    pub fn replace_at_usages(&mut self, id: NodeId, other: Option<NodeId>) -> GraphResult<()> {
        if other == Some(id) {
            return Ok(());
        }
        self.check_target(other)?;
        let usages: SmallVec<[NodeId; 4]> = self.live(id)?.usages.clone();
        for &user in &usages {
            if !self.live(user)?.schema().input_contains(self.node(user), id) {
                return Err(GraphError::EdgeNotFound {
                    node: user,
                    kind: EdgeKind::Input,
                    expected: Some(id),
                });
            }
        }

        // One usage entry per input edge, so each entry replaces one edge.
        for &user in &usages {
            let node = self.live_mut(user)?;
            let schema = node.schema();
            schema.replace_first(node, EdgeKind::Input, id, other);
        }
        self.live_mut(id)?.usages.clear();
        if let Some(other) = other {
            self.live_mut(other)?.usages.extend(usages);
        }
        log::trace!("{}: replaced {:?} by {:?} at usages", self.id(), id, other);
        Ok(())
    }

    /// Point the successor edge that leads to `id` at `other` instead.
    pub fn replace_at_predecessor(&mut self, id: NodeId, other: Option<NodeId>) -> GraphResult<()> {
        let Some(predecessor) = self.live(id)?.predecessor() else {
            return Ok(());
        };
        if other == Some(id) {
            return Ok(());
        }
        self.replace_first_successor(predecessor, id, other)?;
        Ok(())
    }

    /// Replace `id` by `other` everywhere and delete it. Outgoing successor
    /// edges of `id` are dropped, not transferred.
    pub fn replace_and_delete(&mut self, id: NodeId, other: Option<NodeId>) -> GraphResult<Node> {
        let node = self.live(id)?;
        if other == Some(id) {
            self.check_deletable(id)?;
        }
        self.check_target(other)?;
        if let (Some(predecessor), Some(other)) = (node.predecessor(), other) {
            // A successor of `id` is released by the clear below.
            if self.live(other)?.predecessor() != Some(id) {
                self.check_free_successor(predecessor, other)?;
            }
        }

        self.clear_successors(id)?;
        self.replace_at_usages(id, other)?;
        self.replace_at_predecessor(id, other)?;
        self.delete(id)
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Delete a node that nothing refers to any more. Its own edges are
    /// cleared first, so its former inputs and successors lose the
    /// corresponding back-edges. Returns the deleted node.
    pub fn delete(&mut self, id: NodeId) -> GraphResult<Node> {
        self.check_deletable(id)?;
        self.clear_inputs(id)?;
        self.clear_successors(id)?;
        let node = self.unregister(id)?;
        log::trace!("{}: deleted {:?} {}", self.id(), id, node.short_name());
        Ok(node)
    }

    // =========================================================================
    // Copies
    // =========================================================================

    /// Add a copy of `id` with the same values and no edges.
    pub fn clone_node(&mut self, id: NodeId) -> GraphResult<NodeId> {
        let copy = self.live(id)?.detached_copy();
        self.add(copy)
    }

    /// Add a copy of `id` with the same values and no edges to `target`.
    pub fn clone_node_into(&self, id: NodeId, target: &mut Graph) -> GraphResult<NodeId> {
        let copy = self.live(id)?.detached_copy();
        target.add(copy)
    }

    /// Add a copy of `id` that shares its inputs but has no successors.
    pub fn copy_with_inputs(&mut self, id: NodeId) -> GraphResult<NodeId> {
        let node = self.live(id)?;
        let mut copy = node.detached_copy();
        node.schema().copy_inputs(node, &mut copy)?;
        self.add(copy)
    }

    // =========================================================================
    // Edge Cursors
    // =========================================================================

    /// A cursor over the inputs of `id` that does not borrow the graph.
    pub fn input_cursor(&self, id: NodeId) -> GraphResult<EdgeCursor> {
        EdgeCursor::new(self, id, EdgeKind::Input)
    }

    /// A cursor over the successors of `id` that does not borrow the graph.
    pub fn successor_cursor(&self, id: NodeId) -> GraphResult<EdgeCursor> {
        EdgeCursor::new(self, id, EdgeKind::Successor)
    }
}
