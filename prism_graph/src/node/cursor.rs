//! Edge cursor that survives graph mutation.

use super::edges::SlotWalk;
use super::NodeId;
use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;
use crate::schema::{EdgeKind, Position};

/// Walks the non-null edges of one node without borrowing the graph.
///
/// The cursor records the node's modification counter when created. Passes
/// may mutate *other* nodes between steps; if the walked node itself gains
/// or loses an edge, the next step fails with
/// [`GraphError::ConcurrentModification`] instead of yielding stale data.
/// Once exhausted or failed, the cursor stays that way.
#[derive(Debug, Clone)]
pub struct EdgeCursor {
    node: NodeId,
    kind: EdgeKind,
    mod_count: u32,
    walk: SlotWalk,
    done: bool,
}

impl EdgeCursor {
    pub(crate) fn new(graph: &Graph, node: NodeId, kind: EdgeKind) -> GraphResult<Self> {
        let mod_count = graph.live(node)?.mod_count();
        Ok(Self {
            node,
            kind,
            mod_count,
            walk: SlotWalk::default(),
            done: false,
        })
    }

    /// The node being walked.
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Next edge and its position, `Ok(None)` once all edges were seen.
    pub fn next_position(&mut self, graph: &Graph) -> GraphResult<Option<(Position, NodeId)>> {
        if self.done {
            return Ok(None);
        }
        let node = match graph.live(self.node) {
            Ok(node) => node,
            Err(err) => {
                self.done = true;
                return Err(err);
            }
        };
        if node.mod_count() != self.mod_count {
            self.done = true;
            return Err(GraphError::ConcurrentModification(self.node));
        }
        let slots = match self.kind {
            EdgeKind::Input => &node.inputs,
            EdgeKind::Successor => &node.successors,
        };
        let next = self.walk.advance(slots, self.kind);
        self.done = next.is_none();
        Ok(next)
    }

    /// Next edge target.
    pub fn next(&mut self, graph: &Graph) -> GraphResult<Option<NodeId>> {
        Ok(self.next_position(graph)?.map(|(_, target)| target))
    }
}
