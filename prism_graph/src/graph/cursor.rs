//! Graph traversal that tolerates mutation between steps.
//!
//! The borrowing iterators on [`Graph`] cannot be held across a mutation.
//! These cursors keep only a position and take the graph on every step, so
//! a pass can delete or add nodes while it walks.

use super::Graph;
use crate::node::NodeId;

/// Cursor over live nodes in ascending id order.
///
/// Nodes deleted before the cursor reaches them are skipped; nodes added
/// during the walk are visited, since they get higher ids.
#[derive(Debug, Clone)]
pub struct NodeCursor {
    next: usize,
}

impl NodeCursor {
    pub(crate) fn starting_at(next: usize) -> Self {
        Self { next }
    }

    /// The next live node id, or `None` at the end of the table.
    pub fn next(&mut self, graph: &Graph) -> Option<NodeId> {
        let id = graph.nodes.next_live(self.next)?;
        self.next = id.as_usize() + 1;
        Some(id)
    }
}

/// Cursor over the live nodes of one iterable type.
///
/// The cursor remembers the last id it returned, not a list index, so it
/// stays correct when the per-type list is compacted under it.
#[derive(Debug, Clone)]
pub struct TypeCursor {
    slot: usize,
    last: Option<NodeId>,
}

impl TypeCursor {
    pub(crate) fn new(slot: usize) -> Self {
        Self { slot, last: None }
    }

    /// The next live node of the type, or `None` once the list is exhausted.
    pub fn next(&mut self, graph: &Graph) -> Option<NodeId> {
        let ids = graph.type_list_ids(self.slot);
        let start = match self.last {
            Some(last) => ids.partition_point(|&id| id <= last),
            None => 0,
        };
        let id = ids[start..].iter().copied().find(|&id| graph.is_alive(id))?;
        self.last = Some(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::GraphConfig;
    use crate::graph::Graph;
    use crate::node::Node;
    use crate::schema::NodeSchema;
    use crate::test_types::*;

    fn graph() -> Graph {
        Graph::with_config(Node::of::<StartNode>(), GraphConfig::for_testing()).unwrap()
    }

    #[test]
    fn test_node_cursor_survives_deletion() {
        let mut g = graph();
        let ids: Vec<_> = (0..4).map(|i| g.add(constant(i)).unwrap()).collect();
        let mut cursor = g.cursor();
        let mut seen = Vec::new();
        while let Some(id) = cursor.next(&g) {
            seen.push(id);
            if id == ids[0] {
                g.delete(ids[1]).unwrap();
            }
        }
        assert_eq!(seen, vec![g.root(), ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn test_node_cursor_sees_appended_nodes() {
        let mut g = graph();
        let mut cursor = g.cursor();
        assert_eq!(cursor.next(&g), Some(g.root()));
        let a = g.add(constant(1)).unwrap();
        assert_eq!(cursor.next(&g), Some(a));
        assert_eq!(cursor.next(&g), None);
    }

    #[test]
    fn test_new_nodes_cursor_deletes_as_it_goes() {
        let mut g = graph();
        g.mark();
        let ids: Vec<_> = (0..3).map(|i| g.add(constant(i)).unwrap()).collect();
        let mut cursor = g.new_nodes_cursor();
        let mut seen = Vec::new();
        while let Some(id) = cursor.next(&g) {
            seen.push(id);
            g.delete(id).unwrap();
        }
        assert_eq!(seen, ids);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn test_type_cursor_across_compaction() {
        let mut g = graph();
        let ids: Vec<_> = (0..5).map(|i| g.add(constant(i)).unwrap()).collect();
        let mut cursor = g.type_cursor(NodeSchema::of::<ConstNode>()).unwrap();
        assert_eq!(cursor.next(&g), Some(ids[0]));
        assert_eq!(cursor.next(&g), Some(ids[1]));
        // Deleting three of five compacts the list under the cursor.
        for &id in &[ids[0], ids[1], ids[2]] {
            g.delete(id).unwrap();
        }
        assert_eq!(cursor.next(&g), Some(ids[3]));
        let late = g.add(constant(9)).unwrap();
        assert_eq!(cursor.next(&g), Some(ids[4]));
        assert_eq!(cursor.next(&g), Some(late));
        assert_eq!(cursor.next(&g), None);
    }

    #[test]
    fn test_type_cursor_requires_iterable_type() {
        let g = graph();
        assert!(g.type_cursor(NodeSchema::of::<AddNode>()).is_err());
    }
}
