//! Global value numbering.
//!
//! Edgeless nodes are looked up in a cache keyed by value number. Nodes
//! with edges are compared against the usages of their first input, which
//! the graph already maintains, so no graph-wide index is needed.

use smallvec::SmallVec;

use super::Graph;
use crate::config::DuplicateSearch;
use crate::error::{GraphError, GraphResult};
use crate::node::{Node, NodeId};

impl Graph {
    /// Return a live node equal to `node`, adding `node` only if there is
    /// none. The type must be value-numberable.
    pub fn unique(&mut self, node: Node) -> GraphResult<NodeId> {
        let schema = node.schema();
        if !schema.is_value_numberable() {
            return Err(GraphError::NotValueNumberable(schema.name()));
        }

        if node.has_edges() {
            if let Some(existing) = self.find_duplicate(&node)? {
                log::trace!("{}: unique hit {:?} for {:?}", self.id, existing, node);
                return Ok(existing);
            }
            return self.add(node);
        }

        let number = node.value_number();
        if let Some(existing) = self.cached(number, &node) {
            log::trace!("{}: unique cache hit {:?} for {:?}", self.id, existing, node);
            return Ok(existing);
        }
        let id = self.add(node)?;
        self.cache.entry(number).or_default().push(id);
        Ok(id)
    }

    /// Look up an edgeless node in the cache, dropping stale entries of the
    /// bucket on the way.
    fn cached(&mut self, number: u64, node: &Node) -> Option<NodeId> {
        let nodes = &self.nodes;
        let bucket = self.cache.get_mut(&number)?;
        bucket.retain(|id| nodes.contains(*id));
        bucket
            .iter()
            .copied()
            .find(|&id| nodes[id].value_equals(node))
    }

    /// Move a cached node to the bucket of its new value number.
    pub(crate) fn rekey(&mut self, id: NodeId, old: u64, new: u64) {
        let Some(bucket) = self.cache.get_mut(&old) else {
            return;
        };
        let Some(index) = bucket.iter().position(|&cached| cached == id) else {
            return;
        };
        bucket.swap_remove(index);
        if bucket.is_empty() {
            self.cache.remove(&old);
        }
        self.cache.entry(new).or_default().push(id);
        log::trace!("{}: rekeyed {:?} in value-number cache", self.id, id);
    }

    /// Find a live node equal to `node` among the usages of its first
    /// non-null input.
    ///
    /// With [`DuplicateSearch::FirstInputThenPredecessor`], a node without
    /// inputs instead checks the current predecessor of its first successor,
    /// the only node that could hold the same successor edge.
    pub fn find_duplicate(&self, node: &Node) -> GraphResult<Option<NodeId>> {
        let schema = node.schema();
        if !schema.is_value_numberable() {
            return Err(GraphError::NotValueNumberable(schema.name()));
        }

        let candidates: SmallVec<[NodeId; 4]> = match node.input_slots().first() {
            Some(input) => SmallVec::from_slice(self.live(input)?.usages()),
            None => match (self.config.duplicate_search, node.successor_slots().first()) {
                (DuplicateSearch::FirstInputThenPredecessor, Some(successor)) => {
                    self.live(successor)?.predecessor().into_iter().collect()
                }
                _ => SmallVec::new(),
            },
        };

        Ok(candidates.into_iter().find(|&id| {
            id != node.id()
                && self
                    .get(id)
                    .is_some_and(|existing| existing.value_equals(node))
        }))
    }
}
