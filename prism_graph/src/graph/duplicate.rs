//! Subgraph duplication.
//!
//! A region of nodes is copied in two phases: the source is read into a
//! snapshot first, then the snapshot is applied to the target graph. The
//! split lets one routine serve both copying within a graph and copying
//! from another graph (inlining), and means all checks run before the
//! target is touched.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::Graph;
use crate::error::{GraphError, GraphResult};
use crate::node::{Node, NodeId};
use crate::schema::{NodeSchema, Position};

/// Everything needed from one original node.
struct Original {
    id: NodeId,
    schema: &'static NodeSchema,
    inputs: SmallVec<[(Position, NodeId); 4]>,
    successors: SmallVec<[(Position, NodeId); 2]>,
    /// Detached copy with list slots sized like the original's; `None` if
    /// the original has a replacement.
    copy: Option<Node>,
}

fn snapshot(
    source: &Graph,
    nodes: &[NodeId],
    replacements: &FxHashMap<NodeId, NodeId>,
) -> GraphResult<Vec<Original>> {
    let mut seen = FxHashSet::default();
    let mut originals = Vec::with_capacity(nodes.len());
    for &id in nodes {
        if !seen.insert(id) {
            continue;
        }
        let node = source.live(id)?;
        let copy = if replacements.contains_key(&id) {
            None
        } else {
            let mut copy = node.detached_copy();
            for (list, original) in copy.inputs.lists.iter_mut().zip(&node.inputs.lists) {
                list.resize(original.len());
            }
            for (list, original) in copy
                .successors
                .lists
                .iter_mut()
                .zip(&node.successors.lists)
            {
                list.resize(original.len());
            }
            Some(copy)
        };
        originals.push(Original {
            id,
            schema: node.schema(),
            inputs: node.input_positions().collect(),
            successors: node.successor_positions().collect(),
            copy,
        });
    }
    Ok(originals)
}

impl Graph {
    /// Duplicate `nodes` within this graph.
    ///
    /// Every node that is not a key of `replacements` gets a fresh copy.
    /// Edges of the copies are rewired to the copy of their original target
    /// or to its replacement; edges to anything else are left null. A
    /// replacement also takes over the original's edges into the
    /// duplicated region. Returns the original to copy map.
    pub fn add_duplicate(
        &mut self,
        nodes: &[NodeId],
        replacements: &FxHashMap<NodeId, NodeId>,
    ) -> GraphResult<FxHashMap<NodeId, NodeId>> {
        let originals = snapshot(self, nodes, replacements)?;
        self.apply_duplicate(originals, replacements)
    }

    /// Duplicate `nodes` of `source` into this graph; see
    /// [`add_duplicate`](Graph::add_duplicate). Replacements are nodes of
    /// this graph.
    pub fn add_duplicate_from(
        &mut self,
        source: &Graph,
        nodes: &[NodeId],
        replacements: &FxHashMap<NodeId, NodeId>,
    ) -> GraphResult<FxHashMap<NodeId, NodeId>> {
        let originals = snapshot(source, nodes, replacements)?;
        self.apply_duplicate(originals, replacements)
    }

    fn check_duplicate(
        &self,
        originals: &[Original],
        replacements: &FxHashMap<NodeId, NodeId>,
    ) -> GraphResult<()> {
        for original in originals {
            if let Some(&replacement) = replacements.get(&original.id) {
                let found = self.live(replacement)?.schema();
                if !std::ptr::eq(found, original.schema) {
                    return Err(GraphError::TypeMismatch {
                        expected: original.schema.name(),
                        found: found.name(),
                    });
                }
            }
        }

        // Edges of copies may resolve to replacements outside the region.
        for original in originals.iter().filter(|o| o.copy.is_some()) {
            let targets = original.inputs.iter().chain(&original.successors);
            for (_, target) in targets {
                self.check_target(replacements.get(target).copied())?;
            }
        }

        // Copies may gain a replacement as successor; it must be free and
        // claimed only once.
        let mut claimed = FxHashSet::default();
        for original in originals.iter().filter(|o| o.copy.is_some()) {
            for &(_, target) in &original.successors {
                if let Some(&replacement) = replacements.get(&target) {
                    if !claimed.insert(replacement) {
                        return Err(GraphError::PredecessorAlreadySet {
                            node: original.id,
                            target: replacement,
                            existing: original.id,
                        });
                    }
                    self.check_free_successor(original.id, replacement)?;
                }
            }
        }
        Ok(())
    }

    fn apply_duplicate(
        &mut self,
        originals: Vec<Original>,
        replacements: &FxHashMap<NodeId, NodeId>,
    ) -> GraphResult<FxHashMap<NodeId, NodeId>> {
        self.check_duplicate(&originals, replacements)?;

        let mut copies = FxHashMap::default();
        let mut wiring = Vec::with_capacity(originals.len());
        for mut original in originals {
            if let Some(copy) = original.copy.take() {
                copies.insert(original.id, self.add(copy)?);
            }
            wiring.push(original);
        }
        let resolve = |target: &NodeId| copies.get(target).or_else(|| replacements.get(target)).copied();

        // Inputs first, so successor wiring sees a complete data graph.
        let mut inputs = Vec::new();
        let mut successors = Vec::new();
        for original in &wiring {
            let (owner, into_region_only) = match copies.get(&original.id) {
                Some(&copy) => (copy, false),
                None => match replacements.get(&original.id) {
                    Some(&replacement) => (replacement, true),
                    None => continue,
                },
            };
            for &(position, target) in &original.inputs {
                if into_region_only && !copies.contains_key(&target) {
                    continue;
                }
                if let Some(resolved) = resolve(&target) {
                    inputs.push((owner, position, resolved));
                }
            }
            for &(position, target) in &original.successors {
                if into_region_only && !copies.contains_key(&target) {
                    continue;
                }
                if let Some(resolved) = resolve(&target) {
                    successors.push((owner, position, resolved));
                }
            }
        }
        for (owner, position, target) in inputs.into_iter().chain(successors) {
            self.set_edge(owner, position, Some(target))?;
        }

        log::debug!(
            "{}: duplicated {} nodes ({} replaced)",
            self.id,
            copies.len(),
            wiring.len() - copies.len()
        );
        Ok(copies)
    }
}
