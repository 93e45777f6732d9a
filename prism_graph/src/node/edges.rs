//! Edge storage and edge iteration.
//!
//! A node keeps one [`EdgeSlots`] for its inputs and one for its successors.
//! Direct slots are a small inline array of nullable ids; list slots are
//! [`NodeList`]s. Iteration walks direct slots first, then each list in
//! order, skipping nulls.

use smallvec::SmallVec;

use super::NodeId;
use crate::schema::{EdgeKind, Position, SlotLayout};

/// Inline capacity for direct slots and list elements.
const INLINE_EDGES: usize = 4;

// =============================================================================
// Node List
// =============================================================================

/// Ordered list of nullable edge targets.
#[derive(Clone, PartialEq, Eq)]
pub struct NodeList {
    items: SmallVec<[Option<NodeId>; INLINE_EDGES]>,
    initial_size: usize,
}

impl NodeList {
    /// A list of `initial_size` null entries.
    pub fn with_initial_size(initial_size: usize) -> Self {
        Self {
            items: SmallVec::from_elem(None, initial_size),
            initial_size,
        }
    }

    /// A fresh list with this list's declared initial size.
    pub fn fresh(&self) -> Self {
        Self::with_initial_size(self.initial_size)
    }

    /// Declared initial size.
    #[inline]
    pub fn initial_size(&self) -> usize {
        self.initial_size
    }

    /// Number of entries, nulls included.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entry at `index`; `None` for nulls and out-of-range indices.
    #[inline]
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).copied().flatten()
    }

    /// All entries.
    #[inline]
    pub fn items(&self) -> &[Option<NodeId>] {
        &self.items
    }

    /// Set entry `index`, padding with nulls if the list is too short.
    /// Returns the previous entry.
    pub fn set(&mut self, index: usize, value: Option<NodeId>) -> Option<NodeId> {
        if index >= self.items.len() {
            self.items.resize(index + 1, None);
        }
        std::mem::replace(&mut self.items[index], value)
    }

    /// Append an entry.
    pub fn push(&mut self, value: Option<NodeId>) {
        self.items.push(value);
    }

    /// Replace the first entry equal to `old`; returns its index.
    pub fn replace_first(&mut self, old: NodeId, new: Option<NodeId>) -> Option<usize> {
        let index = self.items.iter().position(|item| *item == Some(old))?;
        self.items[index] = new;
        Some(index)
    }

    /// Whether some entry is `target`.
    pub fn contains(&self, target: NodeId) -> bool {
        self.items.contains(&Some(target))
    }

    /// Non-null entries in order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().flatten().copied()
    }

    /// Resize to `len` entries, filling with nulls.
    pub(crate) fn resize(&mut self, len: usize) {
        self.items.resize(len, None);
    }
}

impl std::fmt::Debug for NodeList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

// =============================================================================
// Edge Slots
// =============================================================================

/// All edges of one kind held by a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeSlots {
    pub(crate) direct: SmallVec<[Option<NodeId>; INLINE_EDGES]>,
    pub(crate) lists: SmallVec<[NodeList; 1]>,
}

impl EdgeSlots {
    /// Empty slots shaped after `layout`.
    pub(crate) fn for_layout(layout: &SlotLayout) -> Self {
        Self {
            direct: SmallVec::from_elem(None, layout.direct_count()),
            lists: layout
                .list_slots()
                .iter()
                .map(|f| NodeList::with_initial_size(f.initial_size))
                .collect(),
        }
    }

    /// Direct slot values.
    #[inline]
    pub fn direct(&self) -> &[Option<NodeId>] {
        &self.direct
    }

    /// List slots.
    #[inline]
    pub fn lists(&self) -> &[NodeList] {
        &self.lists
    }

    /// Whether any slot refers to `target`.
    pub fn contains(&self, target: NodeId) -> bool {
        self.direct.contains(&Some(target)) || self.lists.iter().any(|l| l.contains(target))
    }

    /// How many slots refer to `target`.
    pub fn count(&self, target: NodeId) -> usize {
        self.iter().filter(|&id| id == target).count()
    }

    /// Non-null targets in slot order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.direct
            .iter()
            .flatten()
            .copied()
            .chain(self.lists.iter().flat_map(|l| l.iter()))
    }

    /// Whether every slot is null.
    pub fn is_all_null(&self) -> bool {
        self.iter().next().is_none()
    }

    /// First non-null target.
    pub fn first(&self) -> Option<NodeId> {
        self.iter().next()
    }
}

// =============================================================================
// Slot Walk
// =============================================================================

/// Resumable walk over the non-null edges of an [`EdgeSlots`].
///
/// The walk only stores indices, so it can be kept across mutations of the
/// graph; [`EdgeCursor`](super::EdgeCursor) relies on that.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SlotWalk {
    slot: usize,
    sub: usize,
}

impl SlotWalk {
    pub(crate) fn advance(&mut self, slots: &EdgeSlots, kind: EdgeKind) -> Option<(Position, NodeId)> {
        let direct = slots.direct.len();
        while self.slot < direct {
            let index = self.slot;
            self.slot += 1;
            if let Some(target) = slots.direct[index] {
                let position = Position {
                    kind,
                    index,
                    sub_index: None,
                };
                return Some((position, target));
            }
        }
        while let Some(list) = slots.lists.get(self.slot - direct) {
            while self.sub < list.len() {
                let sub = self.sub;
                self.sub += 1;
                if let Some(target) = list.get(sub) {
                    let position = Position {
                        kind,
                        index: self.slot,
                        sub_index: Some(sub),
                    };
                    return Some((position, target));
                }
            }
            self.sub = 0;
            self.slot += 1;
        }
        None
    }
}

/// Iterator over the non-null edges of a node, with their positions.
pub struct EdgePositions<'a> {
    slots: &'a EdgeSlots,
    kind: EdgeKind,
    walk: SlotWalk,
}

impl<'a> EdgePositions<'a> {
    pub(crate) fn new(slots: &'a EdgeSlots, kind: EdgeKind) -> Self {
        Self {
            slots,
            kind,
            walk: SlotWalk::default(),
        }
    }
}

impl Iterator for EdgePositions<'_> {
    type Item = (Position, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        self.walk.advance(self.slots, self.kind)
    }
}

/// Iterator over the non-null edge targets of a node.
pub struct Edges<'a> {
    inner: EdgePositions<'a>,
}

impl<'a> Edges<'a> {
    pub(crate) fn new(slots: &'a EdgeSlots, kind: EdgeKind) -> Self {
        Self {
            inner: EdgePositions::new(slots, kind),
        }
    }
}

impl Iterator for Edges<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, target)| target)
    }
}
