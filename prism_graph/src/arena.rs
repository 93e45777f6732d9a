//! Slab storage for graph nodes.
//!
//! Items are appended and addressed by index. Removing one leaves a hole so
//! ids stay stable and are never handed out twice; iteration skips holes.
//!
//! A graph's node table is an `Arena<Node>`. Node-to-node relations are plain
//! `Id<Node>` values, so the arena is the only owner of node storage.

use std::marker::PhantomData;
use std::ops::Index;

// =============================================================================
// Node ids
// =============================================================================

/// Index of a slot in an [`Arena<T>`].
///
/// A node that was never added to a graph carries [`Id::INVALID`]; one that
/// was deleted carries [`Id::DELETED`]. Comparison and hashing look at the
/// raw index only, so `T` needs no trait bounds.
pub struct Id<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Never placed in an arena.
    pub const INVALID: Self = Self::new(u32::MAX);

    /// Removed from its arena.
    pub const DELETED: Self = Self::new(u32::MAX - 1);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Id {
            index,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.index as usize
    }

    /// Neither sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.index < Self::DELETED.index
    }
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u32(self.index);
    }
}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            id if id.is_valid() => write!(f, "#{}", id.index),
            id if id == Self::DELETED => f.write_str("#DELETED"),
            _ => f.write_str("#INVALID"),
        }
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.index)
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Append-only slab: items can be removed, but their slot stays a hole.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<Option<T>>,
    holes: usize,
}

impl<T> Arena<T> {
    /// Create a new empty arena.
    #[inline]
    pub fn new() -> Self {
        Arena {
            items: Vec::new(),
            holes: 0,
        }
    }

    /// Create a new arena with the given initial capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            items: Vec::with_capacity(capacity),
            holes: 0,
        }
    }

    /// Allocate a new item and return its ID.
    #[inline]
    pub fn alloc(&mut self, item: T) -> Id<T> {
        let index = self.items.len() as u32;
        self.items.push(Some(item));
        Id::new(index)
    }

    /// Remove an item, leaving a hole behind. Returns `None` for holes and
    /// out-of-range ids.
    pub fn remove(&mut self, id: Id<T>) -> Option<T> {
        let item = self.items.get_mut(id.as_usize())?.take()?;
        self.holes += 1;
        Some(item)
    }

    /// Get a reference to a live item by ID.
    #[inline]
    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.items.get(id.as_usize())?.as_ref()
    }

    /// Get a mutable reference to a live item by ID.
    #[inline]
    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.items.get_mut(id.as_usize())?.as_mut()
    }

    /// Whether `id` addresses a live item.
    #[inline]
    pub fn contains(&self, id: Id<T>) -> bool {
        self.get(id).is_some()
    }

    /// Number of slots ever allocated, holes included.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.items.len()
    }

    /// Number of holes left by removals.
    #[inline]
    pub fn hole_count(&self) -> usize {
        self.holes
    }

    /// Number of live items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len() - self.holes
    }

    /// Check if the arena holds no live items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over live items with their IDs, in ascending id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.iter_from(0)
    }

    /// Iterate over live items whose slot index is at least `start`.
    pub fn iter_from(&self, start: usize) -> impl Iterator<Item = (Id<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .skip(start)
            .filter_map(|(i, item)| item.as_ref().map(|item| (Id::new(i as u32), item)))
    }

    /// Iterate over live IDs.
    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// First live id at or after slot `start`.
    pub fn next_live(&self, start: usize) -> Option<Id<T>> {
        self.items
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, item)| item.is_some())
            .map(|(i, _)| Id::new(i as u32))
    }

    /// Reserve capacity for at least `additional` more items.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    /// Get the next ID that will be allocated.
    #[inline]
    pub fn next_id(&self) -> Id<T> {
        Id::new(self.items.len() as u32)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Id<T>> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: Id<T>) -> &Self::Output {
        match self.get(id) {
            Some(item) => item,
            None => panic!("arena access to dead or unknown id {:?}", id),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Slot {
        value: i32,
    }

    #[test]
    fn test_arena_alloc() {
        let mut arena: Arena<Slot> = Arena::new();

        let id1 = arena.alloc(Slot { value: 10 });
        let id2 = arena.alloc(Slot { value: 20 });
        let id3 = arena.alloc(Slot { value: 30 });

        assert_eq!(id1.index(), 0);
        assert_eq!(id2.index(), 1);
        assert_eq!(id3.index(), 2);

        assert_eq!(arena[id1].value, 10);
        assert_eq!(arena[id3].value, 30);

        arena.get_mut(id2).unwrap().value = 200;
        assert_eq!(arena[id2].value, 200);
    }

    #[test]
    fn test_arena_remove_leaves_hole() {
        let mut arena: Arena<Slot> = Arena::new();
        let a = arena.alloc(Slot { value: 1 });
        let b = arena.alloc(Slot { value: 2 });
        let c = arena.alloc(Slot { value: 3 });

        assert_eq!(arena.remove(b).map(|s| s.value), Some(2));
        assert!(arena.remove(b).is_none());

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.slot_count(), 3);
        assert_eq!(arena.hole_count(), 1);
        assert_eq!(arena.ids().collect::<Vec<_>>(), vec![a, c]);

        // Ids are never reused.
        let d = arena.alloc(Slot { value: 4 });
        assert_eq!(d.index(), 3);
    }

    #[test]
    fn test_arena_next_live() {
        let mut arena: Arena<Slot> = Arena::new();
        let a = arena.alloc(Slot { value: 1 });
        let b = arena.alloc(Slot { value: 2 });
        let c = arena.alloc(Slot { value: 3 });
        arena.remove(a);
        arena.remove(b);

        assert_eq!(arena.next_live(0), Some(c));
        assert_eq!(arena.next_live(3), None);
        let values: Vec<_> = arena.iter_from(1).map(|(_, s)| s.value).collect();
        assert_eq!(values, vec![3]);
    }

    #[test]
    fn test_id_sentinels() {
        let id: Id<Slot> = Id::INVALID;
        assert!(!id.is_valid());
        assert!(!Id::<Slot>::DELETED.is_valid());
        assert_ne!(Id::<Slot>::DELETED, Id::<Slot>::INVALID);
        assert_eq!(format!("{:?}", Id::<Slot>::DELETED), "#DELETED");
        assert_eq!(format!("{:?}", Id::<Slot>::default()), "#INVALID");

        let valid_id: Id<Slot> = Id::new(0);
        assert!(valid_id.is_valid());
        assert_eq!(format!("{:?}", valid_id), "#0");
        assert!(Id::<Slot>::new(u32::MAX - 2).is_valid());
        assert!(valid_id < Id::DELETED);
    }
}
