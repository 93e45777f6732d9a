//! Graph configuration.
//!
//! A `GraphConfig` is fixed when the graph is built; the graph reads it on
//! the relevant operations without any per-call setup.

/// Default node table capacity.
const DEFAULT_INITIAL_CAPACITY: usize = 256;

/// Default minimum length before a per-type list is considered for compaction.
const DEFAULT_COMPACTION_MIN_LEN: usize = 32;

// =============================================================================
// Duplicate Search
// =============================================================================

/// Where `find_duplicate` looks for an existing equal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateSearch {
    /// Only the usages of the candidate's first non-null input are scanned.
    /// A candidate with no inputs never finds a duplicate.
    FirstInput,
    /// As `FirstInput`; a candidate whose inputs are all null instead checks
    /// the predecessor of its first non-null successor. A successor can only
    /// have one predecessor, so that node is the only possible duplicate.
    #[default]
    FirstInputThenPredecessor,
}

// =============================================================================
// Graph Configuration
// =============================================================================

/// Configuration for a [`Graph`](crate::Graph).
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Node table capacity reserved up front.
    pub initial_capacity: usize,

    /// Duplicate search strategy for edge-bearing nodes.
    pub duplicate_search: DuplicateSearch,

    /// Drop dead ids from per-type lists once they dominate the list.
    pub compact_type_lists: bool,

    /// Per-type lists shorter than this are never compacted.
    pub compaction_min_len: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            duplicate_search: DuplicateSearch::default(),
            compact_type_lists: true,
            compaction_min_len: DEFAULT_COMPACTION_MIN_LEN,
        }
    }
}

impl GraphConfig {
    /// Configuration for tests: tiny tables and eager compaction, so the
    /// growth and cleanup paths run on small graphs.
    pub fn for_testing() -> Self {
        Self {
            initial_capacity: 4,
            duplicate_search: DuplicateSearch::default(),
            compact_type_lists: true,
            compaction_min_len: 0,
        }
    }

    /// Set the duplicate search strategy.
    pub fn with_duplicate_search(mut self, search: DuplicateSearch) -> Self {
        self.duplicate_search = search;
        self
    }

    /// Whether a per-type list with `len` entries, `dead` of them stale,
    /// should be compacted now.
    #[inline]
    pub(crate) fn should_compact(&self, len: usize, dead: usize) -> bool {
        self.compact_type_lists && len >= self.compaction_min_len && dead * 2 > len
    }
}
