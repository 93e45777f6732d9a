//! Edge positions.

use std::fmt;

/// Which edge family a position addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Input (data) edges.
    Input,
    /// Successor (control) edges.
    Successor,
}

/// Address of one edge of a node.
///
/// `index` selects a slot in schema order (direct slots first, then list
/// slots). `sub_index` is `None` for direct slots and the element index for
/// list slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Input or successor.
    pub kind: EdgeKind,
    /// Slot index.
    pub index: usize,
    /// Element index inside a list slot.
    pub sub_index: Option<usize>,
}

impl Position {
    /// A direct input slot.
    pub const fn input(index: usize) -> Self {
        Self {
            kind: EdgeKind::Input,
            index,
            sub_index: None,
        }
    }

    /// An element of an input list slot.
    pub const fn input_at(index: usize, sub_index: usize) -> Self {
        Self {
            kind: EdgeKind::Input,
            index,
            sub_index: Some(sub_index),
        }
    }

    /// A direct successor slot.
    pub const fn successor(index: usize) -> Self {
        Self {
            kind: EdgeKind::Successor,
            index,
            sub_index: None,
        }
    }

    /// An element of a successor list slot.
    pub const fn successor_at(index: usize, sub_index: usize) -> Self {
        Self {
            kind: EdgeKind::Successor,
            index,
            sub_index: Some(sub_index),
        }
    }

    /// Whether this is an input position.
    #[inline]
    pub const fn is_input(&self) -> bool {
        matches!(self.kind, EdgeKind::Input)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            EdgeKind::Input => "input",
            EdgeKind::Successor => "successor",
        };
        match self.sub_index {
            Some(sub) => write!(f, "{} {}/{}", kind, self.index, sub),
            None => write!(f, "{} {}", kind, self.index),
        }
    }
}
