//! Field declarations and data values.
//!
//! A node type describes itself as an ordered list of [`FieldDescriptor`]s.
//! Edge fields (`Input`, `Successor`) hold node ids; data fields take part in
//! value numbering and structural equality; plain fields are carried along by
//! clones but are otherwise ignored by the graph.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

// =============================================================================
// Field Kind / Type
// =============================================================================

/// Role a field plays in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Data dependency; reverse-tracked through the target's usages.
    Input,
    /// Control-flow edge; reverse-tracked through the target's predecessor.
    Successor,
    /// Value compared and hashed by value numbering.
    Data,
    /// Value with no graph semantics.
    Plain,
}

/// Static type of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A single, nullable node reference.
    Node,
    /// An ordered list of nullable node references.
    NodeList,
    /// Signed integer.
    Int,
    /// Boolean.
    Bool,
    /// 64-bit float.
    Float,
    /// Nullable shared string, hashed by content.
    Symbol,
}

impl FieldType {
    /// Whether values of this type are node references.
    #[inline]
    pub const fn is_edge(self) -> bool {
        matches!(self, FieldType::Node | FieldType::NodeList)
    }
}

/// Slot shape of an edge field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Zero or one target.
    Direct,
    /// Indexed list of targets, nulls allowed.
    List,
}

// =============================================================================
// Field Descriptor
// =============================================================================

/// One declared field of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name, unique across the type and its supertypes.
    pub name: &'static str,
    /// Role of the field.
    pub kind: FieldKind,
    /// Value type of the field.
    pub ty: FieldType,
    /// Number of null entries a fresh list slot starts with.
    pub initial_size: usize,
}

impl FieldDescriptor {
    /// Raw constructor; the schema rejects incompatible kind/type pairs.
    pub const fn new(name: &'static str, kind: FieldKind, ty: FieldType) -> Self {
        Self {
            name,
            kind,
            ty,
            initial_size: 0,
        }
    }

    /// A direct input slot.
    pub const fn input(name: &'static str) -> Self {
        Self::new(name, FieldKind::Input, FieldType::Node)
    }

    /// An input list slot.
    pub const fn input_list(name: &'static str, initial_size: usize) -> Self {
        Self {
            initial_size,
            ..Self::new(name, FieldKind::Input, FieldType::NodeList)
        }
    }

    /// A direct successor slot.
    pub const fn successor(name: &'static str) -> Self {
        Self::new(name, FieldKind::Successor, FieldType::Node)
    }

    /// A successor list slot.
    pub const fn successor_list(name: &'static str, initial_size: usize) -> Self {
        Self {
            initial_size,
            ..Self::new(name, FieldKind::Successor, FieldType::NodeList)
        }
    }

    /// A value-numbered data field.
    pub const fn data(name: &'static str, ty: FieldType) -> Self {
        Self::new(name, FieldKind::Data, ty)
    }

    /// A plain field.
    pub const fn plain(name: &'static str, ty: FieldType) -> Self {
        Self::new(name, FieldKind::Plain, ty)
    }

    /// Slot shape, for edge fields.
    pub const fn cardinality(&self) -> Option<Cardinality> {
        match self.ty {
            FieldType::Node => Some(Cardinality::Direct),
            FieldType::NodeList => Some(Cardinality::List),
            _ => None,
        }
    }

    /// Whether the declared kind can hold the declared type.
    pub const fn is_consistent(&self) -> bool {
        match self.kind {
            FieldKind::Input | FieldKind::Successor => self.ty.is_edge(),
            FieldKind::Data | FieldKind::Plain => !self.ty.is_edge(),
        }
    }
}

// =============================================================================
// Data Values
// =============================================================================

/// Value of a data or plain field.
///
/// Floats compare by bit pattern so that value numbering treats `NaN` as equal
/// to itself and distinguishes `0.0` from `-0.0`.
#[derive(Debug, Clone)]
pub enum DataValue {
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Float value.
    Float(f64),
    /// Nullable reference value.
    Symbol(Option<Arc<str>>),
}

impl DataValue {
    /// Default value for a field of type `ty` (`None` for edge types).
    pub fn default_for(ty: FieldType) -> Option<Self> {
        match ty {
            FieldType::Int => Some(DataValue::Int(0)),
            FieldType::Bool => Some(DataValue::Bool(false)),
            FieldType::Float => Some(DataValue::Float(0.0)),
            FieldType::Symbol => Some(DataValue::Symbol(None)),
            FieldType::Node | FieldType::NodeList => None,
        }
    }

    /// The field type this value belongs to.
    pub const fn field_type(&self) -> FieldType {
        match self {
            DataValue::Int(_) => FieldType::Int,
            DataValue::Bool(_) => FieldType::Bool,
            DataValue::Float(_) => FieldType::Float,
            DataValue::Symbol(_) => FieldType::Symbol,
        }
    }

    /// Contribution of this value to a value number.
    ///
    /// Primitives contribute their bit pattern (`true` contributes 7), a
    /// non-null symbol contributes its hash and a null symbol nothing.
    pub fn value_number_contribution(&self) -> u64 {
        match self {
            DataValue::Int(v) => *v as u64,
            DataValue::Bool(true) => 7,
            DataValue::Bool(false) => 0,
            DataValue::Float(v) => v.to_bits(),
            DataValue::Symbol(Some(s)) => {
                let mut hasher = FxHasher::default();
                s.hash(&mut hasher);
                hasher.finish()
            }
            DataValue::Symbol(None) => 0,
        }
    }

    /// Get as integer if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DataValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as bool if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float if this is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            DataValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as symbol text, if this is a non-null symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            DataValue::Symbol(Some(s)) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DataValue::Int(a), DataValue::Int(b)) => a == b,
            (DataValue::Bool(a), DataValue::Bool(b)) => a == b,
            (DataValue::Float(a), DataValue::Float(b)) => a.to_bits() == b.to_bits(),
            (DataValue::Symbol(a), DataValue::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DataValue {}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Int(v) => write!(f, "{}", v),
            DataValue::Bool(v) => write!(f, "{}", v),
            DataValue::Float(v) => write!(f, "{}", v),
            DataValue::Symbol(Some(s)) => write!(f, "{}", s),
            DataValue::Symbol(None) => write!(f, "null"),
        }
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Int(value as i64)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Symbol(Some(Arc::from(value)))
    }
}

impl From<Arc<str>> for DataValue {
    fn from(value: Arc<str>) -> Self {
        DataValue::Symbol(Some(value))
    }
}
