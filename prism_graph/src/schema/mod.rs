//! Per-type node schemas.
//!
//! Every node type declares its fields once through the [`NodeType`] trait.
//! The declaration is turned into a [`NodeSchema`]:
//!
//! - **Edge layout**: input and successor slots, direct slots first, then
//!   list slots, each group in declaration order
//! - **Data layout**: data fields in declaration order, used by value
//!   numbering and structural equality
//! - **Type properties**: value-numberability, iterability, short name
//!
//! Supertype fields come first, so a subtype's slots extend its parent's.
//! Schemas are built on first use and cached for the life of the process in a
//! registry keyed by the Rust type of the declaration.

mod field;
mod position;
mod slots;

pub use field::{Cardinality, DataValue, FieldDescriptor, FieldKind, FieldType};
pub use position::{EdgeKind, Position};

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};

use crate::error::SchemaError;
use crate::node::Node;

/// Multiplier applied after each data field when computing value numbers.
const VALUE_NUMBER_MULTIPLIER: u64 = 13;

// =============================================================================
// Node Type Declaration
// =============================================================================

/// Static declaration of a node type.
///
/// Implemented by (usually zero-sized) marker types:
///
/// ```
/// use prism_graph::schema::{FieldDescriptor, FieldType, NodeType};
///
/// struct AddNode;
///
/// impl NodeType for AddNode {
///     const NAME: &'static str = "AddNode";
///     const VALUE_NUMBERABLE: bool = true;
///
///     fn fields() -> Vec<FieldDescriptor> {
///         vec![FieldDescriptor::input("x"), FieldDescriptor::input("y")]
///     }
/// }
///
/// let schema = prism_graph::NodeSchema::of::<AddNode>();
/// assert_eq!(schema.short_name(), "Add");
/// assert_eq!(schema.inputs().len(), 2);
/// ```
pub trait NodeType: 'static {
    /// Type name.
    const NAME: &'static str;

    /// Display name; defaults to `NAME` without a trailing `Node`.
    const SHORT_NAME: Option<&'static str> = None;

    /// Whether structurally equal nodes of this type may be merged.
    const VALUE_NUMBERABLE: bool = false;

    /// Whether the graph keeps a per-type list of these nodes.
    const ITERABLE: bool = false;

    /// Schema of the supertype whose fields this type inherits.
    fn supertype() -> Option<&'static NodeSchema> {
        None
    }

    /// Fields declared by this type itself, in declaration order.
    fn fields() -> Vec<FieldDescriptor>;
}

bitflags::bitflags! {
    /// Type-level properties of a schema.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SchemaFlags: u8 {
        /// Nodes take part in value numbering.
        const VALUE_NUMBERABLE = 0b0000_0001;
        /// Nodes are tracked in a per-type list.
        const ITERABLE = 0b0000_0010;
        /// The type declares at least one input or successor slot.
        const HAS_EDGES = 0b0000_0100;
    }
}

// =============================================================================
// Slot Layout
// =============================================================================

/// Ordered edge slots of one kind.
#[derive(Debug, Clone)]
pub struct SlotLayout {
    slots: Vec<FieldDescriptor>,
    direct_count: usize,
}

impl SlotLayout {
    fn from_fields(fields: &[FieldDescriptor], kind: FieldKind) -> Self {
        let of_kind = || fields.iter().filter(move |f| f.kind == kind);
        let mut slots: Vec<FieldDescriptor> = of_kind()
            .filter(|f| f.ty == FieldType::Node)
            .copied()
            .collect();
        let direct_count = slots.len();
        slots.extend(of_kind().filter(|f| f.ty == FieldType::NodeList).copied());
        Self {
            slots,
            direct_count,
        }
    }

    /// Total number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of direct slots (they precede the list slots).
    #[inline]
    pub fn direct_count(&self) -> usize {
        self.direct_count
    }

    /// Number of list slots.
    #[inline]
    pub fn list_count(&self) -> usize {
        self.slots.len() - self.direct_count
    }

    /// Whether slot `index` is a list slot.
    #[inline]
    pub fn is_list(&self, index: usize) -> bool {
        index >= self.direct_count && index < self.slots.len()
    }

    /// Descriptor of slot `index`.
    #[inline]
    pub fn slot(&self, index: usize) -> Option<&FieldDescriptor> {
        self.slots.get(index)
    }

    /// Index of the slot called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|f| f.name == name)
    }

    /// All slots in schema order.
    pub fn slots(&self) -> &[FieldDescriptor] {
        &self.slots
    }

    /// Descriptors of the list slots, in order.
    pub fn list_slots(&self) -> &[FieldDescriptor] {
        &self.slots[self.direct_count..]
    }
}

// =============================================================================
// Node Schema
// =============================================================================

/// Layout and properties of one node type.
pub struct NodeSchema {
    type_id: TypeId,
    name: &'static str,
    short_name: &'static str,
    flags: SchemaFlags,
    iterable_id: Option<u32>,
    seed: u64,
    inputs: SlotLayout,
    successors: SlotLayout,
    /// Data fields followed by plain fields.
    values: Vec<FieldDescriptor>,
    data_count: usize,
    /// Every field in declaration order, supertypes first.
    declared: Vec<FieldDescriptor>,
}

impl NodeSchema {
    /// Schema of `T`, built and cached on first use.
    ///
    /// # Panics
    ///
    /// Panics if the declaration of `T` is malformed. Use [`try_of`] to get
    /// the error instead.
    ///
    /// [`try_of`]: NodeSchema::try_of
    pub fn of<T: NodeType>() -> &'static NodeSchema {
        match Self::try_of::<T>() {
            Ok(schema) => schema,
            Err(err) => panic!("invalid node type {}: {}", T::NAME, err),
        }
    }

    /// Schema of `T`, or the reason its declaration is malformed.
    pub fn try_of<T: NodeType>() -> Result<&'static NodeSchema, SchemaError> {
        let key = TypeId::of::<T>();
        let registry = schema_registry();
        if let Some(schema) = registry.get(key) {
            return Ok(schema);
        }

        let mut flags = SchemaFlags::empty();
        flags.set(SchemaFlags::VALUE_NUMBERABLE, T::VALUE_NUMBERABLE);
        flags.set(SchemaFlags::ITERABLE, T::ITERABLE);
        // Built outside the registry lock: `supertype()` may register the parent.
        let schema = Self::build(
            key,
            T::NAME,
            T::SHORT_NAME,
            flags,
            T::supertype(),
            T::fields(),
        )?;
        Ok(registry.insert(schema))
    }

    fn build(
        type_id: TypeId,
        name: &'static str,
        short_name: Option<&'static str>,
        mut flags: SchemaFlags,
        supertype: Option<&'static NodeSchema>,
        own_fields: Vec<FieldDescriptor>,
    ) -> Result<Self, SchemaError> {
        let mut declared = supertype.map(|s| s.declared.clone()).unwrap_or_default();
        for field in own_fields {
            if !field.is_consistent() {
                return Err(SchemaError::IncompatibleField {
                    type_name: name,
                    field: field.name,
                    kind: field.kind,
                    ty: field.ty,
                });
            }
            if declared.iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    type_name: name,
                    field: field.name,
                });
            }
            declared.push(field);
        }

        let inputs = SlotLayout::from_fields(&declared, FieldKind::Input);
        let successors = SlotLayout::from_fields(&declared, FieldKind::Successor);
        let mut values: Vec<FieldDescriptor> = declared
            .iter()
            .filter(|f| f.kind == FieldKind::Data)
            .copied()
            .collect();
        let data_count = values.len();
        values.extend(declared.iter().filter(|f| f.kind == FieldKind::Plain).copied());

        flags.set(
            SchemaFlags::HAS_EDGES,
            !inputs.is_empty() || !successors.is_empty(),
        );

        let mut hasher = FxHasher::default();
        name.hash(&mut hasher);

        Ok(Self {
            type_id,
            name,
            short_name: short_name.unwrap_or_else(|| derive_short_name(name)),
            flags,
            iterable_id: None,
            seed: hasher.finish(),
            inputs,
            successors,
            values,
            data_count,
            declared,
        })
    }

    // =========================================================================
    // Type Properties
    // =========================================================================

    /// Full type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Display name.
    #[inline]
    pub fn short_name(&self) -> &'static str {
        self.short_name
    }

    /// Rust type the schema was declared by.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type-level flags.
    #[inline]
    pub fn flags(&self) -> SchemaFlags {
        self.flags
    }

    /// Whether nodes of this type take part in value numbering.
    #[inline]
    pub fn is_value_numberable(&self) -> bool {
        self.flags.contains(SchemaFlags::VALUE_NUMBERABLE)
    }

    /// Whether the graph keeps a per-type list for this type.
    #[inline]
    pub fn is_iterable(&self) -> bool {
        self.flags.contains(SchemaFlags::ITERABLE)
    }

    /// Dense index among iterable types, if iterable.
    #[inline]
    pub fn iterable_id(&self) -> Option<u32> {
        self.iterable_id
    }

    /// Whether the type declares any edge slot.
    #[inline]
    pub fn has_edges(&self) -> bool {
        self.flags.contains(SchemaFlags::HAS_EDGES)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Input slot layout.
    #[inline]
    pub fn inputs(&self) -> &SlotLayout {
        &self.inputs
    }

    /// Successor slot layout.
    #[inline]
    pub fn successors(&self) -> &SlotLayout {
        &self.successors
    }

    /// Slot layout for `kind`.
    #[inline]
    pub fn layout(&self, kind: EdgeKind) -> &SlotLayout {
        match kind {
            EdgeKind::Input => &self.inputs,
            EdgeKind::Successor => &self.successors,
        }
    }

    /// Number of direct input slots.
    #[inline]
    pub fn direct_input_count(&self) -> usize {
        self.inputs.direct_count()
    }

    /// Number of direct successor slots.
    #[inline]
    pub fn direct_successor_count(&self) -> usize {
        self.successors.direct_count()
    }

    /// Data fields, in the order they are value-numbered.
    pub fn data_fields(&self) -> &[FieldDescriptor] {
        &self.values[..self.data_count]
    }

    /// Plain fields.
    pub fn plain_fields(&self) -> &[FieldDescriptor] {
        &self.values[self.data_count..]
    }

    /// Data fields followed by plain fields; a node's value storage uses
    /// this order.
    pub fn value_fields(&self) -> &[FieldDescriptor] {
        &self.values
    }

    /// Every declared field, supertypes first.
    pub fn declared_fields(&self) -> &[FieldDescriptor] {
        &self.declared
    }

    /// Index of the data or plain field `name` in value storage.
    pub fn value_index(&self, name: &str) -> Option<usize> {
        self.values.iter().position(|f| f.name == name)
    }

    /// Default values for a fresh node.
    pub(crate) fn default_values(&self) -> impl Iterator<Item = DataValue> + '_ {
        self.values
            .iter()
            .filter_map(|f| DataValue::default_for(f.ty))
    }

    // =========================================================================
    // Value Numbering
    // =========================================================================

    /// Value number of `node`: 0 for types that are not value-numberable.
    ///
    /// Starts from a seed derived from the type and, for each data field in
    /// order, adds the field's contribution and multiplies by 13.
    pub fn value_number(&self, node: &Node) -> u64 {
        debug_assert!(std::ptr::eq(self, node.schema()));
        if !self.is_value_numberable() {
            return 0;
        }
        node.values[..self.data_count]
            .iter()
            .fold(self.seed, |number, value| {
                number
                    .wrapping_add(value.value_number_contribution())
                    .wrapping_mul(VALUE_NUMBER_MULTIPLIER)
            })
    }

    /// Same type and every data field equal.
    pub fn structural_equal(&self, a: &Node, b: &Node) -> bool {
        std::ptr::eq(a.schema(), self)
            && std::ptr::eq(b.schema(), self)
            && a.values[..self.data_count] == b.values[..self.data_count]
    }

    /// Data fields as `("data.<name>", value)` pairs, for dumps.
    pub fn debug_properties(&self, node: &Node) -> Vec<(String, DataValue)> {
        self.data_fields()
            .iter()
            .zip(node.values.iter())
            .map(|(field, value)| (format!("data.{}", field.name), value.clone()))
            .collect()
    }
}

impl PartialEq for NodeSchema {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for NodeSchema {}

impl fmt::Debug for NodeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeSchema({})", self.name)
    }
}

impl fmt::Display for NodeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |fields: &[FieldDescriptor]| {
            fields.iter().map(|f| f.name).collect::<Vec<_>>().join(", ")
        };
        write!(
            f,
            "NodeSchema {} [{}] [{}] [{}]",
            self.name,
            names(self.inputs.slots()),
            names(self.successors.slots()),
            names(self.data_fields())
        )
    }
}

/// `FooNode` -> `Foo`, except for the start and end nodes.
fn derive_short_name(name: &'static str) -> &'static str {
    match name.strip_suffix("Node") {
        Some(short) if !short.is_empty() && name != "StartNode" && name != "EndNode" => short,
        _ => name,
    }
}

// =============================================================================
// Global Registry
// =============================================================================

/// Process-wide schema cache.
struct SchemaRegistry {
    schemas: RwLock<FxHashMap<TypeId, &'static NodeSchema>>,
    next_iterable_id: AtomicU32,
}

impl SchemaRegistry {
    fn new() -> Self {
        Self {
            schemas: RwLock::new(FxHashMap::default()),
            next_iterable_id: AtomicU32::new(0),
        }
    }

    #[inline]
    fn get(&self, type_id: TypeId) -> Option<&'static NodeSchema> {
        self.schemas.read().get(&type_id).copied()
    }

    /// Publish a freshly built schema. If another thread won the race, its
    /// schema is kept and returned instead.
    fn insert(&self, mut schema: NodeSchema) -> &'static NodeSchema {
        let mut schemas = self.schemas.write();
        if let Some(existing) = schemas.get(&schema.type_id) {
            return existing;
        }
        if schema.is_iterable() {
            schema.iterable_id = Some(self.next_iterable_id.fetch_add(1, Ordering::Relaxed));
        }
        let schema: &'static NodeSchema = Box::leak(Box::new(schema));
        schemas.insert(schema.type_id, schema);
        schema
    }

    fn len(&self) -> usize {
        self.schemas.read().len()
    }
}

static SCHEMA_REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

#[inline]
fn schema_registry() -> &'static SchemaRegistry {
    SCHEMA_REGISTRY.get_or_init(SchemaRegistry::new)
}

/// Number of schemas registered so far in this process.
pub fn registered_schema_count() -> usize {
    schema_registry().len()
}

/// Number of iterable types registered so far in this process.
pub fn iterable_type_count() -> u32 {
    schema_registry().next_iterable_id.load(Ordering::Relaxed)
}

// =============================================================================
// Tests
// =============================================================================
