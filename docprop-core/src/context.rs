//! Stack-scoped build contexts and the schema registry that creates them.
//!
//! One context exists per currently-open element. The registry - filled in
//! by the schema layer, never interpreted here - decides for each
//! (parent context, token) pair which stock context a child element opens
//! and how its attributes are typed. Tokens with no registered context get
//! the pass-through [`UnknownContext`], which is how newer-schema content
//! flows through without errors.

use std::collections::HashMap;

use crate::property::{Id, Property, PropertyKind, PropertySet, Table, ID_NONE};
use crate::value::Value;

/// Integer assigned to a qualified element/attribute name by the schema
/// layer. Cheap to dispatch on; the engine never compares names.
pub type Token = u32;

/// Index of a registered element spec; doubles as the context kind for
/// child dispatch.
pub type SpecId = usize;

/// How attribute or leaf-element text becomes a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Bool,
    Int,
    Hex,
    Measure,
    Str,
}

impl AttrType {
    /// Convert source text per this type. Total; malformed text degrades
    /// per the value constructors.
    pub fn value_of(self, text: &str) -> Value {
        match self {
            AttrType::Bool => Value::bool_text(text),
            AttrType::Int => Value::int_text(text),
            AttrType::Hex => Value::hex_text(text),
            AttrType::Measure => Value::measure_text(text),
            AttrType::Str => Value::Str(text.to_owned()),
        }
    }
}

/// Which stock context an element opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Structured bag of properties.
    Properties,

    /// Ordered rows, one per finished child.
    Table,

    /// Leaf whose character data becomes a typed value.
    Value(AttrType),
}

/// How a finished element's artifact reaches its parent.
#[derive(Debug, Clone, Copy)]
pub struct ElementSpec {
    pub role: Role,

    /// Property id the artifact is delivered under. [`ID_NONE`] with a
    /// `Properties` role merges the child's set into the parent instead
    /// of nesting it.
    pub id: Id,

    /// Delivered as an attribute or as a structured modifier.
    pub kind: PropertyKind,
}

impl ElementSpec {
    pub fn new(role: Role, id: Id, kind: PropertyKind) -> Self {
        ElementSpec { role, id, kind }
    }

    /// Property bag merged (flattened) into its parent.
    pub fn merged() -> Self {
        ElementSpec::new(Role::Properties, ID_NONE, PropertyKind::Attribute)
    }

    /// Property bag delivered as a structured modifier under `id`.
    pub fn structure(id: Id) -> Self {
        ElementSpec::new(Role::Properties, id, PropertyKind::Modifier)
    }

    /// Leaf element delivered as an attribute under `id`.
    pub fn leaf(id: Id, ty: AttrType) -> Self {
        ElementSpec::new(Role::Value(ty), id, PropertyKind::Attribute)
    }

    /// Table of repeated children.
    pub fn table() -> Self {
        ElementSpec::new(Role::Table, ID_NONE, PropertyKind::Attribute)
    }
}

/// Dispatch tables supplied by the schema layer.
///
/// Keyed by (context spec, token): the same token may mean different
/// things under different parents. Lookups that miss fall through to the
/// unknown pass-through in the front-end.
#[derive(Debug, Default)]
pub struct Registry {
    specs: Vec<ElementSpec>,
    children: HashMap<(SpecId, Token), SpecId>,
    attrs: HashMap<(SpecId, Token), (Id, AttrType)>,
}

impl Registry {
    /// Create a registry whose root context follows `root`.
    pub fn new(root: ElementSpec) -> Self {
        Registry {
            specs: vec![root],
            children: HashMap::new(),
            attrs: HashMap::new(),
        }
    }

    /// The document-level root spec.
    pub fn root(&self) -> SpecId {
        0
    }

    /// Declare the child context recognized under `parent` for `token`.
    /// Returns the new spec's id so grandchildren can be declared on it.
    pub fn child(&mut self, parent: SpecId, token: Token, spec: ElementSpec) -> SpecId {
        let spec_id = self.specs.len();
        self.specs.push(spec);
        self.children.insert((parent, token), spec_id);
        spec_id
    }

    /// Reuse an already-declared spec under another (parent, token) edge.
    /// Lets recursive structures point back at themselves.
    pub fn child_ref(&mut self, parent: SpecId, token: Token, spec: SpecId) {
        self.children.insert((parent, token), spec);
    }

    /// Declare a typed attribute recognized on elements of `spec`.
    pub fn attr(&mut self, spec: SpecId, token: Token, id: Id, ty: AttrType) {
        self.attrs.insert((spec, token), (id, ty));
    }

    pub fn spec(&self, spec_id: SpecId) -> &ElementSpec {
        &self.specs[spec_id]
    }

    pub fn lookup_child(&self, parent: SpecId, token: Token) -> Option<SpecId> {
        self.children.get(&(parent, token)).copied()
    }

    pub fn lookup_attr(&self, spec: SpecId, token: Token) -> Option<(Id, AttrType)> {
        self.attrs.get(&(spec, token)).copied()
    }
}

/// What a finished context hands to its parent when its element closes.
#[derive(Debug)]
pub enum ContextResult {
    /// Nothing (unknown content).
    None,

    /// A typed leaf value.
    Value(Value),

    /// A finalized property bag.
    Properties(PropertySet),

    /// A finalized table.
    Table(Table),
}

/// A transient per-element build context.
///
/// Created on the element's start event, finalized on the matching end;
/// ownership of the finished artifact transfers to the parent context up
/// the stack.
pub trait ContextHandler {
    /// Spec this context was created from; `None` for pass-through
    /// contexts, whose children are in turn pass-through.
    fn spec(&self) -> Option<SpecId>;

    /// An attribute of the opening element, already typed by the registry.
    fn attribute(&mut self, id: Id, value: Value);

    /// Character data inside the element. Structural contexts ignore it.
    fn characters(&mut self, _text: &str) {}

    /// A finished child artifact, delivered per the child's spec.
    fn child(&mut self, spec: &ElementSpec, result: ContextResult);

    /// Finalize. The context is consumed; the artifact is immutable from
    /// the parent's point of view.
    fn finish(self: Box<Self>) -> ContextResult;
}

/// Create the stock context for a spec.
pub(crate) fn make_context(spec_id: SpecId, spec: &ElementSpec) -> Box<dyn ContextHandler> {
    match spec.role {
        Role::Properties => Box::new(PropertiesContext::new(spec_id)),
        Role::Table => Box::new(TableContext::new(spec_id)),
        Role::Value(ty) => Box::new(ValueContext::new(spec_id, ty)),
    }
}

/// Incorporate a finished child artifact into a property bag per the
/// child's spec.
fn incorporate(props: &PropertySet, spec: &ElementSpec, result: ContextResult) {
    match result {
        ContextResult::None => {}
        ContextResult::Value(value) => {
            props.add(Property::new(spec.id, value, spec.kind));
        }
        ContextResult::Properties(set) => {
            if spec.id == ID_NONE {
                // Flatten: the child's content belongs directly to us.
                props.add_set(&set);
            } else {
                props.add(Property::new(spec.id, Value::Properties(set), spec.kind));
            }
        }
        // A table has no value representation inside a bag; a schema that
        // nests one here gets the usual silent tolerance.
        ContextResult::Table(_) => {}
    }
}

/// Builds a [`PropertySet`] from attributes and finished children.
pub struct PropertiesContext {
    spec: SpecId,
    props: PropertySet,
}

impl PropertiesContext {
    pub fn new(spec: SpecId) -> Self {
        PropertiesContext {
            spec,
            props: PropertySet::new(),
        }
    }
}

impl ContextHandler for PropertiesContext {
    fn spec(&self) -> Option<SpecId> {
        Some(self.spec)
    }

    fn attribute(&mut self, id: Id, value: Value) {
        self.props.add(Property::attribute(id, value));
    }

    fn child(&mut self, spec: &ElementSpec, result: ContextResult) {
        incorporate(&self.props, spec, result);
    }

    fn finish(self: Box<Self>) -> ContextResult {
        ContextResult::Properties(self.props)
    }
}

/// Builds a [`Table`]: each finished child contributes one row.
pub struct TableContext {
    spec: SpecId,
    table: Table,
}

impl TableContext {
    pub fn new(spec: SpecId) -> Self {
        TableContext {
            spec,
            table: Table::new(),
        }
    }
}

impl ContextHandler for TableContext {
    fn spec(&self) -> Option<SpecId> {
        Some(self.spec)
    }

    fn attribute(&mut self, _id: Id, _value: Value) {}

    fn child(&mut self, _spec: &ElementSpec, result: ContextResult) {
        match result {
            ContextResult::Properties(set) => self.table.add(Value::Properties(set)),
            ContextResult::Value(value) => self.table.add(value),
            ContextResult::None | ContextResult::Table(_) => {}
        }
    }

    fn finish(self: Box<Self>) -> ContextResult {
        ContextResult::Table(self.table)
    }
}

/// Accumulates character data for a leaf element and finalizes it into a
/// typed value.
pub struct ValueContext {
    spec: SpecId,
    ty: AttrType,
    text: String,
}

impl ValueContext {
    pub fn new(spec: SpecId, ty: AttrType) -> Self {
        ValueContext {
            spec,
            ty,
            text: String::new(),
        }
    }
}

impl ContextHandler for ValueContext {
    fn spec(&self) -> Option<SpecId> {
        Some(self.spec)
    }

    fn attribute(&mut self, _id: Id, _value: Value) {}

    fn characters(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn child(&mut self, _spec: &ElementSpec, _result: ContextResult) {}

    fn finish(self: Box<Self>) -> ContextResult {
        ContextResult::Value(self.ty.value_of(&self.text))
    }
}

/// Pass-through context for tokens no spec recognizes.
///
/// Accepts arbitrarily deep unknown content and produces nothing. Keeps
/// the stack disciplined so schema extensions the registry predates flow
/// through a parse without errors.
pub struct UnknownContext;

impl ContextHandler for UnknownContext {
    fn spec(&self) -> Option<SpecId> {
        None
    }

    fn attribute(&mut self, _id: Id, _value: Value) {}

    fn child(&mut self, _spec: &ElementSpec, _result: ContextResult) {}

    fn finish(self: Box<Self>) -> ContextResult {
        ContextResult::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_type_conversion() {
        assert!(AttrType::Bool.value_of("on").as_bool());
        assert_eq!(AttrType::Int.value_of("-3").as_int(), -3);
        assert_eq!(AttrType::Hex.value_of("FF").as_int(), 255);
        assert_eq!(AttrType::Measure.value_of("12pt").as_int(), 240);
        assert_eq!(AttrType::Str.value_of("x").as_str(), "x");
    }

    #[test]
    fn test_registry_dispatch_is_parent_scoped() {
        let mut registry = Registry::new(ElementSpec::merged());
        let root = registry.root();
        let section = registry.child(root, 10, ElementSpec::structure(100));
        registry.child(section, 10, ElementSpec::leaf(200, AttrType::Int));

        // Token 10 means different things under root and under section.
        let under_root = registry.lookup_child(root, 10).unwrap();
        let under_section = registry.lookup_child(section, 10).unwrap();
        assert_ne!(under_root, under_section);
        assert!(matches!(registry.spec(under_section).role, Role::Value(AttrType::Int)));

        assert_eq!(registry.lookup_child(root, 99), None);
    }

    #[test]
    fn test_registry_recursive_edge() {
        let mut registry = Registry::new(ElementSpec::merged());
        let root = registry.root();
        let list = registry.child(root, 1, ElementSpec::structure(100));
        registry.child_ref(list, 1, list);

        assert_eq!(registry.lookup_child(list, 1), Some(list));
    }

    #[test]
    fn test_value_context_accumulates_text() {
        let mut ctx = ValueContext::new(0, AttrType::Measure);
        ctx.characters("12");
        ctx.characters("pt");
        match Box::new(ctx).finish() {
            ContextResult::Value(value) => assert_eq!(value.as_int(), 240),
            other => panic!("expected value, got {other:?}"),
        }
    }

    #[test]
    fn test_incorporate_flattens_sentinel_sets() {
        let parent = PropertySet::new();
        let child = PropertySet::new();
        child.add(Property::attribute(1, Value::Int(1)));

        incorporate(&parent, &ElementSpec::merged(), ContextResult::Properties(child));
        // Flattened: one property, not a nested bag.
        assert_eq!(parent.len(), 1);

        let nested = PropertySet::new();
        nested.add(Property::attribute(2, Value::Int(2)));
        incorporate(
            &parent,
            &ElementSpec::structure(50),
            ContextResult::Properties(nested),
        );
        assert_eq!(parent.len(), 2);
    }
}
