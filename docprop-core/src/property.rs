//! Properties, property sets, and tables - the schema-agnostic
//! intermediate representation, and the visitor protocol that replays it.
//!
//! A [`PropertySet`] is an ordered sequence, not a map: duplicate ids
//! coexist and no override policy is applied here. Whether first or last
//! wins (or both matter) is the consuming builder's decision, so resolution
//! delivers everything, in insertion order.

use std::cell::RefCell;

use crate::handle::{BinaryHandle, StreamHandle};
use crate::value::Value;

/// Identifier naming a property's meaning. A namespaced integer assigned
/// by the schema layer; opaque to the engine, interpreted only by the
/// registry that produced it and the builders that consume it.
pub type Id = u32;

/// Reserved id for "no property" / unpopulated placeholder slots.
/// Modifier properties carrying it are never retained or dispatched.
pub const ID_NONE: Id = 0;

/// How a property is delivered during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Terminal key=value annotation, delivered through
    /// [`PropertiesVisitor::attribute`].
    Attribute,

    /// Key mapping to a whole nested structure, delivered through
    /// [`PropertiesVisitor::modifier`]. The visitor walks into the
    /// structure via the property's value.
    Modifier,
}

/// An identifier paired with a value.
#[derive(Debug, Clone)]
pub struct Property {
    id: Id,
    value: Value,
    kind: PropertyKind,
}

impl Property {
    pub fn new(id: Id, value: Value, kind: PropertyKind) -> Self {
        Property { id, value, kind }
    }

    /// Terminal property.
    pub fn attribute(id: Id, value: Value) -> Self {
        Property::new(id, value, PropertyKind::Attribute)
    }

    /// Structured-modifier property.
    pub fn modifier(id: Id, value: Value) -> Self {
        Property::new(id, value, PropertyKind::Modifier)
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Nested structure reachable through this property's value, if any.
    #[inline]
    pub fn properties(&self) -> Option<&PropertySet> {
        self.value.properties()
    }

    /// Deferred binary payload carried by this property's value, if any.
    #[inline]
    pub fn binary(&self) -> Option<&BinaryHandle> {
        self.value.binary()
    }

    /// Deferred stream payload carried by this property's value, if any.
    #[inline]
    pub fn stream(&self) -> Option<&StreamHandle> {
        self.value.stream()
    }

    /// Deliver this property to a visitor. Attributes go through
    /// `attribute`, modifiers through `modifier`; a sentinel-id modifier
    /// is a no-op.
    pub fn resolve(&self, visitor: &mut dyn PropertiesVisitor) {
        match self.kind {
            PropertyKind::Attribute => visitor.attribute(self.id, &self.value),
            PropertyKind::Modifier => {
                if self.id != ID_NONE {
                    visitor.modifier(self);
                }
            }
        }
    }
}

/// Receiver side of property resolution, implemented by each
/// semantic-model builder for the settings area it owns.
///
/// Builders switch on the id, extract typed payloads through the value
/// projections, and recursively resolve nested sets reached through
/// modifier properties.
pub trait PropertiesVisitor {
    fn attribute(&mut self, id: Id, value: &Value);
    fn modifier(&mut self, property: &Property);
}

/// Receiver side of table resolution. Entries arrive in stable append
/// order with their zero-based position.
pub trait TableVisitor {
    fn entry(&mut self, index: usize, properties: &PropertySet);
}

/// Ordered, append-only collection of properties.
///
/// Backed by a `RefCell` so appends go through `&self`: a visitor callback
/// may hold a reference to the very set being resolved and extend it
/// mid-resolution.
#[derive(Debug, Default)]
pub struct PropertySet {
    props: RefCell<Vec<Property>>,
}

impl PropertySet {
    pub fn new() -> Self {
        PropertySet::default()
    }

    /// Append a property. Sentinel-id modifiers are dropped here, at
    /// construction, so they can never reach a visitor.
    pub fn add(&self, property: Property) {
        if property.kind == PropertyKind::Modifier && property.id == ID_NONE {
            return;
        }
        self.props.borrow_mut().push(property);
    }

    /// Structural merge: append all of `other`'s properties, in `other`'s
    /// order, after the receiver's current tail. Used to flatten a child
    /// context's content into its parent.
    pub fn add_set(&self, other: &PropertySet) {
        // Clone out first; `other` may alias `self`.
        let incoming: Vec<Property> = other.props.borrow().clone();
        for property in incoming {
            self.add(property);
        }
    }

    pub fn len(&self) -> usize {
        self.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.borrow().is_empty()
    }

    /// Deliver every property, in insertion order.
    ///
    /// The current length is re-read on each step rather than snapshotted:
    /// a callback that appends to this set while an earlier property is
    /// being delivered gets its addition visited too, within the same
    /// call. Deletion does not exist, so indexing stays valid.
    pub fn resolve(&self, visitor: &mut dyn PropertiesVisitor) {
        let mut index = 0;
        loop {
            // Clone the property out so no borrow is held across the
            // callback (which may re-enter `add`).
            let property = match self.props.borrow().get(index) {
                Some(property) => property.clone(),
                None => break,
            };
            property.resolve(visitor);
            index += 1;
        }
    }
}

impl Clone for PropertySet {
    /// Deep copy: same ordered list, each value cloned. Nested sets are
    /// copied; handle values keep sharing their backing resource.
    fn clone(&self) -> Self {
        PropertySet {
            props: RefCell::new(self.props.borrow().clone()),
        }
    }
}

/// Ordered, position-indexed collection of entries, each able to yield a
/// property set. Used for repeated sibling structures where the ordinal
/// position matters alongside the content.
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<Value>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Append an entry. Position is its stable zero-based index.
    pub fn add(&mut self, entry: Value) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver every entry, in append order. An entry without a nested set
    /// resolves as an empty set; its position is delivered regardless, so
    /// indices stay stable independent of entry content.
    pub fn resolve(&self, visitor: &mut dyn TableVisitor) {
        let empty = PropertySet::new();
        for (index, entry) in self.entries.iter().enumerate() {
            match entry.properties() {
                Some(properties) => visitor.entry(index, properties),
                None => visitor.entry(index, &empty),
            }
        }
    }
}

/// Visitor that pulls the string payload of one attribute out of a
/// resolved set. Later occurrences of the id overwrite earlier ones.
#[derive(Debug)]
pub struct FindString {
    id: Id,
    found: Option<String>,
}

impl FindString {
    pub fn new(id: Id) -> Self {
        FindString { id, found: None }
    }

    pub fn found(&self) -> Option<&str> {
        self.found.as_deref()
    }

    pub fn into_found(self) -> Option<String> {
        self.found
    }
}

impl PropertiesVisitor for FindString {
    fn attribute(&mut self, id: Id, value: &Value) {
        if id == self.id {
            self.found = Some(value.as_str().to_owned());
        }
    }

    fn modifier(&mut self, _property: &Property) {}
}

/// Visitor that pulls one attribute's integer payload out of a resolved
/// set.
#[derive(Debug)]
pub struct FindInt {
    id: Id,
    found: Option<i32>,
}

impl FindInt {
    pub fn new(id: Id) -> Self {
        FindInt { id, found: None }
    }

    pub fn found(&self) -> Option<i32> {
        self.found
    }
}

impl PropertiesVisitor for FindInt {
    fn attribute(&mut self, id: Id, value: &Value) {
        if id == self.id {
            self.found = Some(value.as_int());
        }
    }

    fn modifier(&mut self, _property: &Property) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every callback as (id, int payload).
    #[derive(Default)]
    struct Recorder {
        attributes: Vec<(Id, i32)>,
        modifiers: Vec<Id>,
    }

    impl PropertiesVisitor for Recorder {
        fn attribute(&mut self, id: Id, value: &Value) {
            self.attributes.push((id, value.as_int()));
        }

        fn modifier(&mut self, property: &Property) {
            self.modifiers.push(property.id());
        }
    }

    #[test]
    fn test_resolve_in_insertion_order() {
        let set = PropertySet::new();
        for id in 1..=5 {
            set.add(Property::attribute(id, Value::Int(id as i32 * 10)));
        }

        let mut recorder = Recorder::default();
        set.resolve(&mut recorder);

        assert_eq!(
            recorder.attributes,
            vec![(1, 10), (2, 20), (3, 30), (4, 40), (5, 50)]
        );
        assert!(recorder.modifiers.is_empty());
    }

    #[test]
    fn test_duplicate_ids_both_delivered() {
        let set = PropertySet::new();
        set.add(Property::attribute(9, Value::Int(1)));
        set.add(Property::attribute(9, Value::Int(2)));

        let mut recorder = Recorder::default();
        set.resolve(&mut recorder);
        assert_eq!(recorder.attributes, vec![(9, 1), (9, 2)]);
    }

    #[test]
    fn test_sentinel_modifier_never_retained() {
        let set = PropertySet::new();
        set.add(Property::modifier(ID_NONE, Value::Int(1)));
        assert!(set.is_empty());

        // Still dropped when arriving through a merge.
        let other = PropertySet::new();
        other.add(Property::modifier(ID_NONE, Value::Int(2)));
        set.add_set(&other);
        assert!(set.is_empty());

        let mut recorder = Recorder::default();
        set.resolve(&mut recorder);
        assert!(recorder.attributes.is_empty());
        assert!(recorder.modifiers.is_empty());
    }

    #[test]
    fn test_sentinel_attribute_is_kept() {
        // Only modifiers carry the placeholder meaning; an attribute with
        // id 0 is delivered like any other.
        let set = PropertySet::new();
        set.add(Property::attribute(ID_NONE, Value::Int(3)));

        let mut recorder = Recorder::default();
        set.resolve(&mut recorder);
        assert_eq!(recorder.attributes, vec![(0, 3)]);
    }

    #[test]
    fn test_merge_preserves_both_orders() {
        let a = PropertySet::new();
        a.add(Property::attribute(1, Value::Int(1)));
        a.add(Property::attribute(2, Value::Int(2)));

        let b = PropertySet::new();
        b.add(Property::attribute(3, Value::Int(3)));
        b.add(Property::attribute(4, Value::Int(4)));

        a.add_set(&b);

        let mut recorder = Recorder::default();
        a.resolve(&mut recorder);
        assert_eq!(
            recorder.attributes,
            vec![(1, 1), (2, 2), (3, 3), (4, 4)]
        );
    }

    #[test]
    fn test_clone_resolves_identically() {
        let set = PropertySet::new();
        set.add(Property::attribute(1, Value::Int(11)));
        set.add(Property::attribute(2, Value::Str("x".to_owned())));
        set.add(Property::attribute(3, Value::Bool(true)));

        let copy = set.clone();

        let mut original = Recorder::default();
        set.resolve(&mut original);
        let mut cloned = Recorder::default();
        copy.resolve(&mut cloned);
        assert_eq!(original.attributes, cloned.attributes);

        // And the copies are independent afterwards.
        copy.add(Property::attribute(4, Value::Int(4)));
        assert_eq!(set.len(), 3);
        assert_eq!(copy.len(), 4);
    }

    /// Appends one extra property to the set under resolution on the
    /// first callback.
    struct Appender<'a> {
        set: &'a PropertySet,
        appended: bool,
        seen: Vec<Id>,
    }

    impl PropertiesVisitor for Appender<'_> {
        fn attribute(&mut self, id: Id, _value: &Value) {
            self.seen.push(id);
            if !self.appended {
                self.appended = true;
                self.set.add(Property::attribute(99, Value::Int(99)));
            }
        }

        fn modifier(&mut self, _property: &Property) {}
    }

    #[test]
    fn test_reentrant_append_is_visited_in_same_resolve() {
        let set = PropertySet::new();
        set.add(Property::attribute(1, Value::Int(1)));
        set.add(Property::attribute(2, Value::Int(2)));

        let mut visitor = Appender {
            set: &set,
            appended: false,
            seen: Vec::new(),
        };
        set.resolve(&mut visitor);

        // The append landed after the existing tail and was still visited
        // before resolve returned.
        assert_eq!(visitor.seen, vec![1, 2, 99]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_modifier_dispatch() {
        let nested = PropertySet::new();
        nested.add(Property::attribute(21, Value::Int(210)));

        let set = PropertySet::new();
        set.add(Property::modifier(20, Value::Properties(nested)));

        let mut recorder = Recorder::default();
        set.resolve(&mut recorder);
        assert!(recorder.attributes.is_empty());
        assert_eq!(recorder.modifiers, vec![20]);
    }

    struct Rows {
        rows: Vec<(usize, usize)>,
    }

    impl TableVisitor for Rows {
        fn entry(&mut self, index: usize, properties: &PropertySet) {
            self.rows.push((index, properties.len()));
        }
    }

    #[test]
    fn test_table_positions_stable() {
        let mut table = Table::new();
        for n in 0..4 {
            let row = PropertySet::new();
            for id in 0..n {
                row.add(Property::attribute(id, Value::Int(id as i32)));
            }
            table.add(Value::Properties(row));
        }
        // Entry without a nested set still occupies a position.
        table.add(Value::Int(7));

        let mut rows = Rows { rows: Vec::new() };
        table.resolve(&mut rows);
        assert_eq!(rows.rows, vec![(0, 0), (1, 1), (2, 2), (3, 3), (4, 0)]);
    }

    #[test]
    fn test_find_string_and_int() {
        let set = PropertySet::new();
        set.add(Property::attribute(5, Value::Str("alpha".to_owned())));
        set.add(Property::attribute(6, Value::Int(42)));

        let mut find = FindString::new(5);
        set.resolve(&mut find);
        assert_eq!(find.found(), Some("alpha"));
        assert_eq!(find.into_found().as_deref(), Some("alpha"));

        let mut find = FindInt::new(6);
        set.resolve(&mut find);
        assert_eq!(find.found(), Some(42));

        let mut miss = FindInt::new(7);
        set.resolve(&mut miss);
        assert_eq!(miss.found(), None);
    }
}
