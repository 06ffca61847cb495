//! Observed nodes: schema-enforcing facades over object and array values.
//!
//! Every mutation goes through a node. Writes are validated against the
//! slot's schema at the slot's path, cast when the type does not match,
//! wrapped when the value is a container, and committed unless the schema
//! disallows invalid data. Deletes of required properties are recorded the
//! same way.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::Location;
use std::rc::Rc;

use indexmap::IndexMap;
use vigil_schema::validate::record;
use vigil_schema::{ErrorSink, Kind, Schema, Value, Violation, path, validate};

use crate::error::Error;
use crate::item::{Item, Outcome};
use crate::scope::Scope;
use crate::subscriber::Subscriber;

pub(crate) enum Storage {
    Array(Vec<Item>),
    Object(IndexMap<String, Item>),
}

pub(crate) struct Node {
    schema: Rc<Schema>,
    scope: Rc<Scope>,
    path: RefCell<String>,
    // cleared while the node sits in no slot
    attached: Cell<bool>,
    storage: RefCell<Storage>,
}

/// Handle to an observed container. Clones share the node.
#[derive(Clone)]
pub struct Observed(Rc<Node>);

// =============================================================================
// Construction
// =============================================================================

/// Observes `value` against `schema`, reporting into `sink` below `at`.
///
/// Containers whose type matches the schema come back as `Item::Node`;
/// everything else is validated and returned as is. An already observed node
/// is returned unchanged without validating again.
#[track_caller]
pub fn observe(
    value: impl Into<Item>,
    schema: &Rc<Schema>,
    sink: &ErrorSink,
    subscriber: Rc<dyn Subscriber>,
    at: &str,
) -> Result<Item, Error> {
    match value.into() {
        Item::Node(node) => Ok(Item::Node(node)),
        Item::Value(value) => {
            let scope = Scope::new(sink.clone(), subscriber, *schema.options());
            let _caller = scope.enter(Location::caller());
            validate(&value, schema, &*scope, at)?;
            Ok(wrap(value, schema, &scope, at))
        }
    }
}

/// Builds nodes for an already validated value.
pub(crate) fn wrap(value: Value, schema: &Rc<Schema>, scope: &Rc<Scope>, at: &str) -> Item {
    let storage = match (schema.kind(), value) {
        (Kind::Array, Value::Array(elements)) => {
            let items = schema.items();
            Storage::Array(
                elements
                    .into_iter()
                    .enumerate()
                    .map(|(index, element)| match items {
                        Some(items) => wrap(element, items, scope, &path::join_index(at, index)),
                        None => Item::Value(element),
                    })
                    .collect(),
            )
        }
        (Kind::Object, Value::Object(map)) => Storage::Object(
            map.into_iter()
                .filter(|(_, member)| !member.is_undefined())
                .map(|(key, member)| {
                    let item = match schema.property(&key) {
                        Some(property) => wrap(member, property, scope, &path::join(at, &key)),
                        None => Item::Value(member),
                    };
                    (key, item)
                })
                .collect(),
        ),
        (_, value) => return Item::Value(value),
    };
    tracing::trace!(path = at, kind = %schema.kind(), "observed node created");
    Item::Node(Observed(Rc::new(Node {
        schema: Rc::clone(schema),
        scope: Rc::clone(scope),
        path: RefCell::new(at.to_string()),
        attached: Cell::new(true),
        storage: RefCell::new(storage),
    })))
}

impl Observed {
    /// Observes `value` as a new root with a fresh error sink.
    ///
    /// The value is validated first; when its type does not match the
    /// schema it is replaced by the cast value, so a node is always returned
    /// for container schemas.
    #[track_caller]
    pub fn new(value: Value, schema: &Rc<Schema>, subscriber: Rc<dyn Subscriber>) -> Result<Self, Error> {
        Self::with_sink(value, schema, &ErrorSink::new(), subscriber)
    }

    #[track_caller]
    pub fn with_sink(
        value: Value,
        schema: &Rc<Schema>,
        sink: &ErrorSink,
        subscriber: Rc<dyn Subscriber>,
    ) -> Result<Self, Error> {
        if !schema.is_container() {
            return Err(Error::NotAContainer { path: String::new() });
        }
        let scope = Scope::new(sink.clone(), subscriber, *schema.options());
        let _caller = scope.enter(Location::caller());
        validate(&value, schema, &*scope, "")?;
        let value = if schema.matches(&value) {
            value
        } else {
            schema.cast(&value)
        };
        wrap(value, schema, &scope, "")
            .into_node()
            .ok_or(Error::NotAContainer { path: String::new() })
    }
}

// =============================================================================
// Reading
// =============================================================================

impl Observed {
    pub fn schema(&self) -> &Rc<Schema> {
        &self.0.schema
    }

    pub fn kind(&self) -> Kind {
        self.0.schema.kind()
    }

    pub fn is_array(&self) -> bool {
        matches!(&*self.0.storage.borrow(), Storage::Array(_))
    }

    /// Dotted path of this node from the observation root.
    pub fn path(&self) -> String {
        self.0.path.borrow().clone()
    }

    /// The sink shared by the whole tree.
    pub fn errors(&self) -> ErrorSink {
        self.0.scope.sink().clone()
    }

    pub fn subscriber(&self) -> Rc<dyn Subscriber> {
        Rc::clone(self.0.scope.subscriber())
    }

    /// Always true: an `Observed` only exists for wrapped containers.
    pub fn is_observed(&self) -> bool {
        true
    }

    /// Always true: nodes are built from values that were already
    /// validated, so observing a node again skips validation.
    pub fn is_validated(&self) -> bool {
        true
    }

    pub fn ptr_eq(&self, other: &Observed) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn len(&self) -> usize {
        match &*self.0.storage.borrow() {
            Storage::Array(items) => items.len(),
            Storage::Object(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Property names, or index strings for arrays.
    pub fn keys(&self) -> Vec<String> {
        match &*self.0.storage.borrow() {
            Storage::Array(items) => (0..items.len()).map(|index| index.to_string()).collect(),
            Storage::Object(map) => map.keys().cloned().collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.child(key).is_some()
    }

    /// Item at a dotted path below this node; the empty path is the node
    /// itself. Arrays also answer `length`.
    pub fn get(&self, at: &str) -> Option<Item> {
        let mut current = Item::Node(self.clone());
        for segment in path::segments(at) {
            current = current.into_node()?.child(segment)?;
        }
        Some(current)
    }

    /// Plain snapshot of the value at a dotted path.
    pub fn value(&self, at: &str) -> Option<Value> {
        self.get(at).map(Item::into_value)
    }

    /// Observed node at a dotted path.
    pub fn node(&self, at: &str) -> Option<Observed> {
        self.get(at).and_then(Item::into_node)
    }

    pub fn to_value(&self) -> Value {
        match &*self.0.storage.borrow() {
            Storage::Array(items) => Value::Array(items.iter().map(Item::to_value).collect()),
            Storage::Object(map) => Value::object(map.iter().map(|(key, item)| (key.clone(), item.to_value()))),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }

    pub(crate) fn child(&self, key: &str) -> Option<Item> {
        match &*self.0.storage.borrow() {
            Storage::Array(items) if key == "length" => Some(Item::Value(Value::from(items.len()))),
            Storage::Array(items) => path::parse_index(key).and_then(|index| items.get(index).cloned()),
            Storage::Object(map) => map.get(key).cloned(),
        }
    }

    pub(crate) fn child_at(&self, index: usize) -> Option<Item> {
        match &*self.0.storage.borrow() {
            Storage::Array(items) => items.get(index).cloned(),
            Storage::Object(_) => None,
        }
    }

    pub(crate) fn scope(&self) -> &Rc<Scope> {
        &self.0.scope
    }

    pub(crate) fn allow_invalid(&self) -> bool {
        self.0.schema.options().allow_invalid
    }

    fn container(&self, at: &str) -> Result<Observed, Error> {
        match self.get(at) {
            Some(Item::Node(node)) => Ok(node),
            Some(Item::Value(_)) => Err(Error::NotAContainer {
                path: path::join(&self.path(), at),
            }),
            None => Err(Error::NotFound {
                path: path::join(&self.path(), at),
            }),
        }
    }
}

// =============================================================================
// Writing
// =============================================================================

impl Observed {
    /// Writes `value` at a dotted path below this node.
    ///
    /// Writing `Value::Undefined` to an object property deletes it. On arrays
    /// the key must be an index up to the current length (equal appends) or
    /// `length`, which truncates or pads with item defaults.
    #[track_caller]
    pub fn set(&self, at: &str, value: impl Into<Item>) -> Result<Outcome, Error> {
        let _caller = self.0.scope.enter(Location::caller());
        let (parent, key) = path::split_last(at);
        self.container(parent)?.write(key, value.into())
    }

    /// Deletes the property or array element at a dotted path. Missing keys
    /// are a no-op.
    #[track_caller]
    pub fn delete(&self, at: &str) -> Result<Outcome, Error> {
        let _caller = self.0.scope.enter(Location::caller());
        let (parent, key) = path::split_last(at);
        self.container(parent)?.remove(key)
    }

    pub(crate) fn write(&self, key: &str, item: Item) -> Result<Outcome, Error> {
        if self.is_array() {
            self.write_key(key, item)
        } else {
            self.write_property(key, item)
        }
    }

    pub(crate) fn remove(&self, key: &str) -> Result<Outcome, Error> {
        if !self.is_array() {
            return self.remove_property(key);
        }
        let index = path::parse_index(key).ok_or_else(|| Error::NotAnIndex {
            key: key.to_string(),
            path: self.path(),
        })?;
        let removed = self.array_mut(|items| (index < items.len()).then(|| items.remove(index)))?;
        if let Some(removed) = removed {
            detach(&removed);
            self.relocate_from(index);
        }
        Ok(Outcome::Committed)
    }

    fn write_property(&self, key: &str, item: Item) -> Result<Outcome, Error> {
        if item.is_undefined() {
            return self.remove_property(key);
        }
        let at = path::join(&self.path(), key);
        let Some(schema) = self.0.schema.property(key).cloned() else {
            return self.write_unexpected(key, item, &at);
        };
        let (item, valid) = self.prepare(item, &schema, &at)?;
        if !valid && !self.allow_invalid() {
            tracing::debug!(path = %at, "invalid write rejected");
            detach(&item);
            return Ok(Outcome::Rejected);
        }
        settle(&item, &at);
        if let Some(previous) = self.object_mut(|map| map.insert(key.to_string(), item))? {
            detach(&previous);
        }
        Ok(outcome(valid))
    }

    fn write_unexpected(&self, key: &str, item: Item, at: &str) -> Result<Outcome, Error> {
        let violation = Violation::Unexpected { name: key.to_string() };
        record(&self.0.schema, &*self.0.scope, &violation, at)?;
        if !self.allow_invalid() {
            tracing::debug!(path = %at, "unexpected property dropped");
            return Ok(Outcome::Rejected);
        }
        tracing::debug!(path = %at, "unexpected property stored");
        let value = item.into_value();
        if let Some(previous) = self.object_mut(|map| map.insert(key.to_string(), Item::Value(value)))? {
            detach(&previous);
        }
        Ok(Outcome::CommittedInvalid)
    }

    fn remove_property(&self, key: &str) -> Result<Outcome, Error> {
        if !self.contains(key) {
            return Ok(Outcome::Committed);
        }
        let required = self.0.schema.property(key).is_some_and(|property| property.required());
        if required {
            let at = path::join(&self.path(), key);
            let violation = Violation::Required { name: key.to_string() };
            record(&self.0.schema, &*self.0.scope, &violation, &at)?;
            if !self.allow_invalid() {
                tracing::debug!(path = %at, "delete of required property rejected");
                return Ok(Outcome::Rejected);
            }
        }
        if let Some(removed) = self.object_mut(|map| map.shift_remove(key))? {
            detach(&removed);
        }
        Ok(outcome(!required))
    }

    fn write_key(&self, key: &str, item: Item) -> Result<Outcome, Error> {
        if key == "length" {
            let len = item.to_value().to_number();
            if !(len.is_finite() && len >= 0.0 && len.fract() == 0.0) {
                return Err(Error::NotAnIndex {
                    key: item.to_value().to_display(),
                    path: self.path(),
                });
            }
            if len > MAX_LENGTH as f64 {
                return Err(Error::IndexOutOfBounds {
                    index: len as usize,
                    len: self.len(),
                    path: self.path(),
                });
            }
            return self.set_len(len as usize);
        }
        let index = path::parse_index(key).ok_or_else(|| Error::NotAnIndex {
            key: key.to_string(),
            path: self.path(),
        })?;
        self.write_at(index, item)
    }

    /// Writes one array slot; `index == len` appends.
    pub(crate) fn write_at(&self, index: usize, item: Item) -> Result<Outcome, Error> {
        let len = self.len();
        if index > len {
            return Err(Error::IndexOutOfBounds {
                index,
                len,
                path: self.path(),
            });
        }
        let schema = self.items_schema()?;
        let at = path::join_index(&self.path(), index);
        let (item, valid) = self.prepare(item, &schema, &at)?;
        if !valid && !self.allow_invalid() {
            tracing::debug!(path = %at, "invalid write rejected");
            detach(&item);
            return Ok(Outcome::Rejected);
        }
        settle(&item, &at);
        let previous = self.array_mut(|items| {
            if index < items.len() {
                Some(std::mem::replace(&mut items[index], item))
            } else {
                items.push(item);
                None
            }
        })?;
        if let Some(previous) = previous {
            detach(&previous);
        }
        Ok(outcome(valid))
    }

    /// Truncates, or pads with fresh item defaults.
    pub(crate) fn set_len(&self, len: usize) -> Result<Outcome, Error> {
        let schema = self.items_schema()?;
        let current = self.len();
        if len <= current {
            let dropped: Vec<Item> = self.array_mut(|items| items.drain(len..).collect())?;
            dropped.iter().for_each(detach);
        } else {
            let base = self.path();
            let padding: Vec<Item> = (current..len)
                .map(|index| wrap(schema.default_data(), &schema, &self.0.scope, &path::join_index(&base, index)))
                .collect();
            self.array_mut(|items| items.extend(padding))?;
        }
        Ok(Outcome::Committed)
    }

    /// Validates an incoming item for a slot with `schema` at `at`, casts it
    /// on a type mismatch and wraps it.
    ///
    /// A detached node of this tree with the same schema is claimed and moved
    /// as it is; any other node is snapshotted and wrapped afresh, so a node
    /// never sits in two slots. Callers [`settle`] the item once committed or
    /// [`detach`] it again when the write is rejected.
    pub(crate) fn prepare(&self, item: Item, schema: &Rc<Schema>, at: &str) -> Result<(Item, bool), Error> {
        let item = match item {
            Item::Node(node) if node.is_movable_to(&self.0.scope, schema) => {
                node.0.attached.set(true);
                return Ok((Item::Node(node), true));
            }
            other => other,
        };
        let value = item.into_value();
        let valid = validate(&value, schema, &*self.0.scope, at)?;
        let value = if schema.matches(&value) {
            value
        } else {
            schema.cast(&value)
        };
        Ok((wrap(value, schema, &self.0.scope, at), valid))
    }

    fn is_movable_to(&self, scope: &Rc<Scope>, schema: &Rc<Schema>) -> bool {
        !self.0.attached.get() && Rc::ptr_eq(&self.0.scope, scope) && Rc::ptr_eq(&self.0.schema, schema)
    }

    pub(crate) fn items_schema(&self) -> Result<Rc<Schema>, Error> {
        self.0
            .schema
            .items()
            .cloned()
            .ok_or_else(|| Error::NotAnArray { path: self.path() })
    }

    pub(crate) fn array_mut<R>(&self, f: impl FnOnce(&mut Vec<Item>) -> R) -> Result<R, Error> {
        match &mut *self.0.storage.borrow_mut() {
            Storage::Array(items) => Ok(f(items)),
            Storage::Object(_) => Err(Error::NotAnArray { path: self.path() }),
        }
    }

    fn object_mut<R>(&self, f: impl FnOnce(&mut IndexMap<String, Item>) -> R) -> Result<R, Error> {
        match &mut *self.0.storage.borrow_mut() {
            Storage::Object(map) => Ok(f(map)),
            Storage::Array(_) => Err(Error::NotAContainer { path: self.path() }),
        }
    }

    /// Moves this subtree to `at`, updating every nested node's path.
    pub(crate) fn relocate(&self, at: &str) {
        if *self.0.path.borrow() == at {
            return;
        }
        *self.0.path.borrow_mut() = at.to_string();
        let children: Vec<(String, Observed)> = match &*self.0.storage.borrow() {
            Storage::Array(items) => items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| item.as_node().map(|node| (path::join_index(at, index), node.clone())))
                .collect(),
            Storage::Object(map) => map
                .iter()
                .filter_map(|(key, item)| item.as_node().map(|node| (path::join(at, key), node.clone())))
                .collect(),
        };
        for (child_path, child) in children {
            child.relocate(&child_path);
        }
    }

    /// Re-addresses array elements from `start` after a shift.
    pub(crate) fn relocate_from(&self, start: usize) {
        let base = self.path();
        let shifted: Vec<(usize, Observed)> = match &*self.0.storage.borrow() {
            Storage::Array(items) => items
                .iter()
                .enumerate()
                .skip(start)
                .filter_map(|(index, item)| item.as_node().map(|node| (index, node.clone())))
                .collect(),
            Storage::Object(_) => Vec::new(),
        };
        for (index, node) in shifted {
            node.relocate(&path::join_index(&base, index));
        }
    }
}

/// Largest array length a `length` write may request.
const MAX_LENGTH: usize = u32::MAX as usize;

/// Marks a node that left its slot, so it may be moved elsewhere later.
pub(crate) fn detach(item: &Item) {
    if let Item::Node(node) = item {
        node.0.attached.set(false);
    }
}

/// Addresses a committed item at its slot path.
pub(crate) fn settle(item: &Item, at: &str) {
    if let Item::Node(node) = item {
        node.relocate(at);
    }
}

pub(crate) fn outcome(valid: bool) -> Outcome {
    if valid {
        Outcome::Committed
    } else {
        Outcome::CommittedInvalid
    }
}

impl fmt::Debug for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observed")
            .field("path", &self.path())
            .field("kind", &self.kind())
            .field("value", &self.to_json())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::subscriber::Silent;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use vigil_schema::{ErrorCode, Options, Shape, Validators};

    fn schema(json: serde_json::Value, options: Options) -> Rc<Schema> {
        Schema::create(Shape::from_json(&json, &Validators::new()).unwrap(), options).unwrap()
    }

    fn person() -> Rc<Schema> {
        schema(
            json!({
                "firstName": "string",
                "?nick": "string",
                "addresses": [{"city": "string"}]
            }),
            Options::default(),
        )
    }

    fn observed(schema: &Rc<Schema>, json: serde_json::Value) -> Observed {
        Observed::new(Value::from(json), schema, Rc::new(Silent)).unwrap()
    }

    fn codes(node: &Observed) -> Vec<(ErrorCode, String)> {
        node.errors().iter().map(|e| (e.code, e.path)).collect()
    }

    #[test]
    fn test_children_are_wrapped_with_paths() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": [{"city": "X"}]}));
        let city_holder = root.node("addresses.0").unwrap();
        assert_eq!(city_holder.path(), "addresses.0");
        assert!(city_holder.is_observed() && city_holder.is_validated());
        assert_eq!(root.value("addresses.0.city"), Some(Value::from("X")));
        assert_eq!(root.value("addresses.length"), Some(Value::from(1)));
        assert!(root.errors().is_empty());
    }

    #[test]
    fn test_reads_keep_identity() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": []}));
        let a = root.node("addresses").unwrap();
        let b = root.node("addresses").unwrap();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_type_mismatch_is_cast_and_committed() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": []}));
        assert_eq!(root.set("firstName", 20).unwrap(), Outcome::CommittedInvalid);
        assert_eq!(root.value("firstName"), Some(Value::from("20")));
        assert_eq!(codes(&root), [(ErrorCode::Type, "firstName".to_string())]);
    }

    #[test]
    fn test_unexpected_property_stored_when_allowed() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": []}));
        assert_eq!(root.set("age", 3).unwrap(), Outcome::CommittedInvalid);
        assert_eq!(root.value("age"), Some(Value::from(3)));
        assert_eq!(codes(&root), [(ErrorCode::Unexpected, "age".to_string())]);
    }

    #[test]
    fn test_disallowed_invalid_writes_keep_old_value() {
        let schema = schema(
            json!({"firstName": "string", "addresses": [{"city": "string"}]}),
            Options::default().allow_invalid(false),
        );
        let root = observed(&schema, json!({"firstName": "A", "addresses": []}));
        assert_eq!(root.set("firstName", 1).unwrap(), Outcome::Rejected);
        assert_eq!(root.set("age", 1).unwrap(), Outcome::Rejected);
        assert_eq!(root.delete("firstName").unwrap(), Outcome::Rejected);
        assert_eq!(root.to_json(), json!({"firstName": "A", "addresses": []}));
        assert_eq!(root.errors().len(), 3);
    }

    #[test]
    fn test_strict_write_fails_and_keeps_value() {
        let schema = schema(json!({"firstName": "string"}), Options::default().strict(true));
        let root = observed(&schema, json!({"firstName": "A"}));
        let err = root.set("firstName", 20).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Type));
        assert_eq!(root.value("firstName"), Some(Value::from("A")));
        assert!(root.errors().is_empty());
    }

    #[test]
    fn test_delete_required_records_and_notifies_once() {
        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        let subscriber: Rc<dyn Subscriber> = Rc::new(move |_: &crate::Event<'_>| counter.set(counter.get() + 1));
        let root = Observed::new(
            Value::from(json!({"firstName": "A", "addresses": []})),
            &person(),
            subscriber,
        )
        .unwrap();

        assert_eq!(root.delete("firstName").unwrap(), Outcome::CommittedInvalid);
        assert_eq!(notified.get(), 1);
        assert!(!root.contains("firstName"));
        assert_eq!(codes(&root), [(ErrorCode::Required, "firstName".to_string())]);

        // optional and missing keys delete silently
        assert_eq!(root.delete("nick").unwrap(), Outcome::Committed);
        assert_eq!(notified.get(), 1);
    }

    #[test]
    fn test_set_undefined_deletes() {
        let root = observed(&person(), json!({"firstName": "A", "nick": "a", "addresses": []}));
        assert_eq!(root.set("nick", Value::Undefined).unwrap(), Outcome::Committed);
        assert!(!root.contains("nick"));
    }

    #[test]
    fn test_array_index_writes() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": []}));
        assert_eq!(root.set("addresses.0", json!({"city": "X"})).unwrap(), Outcome::Committed);
        assert_eq!(root.node("addresses.0").unwrap().path(), "addresses.0");
        assert!(matches!(
            root.set("addresses.5", json!({"city": "Y"})),
            Err(Error::IndexOutOfBounds { index: 5, len: 1, .. })
        ));
        assert!(matches!(root.set("addresses.first", json!({})), Err(Error::NotAnIndex { .. })));
    }

    #[test]
    fn test_array_length_writes() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": [{"city": "X"}]}));
        root.set("addresses.length", 3).unwrap();
        assert_eq!(
            root.value("addresses").unwrap().to_json(),
            json!([{"city": "X"}, {"city": ""}, {"city": ""}])
        );
        assert_eq!(root.node("addresses.2").unwrap().path(), "addresses.2");
        root.set("addresses.length", 0).unwrap();
        assert_eq!(root.node("addresses").unwrap().len(), 0);
    }

    #[test]
    fn test_length_beyond_array_limit_fails() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": [{"city": "X"}]}));
        assert!(matches!(
            root.set("addresses.length", 1e15),
            Err(Error::IndexOutOfBounds { len: 1, .. })
        ));
        assert!(matches!(root.set("addresses.length", -1), Err(Error::NotAnIndex { .. })));
        assert_eq!(root.node("addresses").unwrap().len(), 1);
    }

    #[test]
    fn test_attached_node_written_to_another_index_is_copied() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": [{"city": "X"}, {"city": "Y"}]}));
        let first = root.node("addresses.0").unwrap();
        assert_eq!(root.set("addresses.1", &first).unwrap(), Outcome::Committed);

        let second = root.node("addresses.1").unwrap();
        assert!(!second.ptr_eq(&first));
        assert_eq!(first.path(), "addresses.0");
        assert_eq!(second.path(), "addresses.1");

        root.set("addresses.0.city", 5).unwrap();
        assert_eq!(codes(&root), [(ErrorCode::Type, "addresses.0.city".to_string())]);
        assert_eq!(
            root.value("addresses").unwrap().to_json(),
            json!([{"city": "5"}, {"city": "X"}])
        );
    }

    #[test]
    fn test_rejected_move_keeps_node_path() {
        let schema = schema(
            json!({"firstName": "string", "addresses": [{"city": "string"}]}),
            Options::default().allow_invalid(false),
        );
        let root = observed(&schema, json!({"firstName": "A", "addresses": [{"city": "X"}, {"city": "Y"}]}));
        let addresses = root.node("addresses").unwrap();
        let first = addresses.node("0").unwrap();
        addresses.splice(0, 1, Vec::<Item>::new()).unwrap();
        assert_eq!(root.node("addresses.0").unwrap().path(), "addresses.0");

        let outcome = addresses.append([Item::from(&first), Item::from(3)]).unwrap();
        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(addresses.len(), 1);
        assert_eq!(first.path(), "addresses.0");
        assert_eq!(codes(&root), [(ErrorCode::Type, "addresses.2".to_string())]);

        // still detached, so a later append moves it as is
        assert_eq!(addresses.append([&first]).unwrap(), Outcome::Committed);
        assert!(root.node("addresses.1").unwrap().ptr_eq(&first));
        assert_eq!(first.path(), "addresses.1");
    }

    #[test]
    fn test_nested_writes_report_full_paths() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": [{"city": "X"}]}));
        root.set("addresses.0.city", false).unwrap();
        assert_eq!(codes(&root), [(ErrorCode::Type, "addresses.0.city".to_string())]);
        assert_eq!(root.value("addresses.0.city"), Some(Value::from("")));
    }

    #[test]
    fn test_paths_through_plain_values_fail() {
        let root = observed(&person(), json!({"firstName": "A", "addresses": []}));
        assert!(matches!(root.set("firstName.x", 1), Err(Error::NotAContainer { .. })));
        assert!(matches!(root.set("missing.x", 1), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_node_from_another_slot_is_copied() {
        let schema = schema(json!({"home": {"city": "string"}, "?work": {"city": "string"}}), Options::default());
        let root = observed(&schema, json!({"home": {"city": "X"}}));
        let home = root.node("home").unwrap();
        // different schema node, so the value is copied into a new node
        root.set("work", &home).unwrap();
        let work = root.node("work").unwrap();
        assert!(!work.ptr_eq(&home));
        assert_eq!(work.path(), "work");
        assert_eq!(home.path(), "home");
    }

    #[test]
    fn test_observe_returns_nodes_unchanged() {
        let schema = person();
        let sink = ErrorSink::new();
        let first = observe(
            Value::from(json!({"firstName": "A", "addresses": []})),
            &schema,
            &sink,
            Rc::new(Silent),
            "",
        )
        .unwrap();
        let node = first.as_node().unwrap().clone();
        let again = observe(node.clone(), &schema, &sink, Rc::new(Silent), "").unwrap();
        assert!(again.as_node().unwrap().ptr_eq(&node));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_observe_primitive_schema_returns_value() {
        let schema = schema(json!("number"), Options::default());
        let sink = ErrorSink::new();
        let item = observe(Value::from("x"), &schema, &sink, Rc::new(Silent), "age").unwrap();
        assert_eq!(item, Item::Value(Value::from("x")));
        assert_eq!(sink.get("age")[0].code, ErrorCode::Type);
    }
}
