//! Compiled schema tree.

use std::cell::OnceCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::definition::{Definition, Validator};
use crate::error::SchemaError;
use crate::kind::{self, Kind};
use crate::options::Options;
use crate::parse;
use crate::shape::Shape;
use crate::value::Value;

/// One node of a compiled schema tree.
///
/// Nodes are immutable once built. Children are owned through `Rc`, the
/// parent link is weak and only used for navigation.
#[derive(Debug)]
pub struct Schema {
    name: String,
    kind: Kind,
    required: bool,
    default: Value,
    validate: Validator,
    items: Option<Rc<Schema>>,
    properties: Option<IndexMap<String, Rc<Schema>>>,
    parent: Weak<Schema>,
    options: Options,
    definition: OnceCell<Definition>,
}

impl Schema {
    /// Compiles `shape` into a schema tree carrying `options` on every node.
    pub fn create(shape: impl Into<Shape>, options: Options) -> Result<Rc<Schema>, SchemaError> {
        let definition = parse::parse(shape, &options)?;
        tracing::trace!(kind = %definition.kind, "schema compiled");
        Ok(build(definition, Weak::new(), options))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn validator(&self) -> &Validator {
        &self.validate
    }

    pub fn items(&self) -> Option<&Rc<Schema>> {
        self.items.as_ref()
    }

    pub fn properties(&self) -> Option<&IndexMap<String, Rc<Schema>>> {
        self.properties.as_ref()
    }

    pub fn property(&self, name: &str) -> Option<&Rc<Schema>> {
        self.properties.as_ref().and_then(|properties| properties.get(name))
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn parent(&self) -> Option<Rc<Schema>> {
        self.parent.upgrade()
    }

    pub fn is_root(&self) -> bool {
        self.parent.upgrade().is_none()
    }

    pub fn root(self: &Rc<Self>) -> Rc<Schema> {
        let mut node = Rc::clone(self);
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Dotted path of this node inside its tree; array items appear as `*`.
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut child: *const Schema = self;
        let mut name = self.name.clone();
        let mut parent = self.parent();
        // each node is named by how its parent holds it
        while let Some(holder) = parent {
            let is_items = holder
                .items
                .as_ref()
                .is_some_and(|items| std::ptr::eq(Rc::as_ptr(items), child));
            segments.push(if is_items { "*".to_string() } else { name });
            name = holder.name.clone();
            child = Rc::as_ptr(&holder);
            parent = holder.parent();
        }
        segments.reverse();
        segments.join(".")
    }

    /// Whether a value classified as `actual` satisfies this node's kind.
    pub fn accepts(&self, actual: Option<Kind>) -> bool {
        self.kind.accepts(actual)
    }

    pub fn type_of(&self, value: &Value) -> Option<Kind> {
        kind::type_of(value, &self.options)
    }

    pub fn type_name(&self, value: &Value) -> &'static str {
        kind::type_name(value, &self.options)
    }

    /// Whether `value` is classified as this node's kind.
    pub fn matches(&self, value: &Value) -> bool {
        self.accepts(self.type_of(value))
    }

    pub fn cast(&self, value: &Value) -> Value {
        kind::cast(value, self.kind)
    }

    /// Canonical projection of this node, computed once.
    pub fn definition(&self) -> &Definition {
        self.definition.get_or_init(|| Definition {
            name: self.name.clone(),
            kind: self.kind,
            items: self.items.as_ref().map(|items| Box::new(items.definition().clone())),
            properties: self.properties.as_ref().map(|properties| {
                properties
                    .iter()
                    .map(|(name, child)| (name.clone(), child.definition().clone()))
                    .collect()
            }),
            required: self.required,
            default: self.default.clone(),
            validate: self.validate.clone(),
        })
    }

    /// Fresh default value tree for this node.
    pub fn default_data(&self) -> Value {
        parse::default_data(self.definition())
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        self.definition().to_json()
    }

    pub fn to_json_pretty(&self, indent: usize) -> serde_json::Result<String> {
        self.definition().to_json_pretty(indent)
    }
}

pub fn definition_of(schema: &Schema) -> Definition {
    schema.definition().clone()
}

fn build(definition: Definition, parent: Weak<Schema>, options: Options) -> Rc<Schema> {
    let Definition {
        name,
        kind,
        items,
        properties,
        required,
        default,
        validate,
    } = definition;
    Rc::new_cyclic(|this| Schema {
        name,
        kind,
        required,
        default,
        validate,
        items: items.map(|items| build(*items, this.clone(), options)),
        properties: properties.map(|properties| {
            properties
                .into_iter()
                .map(|(name, child)| (name, build(child, this.clone(), options)))
                .collect()
        }),
        parent,
        options,
        definition: OnceCell::new(),
    })
}
