//! In-place reconciliation of an observed tree with plain data.
//!
//! Merging keeps the identity of every node whose slot survives. Keys absent
//! from the source are left alone; an explicit `Undefined` deletes. Scalar
//! assignments and deletes go through the same interception as `set` and
//! `delete`, so they are validated and reported the same way.

use std::panic::Location;

use vigil_schema::validate::record;
use vigil_schema::{Options, Value, Violation, type_name};

use crate::error::Error;
use crate::item::Item;
use crate::observed::Observed;

impl Observed {
    /// Merges `source` into this node and returns it.
    ///
    /// A source whose type does not match records a TYPE error at this
    /// node's path and leaves the node unchanged.
    #[track_caller]
    pub fn merge(&self, source: &Value) -> Result<&Self, Error> {
        let _caller = self.scope().enter(Location::caller());
        tracing::debug!(path = %self.path(), kind = %self.kind(), "merging into observed node");
        merge_node(self, source)?;
        Ok(self)
    }
}

/// Merges `source` into an observed item. Plain values cannot be merged
/// into.
#[track_caller]
pub fn merge(target: &Item, source: &Value) -> Result<Item, Error> {
    match target {
        Item::Node(node) => {
            node.merge(source)?;
            Ok(target.clone())
        }
        Item::Value(value) => Err(Error::ScalarMerge {
            kind: type_name(value, &Options::default()).to_string(),
        }),
    }
}

fn merge_node(node: &Observed, source: &Value) -> Result<(), Error> {
    let schema = node.schema();
    if !schema.matches(source) {
        let violation = Violation::Type {
            expected: schema.kind(),
            actual: schema.type_name(source).to_string(),
        };
        record(schema, &**node.scope(), &violation, &node.path())?;
        return Ok(());
    }
    match source {
        Value::Array(elements) => merge_array(node, elements),
        Value::Object(map) => {
            for (key, value) in map.iter() {
                merge_property(node, key, value)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn merge_array(node: &Observed, elements: &[Value]) -> Result<(), Error> {
    if elements.len() < node.len() {
        node.set_len(elements.len())?;
    }
    let overlap = node.len();
    for (index, element) in elements.iter().enumerate() {
        if index < overlap {
            if let Some(Item::Node(child)) = node.child_at(index) {
                merge_node(&child, element)?;
            } else {
                node.write_at(index, Item::Value(element.clone()))?;
            }
        } else {
            // rejected elements leave no slot behind, so append at the end
            node.write_at(node.len(), Item::Value(element.clone()))?;
        }
    }
    Ok(())
}

fn merge_property(node: &Observed, key: &str, value: &Value) -> Result<(), Error> {
    if value.is_undefined() {
        node.remove(key)?;
        return Ok(());
    }
    let container = node.schema().property(key).is_some_and(|property| property.is_container());
    match node.child(key) {
        Some(Item::Node(child)) if container => merge_node(&child, value),
        _ => node.write(key, Item::Value(value.clone())).map(|_| ()),
    }
}
