//! Canonical schema definitions and the validator registry.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use thisisplural::Plural;

use crate::kind::Kind;
use crate::value::{Function, Value};

// =============================================================================
// Validator
// =============================================================================

#[derive(Clone)]
enum Check {
    Always,
    Custom(Rc<dyn Fn(&Value) -> bool>),
}

/// Custom predicate attached to a schema node, optionally named so it can be
/// referenced from JSON and written back out.
#[derive(Clone)]
pub struct Validator {
    name: Option<String>,
    check: Check,
}

impl Validator {
    /// The identity-true predicate given to nodes without a validator.
    pub fn always() -> Self {
        Self {
            name: None,
            check: Check::Always,
        }
    }

    pub fn new(check: impl Fn(&Value) -> bool + 'static) -> Self {
        Self {
            name: None,
            check: Check::Custom(Rc::new(check)),
        }
    }

    pub fn named(name: impl Into<String>, check: impl Fn(&Value) -> bool + 'static) -> Self {
        Self {
            name: Some(name.into()),
            check: Check::Custom(Rc::new(check)),
        }
    }

    /// Adapts a function value: the value passes when the call returns a
    /// truthy result.
    pub fn from_function(function: Function) -> Self {
        Self::new(move |value| function.call(std::slice::from_ref(value)).is_truthy())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_always(&self) -> bool {
        matches!(self.check, Check::Always)
    }

    pub fn check(&self, value: &Value) -> bool {
        match &self.check {
            Check::Always => true,
            Check::Custom(check) => check(value),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::always()
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && match (&self.check, &other.check) {
                (Check::Always, Check::Always) => true,
                (Check::Custom(a), Check::Custom(b)) => Rc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.check) {
            (Some(name), _) => write!(f, "Validator({name})"),
            (None, Check::Always) => f.write_str("Validator(always)"),
            (None, Check::Custom(_)) => f.write_str("Validator(..)"),
        }
    }
}

impl Serialize for Validator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.name {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_none(),
        }
    }
}

/// Name to validator registry used to resolve `"validate": "<name>"`.
#[derive(Debug, Clone, Default, Plural)]
#[plural(len, is_empty, iter, new)]
pub struct Validators(IndexMap<String, Validator>);

impl Validators {
    pub fn register(
        &mut self,
        name: impl Into<String>,
        check: impl Fn(&Value) -> bool + 'static,
    ) -> &mut Self {
        let name = name.into();
        self.0.insert(name.clone(), Validator::named(name, check));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Validator> {
        self.0.get(name)
    }
}

// =============================================================================
// Definition
// =============================================================================

/// Fully normalized, JSON-safe projection of a schema node. Every keyword is
/// present; `items` exactly for arrays and `properties` exactly for objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Definition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Definition>>,
    pub required: bool,
    pub default: Value,
    #[serde(skip_serializing_if = "is_anonymous")]
    pub validate: Validator,
}

fn is_anonymous(validator: &Validator) -> bool {
    validator.name().is_none()
}

impl Definition {
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn to_json_pretty(&self, indent: usize) -> serde_json::Result<String> {
        let indent = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only emits UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
