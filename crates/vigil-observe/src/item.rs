use vigil_schema::Value;

use crate::observed::Observed;

/// Content of one slot in an observed container: a plain value, or an
/// observed child node.
#[derive(Debug, Clone)]
pub enum Item {
    Value(Value),
    Node(Observed),
}

impl Item {
    /// Plain snapshot of the slot.
    pub fn to_value(&self) -> Value {
        match self {
            Item::Value(value) => value.clone(),
            Item::Node(node) => node.to_value(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Item::Value(value) => value,
            Item::Node(node) => node.to_value(),
        }
    }

    pub fn as_node(&self) -> Option<&Observed> {
        match self {
            Item::Node(node) => Some(node),
            Item::Value(_) => None,
        }
    }

    pub fn into_node(self) -> Option<Observed> {
        match self {
            Item::Node(node) => Some(node),
            Item::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(value) => Some(value),
            Item::Node(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_))
    }

    pub(crate) fn is_undefined(&self) -> bool {
        matches!(self, Item::Value(Value::Undefined))
    }
}

impl PartialEq for Item {
    /// Nodes compare by identity, values structurally.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Item::Value(a), Item::Value(b)) => a == b,
            (Item::Node(a), Item::Node(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Item::Value(value)
    }
}

impl From<Observed> for Item {
    fn from(node: Observed) -> Self {
        Item::Node(node)
    }
}

impl From<&Observed> for Item {
    fn from(node: &Observed) -> Self {
        Item::Node(node.clone())
    }
}

impl From<serde_json::Value> for Item {
    fn from(json: serde_json::Value) -> Self {
        Item::Value(Value::from(json))
    }
}

impl From<&str> for Item {
    fn from(s: &str) -> Self {
        Item::Value(Value::from(s))
    }
}

impl From<f64> for Item {
    fn from(n: f64) -> Self {
        Item::Value(Value::from(n))
    }
}

impl From<i32> for Item {
    fn from(n: i32) -> Self {
        Item::Value(Value::from(n))
    }
}

impl From<bool> for Item {
    fn from(b: bool) -> Self {
        Item::Value(Value::from(b))
    }
}

/// What a mutation did with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stored and valid.
    Committed,
    /// Stored although errors were recorded, under `allowInvalid`.
    CommittedInvalid,
    /// Errors were recorded and the old state was kept.
    Rejected,
}

impl Outcome {
    pub fn is_committed(self) -> bool {
        !matches!(self, Outcome::Rejected)
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Outcome::Committed)
    }
}
