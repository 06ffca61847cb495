//! Type registry: the fixed set of schema kinds, value classification and
//! casting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::options::Options;
use crate::value::{Function, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    String,
    Integer,
    Float,
    Number,
    Boolean,
    Array,
    Object,
    Function,
}

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::String,
        Kind::Integer,
        Kind::Float,
        Kind::Number,
        Kind::Boolean,
        Kind::Array,
        Kind::Object,
        Kind::Function,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Function => "function",
        }
    }

    /// Kinds whose values get wrapped by the observation layer.
    pub fn is_container(self) -> bool {
        matches!(self, Kind::Array | Kind::Object)
    }

    pub fn is_primitive(self) -> bool {
        !self.is_container()
    }

    /// Whether this kind needs the `strictNumbers` option to be declared.
    pub fn is_strict_numeric(self) -> bool {
        matches!(self, Kind::Integer | Kind::Float)
    }

    /// Whether a value classified as `actual` satisfies this kind.
    ///
    /// `number` and `float` accept every numeric classification, `integer`
    /// only integral numbers.
    pub fn accepts(self, actual: Option<Kind>) -> bool {
        match (self, actual) {
            (_, None) => false,
            (Kind::Number | Kind::Float, Some(Kind::Integer | Kind::Float | Kind::Number)) => true,
            (expected, Some(actual)) => expected == actual,
        }
    }

    /// The value a bare type marker (or an absent value) casts to.
    pub fn default_value(self) -> Value {
        cast(&Value::Undefined, self)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownType { name: s.to_string() })
    }
}

/// Classifies a value. Probes run in the order
/// number, boolean, string, array, function, object; absent values and
/// `null` belong to no kind.
pub fn type_of(value: &Value, options: &Options) -> Option<Kind> {
    let kind = match value {
        Value::Number(n) => {
            if options.strict_numbers {
                if n.is_finite() && n.fract() == 0.0 {
                    Kind::Integer
                } else {
                    Kind::Float
                }
            } else {
                Kind::Number
            }
        }
        Value::Bool(_) => Kind::Boolean,
        Value::String(_) => Kind::String,
        Value::Array(_) => Kind::Array,
        Value::Function(_) => Kind::Function,
        Value::Object(_) => Kind::Object,
        Value::Undefined | Value::Null => return None,
    };
    Some(kind)
}

/// Type tag used in messages: the kind name, `"null"` or `"undefined"`.
pub fn type_name(value: &Value, options: &Options) -> &'static str {
    match (type_of(value, options), value) {
        (Some(kind), _) => kind.as_str(),
        (None, Value::Null) => "null",
        (None, _) => "undefined",
    }
}

/// Total coercion of `value` to `kind`.
pub fn cast(value: &Value, kind: Kind) -> Value {
    match kind {
        Kind::Array => match value {
            Value::Array(items) => Value::Array(items.clone()),
            Value::String(s) => Value::Array(s.chars().map(|c| Value::String(c.to_string())).collect()),
            _ => Value::Array(Vec::new()),
        },
        Kind::String => {
            if value.is_truthy() {
                Value::String(value.to_display())
            } else {
                Value::String(String::new())
            }
        }
        Kind::Integer => Value::Number(finite_or_zero(value.to_number().trunc())),
        Kind::Float | Kind::Number => Value::Number(finite_or_zero(value.to_number())),
        Kind::Boolean => Value::Bool(value.is_truthy()),
        Kind::Function => match value {
            Value::Function(f) => Value::Function(f.clone()),
            _ => Value::Function(Function::noop()),
        },
        Kind::Object => match value {
            Value::Object(map) => Value::Object(map.clone()),
            _ => Value::Object(Map::new()),
        },
    }
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() { n } else { 0.0 }
}
