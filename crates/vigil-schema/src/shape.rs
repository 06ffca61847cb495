//! Schema input grammar.
//!
//! A `Shape` is what callers hand to the compiler: either a canonical
//! descriptor or one of the shorthand forms built from plain literals.
//!
//! | input                               | shape                  |
//! |-------------------------------------|------------------------|
//! | `null` / absent                     | `Null` (empty object)  |
//! | `"number"` (a kind name)            | `Marker(Kind::Number)` |
//! | `5`, `true`, `"John"`               | `Literal(value)`       |
//! | `["number"]`                        | `List([...])`          |
//! | `{"?age": "number"}`                | `Record({...})`        |
//! | `{"type": "array", "items": ...}`   | `Canonical(...)`       |

use indexmap::IndexMap;

use crate::definition::{Definition, Validator, Validators};
use crate::error::SchemaError;
use crate::kind::Kind;
use crate::path;
use crate::schema::Schema;
use crate::value::{Map, Value};

/// Keywords recognized in canonical descriptors.
pub const KEYWORDS: [&str; 7] = [
    "name",
    "type",
    "items",
    "properties",
    "required",
    "default",
    "validate",
];

/// Prefix marking a record key as optional.
pub const OPTIONAL_MARKER: char = '?';

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Shape {
    #[default]
    Null,
    Marker(Kind),
    Literal(Value),
    /// Array of the first element's shape. An empty list is an array of
    /// empty objects.
    List(Vec<Shape>),
    Record(IndexMap<String, Shape>),
    Canonical(Box<Descriptor>),
}

/// Canonical keyword set. Every keyword is optional on input and filled in
/// by `parse`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Descriptor {
    pub name: Option<String>,
    pub kind: Option<Kind>,
    pub items: Option<Box<Shape>>,
    pub properties: Option<IndexMap<String, Shape>>,
    pub required: Option<bool>,
    pub default: Option<Value>,
    pub validate: Option<Validator>,
}

impl Descriptor {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn items(mut self, items: impl Into<Shape>) -> Self {
        self.items = Some(Box::new(items.into()));
        self
    }

    pub fn property(mut self, name: impl Into<String>, shape: impl Into<Shape>) -> Self {
        self.properties
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), shape.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validate = Some(validator);
        self
    }
}

impl Shape {
    /// Shorthand for an array of `items`.
    pub fn list(items: impl Into<Shape>) -> Self {
        Shape::List(vec![items.into()])
    }

    pub fn record<K: Into<String>>(entries: impl IntoIterator<Item = (K, Shape)>) -> Self {
        Shape::Record(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Reads the loosely structured grammar from a runtime value. Named
    /// validators are resolved against `validators`.
    pub fn from_value(value: &Value, validators: &Validators) -> Result<Self, SchemaError> {
        read_shape(value, validators, "")
    }

    pub fn from_json(json: &serde_json::Value, validators: &Validators) -> Result<Self, SchemaError> {
        Self::from_value(&Value::from(json), validators)
    }
}

fn read_shape(value: &Value, validators: &Validators, at: &str) -> Result<Shape, SchemaError> {
    Ok(match value {
        Value::Undefined | Value::Null => Shape::Null,
        Value::String(s) => match s.parse::<Kind>() {
            Ok(kind) => Shape::Marker(kind),
            Err(_) => Shape::Literal(value.clone()),
        },
        Value::Bool(_) | Value::Number(_) | Value::Function(_) => Shape::Literal(value.clone()),
        Value::Array(items) => Shape::List(
            items
                .iter()
                .map(|item| read_shape(item, validators, &path::join(at, "*")))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) if is_descriptor(map) => {
            Shape::Canonical(Box::new(read_descriptor(map, validators, at)?))
        }
        Value::Object(map) => Shape::Record(read_properties(map, validators, at)?),
    })
}

fn read_properties(
    map: &Map,
    validators: &Validators,
    at: &str,
) -> Result<IndexMap<String, Shape>, SchemaError> {
    map.iter()
        .map(|(key, value)| {
            let child = path::join(at, key.trim_start_matches(OPTIONAL_MARKER));
            Ok::<_, SchemaError>((key.clone(), read_shape(value, validators, &child)?))
        })
        .collect()
}

/// An object is a descriptor when it names a type (or hints one through
/// `items`/`properties`) and every key is a keyword holding a value of the
/// keyword's expected shape.
fn is_descriptor(map: &Map) -> bool {
    map.keys().any(|key| matches!(key, "type" | "items" | "properties"))
        && map.iter().all(|(key, value)| match key.as_str() {
            _ if value.is_undefined() => KEYWORDS.contains(&key.as_str()),
            "type" => value.as_str().is_some_and(|s| s.parse::<Kind>().is_ok()),
            "name" => matches!(value, Value::String(_)),
            "required" => matches!(value, Value::Bool(_)),
            "validate" => matches!(value, Value::String(_) | Value::Function(_)),
            "properties" => matches!(value, Value::Object(_)),
            "items" | "default" => true,
            _ => false,
        })
}

fn read_descriptor(map: &Map, validators: &Validators, at: &str) -> Result<Descriptor, SchemaError> {
    let mut descriptor = Descriptor::default();
    for (key, value) in map.iter().filter(|(_, v)| !v.is_undefined()) {
        match (key.as_str(), value) {
            ("type", Value::String(s)) => descriptor.kind = Some(s.parse()?),
            ("name", Value::String(s)) => descriptor.name = Some(s.clone()),
            ("required", Value::Bool(b)) => descriptor.required = Some(*b),
            ("validate", Value::String(name)) => {
                let validator = validators.get(name).ok_or_else(|| SchemaError::UnknownValidator {
                    name: name.clone(),
                    path: at.to_string(),
                })?;
                descriptor.validate = Some(validator.clone());
            }
            ("validate", Value::Function(f)) => {
                descriptor.validate = Some(Validator::from_function(f.clone()));
            }
            ("properties", Value::Object(properties)) => {
                descriptor.properties = Some(read_properties(properties, validators, at)?);
            }
            ("items", items) => {
                descriptor.items = Some(Box::new(read_shape(items, validators, &path::join(at, "*"))?));
            }
            // a null default in JSON means "no default"
            ("default", Value::Null) => {}
            ("default", default) => descriptor.default = Some(default.clone()),
            (keyword, _) => {
                return Err(SchemaError::InvalidKeyword {
                    keyword: keyword.to_string(),
                    path: at.to_string(),
                    reason: "unexpected value".to_string(),
                });
            }
        }
    }
    Ok(descriptor)
}

impl From<Kind> for Shape {
    fn from(kind: Kind) -> Self {
        Shape::Marker(kind)
    }
}

impl From<Descriptor> for Shape {
    fn from(descriptor: Descriptor) -> Self {
        Shape::Canonical(Box::new(descriptor))
    }
}

impl From<Definition> for Shape {
    fn from(definition: Definition) -> Self {
        Shape::from(Descriptor {
            name: Some(definition.name),
            kind: Some(definition.kind),
            items: definition.items.map(|items| Box::new(Shape::from(*items))),
            properties: definition.properties.map(|properties| {
                properties
                    .into_iter()
                    .map(|(key, child)| (key, Shape::from(child)))
                    .collect()
            }),
            required: Some(definition.required),
            default: Some(definition.default),
            validate: Some(definition.validate),
        })
    }
}

impl From<&Definition> for Shape {
    fn from(definition: &Definition) -> Self {
        Shape::from(definition.clone())
    }
}

impl From<&Schema> for Shape {
    fn from(schema: &Schema) -> Self {
        Shape::from(schema.definition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(json: serde_json::Value) -> Shape {
        Shape::from_json(&json, &Validators::new()).unwrap()
    }

    #[test]
    fn test_primitive_shapes() {
        assert_eq!(read(json!(null)), Shape::Null);
        assert_eq!(read(json!("number")), Shape::Marker(Kind::Number));
        assert_eq!(read(json!("John")), Shape::Literal(Value::from("John")));
        assert_eq!(read(json!(5)), Shape::Literal(Value::from(5)));
    }

    #[test]
    fn test_record_and_list_shorthand() {
        let shape = read(json!({"name": "string", "rates": ["number"]}));
        // `name` holds a kind name, which is well shaped, but `rates` is no keyword
        assert_eq!(
            shape,
            Shape::record([
                ("name", Shape::Marker(Kind::String)),
                ("rates", Shape::list(Kind::Number)),
            ])
        );
    }

    #[test]
    fn test_descriptor_detection() {
        let shape = read(json!({"type": "array", "items": {"type": "number"}}));
        assert_eq!(
            shape,
            Shape::from(Descriptor::new(Kind::Array).items(Descriptor::new(Kind::Number)))
        );
        // `type` naming no kind makes the object record shorthand
        assert!(matches!(read(json!({"type": "person"})), Shape::Record(_)));
        // `required` must be a boolean for the object to be a descriptor
        assert!(matches!(read(json!({"type": "string", "required": "yes"})), Shape::Record(_)));
        assert!(matches!(read(json!({})), Shape::Record(map) if map.is_empty()));
        // keywords without a type hint read as shorthand
        assert!(matches!(read(json!({"name": "string"})), Shape::Record(_)));
    }

    #[test]
    fn test_named_validator_resolution() {
        let mut validators = Validators::new();
        validators.register("adult", |v| v.as_f64().is_some_and(|n| n >= 18.0));
        let shape = Shape::from_json(&json!({"type": "number", "validate": "adult"}), &validators).unwrap();
        let Shape::Canonical(descriptor) = shape else {
            panic!("expected a descriptor");
        };
        assert_eq!(descriptor.validate.as_ref().and_then(Validator::name), Some("adult"));

        let err = Shape::from_json(&json!({"age": {"type": "number", "validate": "adult"}}), &Validators::new())
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownValidator {
                name: "adult".into(),
                path: "age".into()
            }
        );
    }

    #[test]
    fn test_null_default_is_no_default() {
        let Shape::Canonical(descriptor) = read(json!({"type": "string", "default": null})) else {
            panic!("expected a descriptor");
        };
        assert_eq!(descriptor.default, None);
    }
}
