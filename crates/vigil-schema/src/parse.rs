//! Normalization of `Shape` input into canonical `Definition`s.

use indexmap::IndexMap;

use crate::definition::Definition;
use crate::error::SchemaError;
use crate::kind::{self, Kind};
use crate::options::Options;
use crate::path;
use crate::shape::{Descriptor, OPTIONAL_MARKER, Shape};
use crate::value::{Map, Value};

/// Normalizes `shape` into a canonical definition. Re-parsing the result
/// with the same options reproduces it unchanged.
pub fn parse(shape: impl Into<Shape>, options: &Options) -> Result<Definition, SchemaError> {
    let parser = Parser { options };
    parser.node(shape.into(), Slot::root())
}

/// Where a node sits: its positional name, its schema path, and whether the
/// key carried the optional marker.
struct Slot {
    name: String,
    path: String,
    optional: bool,
}

impl Slot {
    fn root() -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            optional: false,
        }
    }

    fn items(&self) -> Self {
        Self {
            name: String::new(),
            path: path::join(&self.path, "*"),
            optional: false,
        }
    }

    fn property(&self, key: &str) -> Self {
        let (name, optional) = match key.strip_prefix(OPTIONAL_MARKER) {
            Some(stripped) => (stripped, true),
            None => (key, false),
        };
        Self {
            name: name.to_string(),
            path: path::join(&self.path, name),
            optional,
        }
    }
}

struct Parser<'a> {
    options: &'a Options,
}

impl Parser<'_> {
    fn node(&self, shape: Shape, slot: Slot) -> Result<Definition, SchemaError> {
        match shape {
            Shape::Null => self.canonical(Descriptor::new(Kind::Object), slot),
            Shape::Marker(kind) => self.canonical(Descriptor::new(kind), slot),
            Shape::Literal(value) => self.literal(value, slot),
            Shape::List(items) => {
                let items = items.into_iter().next().unwrap_or_default();
                self.canonical(Descriptor::new(Kind::Array).items(items), slot)
            }
            Shape::Record(properties) => self.canonical(
                Descriptor {
                    kind: Some(Kind::Object),
                    properties: Some(properties),
                    ..Descriptor::default()
                },
                slot,
            ),
            Shape::Canonical(descriptor) => self.canonical(*descriptor, slot),
        }
    }

    /// A literal declares its own type and serves as the default.
    fn literal(&self, value: Value, slot: Slot) -> Result<Definition, SchemaError> {
        match value {
            Value::Undefined | Value::Null => self.node(Shape::Null, slot),
            Value::String(s) if s.parse::<Kind>().is_ok() => {
                let kind = s.parse::<Kind>()?;
                self.node(Shape::Marker(kind), slot)
            }
            Value::Array(items) => self.node(Shape::List(items.into_iter().map(Shape::Literal).collect()), slot),
            Value::Object(map) => self.node(
                Shape::Record(map.into_iter().map(|(k, v)| (k, Shape::Literal(v))).collect()),
                slot,
            ),
            value => {
                let kind = kind::type_of(&value, self.options).ok_or_else(|| SchemaError::MissingType {
                    path: slot.path.clone(),
                })?;
                let default = kind::cast(&value, kind);
                self.canonical(Descriptor::new(kind).default_value(default), slot)
            }
        }
    }

    fn canonical(&self, descriptor: Descriptor, slot: Slot) -> Result<Definition, SchemaError> {
        let Descriptor {
            name: _,
            kind,
            items,
            properties,
            required,
            default,
            validate,
        } = descriptor;

        let kind = match kind {
            Some(kind) => kind,
            None if properties.is_some() => Kind::Object,
            None if items.is_some() => Kind::Array,
            None => return Err(SchemaError::MissingType { path: slot.path }),
        };
        if kind.is_strict_numeric() && !self.options.strict_numbers {
            return Err(SchemaError::StrictNumbersRequired { kind, path: slot.path });
        }
        if items.is_some() && kind != Kind::Array {
            return Err(SchemaError::ItemsOnNonArray { kind, path: slot.path });
        }
        if properties.is_some() && kind != Kind::Object {
            return Err(SchemaError::PropertiesOnNonObject { kind, path: slot.path });
        }

        let default = match default {
            None | Some(Value::Undefined) => kind.default_value(),
            Some(default) => {
                if !kind.accepts(kind::type_of(&default, self.options)) {
                    return Err(SchemaError::DefaultTypeMismatch {
                        kind,
                        actual: kind::type_name(&default, self.options).to_string(),
                        path: slot.path,
                    });
                }
                default
            }
        };

        let items = match kind {
            Kind::Array => {
                let shape = items.map(|items| *items).unwrap_or_default();
                Some(Box::new(self.node(shape, slot.items())?))
            }
            _ => None,
        };

        let properties = match kind {
            Kind::Object => Some(self.properties(properties.unwrap_or_default(), &slot)?),
            _ => None,
        };

        let required = !slot.optional && required.unwrap_or(true);

        Ok(Definition {
            name: slot.name,
            kind,
            items,
            properties,
            required,
            default,
            validate: validate.unwrap_or_default(),
        })
    }

    fn properties(
        &self,
        properties: IndexMap<String, Shape>,
        slot: &Slot,
    ) -> Result<IndexMap<String, Definition>, SchemaError> {
        let mut out = IndexMap::with_capacity(properties.len());
        for (key, shape) in properties {
            let child = slot.property(&key);
            let name = child.name.clone();
            let definition = self.node(shape, child)?;
            out.insert(name, definition);
        }
        Ok(out)
    }
}

/// Builds the default value tree of a definition: objects get every
/// declared property's default data, other kinds their own default.
pub fn default_data(definition: &Definition) -> Value {
    match (&definition.properties, &definition.default) {
        (Some(properties), Value::Object(base)) => {
            let mut data: Map = base.clone();
            for (name, child) in properties {
                if !data.contains_key(name) {
                    data.insert(name.clone(), default_data(child));
                }
            }
            Value::Object(data)
        }
        (_, default) => default.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Validators;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse_json(json: serde_json::Value, options: &Options) -> Result<Definition, SchemaError> {
        parse(Shape::from_json(&json, &Validators::new())?, options)
    }

    fn definition_json(json: serde_json::Value) -> serde_json::Value {
        parse_json(json, &Options::default()).unwrap().to_json().unwrap()
    }

    #[test]
    fn test_null_is_empty_object() {
        assert_eq!(
            definition_json(json!(null)),
            json!({"name": "", "type": "object", "properties": {}, "required": true, "default": {}})
        );
    }

    #[test]
    fn test_marker_defaults() {
        assert_eq!(
            definition_json(json!("string")),
            json!({"name": "", "type": "string", "required": true, "default": ""})
        );
        assert_eq!(
            definition_json(json!("array")),
            json!({
                "name": "",
                "type": "array",
                "items": {"name": "", "type": "object", "properties": {}, "required": true, "default": {}},
                "required": true,
                "default": []
            })
        );
    }

    #[test]
    fn test_literal_is_its_own_default() {
        assert_eq!(
            definition_json(json!({"age": 18, "title": "Mr"})),
            json!({
                "name": "",
                "type": "object",
                "properties": {
                    "age": {"name": "age", "type": "number", "required": true, "default": 18},
                    "title": {"name": "title", "type": "string", "required": true, "default": "Mr"}
                },
                "required": true,
                "default": {}
            })
        );
    }

    #[test]
    fn test_optional_marker_is_stripped() {
        let definition = parse_json(json!({"?middleName": "string", "lastName": "string"}), &Options::default())
            .unwrap();
        let properties = definition.properties.unwrap();
        let keys: Vec<_> = properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["middleName", "lastName"]);
        assert!(!properties["middleName"].required);
        assert!(properties["lastName"].required);
    }

    #[test]
    fn test_explicit_required_false() {
        let definition = parse_json(
            json!({"properties": {"nick": {"type": "string", "required": false}}}),
            &Options::default(),
        )
        .unwrap();
        assert_eq!(definition.kind, Kind::Object);
        assert!(!definition.properties.unwrap()["nick"].required);
    }

    #[test]
    fn test_list_shorthand_uses_first_element() {
        let definition = parse_json(json!([{"city": "string"}]), &Options::default()).unwrap();
        assert_eq!(definition.kind, Kind::Array);
        let items = definition.items.unwrap();
        assert_eq!(items.kind, Kind::Object);
        assert_eq!(items.properties.unwrap()["city"].kind, Kind::String);
    }

    #[test]
    fn test_strict_numbers_required_for_integer() {
        let err = parse_json(json!({"count": "integer"}), &Options::default()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::StrictNumbersRequired {
                kind: Kind::Integer,
                path: "count".into()
            }
        );
        let ok = parse_json(json!({"count": "integer"}), &Options::default().strict_numbers(true)).unwrap();
        assert_eq!(ok.properties.unwrap()["count"].kind, Kind::Integer);
    }

    #[test]
    fn test_keyword_misuse_fails() {
        assert!(matches!(
            parse(Descriptor::new(Kind::String).items(Kind::Number), &Options::default()),
            Err(SchemaError::ItemsOnNonArray { .. })
        ));
        assert!(matches!(
            parse(Descriptor::new(Kind::Array).property("a", Kind::Number), &Options::default()),
            Err(SchemaError::PropertiesOnNonObject { .. })
        ));
        assert!(matches!(
            parse(Descriptor::new(Kind::Number).default_value("x"), &Options::default()),
            Err(SchemaError::DefaultTypeMismatch { .. })
        ));
        assert!(matches!(
            parse(Descriptor::default(), &Options::default()),
            Err(SchemaError::MissingType { .. })
        ));
    }

    #[test]
    fn test_names_are_positional() {
        let definition = parse(
            Descriptor::new(Kind::Object).property("first", Descriptor::new(Kind::String).name("other")),
            &Options::default(),
        )
        .unwrap();
        assert_eq!(definition.properties.unwrap()["first"].name, "first");
    }

    #[test]
    fn test_canonical_output_is_a_fixed_point() {
        let options = Options::default().strict_numbers(true);
        let once = parse_json(
            json!({"name": "string", "?tags": ["string"], "address": {"zip": "integer"}}),
            &options,
        )
        .unwrap();
        let twice = parse(once.clone(), &options).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_default_data() {
        let definition = parse_json(
            json!({"name": "string", "address": {"zip": "number"}, "tags": ["string"]}),
            &Options::default(),
        )
        .unwrap();
        assert_eq!(
            default_data(&definition).to_json(),
            json!({"name": "", "address": {"zip": 0}, "tags": []})
        );
    }
}
