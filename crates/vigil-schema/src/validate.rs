//! Recursive validation of values against compiled schemas.

use crate::error::{Error, ErrorEntry, Violation};
use crate::kind::Kind;
use crate::path;
use crate::schema::Schema;
use crate::sink::Report;
use crate::value::{Map, Value};

/// Checks `value` against `schema`, reporting every violation in the subtree
/// at its dotted path below `at`.
///
/// All applicable checks run; nothing is short-circuited. Returns whether the
/// subtree is valid. Under a strict schema the first violation is returned as
/// `Error::Rejected` instead of being reported.
pub fn validate(value: &Value, schema: &Schema, sink: &dyn Report, at: &str) -> Result<bool, Error> {
    if value.is_undefined() {
        if schema.required() {
            let violation = Violation::Required {
                name: schema.name().to_string(),
            };
            record(schema, sink, &violation, at)?;
            return Ok(false);
        }
        return Ok(true);
    }

    let mut valid = true;

    if !schema.matches(value) {
        let violation = Violation::Type {
            expected: schema.kind(),
            actual: schema.type_name(value).to_string(),
        };
        record(schema, sink, &violation, at)?;
        valid = false;
    } else if !schema.validator().check(value) {
        let violation = Violation::Invalid {
            validator: schema.validator().name().map(str::to_string),
        };
        record(schema, sink, &violation, at)?;
        valid = false;
    }

    match (schema.kind(), value) {
        (Kind::Array, Value::Array(elements)) => {
            if let Some(items) = schema.items() {
                for (index, element) in elements.iter().enumerate() {
                    let ok = validate(element, items, sink, &path::join_index(at, index))?;
                    valid = valid && ok;
                }
            }
        }
        (Kind::Object, Value::Object(map)) => {
            let ok = validate_members(map, schema, sink, at)?;
            valid = valid && ok;
        }
        _ => {}
    }

    Ok(valid)
}

fn validate_members(
    map: &Map,
    schema: &Schema,
    sink: &dyn Report,
    at: &str,
) -> Result<bool, Error> {
    let mut valid = true;

    for (key, member) in map.iter() {
        if member.is_undefined() || schema.property(key).is_some() {
            continue;
        }
        let violation = Violation::Unexpected { name: key.clone() };
        record(schema, sink, &violation, &path::join(at, key))?;
        valid = false;
    }

    if let Some(properties) = schema.properties() {
        for (name, property) in properties {
            let member = map.get(name).unwrap_or(&Value::Undefined);
            // absent optional members are skipped, present ones are checked
            if !property.required() && member.is_undefined() {
                continue;
            }
            let ok = validate(member, property, sink, &path::join(at, name))?;
            valid = valid && ok;
        }
    }

    Ok(valid)
}

/// Reports a violation, or fails with it when the schema is strict.
pub fn record(schema: &Schema, sink: &dyn Report, violation: &Violation, at: &str) -> Result<(), Error> {
    let entry = ErrorEntry::new(violation, at);
    if schema.options().strict {
        tracing::debug!(code = %entry.code, path = %entry.path, "strict schema rejected value");
        return Err(Error::Rejected(entry));
    }
    sink.report(entry);
    Ok(())
}
