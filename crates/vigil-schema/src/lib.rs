//! Schema compiler and validation engine.
//!
//! A schema is compiled once from a [`Shape`] (canonical descriptor or
//! shorthand literals) into an immutable [`Schema`] tree. [`validate`] checks
//! values against it and reports path-addressed [`ErrorEntry`]s into an
//! [`ErrorSink`].

pub mod definition;
pub mod error;
pub mod kind;
pub mod options;
pub mod parse;
pub mod path;
pub mod schema;
pub mod shape;
pub mod sink;
pub mod validate;
pub mod value;

pub use definition::{Definition, Validator, Validators};
pub use error::{Error, ErrorCode, ErrorEntry, SchemaError, Violation};
pub use kind::{Kind, cast, type_name, type_of};
pub use options::Options;
pub use parse::parse;
pub use schema::{Schema, definition_of};
pub use shape::{Descriptor, Shape};
pub use sink::{ErrorSink, Report};
pub use validate::validate;
pub use value::{Function, Map, Value};
