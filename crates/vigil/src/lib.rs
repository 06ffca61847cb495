//! Vigil compiles loosely written schema shapes into a canonical schema
//! tree, validates values against it and keeps observed data trees valid as
//! they are mutated or merged.
//!
//! ```
//! use std::rc::Rc;
//! use vigil::prelude::*;
//! use serde_json::json;
//!
//! let shape = Shape::from_json(&json!({"name": "string", "?tags": ["string"]}), &Validators::new())?;
//! let schema = Schema::create(shape, Options::default())?;
//! let person = Observed::new(Value::from(json!({"name": "Ada"})), &schema, Rc::new(Silent))?;
//!
//! person.set("name", 7)?;
//! assert_eq!(person.errors().get("name")[0].code, ErrorCode::Type);
//! # Ok::<(), vigil::observe::Error>(())
//! ```

pub use vigil_observe as observe;
pub use vigil_schema as schema;

pub use vigil_observe::{Emitter, Event, HandlerId, Item, Observed, Outcome, Silent, Subscriber, merge, observe};
pub use vigil_schema::{
    Definition, Descriptor, ErrorCode, ErrorEntry, ErrorSink, Kind, Options, Schema, SchemaError, Shape, Validator,
    Validators, Value, Violation, parse, validate,
};

pub mod prelude {
    pub use vigil_observe::{Event, Item, Observed, Outcome, Silent, Subscriber};
    pub use vigil_schema::{ErrorCode, ErrorSink, Options, Schema, Shape, Validators, Value};
}
