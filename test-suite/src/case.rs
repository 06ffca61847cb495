use std::cell::Cell;
use std::ops::Bound;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail, ensure};
use serde::Deserialize;
use vigil::observe::Error as ObserveError;
use vigil::prelude::*;
use vigil::schema::path;

/// One scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub schema: serde_json::Value,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub expect: Expect,
}

/// A mutation applied to the observed data. `fails` names the error code
/// the step must abort with.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub op: Op,
    #[serde(default)]
    pub fails: Option<ErrorCode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Op {
    Set {
        path: String,
        value: serde_json::Value,
    },
    Delete {
        path: String,
    },
    Append {
        #[serde(default)]
        path: String,
        values: Vec<serde_json::Value>,
    },
    Prepend {
        #[serde(default)]
        path: String,
        values: Vec<serde_json::Value>,
    },
    Insert {
        #[serde(default)]
        path: String,
        index: usize,
        values: Vec<serde_json::Value>,
    },
    Splice {
        #[serde(default)]
        path: String,
        start: usize,
        #[serde(rename = "deleteCount")]
        delete_count: usize,
        #[serde(default)]
        values: Vec<serde_json::Value>,
    },
    Fill {
        #[serde(default)]
        path: String,
        value: serde_json::Value,
        #[serde(default)]
        start: Option<usize>,
        #[serde(default)]
        end: Option<usize>,
    },
    Pop {
        #[serde(default)]
        path: String,
    },
    /// JSON has no undefined, so keys listed in `unset` are set to
    /// `Undefined` in the merge source.
    Merge {
        #[serde(default)]
        path: String,
        value: serde_json::Value,
        #[serde(default)]
        unset: Vec<String>,
    },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Set { .. } => "set",
            Op::Delete { .. } => "delete",
            Op::Append { .. } => "append",
            Op::Prepend { .. } => "prepend",
            Op::Insert { .. } => "insert",
            Op::Splice { .. } => "splice",
            Op::Fill { .. } => "fill",
            Op::Pop { .. } => "pop",
            Op::Merge { .. } => "merge",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Expect {
    /// Canonical definition of the compiled schema.
    pub definition: Option<serde_json::Value>,
    /// The schema must fail to compile.
    pub schema_error: bool,
    pub data: Option<serde_json::Value>,
    /// `[code, path]` pairs in recording order.
    pub errors: Option<Vec<(ErrorCode, String)>>,
    pub notifications: Option<usize>,
}

impl TestCase {
    pub fn load(path: &Path, name: impl Into<String>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read case file {}", path.display()))?;
        let mut case: TestCase =
            serde_json::from_str(&content).with_context(|| format!("failed to parse case file {}", path.display()))?;
        case.name = name.into();
        Ok(case)
    }

    pub fn run(&self) -> Result<()> {
        tracing::debug!(case = %self.name, steps = self.steps.len(), "running case");
        let compiled = Shape::from_json(&self.schema, &Validators::new())
            .and_then(|shape| Schema::create(shape, self.options));
        let schema = match compiled {
            Ok(_) if self.expect.schema_error => bail!("schema compiled but a SCHEMA error was expected"),
            Err(err) if self.expect.schema_error => {
                tracing::debug!(case = %self.name, %err, "schema rejected as expected");
                return Ok(());
            }
            result => result.context("schema failed to compile")?,
        };

        if let Some(expected) = &self.expect.definition {
            let actual = schema.to_json()?;
            ensure!(
                &actual == expected,
                "definition mismatch\nexpected: {}\nactual:   {}",
                serde_json::to_string_pretty(expected)?,
                serde_json::to_string_pretty(&actual)?
            );
        }

        let Some(data) = &self.data else {
            ensure!(self.steps.is_empty(), "steps given without data");
            return Ok(());
        };

        let notifications = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&notifications);
        let subscriber: Rc<dyn Subscriber> = Rc::new(move |event: &Event<'_>| {
            tracing::trace!(path = %event.entry().path, code = %event.entry().code, "invalidate");
            counter.set(counter.get() + 1);
        });
        let root = Observed::new(Value::from(data), &schema, subscriber).context("failed to observe data")?;

        for (index, step) in self.steps.iter().enumerate() {
            let result = apply(&root, &step.op);
            match (&step.fails, result) {
                (None, Ok(())) => {}
                (None, Err(err)) => {
                    return Err(anyhow!(err).context(format!("step {index} ({}) failed", step.op.name())));
                }
                (Some(code), Ok(())) => bail!("step {index} ({}) succeeded, expected {code}", step.op.name()),
                (Some(code), Err(err)) => ensure!(
                    err.code() == Some(*code),
                    "step {index} ({}) failed with {err}, expected {code}",
                    step.op.name()
                ),
            }
        }

        if let Some(expected) = &self.expect.data {
            let actual = root.to_json();
            ensure!(
                &actual == expected,
                "data mismatch\nexpected: {}\nactual:   {}",
                serde_json::to_string_pretty(expected)?,
                serde_json::to_string_pretty(&actual)?
            );
        }
        if let Some(expected) = &self.expect.errors {
            let actual: Vec<(ErrorCode, String)> = root.errors().iter().map(|e| (e.code, e.path)).collect();
            ensure!(&actual == expected, "errors mismatch\nexpected: {expected:?}\nactual:   {actual:?}");
        }
        if let Some(expected) = self.expect.notifications {
            ensure!(
                notifications.get() == expected,
                "expected {expected} notifications, got {}",
                notifications.get()
            );
        }
        Ok(())
    }
}

fn apply(root: &Observed, op: &Op) -> Result<(), ObserveError> {
    match op {
        Op::Set { path, value } => root.set(path, Value::from(value)).map(drop),
        Op::Delete { path } => root.delete(path).map(drop),
        Op::Append { path, values } => target(root, path)?.append(values.iter().map(Value::from)).map(drop),
        Op::Prepend { path, values } => target(root, path)?.prepend(values.iter().map(Value::from)).map(drop),
        Op::Insert { path, index, values } => target(root, path)?
            .insert(*index, values.iter().map(Value::from))
            .map(drop),
        Op::Splice {
            path,
            start,
            delete_count,
            values,
        } => target(root, path)?
            .splice(*start, *delete_count, values.iter().map(Value::from))
            .map(drop),
        Op::Fill { path, value, start, end } => {
            let start = start.map_or(Bound::Unbounded, Bound::Included);
            let end = end.map_or(Bound::Unbounded, Bound::Excluded);
            target(root, path)?.fill(Value::from(value), (start, end)).map(drop)
        }
        Op::Pop { path } => target(root, path)?.pop().map(drop),
        Op::Merge { path, value, unset } => {
            let mut source = Value::from(value);
            for key in unset {
                set_undefined(&mut source, key).map_err(|_| ObserveError::NotFound { path: key.clone() })?;
            }
            target(root, path)?.merge(&source).map(|_| ())
        }
    }
}

fn target(root: &Observed, at: &str) -> Result<Observed, ObserveError> {
    root.node(at).ok_or_else(|| ObserveError::NotFound { path: at.to_string() })
}

fn set_undefined(value: &mut Value, at: &str) -> Result<()> {
    let (parent, key) = path::split_last(at);
    let mut current = value;
    for segment in path::segments(parent) {
        current = match current {
            Value::Object(map) => map.get_mut(segment),
            Value::Array(items) => path::parse_index(segment).and_then(|index| items.get_mut(index)),
            _ => None,
        }
        .ok_or_else(|| anyhow!("no value at '{segment}' in merge source"))?;
    }
    match current {
        Value::Object(map) => {
            map.insert(key, Value::Undefined);
            Ok(())
        }
        _ => bail!("'{at}' does not name an object member"),
    }
}
