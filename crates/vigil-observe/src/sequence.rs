//! Sequence operations on observed arrays.
//!
//! Each new argument is validated at the index it will occupy and cast when
//! its type does not match. If any argument is invalid and the schema does
//! not allow invalid data, the whole operation is skipped.

use std::ops::{Bound, RangeBounds};
use std::panic::Location;

use vigil_schema::path;

use crate::error::Error;
use crate::item::{Item, Outcome};
use crate::observed::{Observed, detach, outcome, settle, wrap};

impl Observed {
    #[track_caller]
    pub fn append<I: Into<Item>>(&self, values: impl IntoIterator<Item = I>) -> Result<Outcome, Error> {
        let _caller = self.scope().enter(Location::caller());
        let len = self.array_len()?;
        self.splice_items(len, 0, collect(values)).map(|(outcome, _)| outcome)
    }

    #[track_caller]
    pub fn prepend<I: Into<Item>>(&self, values: impl IntoIterator<Item = I>) -> Result<Outcome, Error> {
        let _caller = self.scope().enter(Location::caller());
        self.array_len()?;
        self.splice_items(0, 0, collect(values)).map(|(outcome, _)| outcome)
    }

    #[track_caller]
    pub fn insert<I: Into<Item>>(
        &self,
        index: usize,
        values: impl IntoIterator<Item = I>,
    ) -> Result<Outcome, Error> {
        let _caller = self.scope().enter(Location::caller());
        let len = self.array_len()?;
        if index > len {
            return Err(Error::IndexOutOfBounds {
                index,
                len,
                path: self.path(),
            });
        }
        self.splice_items(index, 0, collect(values)).map(|(outcome, _)| outcome)
    }

    /// Removes up to `delete_count` elements from `start` and inserts
    /// `values` in their place. Returns the removed items; nothing is
    /// removed when the operation is rejected.
    #[track_caller]
    pub fn splice<I: Into<Item>>(
        &self,
        start: usize,
        delete_count: usize,
        values: impl IntoIterator<Item = I>,
    ) -> Result<(Outcome, Vec<Item>), Error> {
        let _caller = self.scope().enter(Location::caller());
        let len = self.array_len()?;
        let start = start.min(len);
        let delete_count = delete_count.min(len - start);
        self.splice_items(start, delete_count, collect(values))
    }

    /// Sets every index in `range` (clamped to the length) to `value`. The
    /// value is validated once; each index gets its own node.
    #[track_caller]
    pub fn fill(&self, value: impl Into<Item>, range: impl RangeBounds<usize>) -> Result<Outcome, Error> {
        let _caller = self.scope().enter(Location::caller());
        let len = self.array_len()?;
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&end) => end.saturating_add(1),
            Bound::Excluded(&end) => end,
            Bound::Unbounded => len,
        }
        .min(len);
        if start >= end {
            return Ok(Outcome::Committed);
        }

        let schema = self.items_schema()?;
        let base = self.path();
        let at = path::join_index(&base, start);
        let (first, valid) = self.prepare(value.into(), &schema, &at)?;
        if !valid && !self.allow_invalid() {
            tracing::debug!(path = %base, "invalid fill rejected");
            detach(&first);
            return Ok(Outcome::Rejected);
        }
        settle(&first, &at);
        let snapshot = first.to_value();
        let mut fills = Vec::with_capacity(end - start);
        fills.push(first);
        for index in start + 1..end {
            fills.push(wrap(snapshot.clone(), &schema, self.scope(), &path::join_index(&base, index)));
        }
        let replaced: Vec<Item> = self.array_mut(|items| {
            let end = end.min(items.len());
            let start = start.min(end);
            items.splice(start..end, fills).collect()
        })?;
        replaced.iter().for_each(detach);
        Ok(outcome(valid))
    }

    /// Removes and returns the last element.
    pub fn pop(&self) -> Result<Option<Item>, Error> {
        let popped = self.array_mut(Vec::pop)?;
        if let Some(item) = &popped {
            detach(item);
        }
        Ok(popped)
    }

    fn array_len(&self) -> Result<usize, Error> {
        self.array_mut(|items| items.len())
    }

    fn splice_items(
        &self,
        start: usize,
        delete_count: usize,
        values: Vec<Item>,
    ) -> Result<(Outcome, Vec<Item>), Error> {
        let schema = self.items_schema()?;
        let base = self.path();
        let mut prepared = Vec::with_capacity(values.len());
        let mut valid = true;
        for (offset, value) in values.into_iter().enumerate() {
            let (item, ok) = self.prepare(value, &schema, &path::join_index(&base, start + offset))?;
            valid = valid && ok;
            prepared.push(item);
        }
        if !valid && !self.allow_invalid() {
            tracing::debug!(path = %base, "invalid sequence arguments rejected");
            prepared.iter().for_each(detach);
            return Ok((Outcome::Rejected, Vec::new()));
        }

        for (offset, item) in prepared.iter().enumerate() {
            settle(item, &path::join_index(&base, start + offset));
        }
        let inserted = prepared.len();
        let removed: Vec<Item> = self.array_mut(|items| {
            let start = start.min(items.len());
            let end = (start + delete_count).min(items.len());
            items.splice(start..end, prepared).collect()
        })?;
        removed.iter().for_each(detach);
        if inserted != removed.len() {
            self.relocate_from(start + inserted);
        }
        Ok((outcome(valid), removed))
    }
}

fn collect<I: Into<Item>>(values: impl IntoIterator<Item = I>) -> Vec<Item> {
    values.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::subscriber::Silent;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use vigil_schema::{ErrorCode, Options, Schema, Shape, Validators, Value};

    fn numbers(options: Options) -> Observed {
        let schema = Schema::create(
            Shape::from_json(&json!({"type": "array", "items": {"type": "number"}}), &Validators::new()).unwrap(),
            options,
        )
        .unwrap();
        Observed::new(Value::from(json!([])), &schema, Rc::new(Silent)).unwrap()
    }

    fn codes(node: &Observed) -> Vec<(ErrorCode, String)> {
        node.errors().iter().map(|e| (e.code, e.path)).collect()
    }

    #[test]
    fn test_append_valid() {
        let list = numbers(Options::default());
        assert_eq!(list.append([1]).unwrap(), Outcome::Committed);
        assert_eq!(list.to_json(), json!([1]));
        assert_eq!(list.len(), 1);
        assert!(list.errors().is_empty());
    }

    #[test]
    fn test_append_invalid_is_cast() {
        let list = numbers(Options::default());
        assert_eq!(list.append(["x"]).unwrap(), Outcome::CommittedInvalid);
        assert_eq!(codes(&list), [(ErrorCode::Type, "0".to_string())]);
        assert_eq!(list.to_json(), json!([0]));
    }

    #[test]
    fn test_append_rejected_when_invalid_disallowed() {
        let list = numbers(Options::default().allow_invalid(false));
        list.append([1]).unwrap();
        assert_eq!(list.append([Value::from(2), Value::from("x")]).unwrap(), Outcome::Rejected);
        assert_eq!(list.to_json(), json!([1]));
        assert_eq!(codes(&list), [(ErrorCode::Type, "2".to_string())]);
    }

    #[test]
    fn test_strict_append_fails() {
        let list = numbers(Options::default().strict(true));
        let err = list.append(["x"]).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Type));
        assert!(list.is_empty());
    }

    #[test]
    fn test_prepend_insert_splice() {
        let list = numbers(Options::default());
        list.append([2, 4]).unwrap();
        list.prepend([1]).unwrap();
        list.insert(2, [3]).unwrap();
        assert_eq!(list.to_json(), json!([1, 2, 3, 4]));

        let (outcome, removed) = list.splice(1, 2, [9]).unwrap();
        assert_eq!(outcome, Outcome::Committed);
        assert_eq!(removed, [Item::Value(Value::from(2)), Item::Value(Value::from(3))]);
        assert_eq!(list.to_json(), json!([1, 9, 4]));

        assert!(matches!(list.insert(9, [1]), Err(Error::IndexOutOfBounds { index: 9, .. })));
    }

    #[test]
    fn test_insert_error_uses_target_index() {
        let list = numbers(Options::default());
        list.append([1, 2]).unwrap();
        list.insert(1, [true]).unwrap();
        assert_eq!(codes(&list), [(ErrorCode::Type, "1".to_string())]);
        assert_eq!(list.to_json(), json!([1, 1, 2]));
    }

    #[test]
    fn test_fill_and_pop() {
        let list = numbers(Options::default());
        list.append([1, 2, 3, 4]).unwrap();
        assert_eq!(list.fill(0, 1..3).unwrap(), Outcome::Committed);
        assert_eq!(list.to_json(), json!([1, 0, 0, 4]));
        assert_eq!(list.fill("7", ..).unwrap(), Outcome::CommittedInvalid);
        assert_eq!(list.to_json(), json!([7, 7, 7, 7]));
        assert_eq!(list.errors().len(), 1);

        assert_eq!(list.pop().unwrap(), Some(Item::Value(Value::from(7))));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_operations_on_objects_fail() {
        let schema = Schema::create(Shape::Null, Options::default()).unwrap();
        let object = Observed::new(Value::from(json!({})), &schema, Rc::new(Silent)).unwrap();
        assert!(matches!(object.append([1]), Err(Error::NotAnArray { .. })));
        assert!(matches!(object.pop(), Err(Error::NotAnArray { .. })));
    }
}
