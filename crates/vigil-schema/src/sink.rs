//! The per-root error sink.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::ErrorEntry;
use crate::path;

/// Capability to record an error entry.
///
/// The validator reports through this trait so the observation layer can
/// add notification and diagnostics on top of plain sink storage.
pub trait Report {
    fn report(&self, entry: ErrorEntry);
}

#[derive(Debug, Default)]
struct SinkState {
    entries: Vec<ErrorEntry>,
    /// path -> positions in `entries`
    by_path: IndexMap<String, Vec<usize>, ahash::RandomState>,
}

/// Append-only, path-addressable error store.
///
/// Clones share the same storage. One sink is created per root observation
/// and handed to every descendant.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink(Rc<RefCell<SinkState>>);

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: ErrorEntry) {
        let mut state = self.0.borrow_mut();
        let position = state.entries.len();
        state
            .by_path
            .entry(entry.path.clone())
            .or_default()
            .push(position);
        state.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().entries.is_empty()
    }

    /// Entries recorded exactly at `path`, oldest first.
    pub fn get(&self, path: &str) -> Vec<ErrorEntry> {
        let state = self.0.borrow();
        state
            .by_path
            .get(path)
            .map(|positions| positions.iter().map(|&i| state.entries[i].clone()).collect())
            .unwrap_or_default()
    }

    /// Number of entries at `path` or below it. The empty path counts all.
    pub fn count(&self, path: &str) -> usize {
        let state = self.0.borrow();
        if path.is_empty() {
            return state.entries.len();
        }
        state
            .by_path
            .iter()
            .filter(|(p, _)| path::is_within(p, path))
            .map(|(_, positions)| positions.len())
            .sum()
    }

    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.0.borrow().entries.clone()
    }

    pub fn last(&self) -> Option<ErrorEntry> {
        self.0.borrow().entries.last().cloned()
    }

    /// Distinct paths with at least one entry, in first-recorded order.
    pub fn paths(&self) -> Vec<String> {
        self.0.borrow().by_path.keys().cloned().collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<ErrorEntry> {
        self.entries().into_iter()
    }

    /// Whether both handles share the same storage.
    pub fn ptr_eq(&self, other: &ErrorSink) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.0
                .borrow()
                .entries
                .iter()
                .filter_map(|entry| serde_json::to_value(entry).ok())
                .collect(),
        )
    }
}

impl Report for ErrorSink {
    fn report(&self, entry: ErrorEntry) {
        tracing::trace!(code = %entry.code, path = %entry.path, "error recorded");
        self.push(entry);
    }
}

impl<'a> IntoIterator for &'a ErrorSink {
    type Item = ErrorEntry;
    type IntoIter = std::vec::IntoIter<ErrorEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, Violation};

    fn required(name: &str, path: &str) -> ErrorEntry {
        ErrorEntry::new(&Violation::Required { name: name.into() }, path)
    }

    #[test]
    fn test_push_and_get_by_path() {
        let sink = ErrorSink::new();
        sink.push(required("city", "addresses.0.city"));
        sink.push(required("zip", "addresses.0.zip"));
        sink.push(required("city", "addresses.0.city"));

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.get("addresses.0.city").len(), 2);
        assert!(sink.get("addresses").is_empty());
        assert_eq!(sink.paths(), ["addresses.0.city", "addresses.0.zip"]);
    }

    #[test]
    fn test_count_subtree() {
        let sink = ErrorSink::new();
        sink.push(required("city", "addresses.0.city"));
        sink.push(required("zip", "addresses.1.zip"));
        sink.push(required("name", "name"));

        assert_eq!(sink.count(""), 3);
        assert_eq!(sink.count("addresses"), 2);
        assert_eq!(sink.count("addresses.1"), 1);
        assert_eq!(sink.count("address"), 0);
    }

    #[test]
    fn test_clones_share_storage() {
        let sink = ErrorSink::new();
        let other = sink.clone();
        other.report(required("a", "a"));
        assert!(sink.ptr_eq(&other));
        assert_eq!(sink.len(), 1);
        assert!(!sink.ptr_eq(&ErrorSink::new()));
    }

    #[test]
    fn test_iteration_in_insertion_order() {
        let sink = ErrorSink::new();
        sink.push(required("b", "b"));
        sink.push(ErrorEntry::new(&Violation::Invalid { validator: None }, "a"));
        let codes: Vec<_> = (&sink).into_iter().map(|e| e.code).collect();
        assert_eq!(codes, [ErrorCode::Required, ErrorCode::Invalid]);
        assert_eq!(sink.to_json().as_array().map(Vec::len), Some(2));
    }
}
