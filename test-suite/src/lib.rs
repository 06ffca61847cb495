//! JSON-driven scenario tests for Vigil.
//!
//! Each file under `cases/` compiles a schema, observes initial data, runs a
//! list of mutation steps and compares the final data, recorded errors and
//! notification count against its `expect` block.

use std::path::PathBuf;

pub mod case;
pub mod runner;

pub use case::{Expect, Op, Step, TestCase};
pub use runner::TestRunner;

/// Directory holding the JSON case files of this crate.
pub fn cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("cases")
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct TestResults {
    pub passed: Vec<String>,
    pub failures: Vec<TestFailure>,
}

impl TestResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, case: impl Into<String>) {
        self.passed.push(case.into());
    }

    pub fn add_failure(&mut self, failure: TestFailure) {
        self.failures.push(failure);
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TestFailure {
    pub case: String,
    pub error: String,
}

impl TestFailure {
    pub fn new(case: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            case: case.into(),
            error: error.into(),
        }
    }
}
