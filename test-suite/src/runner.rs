use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::{TestCase, TestFailure, TestResults};

pub struct TestRunner {
    cases_dir: PathBuf,
    filter: Option<String>,
}

impl TestRunner {
    pub fn new(cases_dir: impl Into<PathBuf>) -> Self {
        Self {
            cases_dir: cases_dir.into(),
            filter: None,
        }
    }

    /// Only run cases whose name contains `filter`.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Discover and run all matching cases. A case that cannot be read or
    /// parsed counts as a failure.
    pub fn run_all(&self) -> Result<TestResults> {
        let mut results = TestResults::new();
        for file in self.discover_case_files()? {
            let name = self.case_name(&file);
            if self.filter.as_deref().is_some_and(|filter| !name.contains(filter)) {
                continue;
            }
            match TestCase::load(&file, name.clone()).and_then(|case| case.run()) {
                Ok(()) => {
                    tracing::info!(case = %name, "pass");
                    results.add_pass(name);
                }
                Err(err) => {
                    tracing::info!(case = %name, "fail");
                    results.add_failure(TestFailure::new(name, format!("{err:#}")));
                }
            }
        }
        Ok(results)
    }

    /// Case name: the file path below the cases directory, without extension.
    pub fn case_name(&self, file: &Path) -> String {
        file.strip_prefix(&self.cases_dir)
            .unwrap_or(file)
            .with_extension("")
            .display()
            .to_string()
    }

    fn discover_case_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        walk_directory(&self.cases_dir, &mut files)?;
        files.sort();
        Ok(files)
    }
}

fn walk_directory(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            walk_directory(&path, files)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(path);
        }
    }
    Ok(())
}
