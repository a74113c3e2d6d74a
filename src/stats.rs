//! Run-level bookkeeping: the per-file outcome type strategies report back,
//! and the `RunSummary` they fold into for the terminal report and the
//! `--log-folder` export.
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ExitClass;

/// What happened to one discovered file.
#[derive(Debug)]
pub enum FileOutcome {
    Processed,
    Skipped,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub discovered: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed_files: Vec<(PathBuf, String)>,
    pub elapsed: Option<Duration>,
}

impl RunSummary {
    pub fn new(discovered: usize) -> Self {
        Self {
            discovered,
            ..Default::default()
        }
    }

    pub fn record(&mut self, path: &Path, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Processed => self.processed += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Failed(message) => self.failed_files.push((path.to_path_buf(), message)),
        }
    }

    pub fn failed(&self) -> usize {
        self.failed_files.len()
    }

    /// §7 exit classification: no eligible files is `IGNORED`, any per-file
    /// failure is `FAILURE`, otherwise `SUCCESS` even if some files were
    /// merely skipped (e.g. empty).
    pub fn exit_class(&self) -> ExitClass {
        if self.discovered == 0 {
            ExitClass::Ignored
        } else if !self.failed_files.is_empty() {
            ExitClass::Failure
        } else {
            ExitClass::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_files_is_ignored() {
        let summary = RunSummary::new(0);
        assert_eq!(summary.exit_class(), ExitClass::Ignored);
    }

    #[test]
    fn any_failure_is_failure_even_with_successes() {
        let mut summary = RunSummary::new(3);
        summary.record(Path::new("a"), FileOutcome::Processed);
        summary.record(Path::new("b"), FileOutcome::Failed("boom".into()));
        summary.record(Path::new("c"), FileOutcome::Skipped);
        assert_eq!(summary.exit_class(), ExitClass::Failure);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn all_clean_is_success() {
        let mut summary = RunSummary::new(2);
        summary.record(Path::new("a"), FileOutcome::Processed);
        summary.record(Path::new("b"), FileOutcome::Processed);
        assert_eq!(summary.exit_class(), ExitClass::Success);
    }
}
