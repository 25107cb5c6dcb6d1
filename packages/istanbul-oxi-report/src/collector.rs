use istanbul_oxide::{CoverageMap, FileCoverage};

use crate::{ReportError, ReportResult};

/// Source of per-file coverage for a report run.
pub trait CoverageCollector {
    fn files(&self) -> Vec<String>;
    fn file_coverage_for(&self, path: &str) -> Option<&FileCoverage>;

    /// Coverage of one file known under several `keys`, merged in key order.
    fn merged_coverage_for(&self, keys: &[String]) -> ReportResult<FileCoverage> {
        let mut merged: Option<FileCoverage> = None;

        for key in keys {
            let coverage = self
                .file_coverage_for(key)
                .ok_or_else(|| ReportError::malformed(key, "collector listed file without coverage"))?;
            merged = Some(match merged.take() {
                Some(mut merged) => {
                    merged.merge(coverage);
                    merged
                }
                None => coverage.clone(),
            });
        }

        merged.ok_or_else(|| ReportError::malformed("", "file node without collector keys"))
    }
}

impl CoverageCollector for CoverageMap {
    fn files(&self) -> Vec<String> {
        self.get_files().into_iter().cloned().collect()
    }

    fn file_coverage_for(&self, path: &str) -> Option<&FileCoverage> {
        self.get_coverage_for_file(path)
    }
}
