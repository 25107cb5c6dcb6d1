use indexmap::IndexMap;

use crate::{normalize_path, CoverageResult, CoverageSummary, FileCoverage};

/// a map of `FileCoverage` objects keyed by normalized file paths
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoverageMap {
    inner: IndexMap<String, FileCoverage>,
}

impl CoverageMap {
    pub fn new() -> CoverageMap {
        CoverageMap {
            inner: Default::default(),
        }
    }

    /// Parses an Istanbul coverage object (`{ "<path>": FileCoverage, ... }`).
    /// Every file is validated before the map is returned.
    pub fn from_json(value: &str) -> CoverageResult<CoverageMap> {
        let raw: IndexMap<String, serde_json::Value> = serde_json::from_str(value)?;
        let mut ret = CoverageMap::new();

        for (key, value) in raw {
            let coverage = FileCoverage::from_value(key, value)?;
            ret.add_coverage_for_file(&coverage);
        }

        Ok(ret)
    }

    /// Merges a second coverage map into this one
    pub fn merge(&mut self, map: &CoverageMap) {
        for coverage in map.inner.values() {
            self.add_coverage_for_file(coverage);
        }
    }

    /// Filter the coverage map with a predicate. If the predicate returns false,
    /// the coverage is removed from the map.
    pub fn filter(&mut self, predicate: impl Fn(&FileCoverage) -> bool) {
        self.inner.retain(|_, coverage| predicate(coverage));
    }

    pub fn get_files(&self) -> Vec<&String> {
        self.inner.keys().collect()
    }

    pub fn get_coverage_for_file(&self, file_path: &str) -> Option<&FileCoverage> {
        self.inner
            .get(file_path)
            .or_else(|| self.inner.get(normalize_path(file_path).as_str()))
    }

    pub fn add_coverage_for_file(&mut self, coverage: &FileCoverage) {
        let key = normalize_path(&coverage.path);

        if let Some(value) = self.inner.get_mut(key.as_str()) {
            tracing::debug!(path = %key, "merging coverage for already known file");
            value.merge(coverage);
        } else {
            let mut coverage = coverage.clone();
            coverage.path = key.clone();
            self.inner.insert(key, coverage);
        }
    }

    pub fn get_coverage_summary(&self) -> CoverageResult<CoverageSummary> {
        let mut ret: CoverageSummary = Default::default();

        for coverage in self.inner.values() {
            ret.merge(&coverage.to_summary()?);
        }

        Ok(ret)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
