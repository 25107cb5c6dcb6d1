use serde::{Deserialize, Serialize};

use crate::{
    coverage::Coverage, percent, BranchCoverageMap, BranchHitMap, BranchMap, CoverageError,
    CoverageResult, CoverageSummary, FunctionHitMap, FunctionMap, LineHitMap, StatementHitMap,
    StatementMap, Totals,
};

/// provides a read-only view of coverage for a single file.
/// The deep structure of this object is documented elsewhere. It has the following
/// properties:
/// `path` - the file path for which coverage is being tracked
/// `statementMap` - map of statement locations keyed by statement index
/// `fnMap` - map of function metadata keyed by function index
/// `branchMap` - map of branch metadata keyed by branch index
/// `s` - hit counts for statements
/// `f` - hit count for functions
/// `b` - hit count for branches
/// `l` - hit count for lines; derived from statements when absent
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub statement_map: StatementMap,
    #[serde(default)]
    pub fn_map: FunctionMap,
    #[serde(default)]
    pub branch_map: BranchMap,
    pub s: StatementHitMap,
    pub f: FunctionHitMap,
    pub b: BranchHitMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<LineHitMap>,
}

impl FileCoverage {
    pub fn empty(file_path: String) -> FileCoverage {
        FileCoverage {
            path: file_path,
            ..Default::default()
        }
    }

    pub fn from_json(value: &str) -> CoverageResult<FileCoverage> {
        let value: serde_json::Value = serde_json::from_str(value)?;
        let path = value
            .get("path")
            .and_then(|p| p.as_str())
            .unwrap_or_default()
            .to_string();

        FileCoverage::from_value(path, value)
    }

    /// Reads one file entry of a coverage object. A shape error, such as a
    /// missing hit map, is malformed data of that file. `path` fills in an
    /// absent `path` property.
    pub(crate) fn from_value(path: String, value: serde_json::Value) -> CoverageResult<FileCoverage> {
        let mut coverage: FileCoverage = serde_json::from_value(value)
            .map_err(|e| CoverageError::malformed(&path, e.to_string()))?;
        if coverage.path.is_empty() {
            coverage.path = path;
        }
        coverage.validate()?;
        Ok(coverage)
    }

    /// Checks the hit maps against their location maps. Every id with hits
    /// must be described by its map, otherwise summaries would silently
    /// drop data.
    pub fn validate(&self) -> CoverageResult<()> {
        for id in self.b.keys() {
            if !self.branch_map.contains_key(id) {
                return Err(CoverageError::malformed(
                    &self.path,
                    format!("branch {} has hits but no branchMap entry", id),
                ));
            }
        }

        for id in self.branch_map.keys() {
            if !self.b.contains_key(id) {
                return Err(CoverageError::malformed(
                    &self.path,
                    format!("branch {} is mapped but has no hit counts", id),
                ));
            }
        }

        if self.l.is_none() {
            for id in self.s.keys() {
                if !self.statement_map.contains_key(id) {
                    return Err(CoverageError::malformed(
                        &self.path,
                        format!("statement {} has hits but no statementMap entry", id),
                    ));
                }
            }
        }

        if !self.fn_map.is_empty() {
            for id in self.f.keys() {
                if !self.fn_map.contains_key(id) {
                    return Err(CoverageError::malformed(
                        &self.path,
                        format!("function {} has hits but no fnMap entry", id),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns line coverage: the explicit `l` map if present, otherwise the
    /// map computed from statement coverage. The hit count of a line is the
    /// max over statements starting on it.
    pub fn get_line_coverage(&self) -> LineHitMap {
        if let Some(lines) = &self.l {
            return lines.clone();
        }

        let mut line_map: LineHitMap = Default::default();

        for (st, count) in &self.s {
            let Some(range) = self.statement_map.get(st) else {
                continue;
            };
            let entry = line_map.entry(range.start.line).or_insert(*count);
            if *entry < *count {
                *entry = *count;
            }
        }

        line_map
    }

    /// Returns an array of uncovered line numbers.
    pub fn get_uncovered_lines(&self) -> Vec<u32> {
        self.get_line_coverage()
            .into_iter()
            .filter(|(_, hits)| *hits == 0)
            .map(|(line, _)| line)
            .collect()
    }

    /// Maps branch outcomes back onto source lines. Several branch points on
    /// one line (e.g. chained ternaries) have their outcomes summed. Lines
    /// whose branch points carry no outcomes are left out.
    pub fn get_branch_coverage_by_line(&self) -> CoverageResult<BranchCoverageMap> {
        let mut prefilter_data: std::collections::BTreeMap<u32, (u32, u32)> = Default::default();

        for (k, map) in &self.branch_map {
            let branch_data = self.b.get(k).ok_or_else(|| {
                CoverageError::malformed(
                    &self.path,
                    format!("branch {} is mapped but has no hit counts", k),
                )
            })?;

            let (covered, total) = prefilter_data.entry(map.source_line()).or_default();
            *covered += branch_data.iter().filter(|hits| **hits > 0).count() as u32;
            *total += branch_data.len() as u32;
        }

        Ok(prefilter_data
            .into_iter()
            .filter(|(_, (_, total))| *total > 0)
            .map(|(line, (covered, total))| {
                let coverage = covered as f32 / total as f32 * 100_f32;
                (line, Coverage::new(covered, total, coverage))
            })
            .collect())
    }

    /// Merges coverage of the same file, adding hit counts.
    pub fn merge(&mut self, other: &FileCoverage) {
        // Lines must be combined before statement hits change.
        let merged_lines = if self.l.is_none() && other.l.is_none() {
            None
        } else {
            let mut lines = self.get_line_coverage();
            for (line, hits) in other.get_line_coverage() {
                *lines.entry(line).or_default() += hits;
            }
            Some(lines)
        };

        for (k, v) in &other.statement_map {
            self.statement_map.entry(*k).or_insert(*v);
        }
        for (k, v) in &other.fn_map {
            self.fn_map.entry(*k).or_insert_with(|| v.clone());
        }
        for (k, v) in &other.branch_map {
            self.branch_map.entry(*k).or_insert_with(|| v.clone());
        }

        for (k, hits) in &other.s {
            *self.s.entry(*k).or_default() += hits;
        }
        for (k, hits) in &other.f {
            *self.f.entry(*k).or_default() += hits;
        }
        for (k, hits) in &other.b {
            let target = self.b.entry(*k).or_default();
            if target.len() < hits.len() {
                target.resize(hits.len(), 0);
            }
            target
                .iter_mut()
                .zip(hits.iter())
                .for_each(|(t, h)| *t += h);
        }

        self.l = merged_lines;
    }

    pub fn compute_simple_totals<T>(hit_map: &std::collections::BTreeMap<T, u32>) -> Totals {
        let covered = hit_map.values().filter(|&x| *x > 0).count() as u32;
        Totals::new(hit_map.len() as u32, covered)
    }

    fn compute_branch_totals(branch_map: &BranchHitMap) -> Totals {
        let mut ret: Totals = Default::default();

        branch_map.values().for_each(|branches| {
            ret.covered += branches.iter().filter(|hits| **hits > 0).count() as u32;
            ret.total += branches.len() as u32;
        });

        ret.pct = crate::CoveragePercentage::Value(percent(ret.covered, ret.total));
        ret
    }

    /// Summarizes the file. Malformed data is an error rather than a zeroed
    /// summary.
    pub fn to_summary(&self) -> CoverageResult<CoverageSummary> {
        self.validate()?;

        Ok(CoverageSummary {
            lines: FileCoverage::compute_simple_totals(&self.get_line_coverage()),
            statements: FileCoverage::compute_simple_totals(&self.s),
            functions: FileCoverage::compute_simple_totals(&self.f),
            branches: FileCoverage::compute_branch_totals(&self.b),
        })
    }
}
