use serde::Serialize;

use crate::percent;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum CoveragePercentage {
    #[default]
    Unknown,
    Value(f32),
}

impl Serialize for CoveragePercentage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CoveragePercentage::Unknown => serializer.serialize_str("Unknown"),
            CoveragePercentage::Value(v) => serializer.serialize_f32(*v),
        }
    }
}

#[derive(Default, Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Totals {
    pub total: u32,
    pub covered: u32,
    pub skipped: u32,
    pub pct: CoveragePercentage,
}

impl Totals {
    pub fn new(total: u32, covered: u32) -> Totals {
        Totals {
            total,
            covered,
            skipped: 0,
            pct: CoveragePercentage::Value(percent(covered, total)),
        }
    }

    fn add(&mut self, other: &Totals) {
        self.total += other.total;
        self.covered += other.covered;
        self.skipped += other.skipped;
        self.pct = CoveragePercentage::Value(percent(self.covered, self.total));
    }
}

/// Covered / total counts for every coverage dimension of a file or of an
/// aggregate of files.
#[derive(Default, Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub lines: Totals,
    pub statements: Totals,
    pub functions: Totals,
    pub branches: Totals,
}

impl CoverageSummary {
    /// Merges a second summary coverage object into this one
    pub fn merge(&mut self, summary: &CoverageSummary) {
        self.lines.add(&summary.lines);
        self.statements.add(&summary.statements);
        self.functions.add(&summary.functions);
        self.branches.add(&summary.branches);
    }
}

/// Element-wise sum of two summaries. Associative and commutative, so
/// aggregates can be rolled up in any traversal order.
pub fn combine(a: &CoverageSummary, b: &CoverageSummary) -> CoverageSummary {
    let mut ret = *a;
    ret.merge(b);
    ret
}
