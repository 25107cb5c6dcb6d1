//! Per-file threshold validation against the configured watermarks.

use istanbul_oxide::{CoverageSummary, Totals};

use crate::Watermarks;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dimension {
    Statements,
    Branches,
    Functions,
}

impl Dimension {
    fn singular(&self) -> &'static str {
        match self {
            Dimension::Statements => "statement",
            Dimension::Branches => "branch",
            Dimension::Functions => "function",
        }
    }

    fn plural(&self) -> &'static str {
        match self {
            Dimension::Statements => "statements",
            Dimension::Branches => "branches",
            Dimension::Functions => "functions",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    pub dimension: Dimension,
    /// Covered ratio rounded to two decimals.
    pub actual: f64,
    pub required: f64,
    pub covered: u32,
    pub total: u32,
}

impl Violation {
    pub fn message(&self) -> String {
        format!(
            "Insufficient {} coverage: actual={}% required={}% ({} covered = {} total {} = {})",
            self.dimension.singular(),
            as_percent(self.actual),
            as_percent(self.required),
            self.dimension.plural(),
            self.covered,
            self.dimension.plural(),
            self.total
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdResult {
    pub violations: Vec<Violation>,
}

impl ThresholdResult {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// All violation messages, statements first. Statement and branch
    /// messages end with a newline, the function message does not.
    pub fn error_message(&self) -> Option<String> {
        if self.passed() {
            return None;
        }

        let mut ret = String::new();
        for violation in &self.violations {
            ret.push_str(&violation.message());
            if violation.dimension != Dimension::Functions {
                ret.push('\n');
            }
        }
        Some(ret)
    }
}

/// Covered ratio with two-decimal rounding. A dimension with nothing to
/// cover is fully covered.
pub fn coverage_ratio(totals: &Totals) -> f64 {
    if totals.total == 0 {
        return 1.0;
    }
    let hundredths = (totals.covered as f64 * 100.0 / totals.total as f64).round();
    hundredths / 100.0
}

fn as_percent(ratio: f64) -> f64 {
    (ratio * 10000.0).round() / 100.0
}

fn check(dimension: Dimension, totals: &Totals, watermark: f64) -> Option<Violation> {
    let actual = coverage_ratio(totals);

    if actual < watermark {
        Some(Violation {
            dimension,
            actual,
            required: watermark,
            covered: totals.covered,
            total: totals.total,
        })
    } else {
        None
    }
}

/// Validate a file summary against the watermarks. Clover statements are
/// the summary's line totals.
pub fn evaluate(summary: &CoverageSummary, watermarks: &Watermarks) -> ThresholdResult {
    let violations = [
        check(Dimension::Statements, &summary.lines, watermarks.statements),
        check(Dimension::Branches, &summary.branches, watermarks.branches),
        check(Dimension::Functions, &summary.functions, watermarks.functions),
    ]
    .into_iter()
    .flatten()
    .collect();

    ThresholdResult { violations }
}
