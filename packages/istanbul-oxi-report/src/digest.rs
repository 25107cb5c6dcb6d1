//! Pass/fail digest written next to the clover report, in the layout of a
//! mocha JSON reporter run where every file is one test.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::{Clock, ThresholdResult};

fn serialize_timestamp<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub title: String,
    pub full_title: String,
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DigestStats {
    pub suites: usize,
    pub tests: usize,
    pub passes: usize,
    pub pending: usize,
    pub failures: usize,
    #[serde(serialize_with = "serialize_timestamp")]
    pub start: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub end: DateTime<Utc>,
    /// Milliseconds between `start` and `end`.
    pub duration: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportDigest {
    pub stats: DigestStats,
    pub failures: Vec<TestRecord>,
    pub passes: Vec<TestRecord>,
    pub skipped: Vec<TestRecord>,
}

impl ReportDigest {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Accumulates file results during a single report walk.
#[derive(Debug)]
pub struct DigestBuilder {
    start: DateTime<Utc>,
    file_count: usize,
    failures: Vec<TestRecord>,
    passes: Vec<TestRecord>,
}

impl DigestBuilder {
    pub fn new(start: DateTime<Utc>, file_count: usize) -> Self {
        DigestBuilder {
            start,
            file_count,
            failures: Vec::new(),
            passes: Vec::new(),
        }
    }

    pub fn record(&mut self, name: &str, path: &str, result: &ThresholdResult) {
        let record = TestRecord {
            title: format!("Coverage: {}", name),
            full_title: format!("Coverage: {}", path),
            duration: 0,
            error: result.error_message(),
        };

        if record.error.is_some() {
            self.failures.push(record);
        } else {
            self.passes.push(record);
        }
    }

    pub fn finish(self, clock: &dyn Clock) -> ReportDigest {
        let end = clock.now();

        ReportDigest {
            stats: DigestStats {
                suites: self.file_count,
                tests: self.file_count,
                passes: self.passes.len(),
                pending: 0,
                failures: self.failures.len(),
                start: self.start,
                end,
                duration: (end - self.start).num_milliseconds(),
            },
            failures: self.failures,
            passes: self.passes,
            skipped: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{threshold::Dimension, threshold::Violation, FixedClock};

    #[test]
    fn should_serialize_digest() {
        let start = FixedClock::from_millis(1_700_000_000_000).now();
        let mut builder = DigestBuilder::new(start, 2);

        builder.record("a.js", "src/a.js", &ThresholdResult { violations: vec![] });
        builder.record(
            "b.js",
            "src/b.js",
            &ThresholdResult {
                violations: vec![Violation {
                    dimension: Dimension::Functions,
                    actual: 0.0,
                    required: 0.5,
                    covered: 0,
                    total: 1,
                }],
            },
        );

        let digest = builder.finish(&FixedClock::from_millis(1_700_000_000_250));
        let value: serde_json::Value = serde_json::from_str(&digest.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "stats": {
                    "suites": 2,
                    "tests": 2,
                    "passes": 1,
                    "pending": 0,
                    "failures": 1,
                    "start": "2023-11-14T22:13:20.000Z",
                    "end": "2023-11-14T22:13:20.250Z",
                    "duration": 250
                },
                "failures": [{
                    "title": "Coverage: b.js",
                    "fullTitle": "Coverage: src/b.js",
                    "duration": 0,
                    "error": "Insufficient function coverage: actual=0% required=50% (functions covered = 0 total functions = 1)"
                }],
                "passes": [{
                    "title": "Coverage: a.js",
                    "fullTitle": "Coverage: src/a.js",
                    "duration": 0
                }],
                "skipped": []
            })
        );
    }
}
