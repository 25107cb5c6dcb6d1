//! Clover XML emission.
//!
//! A single pre-order walk over the coverage tree writes the XML document
//! and records one pass/fail entry per file into the digest.

use std::io::Write;

use istanbul_oxide::CoverageSummary;
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, Event},
    Writer,
};

use crate::{
    evaluate, Clock, CoverageCollector, DigestBuilder, FileNode, PackageNode, ProjectNode,
    ProjectStats, ReportDigest, ReportResult, Watermarks,
};

pub const CLOVER_VERSION: &str = "3.2.0";
pub const PROJECT_NAME: &str = "All Files";

/// Output of one emitter run.
#[derive(Clone, Debug, PartialEq)]
pub struct Emission {
    pub xml: String,
    pub digest: ReportDigest,
}

impl Emission {
    pub fn digest_json(&self) -> ReportResult<String> {
        Ok(self.digest.to_json()?)
    }
}

struct EmitContext<'a, W: Write> {
    writer: Writer<W>,
    collector: &'a dyn CoverageCollector,
    watermarks: &'a Watermarks,
    digest: DigestBuilder,
}

impl<'a, W: Write> EmitContext<'a, W> {
    fn start(&mut self, name: &str, attributes: &[(&str, String)]) -> ReportResult<()> {
        self.writer
            .write_event(Event::Start(element(name, attributes)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> ReportResult<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, String)]) -> ReportResult<()> {
        self.writer
            .write_event(Event::Empty(element(name, attributes)))?;
        Ok(())
    }
}

fn element<'b>(name: &'b str, attributes: &[(&str, String)]) -> BytesStart<'b> {
    let mut elem = BytesStart::new(name);
    elem.extend_attributes(attributes.iter().map(|(k, v)| (*k, v.as_str())));
    elem
}

fn metric_attributes(metrics: &CoverageSummary) -> Vec<(&'static str, String)> {
    vec![
        ("statements", metrics.lines.total.to_string()),
        ("coveredstatements", metrics.lines.covered.to_string()),
        ("conditionals", metrics.branches.total.to_string()),
        ("coveredconditionals", metrics.branches.covered.to_string()),
        ("methods", metrics.functions.total.to_string()),
        ("coveredmethods", metrics.functions.covered.to_string()),
    ]
}

trait Emit {
    fn emit<W: Write>(&self, ctx: &mut EmitContext<'_, W>) -> ReportResult<()>;
}

impl Emit for FileNode {
    fn emit<W: Write>(&self, ctx: &mut EmitContext<'_, W>) -> ReportResult<()> {
        let coverage = ctx.collector.merged_coverage_for(&self.keys)?;
        let branch_by_line = coverage.get_branch_coverage_by_line()?;

        let result = evaluate(&self.metrics, ctx.watermarks);
        ctx.digest.record(&self.name, &self.path, &result);
        tracing::debug!(path = %self.path, passed = result.passed(), "emitting file");

        ctx.start(
            "file",
            &[("name", self.name.clone()), ("path", self.path.clone())],
        )?;
        ctx.empty("metrics", &metric_attributes(&self.metrics))?;

        for (num, count) in coverage.get_line_coverage() {
            let mut attributes = vec![("num", num.to_string()), ("count", count.to_string())];
            match branch_by_line.get(&num) {
                Some(branch) => {
                    attributes.push(("type", "cond".to_string()));
                    attributes.push(("truecount", branch.covered.to_string()));
                    attributes.push(("falsecount", branch.uncovered().to_string()));
                }
                None => attributes.push(("type", "stmt".to_string())),
            }
            ctx.empty("line", &attributes)?;
        }

        ctx.end("file")
    }
}

impl Emit for PackageNode {
    fn emit<W: Write>(&self, ctx: &mut EmitContext<'_, W>) -> ReportResult<()> {
        let Some(metrics) = &self.package_metrics else {
            // Nothing to report here, sub-packages still are.
            for package in self.packages() {
                package.emit(ctx)?;
            }
            return Ok(());
        };

        tracing::debug!(package = %self.name, "emitting package");
        ctx.start("package", &[("name", self.name.clone())])?;
        ctx.empty("metrics", &metric_attributes(metrics))?;

        for file in self.files() {
            file.emit(ctx)?;
        }
        for package in self.packages() {
            package.emit(ctx)?;
        }

        ctx.end("package")
    }
}

struct Project<'a> {
    node: &'a ProjectNode,
    stats: &'a ProjectStats,
    timestamp: i64,
}

impl Emit for Project<'_> {
    fn emit<W: Write>(&self, ctx: &mut EmitContext<'_, W>) -> ReportResult<()> {
        let metrics = &self.node.metrics;
        let stats = self.stats;

        ctx.start(
            "project",
            &[
                ("timestamp", self.timestamp.to_string()),
                ("name", PROJECT_NAME.to_string()),
            ],
        )?;

        let mut attributes = metric_attributes(metrics);
        attributes.extend([
            (
                "elements",
                (metrics.lines.total + metrics.branches.total + metrics.functions.total)
                    .to_string(),
            ),
            (
                "coveredelements",
                (metrics.lines.covered + metrics.branches.covered + metrics.functions.covered)
                    .to_string(),
            ),
            ("complexity", "0".to_string()),
            ("packages", stats.packages.to_string()),
            ("files", stats.files.to_string()),
            ("classes", stats.files.to_string()),
            ("loc", stats.lines.loc().to_string()),
            ("ncloc", stats.lines.ncloc().to_string()),
        ]);
        ctx.empty("metrics", &attributes)?;

        for package in &self.node.packages {
            package.emit(ctx)?;
        }

        ctx.end("project")
    }
}

pub struct Emitter<'a> {
    watermarks: &'a Watermarks,
    clock: &'a dyn Clock,
}

impl<'a> Emitter<'a> {
    pub fn new(watermarks: &'a Watermarks, clock: &'a dyn Clock) -> Self {
        Emitter { watermarks, clock }
    }

    /// Walks `project` once, producing the clover document and the digest.
    #[tracing::instrument(skip_all)]
    pub fn emit(
        &self,
        project: &ProjectNode,
        collector: &dyn CoverageCollector,
        stats: &ProjectStats,
    ) -> ReportResult<Emission> {
        let start = self.clock.now();
        let mut ctx = EmitContext {
            writer: Writer::new_with_indent(Vec::new(), b'\t', 1),
            collector,
            watermarks: self.watermarks,
            digest: DigestBuilder::new(start, stats.files),
        };

        ctx.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        ctx.start(
            "coverage",
            &[
                ("generated", self.clock.now().timestamp_millis().to_string()),
                ("clover", CLOVER_VERSION.to_string()),
            ],
        )?;

        Project {
            node: project,
            stats,
            timestamp: self.clock.now().timestamp_millis(),
        }
        .emit(&mut ctx)?;

        ctx.end("coverage")?;

        let EmitContext { writer, digest, .. } = ctx;
        let mut xml = String::from_utf8(writer.into_inner())?;
        xml.push('\n');

        Ok(Emission {
            xml,
            digest: digest.finish(self.clock),
        })
    }
}

#[cfg(test)]
mod tests {
    use istanbul_oxide::{BranchMapping, CoverageMap, FileCoverage, Range};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        build_tree,
        collector::tests::{with_line_hits, RawCollector},
        FixedClock, LineCount, ReportError,
    };

    fn with_lines(path: &str, hits: &[u32]) -> FileCoverage {
        let mut cov = FileCoverage::empty(path.to_string());
        cov.l = Some(
            hits.iter()
                .enumerate()
                .map(|(i, h)| (i as u32 + 1, *h))
                .collect(),
        );
        for (i, h) in hits.iter().enumerate() {
            cov.statement_map.insert(i as u32, Range::line(i as u32 + 1));
            cov.s.insert(i as u32, *h);
        }
        cov
    }

    fn emit(map: &CoverageMap, watermarks: &Watermarks) -> Emission {
        let project = build_tree(map.get_files(), |keys| {
            Ok(map.merged_coverage_for(keys)?.to_summary()?)
        })
        .unwrap();
        let stats = ProjectStats {
            packages: project.package_count(),
            files: project.all_files().len(),
            lines: LineCount { source: 5, comment: 2 },
        };
        let clock = FixedClock::from_millis(1_000);

        Emitter::new(watermarks, &clock).emit(&project, map, &stats).unwrap()
    }

    #[test]
    fn should_emit_conditional_lines() {
        let mut cov = with_lines("src/a.js", &[1, 0, 4]);
        cov.branch_map.insert(
            0,
            BranchMapping {
                loc: Range::line(3),
                branch_type: "if".to_string(),
                locations: vec![Range::line(3), Range::line(3)],
                line: 3,
            },
        );
        cov.b.insert(0, vec![4, 0]);
        let mut map = CoverageMap::new();
        map.add_coverage_for_file(&cov);

        let emission = emit(&map, &Watermarks::default());

        assert!(emission
            .xml
            .contains(r#"<line num="3" count="4" type="cond" truecount="1" falsecount="1"/>"#));
        assert!(emission.xml.contains(r#"<line num="1" count="1" type="stmt"/>"#));
        assert!(emission.xml.contains(
            r#"<metrics statements="3" coveredstatements="2" conditionals="2" coveredconditionals="1" methods="0" coveredmethods="0" elements="5" coveredelements="3" complexity="0" packages="1" files="1" classes="1" loc="7" ncloc="5"/>"#
        ));
    }

    #[test]
    fn should_nest_packages_in_pre_order() {
        let mut map = CoverageMap::new();
        map.add_coverage_for_file(&with_lines("p/src/a.js", &[1]));
        map.add_coverage_for_file(&with_lines("p/src/lib/b.js", &[0]));
        map.add_coverage_for_file(&with_lines("p/test/c.js", &[1]));

        let emission = emit(&map, &Watermarks::default());
        let xml = &emission.xml;

        let src = xml.find(r#"<package name="src">"#).unwrap();
        let a = xml.find(r#"<file name="a.js" path="p/src/a.js">"#).unwrap();
        let lib = xml.find(r#"<package name="src.lib">"#).unwrap();
        let test = xml.find(r#"<package name="test">"#).unwrap();
        assert!(src < a && a < lib && lib < test);
        assert_eq!(xml.matches("</package>").count(), 3);
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<coverage generated="1000" clover="3.2.0">"#));
        assert!(xml.contains(r#"<project timestamp="1000" name="All Files">"#));
        assert!(xml.trim_end().ends_with("</coverage>"));

        assert_eq!(emission.digest.stats.passes, 2);
        assert_eq!(emission.digest.stats.failures, 1);
        assert_eq!(emission.digest.failures[0].full_title, "Coverage: p/src/lib/b.js");
    }

    #[test]
    fn should_escape_attribute_values() {
        let mut map = CoverageMap::new();
        map.add_coverage_for_file(&with_lines("src/a&b.js", &[1]));

        let emission = emit(&map, &Watermarks::default());

        assert!(emission.xml.contains(r#"<file name="a&amp;b.js" path="src/a&amp;b.js">"#));
    }

    #[test]
    fn should_emit_merged_lines_for_duplicate_keys() {
        let collector = RawCollector(vec![
            (r"src\a.js".to_string(), with_line_hits(r"src\a.js", &[(1, 1), (2, 0)])),
            ("src/a.js".to_string(), with_line_hits("src/a.js", &[(1, 1), (2, 0)])),
        ]);
        let project = build_tree(collector.files(), |keys| {
            Ok(collector.merged_coverage_for(keys)?.to_summary()?)
        })
        .unwrap();
        let clock = FixedClock::from_millis(0);
        let watermarks = Watermarks::default();

        let emission = Emitter::new(&watermarks, &clock)
            .emit(&project, &collector, &ProjectStats::default())
            .unwrap();
        let xml = &emission.xml;

        assert!(xml.contains(r#"<file name="a.js" path="src/a.js">"#));
        // package and file metrics
        assert_eq!(
            xml.matches(
                r#"<metrics statements="2" coveredstatements="1" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>"#
            )
            .count(),
            2
        );
        assert_eq!(xml.matches("<line ").count(), 2);
        assert!(xml.contains(r#"<line num="1" count="2" type="stmt"/>"#));
        assert!(xml.contains(r#"<line num="2" count="0" type="stmt"/>"#));
    }

    #[test]
    fn should_fail_on_file_unknown_to_collector() {
        let mut map = CoverageMap::new();
        map.add_coverage_for_file(&with_lines("src/a.js", &[1]));
        let project = build_tree(["src/a.js", "src/gone.js"], |_| Ok(CoverageSummary::default())).unwrap();
        let clock = FixedClock::from_millis(0);
        let watermarks = Watermarks::default();

        let result = Emitter::new(&watermarks, &clock).emit(&project, &map, &ProjectStats::default());

        assert!(matches!(result, Err(ReportError::MalformedCoverageData(_))));
    }
}
