use std::path::PathBuf;

use crate::{
    build_tree, initialize_report_log, Clock, CloverReportOptions, CommentSyntaxCounter,
    CoverageCollector, DiskSourceReader, Emission, Emitter, FileWriter, LineCounter,
    ProjectStats, ReportError, ReportResult, SourceReader, SystemClock, WriteMode,
};

/// a clover-style XML report plus a JSON pass/fail digest.
pub struct CloverReport {
    options: CloverReportOptions,
    project_root: PathBuf,
    clock: Box<dyn Clock + Send + Sync>,
    source_reader: Box<dyn SourceReader>,
    line_counter: Box<dyn LineCounter>,
    writer: FileWriter,
}

impl CloverReport {
    pub const TYPE: &'static str = "clover";

    /// Validates `options` before anything else happens.
    pub fn new(options: CloverReportOptions) -> ReportResult<CloverReport> {
        options.validate()?;
        initialize_report_log(&options.report_log);

        let project_root = match &options.project_root {
            Some(root) => root.clone(),
            None => std::env::current_dir().map_err(|e| ReportError::filesystem(".", e))?,
        };

        Ok(CloverReport {
            source_reader: Box::new(DiskSourceReader::new(&project_root)),
            project_root,
            options,
            clock: Box::new(SystemClock),
            line_counter: Box::new(CommentSyntaxCounter),
            writer: FileWriter,
        })
    }

    pub fn synopsis() -> &'static str {
        "XML coverage report that can be consumed by the clover tool"
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_source_reader(mut self, reader: impl SourceReader + 'static) -> Self {
        self.source_reader = Box::new(reader);
        self
    }

    pub fn with_line_counter(mut self, counter: impl LineCounter + 'static) -> Self {
        self.line_counter = Box::new(counter);
        self
    }

    pub fn output_file(&self) -> PathBuf {
        self.options
            .dir
            .clone()
            .unwrap_or_else(|| self.project_root.clone())
            .join(&self.options.file)
    }

    pub fn json_output_file(&self) -> PathBuf {
        let mut file = self.output_file().into_os_string();
        file.push(".json");
        PathBuf::from(file)
    }

    /// Builds the tree and renders both artifacts in memory. Every file is
    /// summarized up front, so malformed coverage fails before any output.
    #[tracing::instrument(skip_all)]
    pub fn generate(&self, collector: &dyn CoverageCollector) -> ReportResult<Emission> {
        let files = collector.files();
        let project = build_tree(&files, |keys| {
            Ok(collector.merged_coverage_for(keys)?.to_summary()?)
        })?;

        let stats = ProjectStats::collect(
            &project,
            self.source_reader.as_ref(),
            self.line_counter.as_ref(),
        );

        Emitter::new(&self.options.watermarks, self.clock.as_ref()).emit(&project, collector, &stats)
    }

    /// Writes `<dir>/<file>` and then `<dir>/<file>.json`, following the
    /// configured write mode. Async mode falls back to synchronous writes
    /// when called from within a tokio runtime.
    pub fn write_report(&self, collector: &dyn CoverageCollector) -> ReportResult<()> {
        match self.options.write_mode {
            WriteMode::Sync => self.write_report_sync(collector),
            WriteMode::Async if tokio::runtime::Handle::try_current().is_ok() => {
                // block_on would panic inside a running runtime
                tracing::warn!(
                    "write_report called from within a tokio runtime, writing synchronously; \
                     use write_report_async there instead"
                );
                self.write_report_sync(collector)
            }
            WriteMode::Async => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .map_err(|e| ReportError::filesystem(self.output_file(), e))?;
                runtime.block_on(self.write_report_async(collector))
            }
        }
    }

    pub fn write_report_sync(&self, collector: &dyn CoverageCollector) -> ReportResult<()> {
        let emission = self.generate(collector)?;
        let json = emission.digest_json()?;

        self.writer.write_contents(&self.output_file(), &emission.xml)?;
        self.writer.write_contents(&self.json_output_file(), &json)
    }

    pub async fn write_report_async(&self, collector: &dyn CoverageCollector) -> ReportResult<()> {
        let emission = self.generate(collector)?;
        let json = emission.digest_json()?;

        self.writer
            .write_contents_async(self.output_file(), emission.xml)
            .await?;
        self.writer
            .write_contents_async(self.json_output_file(), json)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use istanbul_oxide::CoverageMap;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::FixedClock;

    fn options_in(dir: &Path) -> CloverReportOptions {
        CloverReportOptions {
            dir: Some(dir.join("coverage")),
            project_root: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn should_reject_invalid_options() {
        let options = CloverReportOptions {
            file: "".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            CloverReport::new(options),
            Err(ReportError::Configuration(_))
        ));
    }

    #[test]
    fn should_place_digest_next_to_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = CloverReport::new(options_in(dir.path())).unwrap();

        assert_eq!(report.output_file(), dir.path().join("coverage/clover.xml"));
        assert_eq!(
            report.json_output_file(),
            dir.path().join("coverage/clover.xml.json")
        );
    }

    #[test]
    fn should_write_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let report = CloverReport::new(options_in(dir.path()))
            .unwrap()
            .with_clock(FixedClock::from_millis(0));

        report.write_report(&CoverageMap::new()).unwrap();

        let xml = std::fs::read_to_string(report.output_file()).unwrap();
        assert!(xml.contains(r#"packages="0" files="0" classes="0" loc="0" ncloc="0""#));
        let digest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report.json_output_file()).unwrap())
                .unwrap();
        assert_eq!(digest["stats"]["tests"], 0);
        assert_eq!(digest["failures"], serde_json::json!([]));
    }
}
