mod clock;
mod collector;
mod digest;
mod emitter;
mod error;
mod line_count;
mod options;
mod report;
mod threshold;
mod tree;
mod writer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use collector::CoverageCollector;
pub use digest::{DigestBuilder, DigestStats, ReportDigest, TestRecord};
pub use emitter::{Emission, Emitter, CLOVER_VERSION, PROJECT_NAME};
pub use error::{ReportError, ReportResult};
pub use line_count::{
    CommentSyntax, CommentSyntaxCounter, DiskSourceReader, LineCount, LineCounter, ProjectStats,
    SourceReader,
};
pub use options::*;
pub use report::CloverReport;
pub use threshold::{coverage_ratio, evaluate, Dimension, ThresholdResult, Violation};
pub use tree::*;
pub use writer::FileWriter;

use tracing_subscriber::fmt::format::FmtSpan;

/// Installs a global fmt subscriber when `log_options` names a level. An
/// already installed subscriber is kept.
pub fn initialize_report_log(log_options: &ReportLogOptions) {
    let log_level = match log_options.level.as_deref() {
        Some("error") => Some(tracing::Level::ERROR),
        Some("debug") => Some(tracing::Level::DEBUG),
        Some("info") => Some(tracing::Level::INFO),
        Some("warn") => Some(tracing::Level::WARN),
        Some("trace") => Some(tracing::Level::TRACE),
        _ => None,
    };

    if let Some(log_level) = log_level {
        let builder = tracing_subscriber::fmt().with_max_level(log_level);

        let builder = if log_options.enable_trace {
            builder.with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE)
        } else {
            builder
        };

        let _ = builder
            .with_ansi(false)
            .event_format(tracing_subscriber::fmt::format().pretty())
            .try_init();
    }
}
