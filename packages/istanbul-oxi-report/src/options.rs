use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ReportError, ReportResult};

/// Minimum acceptable coverage ratio, in [0, 1], per dimension.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Watermarks {
    pub statements: f64,
    pub branches: f64,
    pub functions: f64,
}

impl Default for Watermarks {
    fn default() -> Self {
        // Low end of the istanbul default watermarks ([50, 80]).
        Watermarks {
            statements: 0.5,
            branches: 0.5,
            functions: 0.5,
        }
    }
}

impl Watermarks {
    pub fn new(statements: f64, branches: f64, functions: f64) -> ReportResult<Watermarks> {
        let ret = Watermarks {
            statements,
            branches,
            functions,
        };
        ret.validate()?;
        Ok(ret)
    }

    pub fn validate(&self) -> ReportResult<()> {
        for (name, value) in [
            ("statements", self.statements),
            ("branches", self.branches),
            ("functions", self.functions),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReportError::configuration(format!(
                    "{} watermark must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteMode {
    #[default]
    Sync,
    Async,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportLogOptions {
    pub level: Option<String>,
    pub enable_trace: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloverReportOptions {
    /// Directory the report is written to, defaults to the project root.
    pub dir: Option<PathBuf>,
    pub file: String,
    /// Base for relative source paths, defaults to the current directory.
    pub project_root: Option<PathBuf>,
    pub watermarks: Watermarks,
    pub write_mode: WriteMode,
    pub report_log: ReportLogOptions,
}

impl Default for CloverReportOptions {
    fn default() -> Self {
        CloverReportOptions {
            dir: None,
            file: "clover.xml".to_string(),
            project_root: None,
            watermarks: Default::default(),
            write_mode: Default::default(),
            report_log: Default::default(),
        }
    }
}

impl CloverReportOptions {
    pub fn from_json(value: &str) -> ReportResult<CloverReportOptions> {
        let options: CloverReportOptions =
            serde_json::from_str(value).map_err(ReportError::configuration)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> ReportResult<()> {
        if self.file.trim().is_empty() {
            return Err(ReportError::configuration("report file name is empty"));
        }
        self.watermarks.validate()
    }
}
