use std::{io, path::PathBuf};

use istanbul_oxide::CoverageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    MalformedCoverageData(#[from] CoverageError),
    #[error("filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid report configuration: {0}")]
    Configuration(String),
    #[error("xml write error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("json write error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

pub type ReportResult<T> = Result<T, ReportError>;

impl ReportError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn configuration(details: impl std::fmt::Display) -> Self {
        Self::Configuration(details.to_string())
    }

    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCoverageData(CoverageError::malformed(path, reason))
    }
}
