use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("malformed coverage data for {path}: {reason}")]
    MalformedCoverageData { path: String, reason: String },
    #[error("coverage json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CoverageResult<T> = Result<T, CoverageError>;

impl CoverageError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCoverageData {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
