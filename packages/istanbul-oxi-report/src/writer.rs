//! Atomic artifact output.
//!
//! Content goes to a temporary file next to the destination which is only
//! renamed into place once fully written and synced. On any failure the
//! temporary file is dropped and the destination is left untouched.

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{ReportError, ReportResult};

#[derive(Copy, Clone, Debug, Default)]
pub struct FileWriter;

impl FileWriter {
    /// Hands a writer for `path` to `content`. The file appears at `path`
    /// only if `content` and every flush succeed.
    pub fn write_file<F>(&self, path: &Path, content: F) -> ReportResult<()>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| ReportError::filesystem(&dir, e))?;

        let temp = NamedTempFile::new_in(&dir).map_err(|e| ReportError::filesystem(&dir, e))?;
        let mut out = BufWriter::new(temp);

        content(&mut out).map_err(|e| ReportError::filesystem(path, e))?;

        let temp = out
            .into_inner()
            .map_err(|e| ReportError::filesystem(path, e.into_error()))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| ReportError::filesystem(path, e))?;
        temp.persist(path)
            .map_err(|e| ReportError::filesystem(path, e.error))?;

        tracing::info!(path = %path.display(), "wrote report artifact");
        Ok(())
    }

    pub fn write_contents(&self, path: &Path, contents: &str) -> ReportResult<()> {
        self.write_file(path, |w| w.write_all(contents.as_bytes()))
    }

    /// Same as [`FileWriter::write_contents`], performed on tokio's blocking
    /// pool.
    pub async fn write_contents_async(&self, path: PathBuf, contents: String) -> ReportResult<()> {
        let writer = *self;
        tokio::task::spawn_blocking(move || writer.write_contents(&path, &contents)).await?
    }
}
