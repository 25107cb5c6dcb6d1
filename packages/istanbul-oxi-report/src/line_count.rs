//! Descriptive `loc` / `ncloc` statistics for the project metrics element.
//!
//! These numbers never influence pass/fail results. Reading a source file
//! can fail without aborting the report; the file then counts as empty.

use std::{
    collections::HashMap,
    io,
    ops::Add,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use rayon::prelude::*;

use crate::ProjectNode;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LineCount {
    /// Lines holding code.
    pub source: u64,
    /// Lines holding only comments.
    pub comment: u64,
}

impl LineCount {
    pub fn loc(&self) -> u64 {
        self.source + self.comment
    }

    pub fn ncloc(&self) -> u64 {
        self.source
    }
}

impl Add for LineCount {
    type Output = LineCount;

    fn add(self, rhs: LineCount) -> LineCount {
        LineCount {
            source: self.source + rhs.source,
            comment: self.comment + rhs.comment,
        }
    }
}

/// Strategy for counting lines of one source file.
pub trait LineCounter: Send + Sync {
    fn count(&self, path: &str, text: &str) -> LineCount;
}

/// Access to the raw text of covered sources.
pub trait SourceReader: Send + Sync {
    fn read_source(&self, key: &str) -> io::Result<String>;
}

/// Reads sources from disk, resolving relative keys against `root`.
#[derive(Clone, Debug)]
pub struct DiskSourceReader {
    root: PathBuf,
}

impl DiskSourceReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskSourceReader { root: root.into() }
    }

    pub fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(Path::new(key))
    }
}

impl SourceReader for DiskSourceReader {
    fn read_source(&self, key: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(key))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line: &'static [&'static str],
    pub block: Option<(&'static str, &'static str)>,
}

const C_LIKE: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: Some(("/*", "*/")),
};

const HASH: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: None,
};

const NO_COMMENTS: CommentSyntax = CommentSyntax {
    line: &[],
    block: None,
};

static SYNTAX_BY_EXTENSION: Lazy<HashMap<&'static str, CommentSyntax>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for ext in [
        "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "rs", "java", "kt", "scala", "c",
        "h", "cc", "cpp", "hpp", "cs", "go", "swift", "dart", "php",
    ] {
        map.insert(ext, C_LIKE);
    }
    for ext in ["py", "rb", "sh", "bash", "pl", "r", "yaml", "yml", "toml", "coffee"] {
        map.insert(ext, HASH);
    }
    map
});

/// Counts lines with the comment syntax picked by file extension.
/// Unknown extensions count every non-blank line as source.
#[derive(Copy, Clone, Debug, Default)]
pub struct CommentSyntaxCounter;

impl CommentSyntaxCounter {
    pub fn syntax_for(path: &str) -> CommentSyntax {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .and_then(|ext| SYNTAX_BY_EXTENSION.get(ext.as_str()).copied())
            .unwrap_or(NO_COMMENTS)
    }

    pub fn count_with(syntax: &CommentSyntax, text: &str) -> LineCount {
        let mut ret = LineCount::default();
        let mut block_end: Option<&str> = None;

        for line in text.lines() {
            let mut has_code = false;
            let mut has_comment = false;
            let mut rest = line;

            loop {
                if let Some(end) = block_end {
                    has_comment = true;
                    match rest.find(end) {
                        Some(i) => {
                            rest = &rest[i + end.len()..];
                            block_end = None;
                        }
                        None => break,
                    }
                }

                let line_start = syntax
                    .line
                    .iter()
                    .filter_map(|marker| rest.find(marker))
                    .min();
                let block_start = syntax
                    .block
                    .and_then(|(start, end)| rest.find(start).map(|i| (i, start, end)));

                match (line_start, block_start) {
                    (Some(l), Some((b, _, _))) if l <= b => {
                        has_code |= !rest[..l].trim().is_empty();
                        has_comment = true;
                        break;
                    }
                    (Some(l), None) => {
                        has_code |= !rest[..l].trim().is_empty();
                        has_comment = true;
                        break;
                    }
                    (_, Some((b, start, end))) => {
                        has_code |= !rest[..b].trim().is_empty();
                        has_comment = true;
                        rest = &rest[b + start.len()..];
                        block_end = Some(end);
                    }
                    (None, None) => {
                        has_code |= !rest.trim().is_empty();
                        break;
                    }
                }
            }

            if has_code {
                ret.source += 1;
            } else if has_comment {
                ret.comment += 1;
            }
        }

        ret
    }
}

impl LineCounter for CommentSyntaxCounter {
    fn count(&self, path: &str, text: &str) -> LineCount {
        CommentSyntaxCounter::count_with(&CommentSyntaxCounter::syntax_for(path), text)
    }
}

/// Descriptive totals for the project `<metrics>` element.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectStats {
    pub packages: usize,
    pub files: usize,
    pub lines: LineCount,
}

impl ProjectStats {
    #[tracing::instrument(skip_all)]
    pub fn collect(
        project: &ProjectNode,
        reader: &dyn SourceReader,
        counter: &dyn LineCounter,
    ) -> ProjectStats {
        let files = project.all_files();

        let lines = files
            .par_iter()
            .map(|file| match reader.read_source(file.key()) {
                Ok(text) => counter.count(&file.path, &text),
                Err(err) => {
                    tracing::warn!(
                        path = %file.key(),
                        error = %err,
                        "could not read source for line counts, counting it as empty"
                    );
                    LineCount::default()
                }
            })
            .reduce(LineCount::default, |a, b| a + b);

        ProjectStats {
            packages: project.package_count(),
            files: files.len(),
            lines,
        }
    }
}
