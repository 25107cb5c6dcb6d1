//! Coverage tree mirroring the directory layout of the covered files.
//!
//! The root is a [`ProjectNode`] holding only packages. Packages hold files
//! and nested packages, sorted by name, and carry the aggregate of every
//! file below them.

use std::collections::BTreeMap;

use istanbul_oxide::{combine, normalize_path, path_segments, CoverageSummary};

use crate::ReportResult;

/// Package name used for files without any parent directory.
pub const ROOT_PACKAGE_NAME: &str = "__root__";

#[derive(Clone, Debug, PartialEq)]
pub struct FileNode {
    /// Every collector key normalizing to `path`, in input order.
    pub keys: Vec<String>,
    /// Normalized full path.
    pub path: String,
    /// Base name of the file.
    pub name: String,
    pub metrics: CoverageSummary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PackageNode {
    /// Normalized directory path.
    pub path: String,
    /// Dotted path relative to the project root.
    pub name: String,
    pub children: Vec<TreeNode>,
    /// Aggregate of all descendant files. `None` for a package without files.
    pub package_metrics: Option<CoverageSummary>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TreeNode {
    Package(PackageNode),
    File(FileNode),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectNode {
    /// Common ancestor directory of every file, empty when there is none.
    pub path: String,
    pub packages: Vec<PackageNode>,
    pub metrics: CoverageSummary,
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Package(p) => &p.name,
            TreeNode::File(f) => &f.name,
        }
    }

    /// Last path segment, the sort key among siblings.
    fn segment(&self) -> &str {
        match self {
            TreeNode::Package(p) => base_name(&p.path),
            TreeNode::File(f) => &f.name,
        }
    }

    pub fn metrics(&self) -> Option<&CoverageSummary> {
        match self {
            TreeNode::Package(p) => p.package_metrics.as_ref(),
            TreeNode::File(f) => Some(&f.metrics),
        }
    }
}

impl FileNode {
    /// First collector key of the file.
    pub fn key(&self) -> &str {
        self.keys.first().map(String::as_str).unwrap_or(&self.path)
    }
}

impl PackageNode {
    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.children.iter().filter_map(|child| match child {
            TreeNode::File(f) => Some(f),
            TreeNode::Package(_) => None,
        })
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageNode> {
        self.children.iter().filter_map(|child| match child {
            TreeNode::Package(p) => Some(p),
            TreeNode::File(_) => None,
        })
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a FileNode>) {
        out.extend(self.files());
        for package in self.packages() {
            package.collect_files(out);
        }
    }

    fn count_packages(&self) -> usize {
        1 + self.packages().map(|p| p.count_packages()).sum::<usize>()
    }
}

impl ProjectNode {
    /// Every file of the project, in pre-order.
    pub fn all_files(&self) -> Vec<&FileNode> {
        let mut out = Vec::new();
        for package in &self.packages {
            package.collect_files(&mut out);
        }
        out
    }

    /// Number of packages at any depth.
    pub fn package_count(&self) -> usize {
        self.packages.iter().map(|p| p.count_packages()).sum()
    }
}

struct FileEntry {
    keys: Vec<String>,
    path: String,
    metrics: CoverageSummary,
}

#[derive(Default)]
struct DirBuilder<'a> {
    dirs: BTreeMap<&'a str, DirBuilder<'a>>,
    files: Vec<&'a FileEntry>,
}

impl<'a> DirBuilder<'a> {
    fn insert(&mut self, dirs: &[&'a str], file: &'a FileEntry) {
        match dirs.split_first() {
            Some((first, rest)) => self.dirs.entry(*first).or_default().insert(rest, file),
            None => self.files.push(file),
        }
    }

    /// Post-order conversion; aggregates are computed once children are done.
    fn finish(self, path: String, relative: Vec<&'a str>) -> PackageNode {
        let mut children: Vec<TreeNode> = Vec::new();

        for file in self.files {
            children.push(TreeNode::File(FileNode {
                keys: file.keys.clone(),
                path: file.path.clone(),
                name: base_name(&file.path).to_string(),
                metrics: file.metrics,
            }));
        }

        for (segment, dir) in self.dirs {
            let mut child_relative = relative.clone();
            child_relative.push(segment);
            let child_path = join_path(&path, segment);
            children.push(TreeNode::Package(dir.finish(child_path, child_relative)));
        }

        children.sort_by(|a, b| a.segment().cmp(b.segment()));

        let package_metrics = children
            .iter()
            .filter_map(|child| child.metrics())
            .fold(None, |acc: Option<CoverageSummary>, m| {
                Some(match acc {
                    Some(acc) => combine(&acc, m),
                    None => *m,
                })
            });

        PackageNode {
            path,
            name: package_name(&relative),
            children,
            package_metrics,
        }
    }
}

fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        if segment.is_empty() {
            "/".to_string()
        } else {
            segment.to_string()
        }
    } else if base.ends_with('/') {
        format!("{}{}", base, segment)
    } else {
        format!("{}/{}", base, segment)
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn package_name(relative: &[&str]) -> String {
    // An absolute path mixed with relative ones keeps its root segment.
    let (root, relative) = match relative.split_first() {
        Some((first, rest)) if first.is_empty() => ("/", rest),
        _ => ("", relative),
    };
    let name = relative
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(".");
    let name = format!("{}{}", root, name.trim_end_matches('.'));

    if name.is_empty() {
        ROOT_PACKAGE_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Builds the coverage tree for `paths`. Paths denoting the same file under
/// different separator conventions collapse into one node, and
/// `summary_of` is asked once per node with all of its keys.
#[tracing::instrument(skip_all)]
pub fn build_tree<I, S, F>(paths: I, mut summary_of: F) -> ReportResult<ProjectNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&[String]) -> ReportResult<CoverageSummary>,
{
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for key in paths {
        let key = key.as_ref();
        let keys = grouped.entry(normalize_path(key)).or_default();
        if let Some(first) = keys.first() {
            tracing::warn!(
                first = %first,
                duplicate = %key,
                "two coverage keys denote the same file, merging their coverage"
            );
        }
        keys.push(key.to_string());
    }

    let mut entries: BTreeMap<String, FileEntry> = BTreeMap::new();
    for (path, keys) in grouped {
        let metrics = summary_of(&keys)?;
        entries.insert(
            path.clone(),
            FileEntry {
                keys,
                path,
                metrics,
            },
        );
    }

    let dir_segments: Vec<(Vec<&str>, &FileEntry)> = entries
        .values()
        .map(|entry| {
            let mut segments = path_segments(&entry.path);
            segments.pop();
            (segments, entry)
        })
        .collect();

    let mut prefix_len = common_prefix_len(dir_segments.iter().map(|(dirs, _)| dirs.as_slice()));
    // Files sitting directly in the common directory need that directory as
    // their package, so start one level above it.
    if prefix_len > 0 && dir_segments.iter().any(|(dirs, _)| dirs.len() == prefix_len) {
        prefix_len -= 1;
    }

    let prefix: Vec<&str> = dir_segments
        .first()
        .map(|(dirs, _)| dirs[..prefix_len].to_vec())
        .unwrap_or_default();
    let project_path = match (prefix.is_empty(), prefix.join("/")) {
        (false, joined) if joined.is_empty() => "/".to_string(),
        (_, joined) => joined,
    };

    let mut root = DirBuilder::default();
    for (dirs, entry) in &dir_segments {
        let relative = &dirs[prefix_len..];
        if relative.is_empty() {
            root.insert(&[ROOT_PACKAGE_NAME], entry);
        } else {
            root.insert(relative, entry);
        }
    }

    let mut packages = Vec::new();
    for (segment, dir) in root.dirs {
        let path = if segment == ROOT_PACKAGE_NAME && prefix_len == 0 {
            String::new()
        } else {
            join_path(&project_path, segment)
        };
        let package = dir.finish(path, vec![segment]);
        if package.package_metrics.is_some() {
            packages.push(package);
        }
    }

    let metrics = packages
        .iter()
        .filter_map(|p| p.package_metrics.as_ref())
        .fold(CoverageSummary::default(), |acc, m| combine(&acc, m));

    tracing::debug!(
        root = %project_path,
        files = entries.len(),
        packages = packages.len(),
        "built coverage tree"
    );

    Ok(ProjectNode {
        path: project_path,
        packages,
        metrics,
    })
}

fn common_prefix_len<'a, 'b: 'a, I>(mut paths: I) -> usize
where
    I: Iterator<Item = &'a [&'b str]>,
{
    let Some(first) = paths.next() else {
        return 0;
    };

    paths.fold(first.len(), |len, other| {
        first
            .iter()
            .zip(other.iter())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count()
    })
}

#[cfg(test)]
mod tests {
    use istanbul_oxide::Totals;
    use pretty_assertions::assert_eq;

    use super::*;

    fn summary(lines: (u32, u32), functions: (u32, u32), branches: (u32, u32)) -> CoverageSummary {
        CoverageSummary {
            lines: Totals::new(lines.0, lines.1),
            statements: Totals::new(lines.0, lines.1),
            functions: Totals::new(functions.0, functions.1),
            branches: Totals::new(branches.0, branches.1),
        }
    }

    fn build(files: &[(&str, CoverageSummary)]) -> ProjectNode {
        let map: BTreeMap<String, CoverageSummary> = files
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        build_tree(files.iter().map(|(k, _)| *k), |keys| Ok(map[&keys[0]])).unwrap()
    }

    fn descendant_sum(package: &PackageNode) -> CoverageSummary {
        let mut files = Vec::new();
        package.collect_files(&mut files);
        files
            .iter()
            .fold(CoverageSummary::default(), |acc, f| combine(&acc, &f.metrics))
    }

    fn assert_aggregates(package: &PackageNode) {
        let expected = descendant_sum(package);
        let actual = package.package_metrics.unwrap();
        assert_eq!(
            (actual.lines.total, actual.lines.covered),
            (expected.lines.total, expected.lines.covered)
        );
        assert_eq!(
            (actual.branches.total, actual.branches.covered),
            (expected.branches.total, expected.branches.covered)
        );
        assert_eq!(
            (actual.functions.total, actual.functions.covered),
            (expected.functions.total, expected.functions.covered)
        );
        package.packages().for_each(assert_aggregates);
    }

    #[test]
    fn should_aggregate_every_package() {
        let project = build(&[
            ("/p/src/a.js", summary((10, 5), (2, 1), (4, 2))),
            ("/p/src/lib/b.js", summary((3, 3), (1, 1), (0, 0))),
            ("/p/src/lib/deep/c.js", summary((8, 0), (3, 0), (2, 2))),
            ("/p/test/d.js", summary((1, 1), (0, 0), (0, 0))),
        ]);

        assert_eq!(project.path, "/p");
        assert_eq!(project.package_count(), 4);
        assert_eq!(project.all_files().len(), 4);
        project.packages.iter().for_each(assert_aggregates);

        assert_eq!(project.metrics.lines.total, 22);
        assert_eq!(project.metrics.lines.covered, 9);
        assert_eq!(project.metrics.branches.total, 6);
    }

    #[test]
    fn should_lift_root_when_files_sit_in_common_directory() {
        let project = build(&[
            ("/p/src/a.js", summary((1, 1), (0, 0), (0, 0))),
            ("/p/src/lib/b.js", summary((1, 0), (0, 0), (0, 0))),
        ]);

        assert_eq!(project.path, "/p");
        assert_eq!(project.packages.len(), 1);
        let src = &project.packages[0];
        assert_eq!(src.name, "src");
        assert_eq!(src.path, "/p/src");
        assert_eq!(src.files().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["a.js"]);
        let lib = src.packages().next().unwrap();
        assert_eq!(lib.name, "src.lib");
        assert_eq!(lib.path, "/p/src/lib");
    }

    #[test]
    fn should_sort_children_by_name() {
        let project = build(&[
            ("src/z.js", summary((1, 1), (0, 0), (0, 0))),
            ("src/m/x.js", summary((1, 1), (0, 0), (0, 0))),
            ("src/a.js", summary((1, 1), (0, 0), (0, 0))),
        ]);

        let names: Vec<&str> = project.packages[0].children.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a.js", "src.m", "z.js"]);
    }

    #[test]
    fn should_place_bare_files_in_root_package() {
        let project = build(&[("a.js", summary((2, 1), (1, 1), (0, 0)))]);

        assert_eq!(project.path, "");
        assert_eq!(project.packages.len(), 1);
        assert_eq!(project.packages[0].name, ROOT_PACKAGE_NAME);
        assert_eq!(project.packages[0].files().next().unwrap().path, "a.js");
    }

    #[test]
    fn should_ask_once_per_file_with_every_key() {
        let mut requested: Vec<Vec<String>> = Vec::new();
        let project = build_tree([r"src\lib\a.js", "src/lib/a.js", "src/lib/b.js"], |keys| {
            requested.push(keys.to_vec());
            Ok(summary((2, 1), (0, 0), (0, 0)))
        })
        .unwrap();

        assert_eq!(
            requested,
            vec![
                vec![r"src\lib\a.js".to_string(), "src/lib/a.js".to_string()],
                vec!["src/lib/b.js".to_string()],
            ]
        );
        let files = project.all_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "src/lib/a.js");
        assert_eq!(files[0].key(), r"src\lib\a.js");
        assert_eq!(files[0].metrics.lines.total, 2);
    }

    #[test]
    fn should_keep_absolute_root_apart_from_bare_files() {
        let project = build(&[
            ("/abs/x.js", summary((1, 1), (0, 0), (0, 0))),
            ("/abs/lib/y.js", summary((1, 1), (0, 0), (0, 0))),
            ("rel.js", summary((1, 0), (0, 0), (0, 0))),
        ]);

        let names: Vec<&str> = project.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["/", ROOT_PACKAGE_NAME]);
        let slash = &project.packages[0];
        assert_eq!(slash.path, "/");
        let abs = slash.packages().next().unwrap();
        assert_eq!(abs.name, "/abs");
        assert_eq!(abs.path, "/abs");
        assert_eq!(abs.packages().next().unwrap().name, "/abs.lib");
    }

    #[test]
    fn should_build_empty_project() {
        let project = build(&[]);

        assert!(project.packages.is_empty());
        assert_eq!(project.metrics, CoverageSummary::default());
    }
}
