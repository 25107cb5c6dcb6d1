use typed_path::Utf8TypedPath;

/// Normalize a file path to use forward slashes so that the same file given
/// with different separator conventions maps to a single key.
/// Repeated separators and `.` segments are dropped.
pub fn normalize_path(path: &str) -> String {
    let typed_path = Utf8TypedPath::derive(path);
    let unix = if typed_path.is_windows() {
        typed_path.with_unix_encoding().to_string()
    } else {
        path.to_string()
    };
    // Paths with backslashes which weren't detected as Windows paths
    let unix = unix.replace('\\', "/");

    let absolute = unix.starts_with('/');
    let segments: Vec<&str> = unix
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Split a normalized path into segments. An absolute path keeps its root as
/// a leading empty segment so joining with `/` restores it.
pub fn path_segments(normalized: &str) -> Vec<&str> {
    if normalized.is_empty() {
        return Vec::new();
    }
    normalized.split('/').collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_normalize_separators() {
        assert_eq!(normalize_path(r"project\src\test\file.ts"), "project/src/test/file.ts");
        assert_eq!(normalize_path(r"src\lib/a.js"), "src/lib/a.js");
        assert_eq!(
            normalize_path("/home/user/project/src/utils/helper.js"),
            "/home/user/project/src/utils/helper.js"
        );
        assert_eq!(normalize_path("src//./lib/a.js"), "src/lib/a.js");
        assert_eq!(normalize_path("./a.js"), "a.js");
    }

    #[test]
    fn should_keep_root_segment() {
        assert_eq!(path_segments("/a/b.js"), vec!["", "a", "b.js"]);
        assert_eq!(path_segments("a/b.js"), vec!["a", "b.js"]);
        assert!(path_segments("").is_empty());
    }
}
