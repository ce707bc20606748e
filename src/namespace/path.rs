//! String helpers for virtual paths.
//!
//! Virtual paths always use `/` as the separator regardless of host platform,
//! start with `/`, and never end with one (except the root itself).

pub const ROOT: &str = "/";

/// Normalize a virtual path: collapse to a single leading `/` and strip
/// trailing separators.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return ROOT.to_string();
    }
    if trimmed.starts_with('/') {
        let body = trimmed.trim_start_matches('/');
        format!("/{}", body)
    } else {
        format!("/{}", trimmed)
    }
}

/// Strip trailing separators from a real path. A path made only of
/// separators stays as `/`.
pub fn trim_real(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        ROOT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split a path into `(head, tail)` where `tail` is everything after the
/// final `/`. Trailing separators on the head are removed unless the head is
/// the root.
///
/// `split("/a/b")` is `("/a", "b")`, `split("/a")` is `("/", "a")` and
/// `split("/")` is `("/", "")`.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => {
            let head = &path[..=i];
            let tail = &path[i + 1..];
            let stripped = head.trim_end_matches('/');
            if stripped.is_empty() {
                (head, tail)
            } else {
                (stripped, tail)
            }
        }
        None => ("", path),
    }
}

/// Final component of a path, ignoring trailing separators.
pub fn basename(path: &str) -> &str {
    split(path.trim_end_matches('/')).1
}

/// Join a directory path and a child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Split a name into stem and extension. Leading dots belong to the stem, so
/// `.bashrc` has no extension and `/a/b.tar.gz` splits at the last dot.
pub fn split_ext(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let name = &path[name_start..];
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(dot) => {
            let at = name_start + leading_dots + dot;
            (&path[..at], &path[at..])
        }
        None => (path, ""),
    }
}
