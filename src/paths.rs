//! Path utilities shared by the matcher and the persistence codec.
//!
//! All functions are lexical: they never touch the filesystem, so they work
//! for roots that do not exist yet and for files that were just deleted.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` and lexically normalize the result.
///
/// - If `path` is relative, `base` is prepended.
/// - `.` components are dropped and `..` pops the previous normal component.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_relative() {
        normalize(&base.join(path))
    } else {
        normalize(path)
    }
}

/// Lexically normalize a path without resolving symlinks.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Render `path` relative to `base` in `./`-prefixed, `/`-separated form.
///
/// Paths outside `base` are rendered with leading `../` segments instead.
/// Both inputs are expected to be absolute.
pub fn relative_dot_path(path: &Path, base: &Path) -> String {
    let path = normalize(path);
    let base = normalize(base);

    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..base_parts.len() {
        segments.push("..".to_string());
    }
    for part in &path_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }

    if segments.is_empty() {
        return ".".to_string();
    }

    let joined = segments.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{joined}")
    }
}

/// Render a path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| match c {
            Component::RootDir => String::new(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
        .replace("//", "/")
}
