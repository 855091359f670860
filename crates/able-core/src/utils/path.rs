//! Path utilities for root discovery and classification.
//!
//! Provides path normalization, absolute path resolution, overlap checks
//! between roots, and the stdlib/kernel directory markers.

use crate::error::{AbleError, AbleResult};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::path::PathBuf;

/// Directory names that mark a kernel root
const KERNEL_MARKERS: &[&str] = &["kernel", "ablekernel", "able_kernel"];

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Utf8Component::CurDir => {},
            Utf8Component::ParentDir => match components.last() {
                Some(Utf8Component::Normal(_)) => {
                    components.pop();
                },
                // `..` directly under the root stays at the root
                Some(Utf8Component::RootDir) | Some(Utf8Component::Prefix(_)) => {},
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }

    components.iter().collect()
}

/// Resolve a path against the current directory and normalize it
pub fn absolute_path(path: &Utf8Path) -> AbleResult<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir()
        .map_err(|e| AbleError::io("Failed to get current directory".to_string(), e))?;
    let cwd = utf8_path(cwd)?;
    Ok(normalize_path(&cwd.join(path)))
}

/// Convert a std path into a UTF-8 path
pub fn utf8_path(path: PathBuf) -> AbleResult<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| AbleError::NonUtf8Path {
        path: path.to_string_lossy().into_owned(),
    })
}

/// Check if `target` is `base` or lives below it
pub fn contains_path_prefix(base: &Utf8Path, target: &Utf8Path) -> bool {
    normalize_path(target).starts_with(normalize_path(base))
}

/// Check if either path contains the other
pub fn paths_overlap(a: &Utf8Path, b: &Utf8Path) -> bool {
    contains_path_prefix(a, b) || contains_path_prefix(b, a)
}

/// Check if any path segment marks a standard library checkout
pub fn looks_like_stdlib_path(path: &Utf8Path) -> bool {
    lowercase_segments(path).any(|part| {
        part == "stdlib"
            || part.starts_with("stdlib_")
            || part == "able-stdlib"
            || part == "able_stdlib"
    })
}

/// Check if any path segment marks a kernel checkout
pub fn looks_like_kernel_path(path: &Utf8Path) -> bool {
    lowercase_segments(path).any(|part| KERNEL_MARKERS.contains(&part.as_str()))
}

fn lowercase_segments(path: &Utf8Path) -> impl Iterator<Item = String> + '_ {
    path.components().filter_map(|component| match component {
        Utf8Component::Normal(part) => Some(part.to_lowercase()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let path = Utf8Path::new("./src/../lib/./file.able");
        assert_eq!(normalize_path(path), Utf8Path::new("lib/file.able"));

        let path = Utf8Path::new("/work/app/../lib");
        assert_eq!(normalize_path(path), Utf8Path::new("/work/lib"));

        let path = Utf8Path::new("/../etc");
        assert_eq!(normalize_path(path), Utf8Path::new("/etc"));
    }

    #[test]
    fn test_absolute_path_keeps_absolute() {
        let path = absolute_path(Utf8Path::new("/a/./b")).unwrap();
        assert_eq!(path, Utf8Path::new("/a/b"));

        let relative = absolute_path(Utf8Path::new("x/y")).unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("x/y"));
    }

    #[test]
    fn test_contains_path_prefix() {
        assert!(contains_path_prefix(Utf8Path::new("/a/b"), Utf8Path::new("/a/b")));
        assert!(contains_path_prefix(Utf8Path::new("/a/b"), Utf8Path::new("/a/b/c")));
        assert!(!contains_path_prefix(Utf8Path::new("/a/b"), Utf8Path::new("/a/bc")));
        assert!(!contains_path_prefix(Utf8Path::new("/a/b/c"), Utf8Path::new("/a/b")));
    }

    #[test]
    fn test_paths_overlap() {
        assert!(paths_overlap(Utf8Path::new("/a"), Utf8Path::new("/a/b")));
        assert!(paths_overlap(Utf8Path::new("/a/b"), Utf8Path::new("/a")));
        assert!(!paths_overlap(Utf8Path::new("/a/b"), Utf8Path::new("/a/c")));
    }

    #[test]
    fn test_markers() {
        assert!(looks_like_stdlib_path(Utf8Path::new("/x/STDLIB/src")));
        assert!(looks_like_stdlib_path(Utf8Path::new("/x/able_stdlib")));
        assert!(!looks_like_stdlib_path(Utf8Path::new("/x/mystdlib")));
        assert!(looks_like_kernel_path(Utf8Path::new("/x/Able_Kernel/src")));
        assert!(!looks_like_kernel_path(Utf8Path::new("/x/kernels")));
    }
}
