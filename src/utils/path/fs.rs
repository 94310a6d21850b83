//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `relative_path` - lexical path from one directory to another
//! - `to_slash` - forward-slash rendering for JS import specifiers

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Lexical relative path from directory `from` to `to`.
///
/// Both paths are expected to be absolute. No filesystem access.
///
/// # Example
/// ```ignore
/// relative_path(Path::new("/repo/src"), Path::new("/repo/df/devup-ui"))
///     == PathBuf::from("../df/devup-ui")
/// ```
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &to[common..] {
        rel.push(component.as_os_str());
    }
    rel
}

/// Render a path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/absolute/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_relative_path_sibling() {
        let rel = relative_path(Path::new("/repo/src"), Path::new("/repo/df/devup-ui"));
        assert_eq!(rel, PathBuf::from("../df/devup-ui"));
    }

    #[test]
    fn test_relative_path_descendant() {
        let rel = relative_path(Path::new("/repo"), Path::new("/repo/df/devup-ui"));
        assert_eq!(rel, PathBuf::from("df/devup-ui"));
    }

    #[test]
    fn test_relative_path_deeper_source() {
        let rel = relative_path(
            Path::new("/repo/src/components/button"),
            Path::new("/repo/df/devup-ui"),
        );
        assert_eq!(rel, PathBuf::from("../../../df/devup-ui"));
    }

    #[test]
    fn test_relative_path_same() {
        let rel = relative_path(Path::new("/repo/df"), Path::new("/repo/df"));
        assert_eq!(rel, PathBuf::new());
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("a/b")), "a/b");
        assert_eq!(to_slash(Path::new(r"..\df\devup-ui")), "../df/devup-ui");
    }
}
