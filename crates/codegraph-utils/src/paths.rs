//! Path normalization helpers used by the scanner and the incremental
//! update engine to derive stable, portable relative paths.

use std::path::{Path, PathBuf};

use normpath::PathExt;

/// Normalize `path` (resolving `.`/`..` components without requiring the
/// path to exist) and make it relative to `root`, using forward slashes
/// regardless of platform.
#[must_use]
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    let normalized_root = root.normalize_virtually().map(normpath::BasePathBuf::into_path_buf).unwrap_or_else(|_| root.to_path_buf());
    let normalized_path = path.normalize_virtually().map(normpath::BasePathBuf::into_path_buf).unwrap_or_else(|_| path.to_path_buf());

    let relative = normalized_path.strip_prefix(&normalized_root).unwrap_or(&normalized_path);

    to_forward_slashes(relative)
}

/// Re-join a `/`-separated relative path onto `root` as a native path.
#[must_use]
pub fn to_forward_slashes(path: &Path) -> PathBuf {
    let joined = path.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/");
    PathBuf::from(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_prefix() {
        let root = Path::new("/repo");
        let path = Path::new("/repo/src/lib.rs");
        assert_eq!(relative_to(root, path), PathBuf::from("src/lib.rs"));
    }

    #[test]
    fn resolves_dot_dot_components() {
        let root = Path::new("/repo");
        let path = Path::new("/repo/src/../src/lib.rs");
        assert_eq!(relative_to(root, path), PathBuf::from("src/lib.rs"));
    }
}
