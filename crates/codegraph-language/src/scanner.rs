//! File scanner (§4.1): walks a root, filters by extension and
//! ignore-patterns, emits [`FileInfo`] lazily.

use std::path::Path;

use codegraph_domain::constants::languages;
use codegraph_domain::entities::FileInfo;
use codegraph_domain::value_objects::Language;
use codegraph_utils::paths::relative_to;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::warn;

/// Scans a directory tree for source files recognized by [`Language`].
pub struct Scanner {
    ignore_globs: GlobSet,
}

impl Scanner {
    /// Build a scanner whose ignore list matches any path *component*
    /// against `ignore_patterns` (§4.1's per-component ignore rule).
    pub fn new(ignore_patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in ignore_patterns {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
            } else {
                warn!(pattern, "ignoring invalid scanner ignore-pattern");
            }
        }
        let ignore_globs = builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().expect("empty GlobSet always builds"));
        Self { ignore_globs }
    }

    /// Walk `root`, returning every recognized, non-ignored file as a
    /// [`FileInfo`]. Unreadable files are logged and skipped, not
    /// propagated as an error (§4.1).
    pub fn scan(&self, root: &Path) -> Vec<FileInfo> {
        let mut out = Vec::new();

        for entry in WalkBuilder::new(root).hidden(false).git_ignore(true).build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(%err, "scanner: unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let absolute_path = entry.path().to_path_buf();

            if self.is_ignored(&absolute_path, root) {
                continue;
            }

            let Some(language) = language_for(&absolute_path) else {
                continue;
            };

            let bytes = match std::fs::read(&absolute_path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(path = %absolute_path.display(), %err, "scanner: failed to read file, skipping");
                    continue;
                }
            };

            let relative_path = relative_to(root, &absolute_path);
            out.push(FileInfo::from_bytes(absolute_path, relative_path, language, &bytes));
        }

        out
    }

    fn is_ignored(&self, path: &Path, root: &Path) -> bool {
        let relative = relative_to(root, path);
        relative.components().any(|component| self.ignore_globs.is_match(component.as_os_str()))
    }
}

/// Language for `path`'s extension, matched case-insensitively (§4.1).
#[must_use]
pub fn language_for(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    languages::ALL.into_iter().find(|lang| lang.extensions().contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scans_recognized_files_and_skips_unrecognized() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

        let scanner = Scanner::new(&[]);
        let files = scanner.scan(dir.path());

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].language, Language::Python);
    }

    #[test]
    fn ignore_pattern_matches_any_path_component() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/dep.js"), "x\n").unwrap();
        fs::write(dir.path().join("main.js"), "x\n").unwrap();

        let scanner = Scanner::new(&["node_modules".to_owned()]);
        let files = scanner.scan(dir.path());

        assert_eq!(files.len(), 1);
        assert!(files[0].relative_path.ends_with("main.js"));
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Main.RS"), "fn main() {}\n").unwrap();

        let scanner = Scanner::new(&[]);
        let files = scanner.scan(dir.path());

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].language, Language::Rust);
    }
}
