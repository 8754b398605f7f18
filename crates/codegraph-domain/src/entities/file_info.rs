//! `FileInfo`: an immutable record of one scanned source file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::value_objects::Language;

/// Metadata for one file discovered by the scanner.
///
/// Immutable by construction — a change on disk produces a new `FileInfo`
/// with a different `content_hash`, it never mutates an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Absolute filesystem path.
    pub absolute_path: PathBuf,
    /// Path relative to the scan root.
    pub relative_path: PathBuf,
    /// Detected source language.
    pub language: Language,
    /// SHA-256 hex digest of the file's bytes.
    pub content_hash: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Number of lines (count of `\n` plus one for a non-empty file with no
    /// trailing newline).
    pub line_count: usize,
}

impl FileInfo {
    /// Build a `FileInfo` from file bytes already read off disk.
    #[must_use]
    pub fn from_bytes(
        absolute_path: PathBuf,
        relative_path: PathBuf,
        language: Language,
        bytes: &[u8],
    ) -> Self {
        let content_hash = hex::encode(Sha256::digest(bytes));
        let line_count = count_lines(bytes);
        Self {
            absolute_path,
            relative_path,
            language,
            content_hash,
            size_bytes: bytes.len() as u64,
            line_count,
        }
    }
}

fn count_lines(bytes: &[u8]) -> usize {
    if bytes.is_empty() {
        return 0;
    }
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    if bytes.last() == Some(&b'\n') {
        newlines
    } else {
        newlines + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_sha256() {
        let a = FileInfo::from_bytes(
            "/abs/a.py".into(),
            "a.py".into(),
            Language::Python,
            b"x = 1\n",
        );
        let b = FileInfo::from_bytes(
            "/abs/b.py".into(),
            "b.py".into(),
            Language::Python,
            b"x = 1\n",
        );
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn line_count_handles_missing_trailing_newline() {
        let f = FileInfo::from_bytes("/a".into(), "a".into(), Language::Python, b"a\nb\nc");
        assert_eq!(f.line_count, 3);
        let f = FileInfo::from_bytes("/a".into(), "a".into(), Language::Python, b"a\nb\nc\n");
        assert_eq!(f.line_count, 3);
        let f = FileInfo::from_bytes("/a".into(), "a".into(), Language::Python, b"");
        assert_eq!(f.line_count, 0);
    }
}
