//! Journal path validation.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rejected journal paths.
#[derive(Debug, Error)]
pub enum PathError {
    /// Empty argument.
    #[error("path is empty")]
    Empty,
    /// Nothing exists at the path.
    #[error("{0} does not exist")]
    NotFound(String),
    /// Path exists but is a directory or special file.
    #[error("{0} is not a regular file")]
    NotAFile(String),
}

/// Checks that `input` names a journal file.
///
/// With `allow_missing`, a path that does not exist yet is accepted so the
/// caller can create it; an existing path must still be a regular file.
pub fn validate_journal_path(input: &str, allow_missing: bool) -> Result<PathBuf, PathError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    let path = PathBuf::from(trimmed);
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Ok(path),
        Ok(_) => Err(PathError::NotAFile(sanitize_path_for_error(&path))),
        Err(_) if allow_missing => Ok(path),
        Err(_) => Err(PathError::NotFound(sanitize_path_for_error(&path))),
    }
}

/// File name only, so error messages do not leak directory layout.
pub fn sanitize_path_for_error(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<journal>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_depends_on_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.sgl");
        let input = path.to_string_lossy();
        assert!(matches!(validate_journal_path(&input, false), Err(PathError::NotFound(_))));
        assert_eq!(validate_journal_path(&input, true).unwrap(), path);
    }

    #[test]
    fn directories_and_empty_input_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_string_lossy();
        assert!(matches!(validate_journal_path(&input, true), Err(PathError::NotAFile(_))));
        assert!(matches!(validate_journal_path("  ", true), Err(PathError::Empty)));
    }

    #[test]
    fn sanitized_path_hides_directories() {
        assert_eq!(sanitize_path_for_error(Path::new("/secret/dir/ledger.sgl")), "ledger.sgl");
    }
}
