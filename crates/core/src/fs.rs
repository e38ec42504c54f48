//! Small filesystem checks shared by the executors.

use std::path::Path;

/// True if `path` is an existing regular file with at least one byte.
pub(crate) fn has_content(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

/// Size of `path` in bytes, zero if it cannot be read.
pub(crate) fn size_of(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_has_content() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        let full = dir.path().join("full");
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&full, b"abc").unwrap();

        assert!(!has_content(&empty));
        assert!(has_content(&full));
        assert!(!has_content(&dir.path().join("missing")));
        assert!(!has_content(dir.path()));
        assert_eq!(size_of(&full), 3);
    }
}
