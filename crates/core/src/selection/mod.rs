//! Selections handed to the engine and the gate that classifies them.
//!
//! A [`Selection`] is validated once on construction and never changes
//! afterwards. The gate functions in [`gate`] are pure predicates over the
//! item names; they never touch the filesystem.

mod error;
pub mod gate;

pub use error::SelectionError;
pub use gate::{
    all_supported_audio, contains_archived_item, input_formats, is_archived_path,
    is_single_supported_video, video_format,
};

use serde::Serialize;
use std::path::{Path, PathBuf};

/// An ordered, non-empty list of absolute paths to existing items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    items: Vec<PathBuf>,
}

impl Selection {
    /// Validates a raw hand-off.
    ///
    /// Rejects an empty list, relative paths and paths that do not exist.
    /// Dangling symlinks count as existing items.
    pub fn new<I, P>(paths: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let items: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(SelectionError::Empty);
        }

        for item in &items {
            if !item.is_absolute() {
                return Err(SelectionError::NotAbsolute { path: item.clone() });
            }
            if std::fs::symlink_metadata(item).is_err() {
                return Err(SelectionError::NotFound { path: item.clone() });
            }
        }

        Ok(Self { items })
    }

    /// The selected items, in hand-off order.
    pub fn items(&self) -> &[PathBuf] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a constructed selection.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The only item when the selection has exactly one.
    pub fn single(&self) -> Option<&Path> {
        match self.items.as_slice() {
            [only] => Some(only.as_path()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_valid_selection_keeps_order() {
        let dir = TempDir::new().unwrap();
        let b = dir.path().join("b.txt");
        let a = dir.path().join("a.txt");
        std::fs::write(&b, "b").unwrap();
        std::fs::write(&a, "a").unwrap();

        let selection = Selection::new([b.clone(), a.clone()]).unwrap();
        assert_eq!(selection.items(), &[b, a]);
        assert_eq!(selection.len(), 2);
        assert!(!selection.is_empty());
        assert!(selection.single().is_none());
    }

    #[test]
    fn test_new_empty_fails() {
        let result = Selection::new(Vec::<PathBuf>::new());
        assert!(matches!(result, Err(SelectionError::Empty)));
    }

    #[test]
    fn test_new_relative_fails() {
        let result = Selection::new(["relative/file.txt"]);
        assert!(matches!(result, Err(SelectionError::NotAbsolute { .. })));
    }

    #[test]
    fn test_new_missing_fails() {
        let dir = TempDir::new().unwrap();
        let result = Selection::new([dir.path().join("missing.wav")]);
        assert!(matches!(result, Err(SelectionError::NotFound { .. })));
    }

    #[test]
    fn test_single() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("one.mov");
        std::fs::write(&file, "x").unwrap();

        let selection = Selection::new([file.clone()]).unwrap();
        assert_eq!(selection.single(), Some(file.as_path()));
    }
}
