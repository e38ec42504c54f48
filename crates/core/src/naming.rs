//! Output path derivation.
//!
//! All functions here are deterministic given their inputs. The only outside
//! state consulted is the filesystem, through an [`ExistenceProbe`], and only
//! to find the first candidate name that is not taken yet.

use chrono::NaiveDateTime;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::ArchiveFormat;

/// Timestamp layout used in multi-item archive names (`yyyyMMdd_HHmmss`).
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Base name prefix for multi-item archives.
pub const MULTI_ITEM_ARCHIVE_PREFIX: &str = "archive_";

/// Errors raised while deriving output paths.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NamingError {
    /// No items to derive a name from.
    #[error("Selection is empty")]
    EmptySelection,

    /// The items do not share a single parent directory.
    #[error("Selected items are in different folders: {} and {}", .first.display(), .other.display())]
    MixedParentDirectories { first: PathBuf, other: PathBuf },

    /// An item has no parent directory or file name (e.g. `/`).
    #[error("Cannot derive an output name from {}", .path.display())]
    Unnameable { path: PathBuf },
}

/// Answers whether a candidate output path is already taken.
pub trait ExistenceProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the live filesystem. Dangling symlinks count as taken.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl ExistenceProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path).is_ok()
    }
}

impl<F> ExistenceProbe for F
where
    F: Fn(&Path) -> bool,
{
    fn exists(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Returns the first free path `dir/stem{suffix}`, then `dir/stem 2{suffix}`,
/// `dir/stem 3{suffix}` and so on.
///
/// The stem is kept byte for byte, so non-UTF-8 names survive unchanged.
pub fn unique_path(
    dir: &Path,
    stem: &OsStr,
    suffix: &str,
    probe: &impl ExistenceProbe,
) -> PathBuf {
    let first = dir.join(candidate_name(stem, None, suffix));
    if !probe.exists(&first) {
        return first;
    }

    let mut counter: u64 = 2;
    loop {
        let candidate = dir.join(candidate_name(stem, Some(counter), suffix));
        if !probe.exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn candidate_name(stem: &OsStr, counter: Option<u64>, suffix: &str) -> OsString {
    let mut name = stem.to_os_string();
    if let Some(counter) = counter {
        name.push(format!(" {counter}"));
    }
    name.push(suffix);
    name
}

/// The single parent directory shared by every item.
pub fn common_parent_directory<P: AsRef<Path>>(items: &[P]) -> Result<PathBuf, NamingError> {
    let (first, rest) = items.split_first().ok_or(NamingError::EmptySelection)?;
    let parent = parent_of(first.as_ref())?;

    for item in rest {
        let other = parent_of(item.as_ref())?;
        if other != parent {
            return Err(NamingError::MixedParentDirectories {
                first: parent.to_path_buf(),
                other: other.to_path_buf(),
            });
        }
    }

    Ok(parent.to_path_buf())
}

/// File name of each item, relative to the common parent.
pub fn relative_item_names<P: AsRef<Path>>(items: &[P]) -> Result<Vec<OsString>, NamingError> {
    items
        .iter()
        .map(|item| {
            let item = item.as_ref();
            item.file_name()
                .map(|n| n.to_os_string())
                .ok_or_else(|| NamingError::Unnameable {
                    path: item.to_path_buf(),
                })
        })
        .collect()
}

/// Derives a collision-free archive path for the selected items.
///
/// One item: sibling named after the item (full name for ZIP, extension
/// dropped for tarballs). Several items: `archive_<timestamp>` inside their
/// common parent.
pub fn archive_output_path<P: AsRef<Path>>(
    items: &[P],
    format: ArchiveFormat,
    now: NaiveDateTime,
    probe: &impl ExistenceProbe,
) -> Result<PathBuf, NamingError> {
    let dir = common_parent_directory(items)?;

    let base = match items {
        [only] => {
            let only = only.as_ref();
            let name = file_name_of(only)?;
            if format.keeps_full_name() {
                name
            } else {
                stem_or_name(only)?
            }
        }
        _ => OsString::from(format!(
            "{MULTI_ITEM_ARCHIVE_PREFIX}{}",
            now.format(ARCHIVE_TIMESTAMP_FORMAT)
        )),
    };

    Ok(unique_path(&dir, &base, format.suffix(), probe))
}

/// Derives a collision-free sibling path for a converted copy of `source`.
///
/// `extension` is given without the leading dot.
pub fn conversion_output_path(
    source: &Path,
    extension: &str,
    probe: &impl ExistenceProbe,
) -> Result<PathBuf, NamingError> {
    let dir = parent_of(source)?;
    let stem = stem_or_name(source)?;
    Ok(unique_path(dir, &stem, &format!(".{extension}"), probe))
}

fn parent_of(path: &Path) -> Result<&Path, NamingError> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| NamingError::Unnameable {
            path: path.to_path_buf(),
        })
}

fn file_name_of(path: &Path) -> Result<OsString, NamingError> {
    path.file_name()
        .map(OsStr::to_os_string)
        .ok_or_else(|| NamingError::Unnameable {
            path: path.to_path_buf(),
        })
}

/// Name without its last extension; the full name when that would be empty.
fn stem_or_name(path: &Path) -> Result<OsString, NamingError> {
    let name = file_name_of(path)?;
    match path.file_stem() {
        Some(stem) if !stem.is_empty() => Ok(stem.to_os_string()),
        _ => Ok(name),
    }
}
