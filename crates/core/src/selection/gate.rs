//! Pure predicates that classify a list of paths.

use std::path::Path;

use crate::catalog::{AudioFormat, VideoFormat};

/// Suffixes that mark an item as already archived. Compound suffixes come
/// first so `.tar.gz` is recognised before the bare `.gz`.
const ARCHIVE_SUFFIXES: [&str; 9] = [
    ".tar.gz", ".tar.xz", ".tgz", ".txz", ".zip", ".tar", ".gz", ".xz", ".bz2",
];

/// Returns the archive suffix a file name ends with, if any.
pub fn archive_suffix(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();
    ARCHIVE_SUFFIXES
        .into_iter()
        .find(|suffix| name.ends_with(suffix))
}

/// True if the lowercased file name ends with a known archive suffix.
pub fn is_archived_path(path: &Path) -> bool {
    archive_suffix(path).is_some()
}

/// True if any item is already an archive.
pub fn contains_archived_item<P: AsRef<Path>>(items: &[P]) -> bool {
    items.iter().any(|p| is_archived_path(p.as_ref()))
}

/// True only for a non-empty list where every item is a readable audio format.
pub fn all_supported_audio<P: AsRef<Path>>(items: &[P]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|p| AudioFormat::from_path(p.as_ref()).is_some())
}

/// Audio input format of every item, or `None` if any item is not audio.
pub fn input_formats<P: AsRef<Path>>(items: &[P]) -> Option<Vec<AudioFormat>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|p| AudioFormat::from_path(p.as_ref()))
        .collect()
}

/// Video format of the only item, if the list is exactly one supported video.
pub fn video_format<P: AsRef<Path>>(items: &[P]) -> Option<VideoFormat> {
    match items {
        [only] => VideoFormat::from_path(only.as_ref()),
        _ => None,
    }
}

/// True only for exactly one item with a supported video extension.
pub fn is_single_supported_video<P: AsRef<Path>>(items: &[P]) -> bool {
    video_format(items).is_some()
}
