//! Job assembly.

use chrono::{Local, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::JobError;
use super::types::{ArchiveJob, ConvertJob, ConvertTask, VideoConvertJob};
use crate::catalog::{ArchiveFormat, AudioFormat, VideoFormat};
use crate::naming::{self, ExistenceProbe, FsProbe};
use crate::selection::{self, Selection, SelectionError};

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Validates selections and derives every path a job needs.
pub struct JobBuilder<P: ExistenceProbe = FsProbe> {
    probe: P,
    clock: fn() -> NaiveDateTime,
}

impl JobBuilder<FsProbe> {
    /// Builder probing the live filesystem and using local time.
    pub fn new() -> Self {
        Self::with_probe(FsProbe)
    }
}

impl Default for JobBuilder<FsProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ExistenceProbe> JobBuilder<P> {
    /// Builder with a custom existence probe.
    pub fn with_probe(probe: P) -> Self {
        Self {
            probe,
            clock: local_now,
        }
    }

    /// Replaces the clock used for multi-item archive names.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Builds an archive job.
    pub fn archive(
        &self,
        selection: &Selection,
        format: ArchiveFormat,
    ) -> Result<ArchiveJob, JobError> {
        let items = selection.items();
        if items.is_empty() {
            return Err(SelectionError::Empty.into());
        }
        if let Some(archived) = items.iter().find(|p| selection::is_archived_path(p)) {
            return Err(SelectionError::AlreadyArchived {
                path: archived.clone(),
            }
            .into());
        }

        let working_directory = naming::common_parent_directory(items)?;
        let relative_item_names = naming::relative_item_names(items)?;
        let output_path = naming::archive_output_path(items, format, (self.clock)(), &self.probe)?;

        debug!(
            working_directory = %working_directory.display(),
            output = %output_path.display(),
            items = relative_item_names.len(),
            "Built archive job"
        );

        Ok(ArchiveJob {
            selection: selection.clone(),
            format,
            working_directory,
            relative_item_names,
            output_path,
        })
    }

    /// Builds an audio conversion job with one task per selected file.
    ///
    /// Each task probes the filesystem on its own. Paths claimed by earlier
    /// tasks of the same job also count as taken, so two sources sharing a
    /// stem never map to one output.
    pub fn audio(
        &self,
        selection: &Selection,
        output_format: AudioFormat,
    ) -> Result<ConvertJob, JobError> {
        let inputs =
            selection::input_formats(selection.items()).ok_or(SelectionError::UnsupportedAudio)?;
        if !AudioFormat::offered_outputs(&inputs).contains(&output_format) {
            return Err(JobError::unsupported_target(output_format));
        }

        let claimed: RefCell<HashSet<PathBuf>> = RefCell::new(HashSet::new());
        let probe = |path: &Path| self.probe.exists(path) || claimed.borrow().contains(path);

        let mut tasks = Vec::with_capacity(selection.len());
        for source in selection.items() {
            let output_path =
                naming::conversion_output_path(source, output_format.extension(), &probe)?;
            claimed.borrow_mut().insert(output_path.clone());
            tasks.push(ConvertTask {
                source_path: source.clone(),
                output_path,
                output_format,
            });
        }

        debug!(tasks = tasks.len(), format = %output_format, "Built audio conversion job");

        Ok(ConvertJob {
            selection: selection.clone(),
            output_format,
            tasks,
        })
    }

    /// Builds a video conversion job.
    ///
    /// `alternatives` is the list of outputs discovered for this source,
    /// already excluding the source's own container.
    pub fn video(
        &self,
        selection: &Selection,
        output_format: VideoFormat,
        alternatives: &[VideoFormat],
    ) -> Result<VideoConvertJob, JobError> {
        let source_format =
            selection::video_format(selection.items()).ok_or(SelectionError::NotSingleVideo)?;
        let source_path = selection
            .single()
            .ok_or(SelectionError::NotSingleVideo)?
            .to_path_buf();

        if alternatives.is_empty() {
            return Err(JobError::NoAlternativeOutputs);
        }
        if output_format == source_format || !alternatives.contains(&output_format) {
            return Err(JobError::unsupported_target(output_format));
        }

        let output_path =
            naming::conversion_output_path(&source_path, output_format.extension(), &self.probe)?;

        debug!(
            source = %source_path.display(),
            output = %output_path.display(),
            "Built video conversion job"
        );

        Ok(VideoConvertJob {
            source_path,
            source_format,
            output_format,
            output_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingError;
    use chrono::NaiveDate;
    use std::ffi::OsString;
    use tempfile::TempDir;

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 58)
            .unwrap()
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"data").unwrap();
        path
    }

    #[test]
    fn test_archive_single_item() {
        let dir = TempDir::new().unwrap();
        let report = touch(dir.path(), "report.txt");
        let selection = Selection::new([report]).unwrap();

        let job = JobBuilder::new().archive(&selection, ArchiveFormat::Zip).unwrap();
        assert_eq!(job.working_directory, dir.path());
        assert_eq!(job.relative_item_names, vec![OsString::from("report.txt")]);
        assert_eq!(job.output_path, dir.path().join("report.txt.zip"));
        assert_eq!(
            job.tool_arguments(),
            vec![
                OsString::from("-r"),
                OsString::from("-y"),
                OsString::from("report.txt.zip"),
                OsString::from("report.txt"),
            ]
        );
    }

    #[test]
    fn test_archive_multi_item_uses_clock() {
        let dir = TempDir::new().unwrap();
        let a = touch(dir.path(), "a.txt");
        let b = touch(dir.path(), "b.txt");
        let selection = Selection::new([a, b]).unwrap();

        let job = JobBuilder::new()
            .with_clock(fixed_clock)
            .archive(&selection, ArchiveFormat::TarXz)
            .unwrap();
        assert_eq!(
            job.output_path,
            dir.path().join("archive_20231231_235958.tar.xz")
        );
    }

    #[test]
    fn test_archive_mixed_parents_fails() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        let selection =
            Selection::new([touch(one.path(), "a.txt"), touch(two.path(), "b.txt")]).unwrap();

        let err = JobBuilder::new()
            .archive(&selection, ArchiveFormat::Zip)
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Naming(NamingError::MixedParentDirectories { .. })
        ));
        assert_eq!(err.user_message(), "All selected items must be in the same folder.");
    }

    #[test]
    fn test_archive_rejects_archived_item() {
        let dir = TempDir::new().unwrap();
        let selection = Selection::new([touch(dir.path(), "old.tar.gz")]).unwrap();

        let err = JobBuilder::new()
            .archive(&selection, ArchiveFormat::Zip)
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Selection(SelectionError::AlreadyArchived { .. })
        ));
    }

    #[test]
    fn test_audio_one_task_per_source() {
        let dir = TempDir::new().unwrap();
        let a = touch(dir.path(), "a.wav");
        let b = touch(dir.path(), "b.wav");
        touch(dir.path(), "b.aiff");
        let selection = Selection::new([a.clone(), b.clone()]).unwrap();

        let job = JobBuilder::new().audio(&selection, AudioFormat::Aiff).unwrap();
        assert_eq!(job.tasks.len(), 2);
        assert_eq!(job.tasks[0].source_path, a);
        assert_eq!(job.tasks[0].output_path, dir.path().join("a.aiff"));
        assert_eq!(job.tasks[1].source_path, b);
        assert_eq!(job.tasks[1].output_path, dir.path().join("b 2.aiff"));
    }

    #[test]
    fn test_audio_shared_stem_gets_distinct_outputs() {
        let dir = TempDir::new().unwrap();
        let wav = touch(dir.path(), "take.wav");
        let mp3 = touch(dir.path(), "take.mp3");
        let selection = Selection::new([wav, mp3]).unwrap();

        let job = JobBuilder::new().audio(&selection, AudioFormat::M4a).unwrap();
        assert_eq!(job.tasks[0].output_path, dir.path().join("take.m4a"));
        assert_eq!(job.tasks[1].output_path, dir.path().join("take 2.m4a"));
    }

    #[test]
    fn test_audio_rejects_mp3_target() {
        let dir = TempDir::new().unwrap();
        let selection = Selection::new([touch(dir.path(), "a.wav")]).unwrap();

        let err = JobBuilder::new().audio(&selection, AudioFormat::Mp3).unwrap_err();
        assert!(matches!(err, JobError::UnsupportedTarget { .. }));
    }

    #[test]
    fn test_audio_rejects_non_audio() {
        let dir = TempDir::new().unwrap();
        let selection =
            Selection::new([touch(dir.path(), "a.wav"), touch(dir.path(), "notes.txt")]).unwrap();

        let err = JobBuilder::new().audio(&selection, AudioFormat::Aiff).unwrap_err();
        assert_eq!(err, JobError::Selection(SelectionError::UnsupportedAudio));
    }

    #[test]
    fn test_video_job() {
        let dir = TempDir::new().unwrap();
        let clip = touch(dir.path(), "clip.mp4");
        let selection = Selection::new([clip.clone()]).unwrap();

        let job = JobBuilder::new()
            .video(&selection, VideoFormat::Mov, &[VideoFormat::Mov, VideoFormat::M4v])
            .unwrap();
        assert_eq!(job.source_path, clip);
        assert_eq!(job.source_format, VideoFormat::Mp4);
        assert_eq!(job.output_path, dir.path().join("clip.mov"));
    }

    #[test]
    fn test_video_without_alternatives_refuses() {
        let dir = TempDir::new().unwrap();
        let selection = Selection::new([touch(dir.path(), "clip.mov")]).unwrap();

        let err = JobBuilder::new()
            .video(&selection, VideoFormat::Mp4, &[])
            .unwrap_err();
        assert_eq!(err, JobError::NoAlternativeOutputs);
    }

    #[test]
    fn test_video_rejects_own_container() {
        let dir = TempDir::new().unwrap();
        let selection = Selection::new([touch(dir.path(), "clip.mov")]).unwrap();

        let err = JobBuilder::new()
            .video(&selection, VideoFormat::Mov, &[VideoFormat::Mp4])
            .unwrap_err();
        assert!(matches!(err, JobError::UnsupportedTarget { .. }));
    }
}
