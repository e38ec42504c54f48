//! Archive formats and the external tools that produce them.

use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::str::FromStr;

use super::UnknownFormat;

/// External compression utility invoked for an archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveTool {
    /// Info-ZIP `zip`
    Zip,
    /// `tar` with a compression filter
    Tar,
}

impl ArchiveTool {
    /// Returns the conventional executable name of the tool.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
        }
    }
}

/// Supported archive output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// ZIP archive (.zip)
    Zip,
    /// Gzip-compressed tarball (.tar.gz)
    TarGz,
    /// XZ-compressed tarball (.tar.xz)
    TarXz,
}

impl ArchiveFormat {
    /// Every archive format, in the order they are offered.
    pub const ALL: [ArchiveFormat; 3] = [Self::Zip, Self::TarGz, Self::TarXz];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Zip => "ZIP",
            Self::TarGz => "TAR.GZ",
            Self::TarXz => "TAR.XZ",
        }
    }

    /// Output file suffix, including the leading dot.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
            Self::TarXz => ".tar.xz",
        }
    }

    /// The external tool that creates this format.
    pub fn tool(&self) -> ArchiveTool {
        match self {
            Self::Zip => ArchiveTool::Zip,
            Self::TarGz | Self::TarXz => ArchiveTool::Tar,
        }
    }

    /// Whether a single-item archive keeps the item's full file name
    /// (`report.txt.zip`) instead of dropping its extension (`report.tar.gz`).
    pub fn keeps_full_name(&self) -> bool {
        matches!(self, Self::Zip)
    }

    /// Builds the tool's argument vector.
    ///
    /// Both the output name and the item names are relative to the working
    /// directory the tool is launched in.
    pub fn arguments(&self, output_name: &OsStr, items: &[OsString]) -> Vec<OsString> {
        let flags: &[&str] = match self {
            // Recurse into directories, store symlinks as links.
            Self::Zip => &["-r", "-y"],
            Self::TarGz => &["-czf"],
            Self::TarXz => &["-cJf"],
        };

        let mut args: Vec<OsString> = flags.iter().map(OsString::from).collect();
        args.push(output_name.to_os_string());
        args.extend(items.iter().cloned());
        args
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ArchiveFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar.gz" | "tgz" | "targz" => Ok(Self::TarGz),
            "tar.xz" | "txz" | "tarxz" => Ok(Self::TarXz),
            _ => Err(UnknownFormat::new("archive", s)),
        }
    }
}
