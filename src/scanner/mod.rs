//! Candidate discovery: stat'ing paths and filtering to linkable files.
//!
//! The scanner turns user-supplied paths into [`Candidate`] values carrying
//! everything later stages need: a [`FileRef`] naming one on-disk entry and
//! the metadata used for equivalence classing. Only regular files qualify;
//! directories are expanded by the walker, and everything else (sockets,
//! devices, unwanted symlinks, vanished paths) is skipped without error.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::config::Config;
//! use linkdupe::scanner::Walker;
//! use std::path::PathBuf;
//!
//! let mut walker = Walker::new(Config::default());
//! let candidates = walker.collect(&[PathBuf::from(".")]);
//! println!("{} linkable files", candidates.len());
//! ```

pub mod walker;

use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

pub use walker::{WalkError, Walker};

/// One on-disk name for a file.
///
/// Created when a candidate is stat'd and immutable afterwards. A retired
/// path stays a valid `FileRef`: after consolidation it aliases the
/// survivor's inode, and its content is unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Full path to the directory entry.
    pub path: PathBuf,
    /// Directory containing the entry. Backup names during a link swap are
    /// built here so the rename never crosses a device.
    pub dir: PathBuf,
    /// Inode number at discovery time.
    pub ino: u64,
}

impl FileRef {
    /// Build a `FileRef` from a path and its stat data.
    #[must_use]
    pub fn new(path: PathBuf, meta: &Metadata) -> Self {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            path,
            dir,
            ino: meta.ino(),
        }
    }
}

/// A discovered regular file plus the metadata it was discovered with.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The on-disk name.
    pub file: FileRef,
    /// Stat data captured at discovery; classing keys derive from this.
    pub meta: Metadata,
}

/// Why a path was left out of the candidate set.
///
/// These are expected, non-error outcomes: the walker logs them at trace
/// level and moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Path vanished between listing and stat, or never existed.
    Vanished,
    /// Not a regular file (device node, socket, fifo, ...).
    Special,
    /// Symbolic link and link-following is disabled, or the link target
    /// is not a regular file.
    Symlink,
    /// Zero-length file excluded by the empty-file policy.
    Empty,
}

impl SkipReason {
    /// Short label for logging.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Vanished => "vanished",
            Self::Special => "not a regular file",
            Self::Symlink => "symlink",
            Self::Empty => "empty",
        }
    }
}

/// Counters for one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Regular files accepted as candidates.
    pub candidates: usize,
    /// Directories expanded.
    pub directories: usize,
    /// Paths that vanished before they could be stat'd.
    pub vanished: usize,
    /// Special files skipped.
    pub special: usize,
    /// Symlinks skipped (or symlinks to non-files).
    pub symlinks: usize,
    /// Zero-length files excluded by policy.
    pub empty: usize,
}

impl WalkStats {
    /// Total paths skipped for any reason.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.vanished + self.special + self.symlinks + self.empty
    }

    pub(crate) fn count_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Vanished => self.vanished += 1,
            SkipReason::Special => self.special += 1,
            SkipReason::Symlink => self.symlinks += 1,
            SkipReason::Empty => self.empty += 1,
        }
    }
}
