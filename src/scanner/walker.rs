//! Sequential candidate enumeration.
//!
//! # Overview
//!
//! The [`Walker`] expands the paths given on the command line (or read from
//! a candidate list) into the ordered candidate set the classifier
//! consumes. File arguments are stat'd directly; directory arguments list
//! their immediate entries, descending further only when recursion is
//! enabled. Traversal is strictly single-threaded and depth-first in name
//! order, so repeated runs over the same tree discover candidates in the
//! same order.
//!
//! Unreadable directories are warnings, not errors: the files we can reach
//! are still worth consolidating.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::config::Config;
//! use linkdupe::scanner::Walker;
//! use std::path::PathBuf;
//!
//! let config = Config::default().with_recursive(true);
//! let mut walker = Walker::new(config);
//! let candidates = walker.collect(&[PathBuf::from("/srv/mirror")]);
//! println!("{} files, {} skipped", candidates.len(), walker.stats().skipped());
//! ```

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use super::{Candidate, FileRef, SkipReason, WalkStats};
use crate::config::Config;

/// Errors reading an external candidate list.
///
/// These are fatal: they occur before any filesystem mutation, so aborting
/// requires no cleanup.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The list file could not be opened or read.
    #[error("cannot read candidate list {path}: {source}")]
    ListRead {
        /// Path of the list file (`-` for stdin).
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The list contained an empty line; a candidate path cannot be empty.
    #[error("malformed candidate list {path}: empty path on line {line}")]
    MalformedList {
        /// Path of the list file.
        path: PathBuf,
        /// 1-based line number of the offending entry.
        line: usize,
    },
}

/// Outcome of stat'ing one path.
enum Examined {
    File(Candidate),
    Dir,
    Skipped,
}

/// Sequential walker producing candidates in arrival order.
#[derive(Debug)]
pub struct Walker {
    config: Config,
    stats: WalkStats,
}

impl Walker {
    /// Create a walker with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stats: WalkStats::default(),
        }
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Expand command-line paths into the candidate set.
    ///
    /// Directories list their immediate entries; subdirectories are entered
    /// only when recursion is enabled. Paths that vanish or are not regular
    /// files are skipped silently.
    pub fn collect(&mut self, paths: &[PathBuf]) -> Vec<Candidate> {
        let mut out = Vec::new();
        for path in paths {
            self.enter(path, &mut out);
        }
        out
    }

    /// Expand candidates read from a list file, one path per line.
    ///
    /// `-` reads the list from stdin. Blank lines are malformed input.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError`] if the list cannot be read or contains an
    /// empty path. Both happen before any mutation.
    pub fn collect_from_list(&mut self, list: &Path) -> Result<Vec<Candidate>, WalkError> {
        let paths = if list == Path::new("-") {
            read_list(list, io::stdin().lock())?
        } else {
            let file = fs::File::open(list).map_err(|source| WalkError::ListRead {
                path: list.to_path_buf(),
                source,
            })?;
            read_list(list, BufReader::new(file))?
        };

        log::debug!("read {} candidate paths from {}", paths.len(), list.display());
        Ok(self.collect(&paths))
    }

    /// Handle one argument-level path.
    fn enter(&mut self, path: &Path, out: &mut Vec<Candidate>) {
        match self.examine(path) {
            Examined::File(candidate) => {
                self.stats.candidates += 1;
                out.push(candidate);
            }
            Examined::Dir => {
                self.stats.directories += 1;
                self.walk_dir(path, out);
            }
            Examined::Skipped => {}
        }
    }

    /// List a directory, descending when recursion is enabled.
    fn walk_dir(&mut self, dir: &Path, out: &mut Vec<Candidate>) {
        let mut walk = WalkDir::new(dir)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if !self.config.recursive {
            walk = walk.max_depth(1);
        }

        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let at = e.path().unwrap_or(dir);
                    log::warn!("cannot read {}: {}", at.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                self.stats.directories += 1;
                continue;
            }
            match self.examine(entry.path()) {
                Examined::File(candidate) => {
                    self.stats.candidates += 1;
                    out.push(candidate);
                }
                // A symlink to a directory at the depth limit; already
                // counted by the surrounding traversal.
                Examined::Dir | Examined::Skipped => {}
            }
        }
    }

    /// Stat one path and decide what it is.
    fn examine(&mut self, path: &Path) -> Examined {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(_) => return self.skip(path, SkipReason::Vanished),
        };

        let meta = if meta.file_type().is_symlink() {
            if !self.config.follow_symlinks {
                return self.skip(path, SkipReason::Symlink);
            }
            // Stat through the link; a dangling target counts as vanished.
            match fs::metadata(path) {
                Ok(meta) => meta,
                Err(_) => return self.skip(path, SkipReason::Vanished),
            }
        } else {
            meta
        };

        if meta.is_dir() {
            return Examined::Dir;
        }
        if !meta.is_file() {
            return self.skip(path, SkipReason::Special);
        }
        if self.config.ignore_empty && meta.len() == 0 {
            return self.skip(path, SkipReason::Empty);
        }

        Examined::File(Candidate {
            file: FileRef::new(path.to_path_buf(), &meta),
            meta,
        })
    }

    fn skip(&mut self, path: &Path, reason: SkipReason) -> Examined {
        log::trace!("skipping {} ({})", path.display(), reason.label());
        self.stats.count_skip(reason);
        Examined::Skipped
    }
}

/// Parse a candidate list: one path per line, no empty lines.
fn read_list(path: &Path, reader: impl BufRead) -> Result<Vec<PathBuf>, WalkError> {
    let mut paths = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| WalkError::ListRead {
            path: path.to_path_buf(),
            source,
        })?;
        if line.is_empty() {
            return Err(WalkError::MalformedList {
                path: path.to_path_buf(),
                line: idx + 1,
            });
        }
        paths.push(PathBuf::from(line));
    }
    Ok(paths)
}
