//! The link swap protocol: retire one name, link it to a survivor.
//!
//! # Overview
//!
//! This is the part that must never lose data. Before a name is given
//! away it is renamed to a temporary backup in the same directory, so at
//! every observable instant the content exists under at least one name:
//!
//! 1. rename `to` → backup (atomic, same device; failure leaves `to`
//!    untouched)
//! 2. hard-link `from` → `to`
//! 3. unlink the backup
//!
//! If the link fails, the backup is renamed back into place and the swap
//! is retried in the other direction. If that restore itself fails, the
//! content still exists under the backup name — the failure is reported
//! with that path and is never treated as silent loss.
//!
//! # Safety caveat
//!
//! The two paths of a merge are assumed to be used exclusively by this
//! process for the duration of the swap; nothing enforces that. The
//! optional priority boost shrinks, but cannot close, the window in which
//! another process could observe `to` missing.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use super::compare::{compare, Comparison};
use super::priority::PriorityBoost;
use crate::config::Config;
use crate::scanner::FileRef;

/// Result of one pairwise merge attempt.
#[derive(Debug)]
pub enum MergeOutcome {
    /// The names already share an inode; nothing to do.
    AlreadyLinked,
    /// `retired` now links to `kept`'s inode. In dry-run mode no mutation
    /// happened; this is the action that would have been taken.
    Linked {
        /// Name whose inode survives.
        kept: PathBuf,
        /// Name that was redirected at the survivor.
        retired: PathBuf,
        /// Whether retiring the name released its old inode (it had no
        /// other references), reclaiming the file's bytes.
        freed_inode: bool,
    },
    /// Contents differ; both names stay live.
    Different,
    /// One side could not be read; the pair is skipped.
    Unreadable,
    /// The pair is byte-identical but could not be consolidated.
    Failed(SwapError),
}

/// Failure of a merge whose pair was proven identical.
#[derive(Debug, Error)]
pub enum SwapError {
    /// Both directions failed recoverably; neither name was modified.
    #[error("cannot link {a} and {b}: {source}")]
    BothDirections {
        /// First name of the pair.
        a: PathBuf,
        /// Second name of the pair.
        b: PathBuf,
        /// Error from the last attempt.
        #[source]
        source: io::Error,
    },

    /// The backup rename succeeded, the link failed, and restoring the
    /// backup failed too. The content survives under `backup`; the
    /// operator must recover it by hand.
    #[error("failed to link {to} to {from}: copy has been left on {backup}")]
    BackupStranded {
        /// Intended link source.
        from: PathBuf,
        /// Name that was being retired.
        to: PathBuf,
        /// Where the content still lives.
        backup: PathBuf,
        /// The link error that started the failure.
        #[source]
        source: io::Error,
    },
}

/// Outcome of one demotion direction.
enum Demote {
    Done,
    /// The target name is untouched; the other direction may be tried.
    Recoverable(io::Error),
    /// The target name is gone but its content survives at `backup`.
    Stranded { backup: PathBuf, source: io::Error },
}

/// Attempt to consolidate a pair of candidates from one equivalence class.
///
/// Same-inode pairs short-circuit; differing or unreadable content is left
/// alone. For identical pairs the name with the lower hard-link count is
/// retired, keeping the name with more existing references; on a tie (or
/// when counts are unavailable) the earlier-discovered name `a` survives.
/// A recoverable failure in the preferred direction is retried once in
/// the reverse direction.
///
/// In dry-run mode the decision is computed and reported but nothing is
/// mutated.
#[must_use]
pub fn try_merge(a: &FileRef, b: &FileRef, config: &Config) -> MergeOutcome {
    if a.ino == b.ino {
        return MergeOutcome::AlreadyLinked;
    }

    match compare(&a.path, &b.path) {
        Comparison::Different => return MergeOutcome::Different,
        Comparison::Unreadable => return MergeOutcome::Unreadable,
        Comparison::Equal => {}
    }

    // Link counts change as the run proceeds, so stat fresh here rather
    // than trusting discovery-time data.
    let links_a = link_count(&a.path);
    let links_b = link_count(&b.path);
    let (keep, retire, retire_links) = match (links_a, links_b) {
        (Some(la), Some(lb)) if lb > la => (b, a, links_a),
        _ => (a, b, links_b),
    };
    let freed_inode = retire_links == Some(1);

    if config.dry_run {
        log::debug!(
            "would link {} to {}",
            retire.path.display(),
            keep.path.display()
        );
        return MergeOutcome::Linked {
            kept: keep.path.clone(),
            retired: retire.path.clone(),
            freed_inode,
        };
    }

    let _boost = config.boost_priority.then(PriorityBoost::acquire);

    let first_err = match demote(&keep.path, retire) {
        Demote::Done => {
            return MergeOutcome::Linked {
                kept: keep.path.clone(),
                retired: retire.path.clone(),
                freed_inode,
            }
        }
        Demote::Stranded { backup, source } => {
            return stranded(&keep.path, &retire.path, backup, source)
        }
        Demote::Recoverable(e) => e,
    };

    // The preferred direction rolled back cleanly; retire the other name.
    log::debug!(
        "retrying {} in the other direction: {}",
        retire.path.display(),
        first_err
    );
    match demote(&retire.path, keep) {
        Demote::Done => MergeOutcome::Linked {
            kept: retire.path.clone(),
            retired: keep.path.clone(),
            freed_inode: if keep.path == a.path {
                links_a == Some(1)
            } else {
                links_b == Some(1)
            },
        },
        Demote::Stranded { backup, source } => stranded(&retire.path, &keep.path, backup, source),
        Demote::Recoverable(source) => MergeOutcome::Failed(SwapError::BothDirections {
            a: a.path.clone(),
            b: b.path.clone(),
            source,
        }),
    }
}

fn stranded(from: &Path, to: &Path, backup: PathBuf, source: io::Error) -> MergeOutcome {
    MergeOutcome::Failed(SwapError::BackupStranded {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        backup,
        source,
    })
}

/// Replace the name `to` with a hard link to `from`'s inode.
///
/// The backup rename, the link, and the backup unlink execute strictly in
/// order, each observed before the next; batching them would reopen the
/// crash window the backup exists to close.
fn demote(from: &Path, to: &FileRef) -> Demote {
    let backup = backup_name(to);

    if let Err(e) = fs::rename(&to.path, &backup) {
        log::debug!("cannot stage {}: {}", to.path.display(), e);
        return Demote::Recoverable(e);
    }

    if let Err(link_err) = fs::hard_link(from, &to.path) {
        return match fs::rename(&backup, &to.path) {
            Ok(()) => {
                log::debug!(
                    "link {} to {} failed, original restored: {}",
                    to.path.display(),
                    from.display(),
                    link_err
                );
                Demote::Recoverable(link_err)
            }
            Err(restore_err) => {
                log::error!(
                    "cannot restore {} from {}: {}",
                    to.path.display(),
                    backup.display(),
                    restore_err
                );
                Demote::Stranded {
                    backup,
                    source: link_err,
                }
            }
        };
    }

    // The backup is now a redundant extra reference to the old inode.
    if let Err(e) = fs::remove_file(&backup) {
        log::warn!("cannot remove temporary file {}: {}", backup.display(), e);
    }

    Demote::Done
}

/// Hard-link count for a name, if it can be stat'd.
fn link_count(path: &Path) -> Option<u64> {
    fs::symlink_metadata(path).ok().map(|m| m.nlink())
}

/// Build a unique backup name in the retired name's own directory.
///
/// Same-directory placement keeps the rename on one device, which is what
/// makes it atomic. The name derives from the process id and current
/// time; a counter disambiguates in the unlikely event of a collision.
fn backup_name(to: &FileRef) -> PathBuf {
    let name = to.path.file_name().unwrap_or_default();
    let pid = std::process::id();
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());

    let mut attempt = 0u32;
    loop {
        let mut file_name = OsString::from(".");
        file_name.push(name);
        file_name.push(format!(".{pid}.{stamp}"));
        if attempt > 0 {
            file_name.push(format!(".{attempt}"));
        }
        file_name.push(".bak");
        let candidate = to.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn make(dir: &TempDir, name: &str, content: &[u8]) -> FileRef {
        let path = dir.path().join(name);
        File::create(&path).unwrap().write_all(content).unwrap();
        let meta = fs::metadata(&path).unwrap();
        FileRef::new(path, &meta)
    }

    fn inode(path: &Path) -> u64 {
        fs::metadata(path).unwrap().ino()
    }

    fn no_backups_left(dir: &TempDir) -> bool {
        !fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().ends_with(".bak"))
    }

    #[test]
    fn test_same_inode_short_circuits() {
        let dir = TempDir::new().unwrap();
        let a = make(&dir, "a", b"x");
        let linked = dir.path().join("linked");
        fs::hard_link(&a.path, &linked).unwrap();
        let b = FileRef::new(linked, &fs::metadata(dir.path().join("linked")).unwrap());

        assert!(matches!(
            try_merge(&a, &b, &Config::default()),
            MergeOutcome::AlreadyLinked
        ));
    }

    #[test]
    fn test_different_content_left_alone() {
        let dir = TempDir::new().unwrap();
        let a = make(&dir, "a", b"aaa");
        let b = make(&dir, "b", b"bbb");
        let (ino_a, ino_b) = (inode(&a.path), inode(&b.path));

        assert!(matches!(
            try_merge(&a, &b, &Config::default()),
            MergeOutcome::Different
        ));
        assert_eq!(inode(&a.path), ino_a);
        assert_eq!(inode(&b.path), ino_b);
    }

    #[test]
    fn test_identical_pair_gets_linked() {
        let dir = TempDir::new().unwrap();
        let a = make(&dir, "a", b"same bytes");
        let b = make(&dir, "b", b"same bytes");

        match try_merge(&a, &b, &Config::default()) {
            MergeOutcome::Linked {
                kept,
                retired,
                freed_inode,
            } => {
                assert_eq!(kept, a.path);
                assert_eq!(retired, b.path);
                assert!(freed_inode);
            }
            other => panic!("expected Linked, got {:?}", other),
        }

        assert_eq!(inode(&a.path), inode(&b.path));
        assert_eq!(fs::read(&b.path).unwrap(), b"same bytes");
        assert!(no_backups_left(&dir));
    }

    #[test]
    fn test_higher_link_count_name_survives() {
        let dir = TempDir::new().unwrap();
        let a = make(&dir, "a", b"payload");
        let b = make(&dir, "b", b"payload");
        // Give b an extra reference so its name wins the direction choice.
        fs::hard_link(&b.path, dir.path().join("b-extra")).unwrap();
        let ino_b = inode(&b.path);

        match try_merge(&a, &b, &Config::default()) {
            MergeOutcome::Linked {
                kept,
                retired,
                freed_inode,
            } => {
                assert_eq!(kept, b.path);
                assert_eq!(retired, a.path);
                assert!(freed_inode, "a had a single reference");
            }
            other => panic!("expected Linked, got {:?}", other),
        }
        assert_eq!(inode(&a.path), ino_b);
    }

    #[test]
    fn test_equal_link_counts_keep_first_discovered() {
        let dir = TempDir::new().unwrap();
        let a = make(&dir, "a", b"payload");
        let b = make(&dir, "b", b"payload");
        let ino_a = inode(&a.path);

        match try_merge(&a, &b, &Config::default()) {
            MergeOutcome::Linked { kept, .. } => assert_eq!(kept, a.path),
            other => panic!("expected Linked, got {:?}", other),
        }
        assert_eq!(inode(&b.path), ino_a);
    }

    #[test]
    fn test_dry_run_mutates_nothing() {
        let dir = TempDir::new().unwrap();
        let a = make(&dir, "a", b"same");
        let b = make(&dir, "b", b"same");
        let (ino_a, ino_b) = (inode(&a.path), inode(&b.path));

        match try_merge(&a, &b, &Config::default().with_dry_run(true)) {
            MergeOutcome::Linked { kept, retired, .. } => {
                assert_eq!(kept, a.path);
                assert_eq!(retired, b.path);
            }
            other => panic!("expected Linked, got {:?}", other),
        }

        assert_eq!(inode(&a.path), ino_a);
        assert_eq!(inode(&b.path), ino_b);
        assert_ne!(ino_a, ino_b);
        assert!(no_backups_left(&dir));
    }

    #[test]
    fn test_failed_link_restores_the_original() {
        let dir = TempDir::new().unwrap();
        let b = make(&dir, "b", b"precious");
        let ino_b = inode(&b.path);

        // A link source that does not exist: the backup rename succeeds,
        // the link fails, the restore puts b back.
        let missing = dir.path().join("missing");
        match demote(&missing, &b) {
            Demote::Recoverable(_) => {}
            Demote::Done => panic!("link from a missing source cannot succeed"),
            Demote::Stranded { .. } => panic!("restore should have succeeded"),
        }

        assert_eq!(inode(&b.path), ino_b);
        assert_eq!(fs::read(&b.path).unwrap(), b"precious");
        assert!(no_backups_left(&dir));
    }

    #[test]
    fn test_backup_name_shape() {
        let dir = TempDir::new().unwrap();
        let b = make(&dir, "data.bin", b"x");

        let backup = backup_name(&b);
        assert_eq!(backup.parent().unwrap(), dir.path());
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".data.bin."));
        assert!(name.ends_with(".bak"));
        assert!(!backup.exists());
    }
}
