//! Equivalence classing of candidates by cheap metadata.
//!
//! # Overview
//!
//! Files can only be byte-identical if their sizes match, and can only be
//! hard-linked if they live on the same device. Classing candidates on
//! (size, device) — and, unless configured otherwise, owner, group, and
//! permission bits — means content comparison is only ever attempted
//! between plausible pairs. Equal keys mean "candidates", not "identical".
//!
//! Classing is first-fit: a candidate joins the first existing class whose
//! key matches in scan order (new classes enter at the front), and a class
//! is never merged with a later-matching one. The scan is O(n·c) in the number of
//! distinct classes, which stays small on the duplicate-heavy inputs this
//! tool is pointed at.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::classify::{Classifier, EquivalenceKey};
//! use linkdupe::config::Config;
//! use linkdupe::scanner::{FileRef, Walker};
//! use std::path::PathBuf;
//!
//! let config = Config::default();
//! let mut walker = Walker::new(config.clone());
//! let mut classifier = Classifier::new();
//! for candidate in walker.collect(&[PathBuf::from(".")]) {
//!     let key = EquivalenceKey::from_metadata(&candidate.meta, &config);
//!     classifier.insert(candidate.file, key);
//! }
//! println!("{} classes", classifier.class_count());
//! ```

use std::collections::VecDeque;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;

use serde::Serialize;

use crate::config::Config;
use crate::scanner::FileRef;

/// Permission bits carried into the equivalence key.
const MODE_MASK: u32 = 0o7777;

/// Cheap-metadata key deciding which candidates could possibly match.
///
/// Size and device always participate: differing sizes can never be
/// identical, and hard links cannot cross devices. Owner, group, and mode
/// participate unless the configuration ignores them, in which case they
/// are `None` on every key of the run and compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EquivalenceKey {
    /// File size in bytes.
    pub size: u64,
    /// Device the inode lives on.
    pub dev: u64,
    /// Owning user id, `None` when ownership is ignored.
    pub uid: Option<u32>,
    /// Owning group id, `None` when group ownership is ignored.
    pub gid: Option<u32>,
    /// Permission bits, `None` when permissions are ignored.
    pub mode: Option<u32>,
}

impl EquivalenceKey {
    /// Derive the key for a candidate from its stat data.
    #[must_use]
    pub fn from_metadata(meta: &Metadata, config: &Config) -> Self {
        Self {
            size: meta.len(),
            dev: meta.dev(),
            uid: (!config.ignore_owner).then(|| meta.uid()),
            gid: (!config.ignore_group).then(|| meta.gid()),
            mode: (!config.ignore_mode).then(|| meta.mode() & MODE_MASK),
        }
    }
}

/// One equivalence class: a key and the members that matched it.
///
/// Invariant: every member was inserted with exactly this key. The class
/// is built once by the classifier, consumed once by the consolidator,
/// then discarded.
#[derive(Debug, Clone)]
pub struct EquivalenceClass {
    /// The shared metadata key.
    pub key: EquivalenceKey,
    /// Members in arrival order.
    pub members: Vec<FileRef>,
}

impl EquivalenceClass {
    fn new(key: EquivalenceKey, first: FileRef) -> Self {
        Self {
            key,
            members: vec![first],
        }
    }
}

/// First-fit classifier over the candidate stream.
#[derive(Debug, Default)]
pub struct Classifier {
    // Front of the deque is the most recently created class; insert scans
    // from the front, so lookups stay first-fit in class-creation order.
    classes: VecDeque<EquivalenceClass>,
    candidates: usize,
}

impl Classifier {
    /// Create an empty classifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a candidate into the first class whose key matches, creating
    /// a new class at the front of the scan order when none does.
    pub fn insert(&mut self, file: FileRef, key: EquivalenceKey) {
        self.candidates += 1;
        for class in &mut self.classes {
            if class.key == key {
                log::trace!(
                    "associating {} with {}",
                    file.path.display(),
                    class.members[0].path.display()
                );
                class.members.push(file);
                return;
            }
        }
        self.classes.push_front(EquivalenceClass::new(key, file));
    }

    /// Number of classes built so far.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of candidates inserted so far.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates
    }

    /// Consume the classifier, yielding classes in scan order.
    #[must_use]
    pub fn into_classes(self) -> Vec<EquivalenceClass> {
        self.classes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(name: &str, ino: u64) -> FileRef {
        FileRef {
            path: PathBuf::from(name),
            dir: PathBuf::from("."),
            ino,
        }
    }

    fn key(size: u64, dev: u64, uid: Option<u32>) -> EquivalenceKey {
        EquivalenceKey {
            size,
            dev,
            uid,
            gid: None,
            mode: None,
        }
    }

    #[test]
    fn test_matching_keys_share_a_class() {
        let mut classifier = Classifier::new();
        classifier.insert(file("a", 1), key(10, 1, Some(0)));
        classifier.insert(file("b", 2), key(10, 1, Some(0)));

        let classes = classifier.into_classes();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].members.len(), 2);
    }

    #[test]
    fn test_members_keep_arrival_order() {
        let mut classifier = Classifier::new();
        classifier.insert(file("first", 1), key(10, 1, None));
        classifier.insert(file("second", 2), key(10, 1, None));
        classifier.insert(file("third", 3), key(10, 1, None));

        let classes = classifier.into_classes();
        let names: Vec<_> = classes[0]
            .members
            .iter()
            .map(|m| m.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_differing_size_splits_classes() {
        let mut classifier = Classifier::new();
        classifier.insert(file("a", 1), key(10, 1, None));
        classifier.insert(file("b", 2), key(11, 1, None));
        assert_eq!(classifier.class_count(), 2);
    }

    #[test]
    fn test_differing_device_splits_classes() {
        let mut classifier = Classifier::new();
        classifier.insert(file("a", 1), key(10, 1, None));
        classifier.insert(file("b", 2), key(10, 2, None));
        assert_eq!(classifier.class_count(), 2);
    }

    #[test]
    fn test_differing_owner_splits_unless_ignored() {
        let mut classifier = Classifier::new();
        classifier.insert(file("a", 1), key(10, 1, Some(0)));
        classifier.insert(file("b", 2), key(10, 1, Some(1000)));
        assert_eq!(classifier.class_count(), 2);

        // With ownership ignored, keys are built with uid = None and match.
        let mut classifier = Classifier::new();
        classifier.insert(file("a", 1), key(10, 1, None));
        classifier.insert(file("b", 2), key(10, 1, None));
        assert_eq!(classifier.class_count(), 1);
    }

    #[test]
    fn test_new_classes_go_to_the_front() {
        let mut classifier = Classifier::new();
        classifier.insert(file("old", 1), key(10, 1, None));
        classifier.insert(file("new", 2), key(20, 1, None));

        let classes = classifier.into_classes();
        assert_eq!(classes[0].members[0].path, PathBuf::from("new"));
        assert_eq!(classes[1].members[0].path, PathBuf::from("old"));
    }

    #[test]
    fn test_key_from_metadata_respects_ignore_flags() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"xyz").unwrap();
        let meta = std::fs::metadata(&path).unwrap();

        let full = EquivalenceKey::from_metadata(&meta, &Config::default());
        assert_eq!(full.size, 3);
        assert!(full.uid.is_some());
        assert!(full.gid.is_some());
        assert!(full.mode.is_some());

        let loose = EquivalenceKey::from_metadata(
            &meta,
            &Config::default()
                .with_ignore_owner(true)
                .with_ignore_group(true)
                .with_ignore_mode(true),
        );
        assert_eq!(loose.size, 3);
        assert_eq!(loose.dev, full.dev);
        assert!(loose.uid.is_none());
        assert!(loose.gid.is_none());
        assert!(loose.mode.is_none());
    }
}
