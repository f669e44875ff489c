//! Reducing an equivalence class to pairwise-distinct survivors.
//!
//! # Overview
//!
//! Within one class, the consolidator repeatedly takes the head member and
//! sweeps it against every remaining member: a pair that turns out
//! byte-identical is consolidated through the link swap protocol
//! ([`swap`]), a differing member stays in the tail, and the next head is
//! chosen only after the current head has been swept against the whole
//! tail. The loop is an explicit index walk, so arbitrarily large classes
//! cannot grow the call stack.
//!
//! Worst case is O(k²) content comparisons for a class of k members;
//! true-duplicate clusters are expected to stay small.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::config::Config;
//! use linkdupe::consolidate::Consolidator;
//! use linkdupe::report::RunReport;
//! # fn classes() -> Vec<linkdupe::classify::EquivalenceClass> { vec![] }
//!
//! let consolidator = Consolidator::new(Config::default());
//! let mut report = RunReport::new(false);
//! for class in classes() {
//!     consolidator.consolidate(class, &mut report);
//! }
//! ```

pub mod compare;
pub mod priority;
pub mod swap;

pub use compare::{compare, Comparison};
pub use priority::PriorityBoost;
pub use swap::{try_merge, MergeOutcome, SwapError};

use crate::classify::EquivalenceClass;
use crate::config::Config;
use crate::report::{PairAction, PairDecision, RunReport};
use crate::scanner::FileRef;

/// Drives pairwise merges over the classes of one run.
#[derive(Debug)]
pub struct Consolidator {
    config: Config,
}

impl Consolidator {
    /// Create a consolidator with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Consolidate one class, recording a decision for every pair.
    ///
    /// On return, the surviving members are pairwise byte-distinct and
    /// every retired member's name aliases exactly one survivor's inode.
    /// A pair that was proven identical but could not be linked is
    /// reported failed and never retried against later heads.
    pub fn consolidate(&self, class: EquivalenceClass, report: &mut RunReport) {
        let size = class.key.size;
        let mut members = class.members;
        let mut head = 0;

        while head + 1 < members.len() {
            let mut idx = head + 1;
            while idx < members.len() {
                let outcome = swap::try_merge(&members[head], &members[idx], &self.config);
                let resolved = self.record(&members[head], &members[idx], outcome, size, report);
                if resolved {
                    members.remove(idx);
                } else {
                    idx += 1;
                }
            }
            head += 1;
        }
    }

    /// Record one outcome; returns whether the tail member is resolved
    /// (anything but a content mismatch removes it from the sweep).
    fn record(
        &self,
        head: &FileRef,
        member: &FileRef,
        outcome: MergeOutcome,
        size: u64,
        report: &mut RunReport,
    ) -> bool {
        match outcome {
            MergeOutcome::AlreadyLinked => {
                log::debug!(
                    "{} already links {}",
                    member.path.display(),
                    head.path.display()
                );
                report.record(PairDecision {
                    action: PairAction::Skipped,
                    kept: head.path.clone(),
                    other: member.path.clone(),
                    detail: Some("already linked".into()),
                });
                true
            }
            MergeOutcome::Linked {
                kept,
                retired,
                freed_inode,
            } => {
                report.summary.comparisons += 1;
                if freed_inode {
                    report.add_reclaimed(size);
                }
                log::info!("linking {} to {}", retired.display(), kept.display());
                report.record(PairDecision {
                    action: if self.config.dry_run {
                        PairAction::WouldLink
                    } else {
                        PairAction::Linked
                    },
                    kept,
                    other: retired,
                    detail: None,
                });
                true
            }
            MergeOutcome::Different => {
                report.summary.comparisons += 1;
                report.record(PairDecision {
                    action: PairAction::Kept,
                    kept: head.path.clone(),
                    other: member.path.clone(),
                    detail: None,
                });
                false
            }
            MergeOutcome::Unreadable => {
                report.record(PairDecision {
                    action: PairAction::Skipped,
                    kept: head.path.clone(),
                    other: member.path.clone(),
                    detail: Some("unreadable".into()),
                });
                true
            }
            MergeOutcome::Failed(err) => {
                report.summary.comparisons += 1;
                match &err {
                    SwapError::BothDirections { .. } => log::warn!("{}", err),
                    // The backup path must reach the operator; content
                    // survives only there.
                    SwapError::BackupStranded { .. } => log::error!("{}", err),
                }
                report.record(PairDecision {
                    action: PairAction::Failed,
                    kept: head.path.clone(),
                    other: member.path.clone(),
                    detail: Some(err.to_string()),
                });
                true
            }
        }
    }
}
