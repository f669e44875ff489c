//! Per-pair decisions and the run summary.
//!
//! The consolidator records one [`PairDecision`] for every pair it
//! resolves; the ordered sequence plus the [`RunSummary`] totals is the
//! program's user-visible output. In dry-run mode it is the program's
//! entire effect.

use std::io::{self, Write};
use std::path::PathBuf;

use bytesize::ByteSize;
use serde::Serialize;

/// What was decided about one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairAction {
    /// The pair was consolidated onto one inode.
    Linked,
    /// Dry-run: the pair would have been consolidated.
    WouldLink,
    /// Contents differ; both names stay.
    Kept,
    /// Nothing to do (already one inode) or nothing safe to do
    /// (unreadable content).
    Skipped,
    /// Identical but could not be consolidated; names unmodified unless
    /// the detail names a backup path.
    Failed,
}

/// One entry in the ordered decision sequence.
#[derive(Debug, Clone, Serialize)]
pub struct PairDecision {
    /// The decision.
    pub action: PairAction,
    /// Name that survives the decision (for `Kept`/`Skipped`/`Failed`,
    /// the head of the pair).
    pub kept: PathBuf,
    /// The other name of the pair.
    pub other: PathBuf,
    /// Human-readable context (skip reason, failure message).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    /// Candidates accepted by the scanner.
    pub candidates: usize,
    /// Equivalence classes built.
    pub classes: usize,
    /// Content comparisons performed.
    pub comparisons: usize,
    /// Pairs linked (or would-be-linked in dry-run).
    pub linked: usize,
    /// Pairs kept distinct.
    pub kept: usize,
    /// Pairs skipped.
    pub skipped: usize,
    /// Pairs that failed to consolidate.
    pub failed: usize,
    /// Bytes whose inodes were released by consolidation.
    pub bytes_reclaimed: u64,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// The ordered decision sequence and its totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Decisions in the order they were made.
    pub decisions: Vec<PairDecision>,
    /// Aggregated totals.
    pub summary: RunSummary,
}

impl RunReport {
    /// Create an empty report.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            decisions: Vec::new(),
            summary: RunSummary {
                dry_run,
                ..RunSummary::default()
            },
        }
    }

    /// Append a decision and update the totals.
    pub fn record(&mut self, decision: PairDecision) {
        match decision.action {
            PairAction::Linked | PairAction::WouldLink => self.summary.linked += 1,
            PairAction::Kept => self.summary.kept += 1,
            PairAction::Skipped => self.summary.skipped += 1,
            PairAction::Failed => self.summary.failed += 1,
        }
        self.decisions.push(decision);
    }

    /// Add reclaimed bytes to the total.
    pub fn add_reclaimed(&mut self, bytes: u64) {
        self.summary.bytes_reclaimed += bytes;
    }

    /// Render the report as text.
    ///
    /// With `verbose`, every decision prints one line before the summary;
    /// otherwise only the summary prints.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn render_text(&self, verbose: bool, out: &mut impl Write) -> io::Result<()> {
        if verbose {
            for decision in &self.decisions {
                self.render_decision(decision, out)?;
            }
        }

        let s = &self.summary;
        writeln!(
            out,
            "{} candidates in {} classes: {} {}, {} kept, {} skipped, {} failed",
            s.candidates,
            s.classes,
            s.linked,
            if s.dry_run { "would link" } else { "linked" },
            s.kept,
            s.skipped,
            s.failed,
        )?;
        writeln!(
            out,
            "{} {}",
            if s.dry_run { "would reclaim" } else { "reclaimed" },
            ByteSize(s.bytes_reclaimed),
        )
    }

    fn render_decision(&self, decision: &PairDecision, out: &mut impl Write) -> io::Result<()> {
        let kept = decision.kept.display();
        let other = decision.other.display();
        match decision.action {
            PairAction::Linked => writeln!(out, "linked {} -> {}", other, kept),
            PairAction::WouldLink => writeln!(out, "would link {} -> {}", other, kept),
            PairAction::Kept => writeln!(out, "kept {} (differs from {})", other, kept),
            PairAction::Skipped => match &decision.detail {
                Some(detail) => writeln!(out, "skipped {} ({})", other, detail),
                None => writeln!(out, "skipped {}", other),
            },
            PairAction::Failed => match &decision.detail {
                Some(detail) => writeln!(out, "failed {} <-> {}: {}", kept, other, detail),
                None => writeln!(out, "failed {} <-> {}", kept, other),
            },
        }
    }

    /// Render the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error; with these types that only happens
    /// if the writer fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
