//! linkdupe - Duplicate File Consolidation via Hard Links
//!
//! Finds files with byte-identical content among a set of files and
//! directories and replaces redundant copies with hard links to one
//! retained inode. Candidates are grouped by cheap metadata, compared
//! byte for byte within each group, and consolidated through a
//! backup-staged link swap that can never lose content.

pub mod classify;
pub mod cli;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod logging;
pub mod report;
pub mod scanner;

use std::io;
use std::path::PathBuf;

use anyhow::Context;

use classify::{Classifier, EquivalenceKey};
use cli::{Cli, OutputFormat};
use consolidate::Consolidator;
use error::ExitCode;
use report::RunReport;
use scanner::Walker;

/// Run one consolidation pass: collect, classify, consolidate, report.
///
/// The run is strictly sequential: every rename and link is observed
/// before the next action. Non-fatal problems are logged and counted;
/// only setup failures (an unreadable or malformed candidate list) abort,
/// and those happen before any mutation.
///
/// # Errors
///
/// Returns an error for fatal setup failures; the caller maps it to
/// [`ExitCode::GeneralError`].
pub fn run_app(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = cli.to_config();

    let mut walker = Walker::new(config.clone());
    let candidates = match &cli.files_from {
        Some(list) => walker
            .collect_from_list(list)
            .context("reading candidate list")?,
        None => {
            let paths = if cli.paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                cli.paths.clone()
            };
            walker.collect(&paths)
        }
    };
    log::debug!(
        "{} candidates collected, {} paths skipped",
        candidates.len(),
        walker.stats().skipped()
    );

    let mut classifier = Classifier::new();
    for candidate in candidates {
        let key = EquivalenceKey::from_metadata(&candidate.meta, &config);
        classifier.insert(candidate.file, key);
    }
    log::debug!(
        "{} candidates in {} classes",
        classifier.candidate_count(),
        classifier.class_count()
    );

    let mut report = RunReport::new(config.dry_run);
    report.summary.candidates = classifier.candidate_count();
    report.summary.classes = classifier.class_count();

    let consolidator = Consolidator::new(config.clone());
    for class in classifier.into_classes() {
        consolidator.consolidate(class, &mut report);
    }

    match cli.output {
        OutputFormat::Text => {
            if !cli.quiet {
                report
                    .render_text(config.verbose, &mut io::stdout().lock())
                    .context("writing report")?;
            }
        }
        OutputFormat::Json => {
            let json = report.to_json().context("serializing report")?;
            println!("{json}");
        }
    }

    Ok(if report.summary.failed > 0 {
        ExitCode::PartialFailure
    } else {
        ExitCode::Success
    })
}
