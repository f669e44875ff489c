//! Command-line interface definitions.
//!
//! All CLI arguments and options are defined here using the clap derive
//! API. The flags map one-to-one onto [`crate::config::Config`]; parsing
//! happens once in `main` and the rest of the program sees only the
//! immutable configuration value.
//!
//! # Example
//!
//! ```bash
//! # Consolidate duplicates under the current directory
//! linkdupe
//!
//! # Recurse through a mirror tree, reporting what would change
//! linkdupe --dry-run --recursive /srv/mirror
//!
//! # Candidates from a list, ownership differences ignored
//! linkdupe --files-from candidates.list --ignore-owner
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;

/// Reclaims disk space by replacing byte-identical files with hard links.
///
/// Files are grouped by size, device, and (unless ignored) ownership and
/// permissions, compared byte for byte within each group, and redundant
/// copies are replaced by hard links to one retained inode. Every swap is
/// staged through a same-directory backup, so no failure can lose content.
#[derive(Debug, Parser)]
#[command(name = "linkdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files and directories to consolidate (default: current directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Increase verbosity (-v prints each decision, -vv adds trace logs)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report intended actions without touching the filesystem
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Recurse into subdirectories of directory arguments
    #[arg(short, long)]
    pub recursive: bool,

    /// Follow symbolic links
    ///
    /// A link to a regular file becomes a candidate; a link to a
    /// directory is walked.
    #[arg(short = 's', long)]
    pub follow_symlinks: bool,

    /// Ignore file ownership when grouping candidates
    #[arg(long)]
    pub ignore_owner: bool,

    /// Ignore group ownership when grouping candidates
    #[arg(long)]
    pub ignore_group: bool,

    /// Ignore permission bits when grouping candidates
    #[arg(long)]
    pub ignore_mode: bool,

    /// Exclude zero-length files
    ///
    /// Empty files are all identical; linking them rarely saves space and
    /// often surprises.
    #[arg(long)]
    pub ignore_empty: bool,

    /// Read candidate paths from a file, one per line (`-` for stdin)
    #[arg(long, value_name = "LIST", conflicts_with = "paths")]
    pub files_from: Option<PathBuf>,

    /// Output format for the decision report
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Raise scheduling priority around each rename/link sequence
    ///
    /// Shrinks the window in which another process could observe a name
    /// missing. Usually requires privilege; best-effort.
    #[arg(long)]
    pub boost_priority: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Build the run configuration from the parsed flags.
    ///
    /// Dry-run implies verbose: the decision sequence is the run's entire
    /// effect, so it is always shown.
    #[must_use]
    pub fn to_config(&self) -> Config {
        Config {
            verbose: self.verbose > 0 || self.dry_run,
            dry_run: self.dry_run,
            recursive: self.recursive,
            follow_symlinks: self.follow_symlinks,
            ignore_owner: self.ignore_owner,
            ignore_group: self.ignore_group,
            ignore_mode: self.ignore_mode,
            ignore_empty: self.ignore_empty,
            boost_priority: self.boost_priority,
        }
    }
}

/// Output format for the decision report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines and a summary
    Text,
    /// JSON for scripting
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["linkdupe"]);
        assert!(cli.paths.is_empty());
        assert!(!cli.dry_run);
        assert!(!cli.recursive);
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_short_flags() {
        let cli = parse(&["linkdupe", "-n", "-r", "-s", "a", "b"]);
        assert!(cli.dry_run);
        assert!(cli.recursive);
        assert!(cli.follow_symlinks);
        assert_eq!(cli.paths.len(), 2);
    }

    #[test]
    fn test_ignore_flags_map_to_config() {
        let cli = parse(&[
            "linkdupe",
            "--ignore-owner",
            "--ignore-group",
            "--ignore-mode",
            "--ignore-empty",
        ]);
        let config = cli.to_config();
        assert!(config.ignore_owner);
        assert!(config.ignore_group);
        assert!(config.ignore_mode);
        assert!(config.ignore_empty);
    }

    #[test]
    fn test_dry_run_implies_verbose() {
        let config = parse(&["linkdupe", "-n"]).to_config();
        assert!(config.verbose);
        assert!(config.dry_run);
    }

    #[test]
    fn test_files_from_conflicts_with_paths() {
        assert!(Cli::try_parse_from(["linkdupe", "--files-from", "list", "extra"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["linkdupe", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_json_output() {
        let cli = parse(&["linkdupe", "--output", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);
    }
}
