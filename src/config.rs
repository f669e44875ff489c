//! Run configuration.
//!
//! One immutable [`Config`] value is built from the CLI at startup and
//! passed through every component call; no component reads ambient state.

/// Options governing a consolidation run.
///
/// # Example
///
/// ```
/// use linkdupe::config::Config;
///
/// let config = Config::default()
///     .with_recursive(true)
///     .with_ignore_owner(true);
/// assert!(config.recursive);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Print each per-pair decision, not just the summary.
    pub verbose: bool,
    /// Report intended actions without touching the filesystem.
    pub dry_run: bool,
    /// Descend into subdirectories of directory arguments.
    pub recursive: bool,
    /// Stat through symbolic links; a link to a regular file qualifies as
    /// a candidate, a link to a directory is walked.
    pub follow_symlinks: bool,
    /// Leave file ownership out of the equivalence key.
    pub ignore_owner: bool,
    /// Leave group ownership out of the equivalence key.
    pub ignore_group: bool,
    /// Leave permission bits out of the equivalence key.
    pub ignore_mode: bool,
    /// Exclude zero-length files from candidacy.
    pub ignore_empty: bool,
    /// Raise scheduling priority around each rename/link sequence to
    /// shrink the window where another process could observe a missing
    /// name. Best-effort; released after every swap.
    pub boost_priority: bool,
}

impl Config {
    /// Enable or disable verbose per-pair output.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable or disable recursion into subdirectories.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Enable or disable following symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Ignore file ownership when classing candidates.
    #[must_use]
    pub fn with_ignore_owner(mut self, ignore: bool) -> Self {
        self.ignore_owner = ignore;
        self
    }

    /// Ignore group ownership when classing candidates.
    #[must_use]
    pub fn with_ignore_group(mut self, ignore: bool) -> Self {
        self.ignore_group = ignore;
        self
    }

    /// Ignore permission bits when classing candidates.
    #[must_use]
    pub fn with_ignore_mode(mut self, ignore: bool) -> Self {
        self.ignore_mode = ignore;
        self
    }

    /// Exclude zero-length files from candidacy.
    #[must_use]
    pub fn with_ignore_empty(mut self, ignore: bool) -> Self {
        self.ignore_empty = ignore;
        self
    }

    /// Request the scoped priority boost around link swaps.
    #[must_use]
    pub fn with_boost_priority(mut self, boost: bool) -> Self {
        self.boost_priority = boost;
        self
    }
}
