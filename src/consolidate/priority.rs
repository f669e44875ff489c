//! Scoped scheduling-priority boost.
//!
//! A raised priority shrinks (but cannot eliminate) the window in which
//! another process could observe a name missing between the backup rename
//! and the link. The boost is strictly scoped: [`PriorityBoost::acquire`]
//! returns a guard that restores the previous priority when dropped, on
//! every exit path.
//!
//! Lowering the nice value usually needs privilege; failure to acquire is
//! expected and silent at debug level. Everything here is best-effort.

/// How far to lower the nice value while a swap is in flight.
const BOOST_STEP: libc::c_int = 4;

/// RAII guard holding an elevated scheduling priority.
#[derive(Debug)]
pub struct PriorityBoost {
    previous: libc::c_int,
    active: bool,
}

impl PriorityBoost {
    /// Try to raise this process's scheduling priority.
    ///
    /// Returns an inactive guard when the priority cannot be changed;
    /// the swap proceeds either way.
    #[must_use]
    pub fn acquire() -> Self {
        // getpriority can legitimately return -1; since the boost is
        // best-effort, a conflated error simply yields an inactive guard
        // when the follow-up setpriority is refused.
        let previous = unsafe { libc::getpriority(libc::PRIO_PROCESS as _, 0) };
        let boosted = previous.saturating_sub(BOOST_STEP);
        let active = unsafe { libc::setpriority(libc::PRIO_PROCESS as _, 0, boosted) } == 0;

        if active {
            log::trace!("scheduling priority raised from {} to {}", previous, boosted);
        } else {
            log::debug!(
                "cannot raise scheduling priority: {}",
                std::io::Error::last_os_error()
            );
        }

        Self { previous, active }
    }

    /// Whether the priority change actually took effect.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for PriorityBoost {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if unsafe { libc::setpriority(libc::PRIO_PROCESS as _, 0, self.previous) } != 0 {
            log::warn!(
                "cannot restore scheduling priority to {}: {}",
                self.previous,
                std::io::Error::last_os_error()
            );
        }
    }
}
