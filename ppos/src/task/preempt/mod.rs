// SPDX-License-Identifier: MPL-2.0

//! Preemption control.
//!
//! A clock firing that exhausts the quantum of the running task normally
//! switches to the dispatcher right away. While preemption is disabled the
//! firing is still accounted, but the switch is only recorded as pending
//! and carried out at the next preemption point after the last guard drops.

mod guard;

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub use self::guard::DisabledPreemptGuard;
use crate::Kernel;

#[derive(Debug, Default)]
pub(crate) struct PreemptInfo {
    /// The number of live [`DisabledPreemptGuard`]s.
    guard_count: AtomicU32,
    need_preempt: AtomicBool,
}

impl PreemptInfo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn inc_guard_count(&self) {
        self.guard_count.fetch_add(1, Ordering::Relaxed);
    }

    fn dec_guard_count(&self) {
        self.guard_count.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn guard_count(&self) -> u32 {
        self.guard_count.load(Ordering::Relaxed)
    }

    /// Forgets the guards of a task that exits while holding them.
    pub(crate) fn clear_guard_count(&self) -> u32 {
        self.guard_count.swap(0, Ordering::Relaxed)
    }

    pub(crate) fn is_preemptive(&self) -> bool {
        self.guard_count() == 0
    }

    pub(crate) fn set_need_preempt(&self) {
        self.need_preempt.store(true, Ordering::Relaxed);
    }

    pub(crate) fn clear_need_preempt(&self) {
        self.need_preempt.store(false, Ordering::Relaxed);
    }

    pub(crate) fn need_preempt(&self) -> bool {
        self.need_preempt.load(Ordering::Relaxed)
    }

    /// Returns whether a pending preemption may be carried out now.
    pub(crate) fn should_preempt(&self) -> bool {
        self.need_preempt() && self.is_preemptive()
    }
}

impl Kernel {
    /// Disables preemption until the returned guard is dropped.
    ///
    /// Voluntary switches remain possible, but switching away while holding
    /// a guard is a bug and panics.
    pub fn disable_preempt(&self) -> DisabledPreemptGuard<'_> {
        DisabledPreemptGuard::new(self.preempt_info())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn guards_defer_preemption() {
        let info = PreemptInfo::new();
        info.set_need_preempt();
        assert!(info.should_preempt());

        let outer = DisabledPreemptGuard::new(&info);
        let inner = DisabledPreemptGuard::new(&info);
        assert_eq!(info.guard_count(), 2);
        assert!(!info.should_preempt());

        drop(inner);
        assert!(!info.should_preempt());
        drop(outer);
        assert!(info.should_preempt());

        info.clear_need_preempt();
        assert!(!info.should_preempt());
    }

    #[test]
    fn leaked_guards_are_cleared() {
        let info = PreemptInfo::new();
        core::mem::forget(DisabledPreemptGuard::new(&info));
        assert_eq!(info.clear_guard_count(), 1);
        assert!(info.is_preemptive());
    }
}
