// SPDX-License-Identifier: MPL-2.0

use core::marker::PhantomData;

use super::PreemptInfo;

/// A guard for disabled preemption.
#[clippy::has_significant_drop]
#[must_use]
#[derive(Debug)]
pub struct DisabledPreemptGuard<'a> {
    info: &'a PreemptInfo,
    // Makes the guard `!Send`: it belongs to the task that created it.
    _not_send: PhantomData<*const ()>,
}

impl<'a> DisabledPreemptGuard<'a> {
    pub(super) fn new(info: &'a PreemptInfo) -> Self {
        info.inc_guard_count();
        Self {
            info,
            _not_send: PhantomData,
        }
    }
}

impl Drop for DisabledPreemptGuard<'_> {
    fn drop(&mut self) {
        self.info.dec_guard_count();
    }
}
