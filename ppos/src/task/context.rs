// SPDX-License-Identifier: MPL-2.0

//! Execution contexts and the transfer of control between them.
//!
//! Every task executes on a host thread of its own. The saved machine state
//! of a task is that thread, blocked at the point where it last gave up the
//! CPU. A context holds a baton: handing the baton to a context lets its
//! thread continue, and a thread that gives its baton away blocks until it
//! gets it back. Only the running task ever holds a baton.

use std::sync::{Condvar, Mutex, PoisonError};

#[derive(Debug, Default)]
pub(crate) struct ExecContext {
    baton: Mutex<bool>,
    cv: Condvar,
}

impl ExecContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Hands the baton to this context, letting its thread continue.
    fn resume(&self) {
        let mut baton = self.baton.lock().unwrap_or_else(PoisonError::into_inner);
        *baton = true;
        self.cv.notify_one();
    }

    /// Blocks the calling thread until this context is given the baton.
    ///
    /// A baton handed over before the thread got here is not lost.
    pub(super) fn park(&self) {
        let mut baton = self.baton.lock().unwrap_or_else(PoisonError::into_inner);
        while !*baton {
            baton = self.cv.wait(baton).unwrap_or_else(PoisonError::into_inner);
        }
        *baton = false;
    }
}

/// Saves the current context into `prev` and resumes `next`.
///
/// Returns once some task switches back to `prev`.
pub(super) fn context_switch(prev: &ExecContext, next: &ExecContext) {
    next.resume();
    prev.park();
}

/// Resumes `next` and abandons the current context for good.
///
/// The calling thread stays blocked for the rest of the process, together
/// with its stack.
pub(super) fn context_exit(next: &ExecContext) -> ! {
    next.resume();
    loop {
        std::thread::park();
    }
}
