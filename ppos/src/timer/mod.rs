// SPDX-License-Identifier: MPL-2.0

//! The preemption clock.
//!
//! Each kernel owns a virtual clock counted in [`Jiffies`]. Every firing
//! advances the clock, charges one tick to the running task and uses up one
//! tick of a running user task's quantum. Firings come either from
//! [`Kernel::timer_interrupt`], which runs on the flow of the running task,
//! or from a [`Ticker`] thread. The ticker cannot move the CPU itself, so a
//! quantum it exhausts is only marked; the running task gives up the CPU at
//! its next [`Kernel::might_preempt`].

mod jiffies;

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

pub use jiffies::Jiffies;
use log::{debug, trace, warn};

use crate::prelude::*;

/// The timer frequency in Hz.
///
/// Here we choose 1000Hz since 1000Hz is easier for unit conversion: one
/// jiffy is one millisecond of virtual time.
pub const TIMER_FREQ: u64 = 1000;

/// The virtual clock of a kernel.
#[derive(Debug, Default)]
pub(crate) struct Clock {
    elapsed: AtomicU64,
}

impl Clock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn elapsed(&self) -> Jiffies {
        Jiffies::new(self.elapsed.load(Ordering::Relaxed))
    }

    fn tick(&self) {
        self.elapsed.fetch_add(1, Ordering::Relaxed);
    }
}

impl Kernel {
    /// Delivers one firing of the preemption clock.
    ///
    /// The clock advances and the running task is charged one tick of
    /// processor time. A running user task also uses up one tick of its
    /// quantum; when none is left it is preempted, exactly as if it had
    /// yielded, unless preemption is disabled, in which case the preemption
    /// happens once the last [`DisabledPreemptGuard`] is dropped and
    /// [`Kernel::might_preempt`] is called.
    ///
    /// System tasks are charged for the tick but never preempted.
    ///
    /// [`DisabledPreemptGuard`]: crate::task::DisabledPreemptGuard
    pub fn timer_interrupt(&self) {
        if self.account_tick() {
            self.preempt_if_needed();
        }
    }

    /// Performs the bookkeeping of one firing on behalf of the running task.
    ///
    /// Returns whether the firing exhausted the quantum, in which case a
    /// preemption is now pending. The pending flag is set under the state
    /// lock, so a switch in progress cannot hand it to the next task.
    fn account_tick(&self) -> bool {
        let mut state = self.lock_state();
        self.clock().tick();

        let Some(task) = state.current_desc_mut() else {
            return false;
        };
        task.acct.cpu_ticks += 1;
        if !task.is_user() {
            return false;
        }
        state.quantum_left = state.quantum_left.saturating_sub(1);
        let exhausted = state.quantum_left == 0;
        if exhausted {
            self.preempt_info().set_need_preempt();
        }
        exhausted
    }

    /// Performs a pending preemption, if any and if preemption is enabled.
    ///
    /// Long-running task bodies call this at safe points.
    pub fn might_preempt(&self) {
        self.preempt_if_needed();
    }

    fn preempt_if_needed(&self) {
        if !self.preempt_info().should_preempt() {
            return;
        }
        trace!("task {} preempted", self.id());
        if let Err(err) = self.yield_now() {
            warn!("cannot preempt task {}: {}", self.id(), err);
        }
    }

    /// Starts a thread delivering a firing every
    /// [`SchedConfig::get_tick_interval`].
    ///
    /// The returned [`Ticker`] stops the clock when dropped.
    ///
    /// [`SchedConfig::get_tick_interval`]: crate::SchedConfig::get_tick_interval
    pub fn start_ticker(&self) -> Result<Ticker> {
        let kernel = self.weak();
        let interval = self.config().get_tick_interval();
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let stop = stop.clone();
            thread::Builder::new()
                .name("ppos-ticker".into())
                .spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        thread::sleep(interval);
                        let Some(kernel) = kernel.upgrade() else {
                            break;
                        };
                        kernel.account_tick();
                    }
                })
                .map_err(|_| Error::NoMemory)?
        };

        debug!("ticker started with an interval of {:?}", interval);
        Ok(Ticker {
            stop,
            handle: Some(handle),
        })
    }
}

/// A running source of clock firings.
#[derive(Debug)]
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Stops the ticker and waits for its thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
