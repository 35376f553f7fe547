// SPDX-License-Identifier: MPL-2.0

//! Tunables of the scheduler.

use core::time::Duration;

use crate::timer::TIMER_FREQ;

/// The stack size of a task, in bytes.
///
/// Users can choose a different default by specifying the
/// `PPOS_TASK_STACK_SIZE` environment variable at build time.
pub static TASK_STACK_SIZE: usize = parse_usize_or_default(
    option_env!("PPOS_TASK_STACK_SIZE"),
    DEFAULT_TASK_STACK_SIZE,
);

/// The default stack size of a task, in bytes.
pub const DEFAULT_TASK_STACK_SIZE: usize = 32 * 1024;

/// The default number of ticks a user task may run before being preempted.
pub const DEFAULT_QUANTUM: u32 = 20;

/// The default amount by which a passed-over task gains urgency per dispatch round.
pub const DEFAULT_AGING_STEP: i8 = 1;

/// Scheduler configuration, fixed for the lifetime of a [`Kernel`].
///
/// [`Kernel`]: crate::Kernel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedConfig {
    quantum: u32,
    tick_interval: Duration,
    stack_size: usize,
    aging_step: i8,
}

impl SchedConfig {
    /// Sets the quantum of user tasks, in ticks.
    ///
    /// A zero quantum is raised to one tick.
    pub fn quantum(mut self, ticks: u32) -> Self {
        self.quantum = ticks.max(1);
        self
    }

    /// Sets the period of the ticker started by [`Kernel::start_ticker`].
    ///
    /// [`Kernel::start_ticker`]: crate::Kernel::start_ticker
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Sets the stack size of the tasks created from now on, in bytes.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// Sets the aging step. Only its magnitude matters: aging always moves
    /// toward the most urgent priority.
    ///
    /// A zero step is raised to one, so passed-over tasks always gain urgency.
    pub fn aging_step(mut self, step: i8) -> Self {
        self.aging_step = step.saturating_abs().max(1);
        self
    }

    pub fn get_quantum(&self) -> u32 {
        self.quantum
    }

    pub fn get_tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn get_stack_size(&self) -> usize {
        self.stack_size
    }

    pub fn get_aging_step(&self) -> i8 {
        self.aging_step
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            tick_interval: Duration::from_nanos(1_000_000_000 / TIMER_FREQ),
            stack_size: TASK_STACK_SIZE,
            aging_step: DEFAULT_AGING_STEP,
        }
    }
}

const fn parse_usize_or_default(size: Option<&str>, default: usize) -> usize {
    match size {
        Some(value) => parse_usize(value),
        None => default,
    }
}

const fn parse_usize(input: &str) -> usize {
    let mut output: usize = 0;
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let digit = (bytes[i] - b'0') as usize;
        output = output * 10 + digit;
        i += 1;
    }
    output
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = SchedConfig::default();
        assert_eq!(config.get_quantum(), 20);
        assert_eq!(config.get_tick_interval(), Duration::from_millis(1));
        assert_eq!(config.get_aging_step(), 1);
    }

    #[test]
    fn zero_quantum_is_raised() {
        assert_eq!(SchedConfig::default().quantum(0).get_quantum(), 1);
    }

    #[test]
    fn zero_aging_step_is_raised() {
        assert_eq!(SchedConfig::default().aging_step(0).get_aging_step(), 1);
    }

    #[test]
    fn aging_step_keeps_magnitude() {
        assert_eq!(SchedConfig::default().aging_step(-3).get_aging_step(), 3);
        assert_eq!(SchedConfig::default().aging_step(i8::MIN).get_aging_step(), i8::MAX);
    }

    #[test]
    fn parse_stack_size() {
        assert_eq!(parse_usize("32768"), 32768);
        assert_eq!(parse_usize_or_default(None, 7), 7);
        assert_eq!(parse_usize_or_default(Some("65536"), 7), 65536);
    }
}
