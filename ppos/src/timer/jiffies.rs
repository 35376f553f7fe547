// SPDX-License-Identifier: MPL-2.0

use core::time::Duration;

use super::TIMER_FREQ;

/// Jiffies is the unit of the virtual clock of a kernel.
///
/// A jiffy represents one delivered firing of the preemption clock, whose
/// nominal frequency is [`TIMER_FREQ`] Hz.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Jiffies(u64);

impl Jiffies {
    /// Creates a new instance.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Gets the number of jiffies.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the jiffies elapsed from `earlier` to `self`, or zero if
    /// `earlier` is later.
    pub const fn since(self, earlier: Jiffies) -> Jiffies {
        Self(self.0.saturating_sub(earlier.0))
    }

    /// Gets the [`Duration`] calculated from the jiffies counts.
    pub fn as_duration(self) -> Duration {
        let secs = self.0 / TIMER_FREQ;
        let nanos = ((self.0 % TIMER_FREQ) * 1_000_000_000) / TIMER_FREQ;
        Duration::new(secs, nanos as u32)
    }
}

impl From<Jiffies> for Duration {
    fn from(value: Jiffies) -> Self {
        value.as_duration()
    }
}
