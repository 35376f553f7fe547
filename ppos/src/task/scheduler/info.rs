// SPDX-License-Identifier: MPL-2.0

//! Scheduling related information in a task.

use crate::task::Priority;

/// The priorities a scheduler works with.
///
/// The static priority is the baseline chosen at creation or through
/// [`Kernel::set_priority`]. The dynamic priority is what selection actually
/// compares; a scheduler is free to move it around, e.g., by aging.
///
/// [`Kernel::set_priority`]: crate::Kernel::set_priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskScheduleInfo {
    static_prio: Priority,
    dynamic_prio: Priority,
}

impl TaskScheduleInfo {
    pub fn new(prio: Priority) -> Self {
        Self {
            static_prio: prio,
            dynamic_prio: prio,
        }
    }

    pub fn static_priority(&self) -> Priority {
        self.static_prio
    }

    pub fn dynamic_priority(&self) -> Priority {
        self.dynamic_prio
    }

    /// Sets both priorities, re-baselining the dynamic one.
    pub fn set_priority(&mut self, prio: Priority) {
        self.static_prio = prio;
        self.dynamic_prio = prio;
    }

    /// Makes the dynamic priority more urgent by `step`.
    pub fn age(&mut self, step: i8) {
        self.dynamic_prio = self.dynamic_prio.aged(step);
    }

    /// Drops all urgency accumulated by aging.
    pub fn reset(&mut self) {
        self.dynamic_prio = self.static_prio;
    }
}
