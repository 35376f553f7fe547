// SPDX-License-Identifier: MPL-2.0

use log::trace;

use super::{ReadyQueue, Scheduler};
use crate::{config::DEFAULT_AGING_STEP, task::TaskId};

/// A priority scheduler with aging.
///
/// The most urgent task by dynamic priority wins, and among equally urgent
/// tasks the one closest to the head of the ready queue wins. Every task that
/// loses a round becomes more urgent by the aging step, so a task with a poor
/// static priority is passed over at most
/// `(LEAST_URGENT - MOST_URGENT) / step` times before it reaches the most
/// urgent value and wins. The winner falls back to its static priority.
#[derive(Debug, Clone, Copy)]
pub struct AgingScheduler {
    step: i8,
}

impl AgingScheduler {
    /// Creates a scheduler aging by the magnitude of `step`, at least one.
    pub const fn new(step: i8) -> Self {
        let step = step.saturating_abs();
        Self {
            step: if step == 0 { 1 } else { step },
        }
    }

    pub const fn step(&self) -> i8 {
        self.step
    }
}

impl Default for AgingScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_AGING_STEP)
    }
}

impl Scheduler for AgingScheduler {
    fn pick_next(&self, rq: &mut ReadyQueue<'_>) -> Option<TaskId> {
        let candidates = rq.snapshot();

        let mut winner: Option<(TaskId, _)> = None;
        for &id in &candidates {
            let Some(prio) = rq.sched_info(id).map(|info| info.dynamic_priority()) else {
                continue;
            };
            // Strictly more urgent only, so ties keep the earlier task.
            if winner.is_none_or(|(_, best)| prio < best) {
                winner = Some((id, prio));
            }
        }
        let (winner, _) = winner?;

        for &id in candidates.iter().filter(|&&id| id != winner) {
            if let Some(info) = rq.sched_info_mut(id) {
                info.age(self.step);
            }
        }
        if let Some(info) = rq.sched_info_mut(winner) {
            info.reset();
        }

        trace!("aging scheduler picked task {} out of {}", winner, candidates.len());
        Some(winner)
    }
}
