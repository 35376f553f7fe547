// SPDX-License-Identifier: MPL-2.0

//! Scheduling policies.
//!
//! This module defines what the dispatcher expects from a scheduling policy.
//! A policy is consulted once per dispatch decision with a view of the ready
//! queue, and answers with the task that should run next. The dispatcher then
//! takes care of unlinking that task and switching to it.

mod aging;
pub mod info;

pub use self::aging::AgingScheduler;
use self::info::TaskScheduleInfo;
use super::{
    QueueId, TaskId,
    descriptor::TaskTable,
    queue::{QueueIter, QueueTable},
};

/// A task selection policy.
pub trait Scheduler: Sync + Send {
    /// Picks the next task to run from the ready queue.
    ///
    /// The chosen task must stay linked into the ready queue; removing it is
    /// the dispatcher's job. Returns `None` if there is no candidate.
    fn pick_next(&self, rq: &mut ReadyQueue<'_>) -> Option<TaskId>;
}

/// The view of the ready queue handed to a [`Scheduler`].
///
/// It exposes the order of the queue and the scheduling information of the
/// queued tasks, but not the links themselves.
pub struct ReadyQueue<'a> {
    queues: &'a QueueTable,
    tasks: &'a mut TaskTable,
}

impl<'a> ReadyQueue<'a> {
    pub(crate) fn new(queues: &'a QueueTable, tasks: &'a mut TaskTable) -> Self {
        Self { queues, tasks }
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty(QueueId::READY)
    }

    pub fn len(&self) -> usize {
        self.queues.len(QueueId::READY).unwrap_or(0)
    }

    /// Returns the queued tasks, starting at the head of the queue.
    pub fn snapshot(&self) -> Vec<TaskId> {
        self.iter().collect()
    }

    fn iter(&self) -> QueueIter<'_> {
        self.queues.iter(&*self.tasks, QueueId::READY)
    }

    /// Returns the scheduling information of a queued task.
    pub fn sched_info(&self, id: TaskId) -> Option<&TaskScheduleInfo> {
        self.tasks
            .get(id)
            .filter(|task| task.queue == Some(QueueId::READY))
            .map(|task| &task.sched_info)
    }

    /// Returns the scheduling information of a queued task for update.
    pub fn sched_info_mut(&mut self, id: TaskId) -> Option<&mut TaskScheduleInfo> {
        self.tasks
            .get_mut(id)
            .filter(|task| task.queue == Some(QueueId::READY))
            .map(|task| &mut task.sched_info)
    }
}
