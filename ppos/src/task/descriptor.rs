// SPDX-License-Identifier: MPL-2.0

//! Task descriptors and the table that owns them.

use super::{
    ExecContext, Priority, QueueId, TaskClass, TaskId, TaskStatus, scheduler::info::TaskScheduleInfo,
    stack::TaskStack,
};
use crate::{prelude::*, timer::Jiffies};

/// The links of a task inside the queue it occupies.
///
/// Both ends point back to the task itself while it is not queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) prev: TaskId,
    pub(crate) next: TaskId,
}

impl Link {
    pub(crate) fn detached(id: TaskId) -> Self {
        Self { prev: id, next: id }
    }
}

/// Per-task accounting, reported when the task exits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Accounting {
    pub(crate) created_at: Jiffies,
    pub(crate) cpu_ticks: u64,
    pub(crate) activations: u64,
}

/// Everything the kernel knows about one task.
#[derive(Debug)]
pub(crate) struct TaskDesc {
    pub(crate) id: TaskId,
    pub(crate) name: Option<String>,
    pub(crate) class: TaskClass,
    pub(crate) status: TaskStatus,
    pub(crate) sched_info: TaskScheduleInfo,
    /// The queue this task is linked into.
    pub(crate) queue: Option<QueueId>,
    pub(crate) link: Link,
    /// The task that was running when this one was created.
    pub(crate) parent: Option<TaskId>,
    pub(crate) acct: Accounting,
    pub(crate) exit_code: Option<i32>,
    pub(crate) ctx: Arc<ExecContext>,
    /// `None` for the main task, which runs on the thread that created the kernel.
    pub(crate) stack: Option<TaskStack>,
}

impl TaskDesc {
    pub(crate) fn new(id: TaskId, class: TaskClass, ctx: Arc<ExecContext>, now: Jiffies) -> Self {
        Self {
            id,
            name: None,
            class,
            status: TaskStatus::New,
            sched_info: TaskScheduleInfo::default(),
            queue: None,
            link: Link::detached(id),
            parent: None,
            acct: Accounting {
                created_at: now,
                cpu_ticks: 0,
                activations: 0,
            },
            exit_code: None,
            ctx,
            stack: None,
        }
    }

    pub(crate) fn is_user(&self) -> bool {
        self.class == TaskClass::User
    }

    pub(crate) fn stats(&self) -> TaskStats {
        TaskStats {
            id: self.id,
            name: self.name.clone(),
            class: self.class,
            status: self.status,
            static_priority: self.sched_info.static_priority(),
            dynamic_priority: self.sched_info.dynamic_priority(),
            queue: self.queue,
            parent: self.parent,
            created_at: self.acct.created_at,
            cpu_ticks: self.acct.cpu_ticks,
            activations: self.acct.activations,
            exit_code: self.exit_code,
            stack_size: self.stack.as_ref().map(TaskStack::size),
        }
    }
}

/// A snapshot of a task's descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskStats {
    pub id: TaskId,
    pub name: Option<String>,
    pub class: TaskClass,
    pub status: TaskStatus,
    pub static_priority: Priority,
    pub dynamic_priority: Priority,
    /// The queue the task is linked into, if any.
    pub queue: Option<QueueId>,
    pub parent: Option<TaskId>,
    /// The clock reading when the task was created.
    pub created_at: Jiffies,
    /// Clock ticks that fired while the task was running.
    pub cpu_ticks: u64,
    /// How many times the task was switched in.
    pub activations: u64,
    pub exit_code: Option<i32>,
    /// The size of the task's dedicated stack, if it has one.
    pub stack_size: Option<usize>,
}

/// The owner of all task descriptors of a kernel, indexed by [`TaskId`].
///
/// Descriptors are never removed, so a [`TaskId`] stays valid for the
/// lifetime of the kernel.
#[derive(Debug, Default)]
pub(crate) struct TaskTable {
    slots: Vec<Option<TaskDesc>>,
}

impl TaskTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn index_of(id: TaskId) -> Option<usize> {
        let offset = i64::from(id.as_i32()) - i64::from(TaskId::DISPATCHER.as_i32());
        usize::try_from(offset).ok()
    }

    pub(crate) fn insert(&mut self, desc: TaskDesc) {
        let Some(index) = Self::index_of(desc.id) else {
            return;
        };
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        debug_assert!(self.slots[index].is_none());
        self.slots[index] = Some(desc);
    }

    pub(crate) fn get(&self, id: TaskId) -> Option<&TaskDesc> {
        self.slots.get(Self::index_of(id)?)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut TaskDesc> {
        self.slots.get_mut(Self::index_of(id)?)?.as_mut()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TaskDesc> {
        self.slots.iter().flatten()
    }
}
