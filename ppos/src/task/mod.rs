// SPDX-License-Identifier: MPL-2.0

//! Tasks are the unit of code execution.
//!
//! A task is created with [`Kernel::create`] from a set of [`TaskOptions`]
//! and then moves through the following states:
//!
//! ```text
//! New ──► Ready ──► Running ──► Terminated
//!           ▲          │
//!           │          ├──► Ready      (switch, yield, quantum exhausted)
//!           │          ▼
//!           └──── Suspended            (suspend / resume)
//! ```
//!
//! Exactly one task is `Running` at any instant. Every other live task is
//! either linked into exactly one queue or parked outside of all queues.
//!
//! [`Kernel::create`]: crate::Kernel::create

mod context;
pub(crate) mod descriptor;
mod dispatcher;
mod preempt;
mod priority;
mod processor;
pub(crate) mod queue;
pub mod scheduler;
mod stack;

use core::fmt;

pub use self::{
    descriptor::TaskStats,
    preempt::DisabledPreemptGuard,
    priority::{Priority, PriorityRange},
    queue::QueueId,
};
pub(crate) use self::{context::ExecContext, preempt::PreemptInfo};
use crate::prelude::*;

/// The identity of a task.
///
/// Identifiers are handed out monotonically and never reused. The two
/// non-positive values are reserved for the tasks every kernel starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(i32);

impl TaskId {
    /// The dispatcher, the system task that runs the scheduler.
    pub const DISPATCHER: Self = Self(-1);
    /// The task that called [`crate::init`].
    pub const MAIN: Self = Self(0);
    /// The first identifier given to a created task.
    pub(crate) const FIRST_USER: Self = Self(1);

    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Names the task with the raw identifier `raw`, which need not exist.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The status of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Created but not yet handed to the scheduler.
    New,
    /// Eligible to run.
    Ready,
    /// Holding the CPU.
    Running,
    /// Waiting for an explicit resume.
    Suspended,
    /// Finished; never runs again.
    Terminated,
}

/// Who a task belongs to.
///
/// System tasks are exempt from quantum-based preemption and are never
/// counted as pending work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TaskClass {
    #[default]
    User,
    System,
}

/// Options to create a new task.
pub struct TaskOptions {
    func: Option<Box<dyn FnOnce() + Send>>,
    name: Option<String>,
    class: TaskClass,
    priority: Option<i32>,
}

impl TaskOptions {
    /// Creates a set of options for a task running `func`.
    ///
    /// A body should end by calling [`Kernel::exit`]. If it returns instead,
    /// the task exits with code 0.
    ///
    /// [`Kernel::exit`]: crate::Kernel::exit
    pub fn new<F>(func: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            func: Some(Box::new(func)),
            ..Self::empty()
        }
    }

    /// Creates a set of options for a task running `func(arg)`.
    pub fn with_arg<F, A>(func: F, arg: A) -> Self
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        Self::new(move || func(arg))
    }

    /// Creates a set of options without an entry function.
    ///
    /// Such options are rejected by [`Kernel::create`].
    ///
    /// [`Kernel::create`]: crate::Kernel::create
    pub fn empty() -> Self {
        Self {
            func: None,
            name: None,
            class: TaskClass::User,
            priority: None,
        }
    }

    /// Sets the name of the task, used for its thread and in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the class of the task. Tasks are user tasks by default.
    pub fn class(mut self, class: TaskClass) -> Self {
        self.class = class;
        self
    }

    /// Sets the initial static (and dynamic) priority, clamped to
    /// [`Priority::MOST_URGENT`]..=[`Priority::LEAST_URGENT`].
    pub fn priority(mut self, prio: i32) -> Self {
        self.priority = Some(prio);
        self
    }
}

impl fmt::Debug for TaskOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskOptions")
            .field("has_func", &self.func.is_some())
            .field("name", &self.name)
            .field("class", &self.class)
            .field("priority", &self.priority)
            .finish()
    }
}
