// SPDX-License-Identifier: MPL-2.0

//! The scheduler context object.

use alloc::sync::Weak;

use log::{debug, info};
use spin::{Mutex as SpinLock, MutexGuard as SpinLockGuard};

use crate::{
    config::SchedConfig,
    prelude::*,
    task::{
        ExecContext, PreemptInfo, QueueId, TaskClass, TaskId, TaskOptions, TaskStats, TaskStatus,
        descriptor::{TaskDesc, TaskTable},
        queue::QueueTable,
        scheduler::{AgingScheduler, Scheduler},
    },
    timer::{Clock, Jiffies},
};

/// The mutable state shared by all tasks of a kernel.
pub(crate) struct SchedState {
    pub(crate) tasks: TaskTable,
    pub(crate) queues: QueueTable,
    /// The task holding the CPU.
    pub(crate) current: TaskId,
    /// Ticks left before the running user task is preempted.
    pub(crate) quantum_left: u32,
    /// User tasks created and not yet terminated.
    pub(crate) user_tasks: usize,
    next_id: i32,
}

impl SchedState {
    pub(crate) fn current_desc(&self) -> Option<&TaskDesc> {
        self.tasks.get(self.current)
    }

    pub(crate) fn current_desc_mut(&mut self) -> Option<&mut TaskDesc> {
        self.tasks.get_mut(self.current)
    }
}

/// A kernel: one scheduler with its tasks, queues and clock.
///
/// Kernels are independent of each other. The thread that creates a kernel
/// becomes its main task; every created task runs on a thread of its own,
/// and exactly one of them runs at a time.
pub struct Kernel {
    state: SpinLock<SchedState>,
    scheduler: Box<dyn Scheduler>,
    config: SchedConfig,
    clock: Clock,
    preempt: PreemptInfo,
    this: Weak<Kernel>,
}

impl Kernel {
    /// Creates a kernel scheduling with an [`AgingScheduler`].
    ///
    /// The calling thread becomes the running main task. The dispatcher is
    /// created but does not run until some task switches to it.
    pub fn new(config: SchedConfig) -> Result<Arc<Self>> {
        let scheduler = Box::new(AgingScheduler::new(config.get_aging_step()));
        Self::with_scheduler(config, scheduler)
    }

    /// Creates a kernel with a custom scheduling policy.
    pub fn with_scheduler(config: SchedConfig, scheduler: Box<dyn Scheduler>) -> Result<Arc<Self>> {
        crate::logger::init();

        let clock = Clock::new();
        let mut main = TaskDesc::new(
            TaskId::MAIN,
            TaskClass::System,
            Arc::new(ExecContext::new()),
            clock.elapsed(),
        );
        main.name = Some("main".into());
        main.status = TaskStatus::Running;
        main.acct.activations = 1;

        let mut tasks = TaskTable::new();
        tasks.insert(main);

        let state = SchedState {
            tasks,
            queues: QueueTable::new(),
            current: TaskId::MAIN,
            quantum_left: config.get_quantum(),
            user_tasks: 0,
            next_id: TaskId::FIRST_USER.as_i32(),
        };

        let kernel = Arc::new_cyclic(|this| Self {
            state: SpinLock::new(state),
            scheduler,
            config,
            clock,
            preempt: PreemptInfo::new(),
            this: this.clone(),
        });
        kernel.spawn_dispatcher()?;

        info!("kernel initialized: {:?}", kernel.config);
        Ok(kernel)
    }

    fn spawn_dispatcher(self: &Arc<Self>) -> Result<()> {
        let kernel = self.clone();
        let options = TaskOptions::new(move || kernel.dispatcher_body())
            .name("dispatcher")
            .class(TaskClass::System);
        self.create_with_id(options, TaskId::DISPATCHER).map(|_| ())
    }

    /// Allocates the identity of a task about to be created.
    pub(crate) fn alloc_id(&self) -> TaskId {
        let mut state = self.lock_state();
        let id = TaskId::from_raw(state.next_id);
        state.next_id += 1;
        id
    }

    pub(crate) fn lock_state(&self) -> SpinLockGuard<'_, SchedState> {
        self.state.lock()
    }

    pub(crate) fn scheduler(&self) -> &dyn Scheduler {
        &*self.scheduler
    }

    pub(crate) fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn preempt_info(&self) -> &PreemptInfo {
        &self.preempt
    }

    /// Returns a strong reference to this kernel.
    pub(crate) fn arc(&self) -> Option<Arc<Self>> {
        self.this.upgrade()
    }

    pub(crate) fn weak(&self) -> Weak<Self> {
        self.this.clone()
    }

    /// Returns the configuration the kernel was created with.
    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    /// Returns the identity of the running task.
    pub fn id(&self) -> TaskId {
        self.lock_state().current
    }

    /// Returns a snapshot of the running task's descriptor.
    pub fn current(&self) -> Option<TaskStats> {
        self.lock_state().current_desc().map(TaskDesc::stats)
    }

    /// Returns the current value of the virtual clock.
    pub fn jiffies(&self) -> Jiffies {
        self.clock.elapsed()
    }

    /// Returns the number of user tasks that have not terminated yet.
    pub fn user_tasks(&self) -> usize {
        self.lock_state().user_tasks
    }

    /// Returns the status of task `id`, or `None` if no such task exists.
    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.lock_state().tasks.get(id).map(|task| task.status)
    }

    /// Returns a snapshot of a task's descriptor.
    pub fn stats(&self, id: TaskId) -> Option<TaskStats> {
        self.lock_state().tasks.get(id).map(TaskDesc::stats)
    }

    /// Returns the number of tasks in the `Running` state.
    ///
    /// This is always one; it is exposed for diagnostics.
    pub fn running_tasks(&self) -> usize {
        self.lock_state()
            .tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Running)
            .count()
    }

    /// Creates a new, empty wait queue.
    pub fn new_queue(&self) -> QueueId {
        let queue = self.lock_state().queues.create();
        debug!("created wait queue {:?}", queue);
        queue
    }

    /// Returns the number of tasks linked into `queue`.
    pub fn queue_len(&self, queue: QueueId) -> Option<usize> {
        self.lock_state().queues.len(queue)
    }

    /// Returns the task at the head of `queue`.
    pub fn queue_head(&self, queue: QueueId) -> Option<TaskId> {
        self.lock_state().queues.head(queue)
    }

    /// Returns the tasks linked into `queue`, starting at its head.
    pub fn queue_tasks(&self, queue: QueueId) -> Option<Vec<TaskId>> {
        let state = self.lock_state();
        if !state.queues.contains(queue) {
            return None;
        }
        Some(state.queues.iter(&state.tasks, queue).collect())
    }

    /// Returns the queue `id` is linked into, if any.
    pub fn queue_of(&self, id: TaskId) -> Option<QueueId> {
        self.lock_state().tasks.get(id)?.queue
    }
}

impl core::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.config)
            .field("jiffies", &self.clock.elapsed())
            .finish_non_exhaustive()
    }
}
