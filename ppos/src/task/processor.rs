// SPDX-License-Identifier: MPL-2.0

//! The task control API: creating tasks and moving the CPU between them.
//!
//! Every operation here is called by the running task. The scheduler state
//! is updated under the kernel's lock; the lock is always released before
//! control is transferred to another task.

use core::panic::AssertUnwindSafe;
use std::panic;

use log::{error, info, trace, warn};

use super::{
    ExecContext, Priority, QueueId, TaskClass, TaskId, TaskOptions, TaskStatus,
    context::{context_exit, context_switch},
    descriptor::TaskDesc,
    stack::TaskStack,
};
use crate::{
    kernel::{Kernel, SchedState},
    prelude::*,
    timer::Jiffies,
};

type ContextPair = (Arc<ExecContext>, Arc<ExecContext>);

impl Kernel {
    /// Creates a task and makes it ready to run.
    ///
    /// The new task's parent is the running task. A user task is appended to
    /// the ready queue and counts as pending work until it exits; a system
    /// task is only marked ready and runs when some task switches to it.
    ///
    /// Fails with [`Error::InvalidArgs`] if `options` has no entry function,
    /// in which case nothing changes. If no stack can be allocated for the
    /// task, the process is aborted.
    pub fn create(&self, options: TaskOptions) -> Result<TaskId> {
        if options.func.is_none() {
            return Err(Error::InvalidArgs);
        }
        let id = self.alloc_id();
        self.create_with_id(options, id)
    }

    pub(crate) fn create_with_id(&self, options: TaskOptions, id: TaskId) -> Result<TaskId> {
        let TaskOptions {
            func,
            name,
            class,
            priority,
        } = options;
        let func = func.ok_or(Error::InvalidArgs)?;
        let kernel = self.arc().ok_or(Error::InvalidArgs)?;

        let ctx = Arc::new(ExecContext::new());
        let entry = {
            let ctx = ctx.clone();
            move || task_entry(kernel, ctx, id, func)
        };
        let stack = match TaskStack::spawn(id, name.as_deref(), self.config().get_stack_size(), entry)
        {
            Ok(stack) => stack,
            Err(err) => {
                error!("cannot create task {}: {}", id, err);
                std::process::abort();
            }
        };

        let mut desc = TaskDesc::new(id, class, ctx, self.jiffies());
        desc.name = name;
        desc.stack = Some(stack);
        if let Some(prio) = priority {
            desc.sched_info.set_priority(Priority::clamped(prio));
        }

        let mut guard = self.lock_state();
        let state = &mut *guard;
        desc.parent = Some(state.current);
        state.tasks.insert(desc);
        if class == TaskClass::User {
            state.user_tasks += 1;
            state.queues.append(&mut state.tasks, QueueId::READY, id)?;
        }
        set_status(state, id, TaskStatus::Ready)?;

        trace!("created {:?} task {}", class, id);
        Ok(id)
    }

    /// Terminates the running task with `exit_code`.
    ///
    /// Control goes to the dispatcher, or to the main task if the dispatcher
    /// itself exits. When the main task exits, the process exits.
    pub fn exit(&self, exit_code: i32) -> ! {
        let leaked = self.preempt_info().clear_guard_count();
        if leaked > 0 {
            warn!("a task exits with {} preemption guards held", leaked);
        }

        let now = self.jiffies();
        let mut state = self.lock_state();
        let id = state.current;
        if id == TaskId::MAIN {
            drop(state);
            info!("main task exit with code {}", exit_code);
            std::process::exit(exit_code);
        }

        let is_user = {
            let task = state
                .current_desc_mut()
                .expect("the running task must have a descriptor");
            task.status = TaskStatus::Terminated;
            task.exit_code = Some(exit_code);

            let elapsed = now.since(task.acct.created_at);
            info!(
                "task {} exit: execution time {} ms, processor time {} ms, {} activations",
                id,
                elapsed.as_duration().as_millis(),
                Jiffies::new(task.acct.cpu_ticks).as_duration().as_millis(),
                task.acct.activations,
            );
            task.is_user()
        };
        if is_user {
            state.user_tasks -= 1;
        }

        let dispatcher_alive = state
            .tasks
            .get(TaskId::DISPATCHER)
            .is_some_and(|task| task.status != TaskStatus::Terminated);
        let successor = if id == TaskId::DISPATCHER || !dispatcher_alive {
            TaskId::MAIN
        } else {
            TaskId::DISPATCHER
        };

        let next = match self.prepare_switch(&mut state, successor) {
            Ok((_, next)) => next,
            Err(err) => {
                error!("task {} cannot hand over to task {}: {}", id, successor, err);
                std::process::abort();
            }
        };
        drop(state);

        context_exit(&next)
    }

    /// Switches to `target`, which becomes the running task.
    ///
    /// The running task becomes ready; if it is a user task it is appended to
    /// the ready queue. This returns once some task switches back to it.
    ///
    /// Fails with [`Error::InvalidArgs`] if `target` does not exist or has
    /// terminated. Switching to the running task does nothing.
    ///
    /// # Panics
    ///
    /// This method panics if preemption is disabled.
    pub fn switch_to(&self, target: TaskId) -> Result<()> {
        self.assert_preemptive();

        let (prev, next) = {
            let mut state = self.lock_state();
            if state.current == target {
                return Ok(());
            }
            self.prepare_switch(&mut state, target)?
        };
        context_switch(&prev, &next);
        Ok(())
    }

    /// Gives up the rest of the quantum and switches to the dispatcher.
    pub fn yield_now(&self) -> Result<()> {
        trace!("task {} yields", self.id());
        self.switch_to(TaskId::DISPATCHER)
    }

    /// Suspends `task`, or the running task if `None`.
    ///
    /// If `queue` is given, the task is moved from its current queue to the
    /// tail of `queue`. Otherwise it stays where it is, except that it leaves
    /// the ready queue. Suspending the running task switches to the
    /// dispatcher and returns once the task has been resumed and selected.
    pub fn suspend(&self, task: Option<TaskId>, queue: Option<QueueId>) -> Result<()> {
        let switch = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let current = state.current;
            let id = task.unwrap_or(current);
            let is_current = id == current;

            let desc = state.tasks.get(id).ok_or(Error::InvalidArgs)?;
            if desc.status == TaskStatus::Terminated || id == TaskId::DISPATCHER {
                return Err(Error::InvalidArgs);
            }
            let old_queue = desc.queue;
            match queue {
                Some(QueueId::READY) => return Err(Error::InvalidArgs),
                Some(queue) if !state.queues.contains(queue) => return Err(Error::InvalidArgs),
                _ => {}
            }
            if is_current {
                self.assert_preemptive();
                let dispatcher_alive = state
                    .tasks
                    .get(TaskId::DISPATCHER)
                    .is_some_and(|task| task.status != TaskStatus::Terminated);
                if !dispatcher_alive {
                    return Err(Error::InvalidArgs);
                }
            }

            match queue {
                Some(queue) => state.queues.move_to(&mut state.tasks, queue, id)?,
                None if old_queue == Some(QueueId::READY) => {
                    state.queues.remove(&mut state.tasks, QueueId::READY, id)?
                }
                None => {}
            }
            set_status(state, id, TaskStatus::Suspended)?;
            trace!("task {} suspended into {:?}", id, queue);

            if is_current {
                Some(self.prepare_switch(state, TaskId::DISPATCHER)?)
            } else {
                None
            }
        };

        if let Some((prev, next)) = switch {
            context_switch(&prev, &next);
        }
        Ok(())
    }

    /// Makes `task` ready, moving it from its current queue to the tail of
    /// the ready queue.
    ///
    /// Fails with [`Error::InvalidArgs`] for an unknown, running or
    /// terminated task, and for the dispatcher.
    pub fn resume(&self, task: TaskId) -> Result<()> {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let desc = state.tasks.get(task).ok_or(Error::InvalidArgs)?;
        if matches!(desc.status, TaskStatus::Running | TaskStatus::Terminated)
            || task == TaskId::DISPATCHER
        {
            return Err(Error::InvalidArgs);
        }

        state.queues.move_to(&mut state.tasks, QueueId::READY, task)?;
        set_status(state, task, TaskStatus::Ready)?;
        trace!("task {} resumed", task);
        Ok(())
    }

    /// Sets the static priority of `task`, or of the running task if `None`.
    ///
    /// `prio` is clamped to the valid range, and the dynamic priority is
    /// reset to the new value.
    pub fn set_priority(&self, task: Option<TaskId>, prio: i32) -> Result<()> {
        let prio = Priority::clamped(prio);
        let mut state = self.lock_state();
        let id = task.unwrap_or(state.current);
        let desc = state.tasks.get_mut(id).ok_or(Error::InvalidArgs)?;
        desc.sched_info.set_priority(prio);
        trace!("task {} priority set to {}", id, prio.get());
        Ok(())
    }

    /// Returns the static priority of `task`, or of the running task if `None`.
    pub fn get_priority(&self, task: Option<TaskId>) -> Result<Priority> {
        let state = self.lock_state();
        let id = task.unwrap_or(state.current);
        let desc = state.tasks.get(id).ok_or(Error::InvalidArgs)?;
        Ok(desc.sched_info.static_priority())
    }

    /// Moves the CPU from the running task to `next` in the scheduler state
    /// and returns the contexts to transfer between.
    ///
    /// If `next` is linked into a queue, it is unlinked. The previous task is
    /// made ready only if it is still running; a suspended or terminated one
    /// keeps its status.
    pub(crate) fn prepare_switch(&self, state: &mut SchedState, next: TaskId) -> Result<ContextPair> {
        let prev = state.current;
        let next_desc = state.tasks.get(next).ok_or(Error::InvalidArgs)?;
        if next_desc.status == TaskStatus::Terminated || next == prev {
            return Err(Error::InvalidArgs);
        }
        state.queues.detach(&mut state.tasks, next)?;

        let prev_desc = state.tasks.get_mut(prev).ok_or(Error::InvalidArgs)?;
        let prev_ctx = prev_desc.ctx.clone();
        if prev_desc.status == TaskStatus::Running {
            prev_desc.status = TaskStatus::Ready;
            if prev_desc.is_user() && prev_desc.queue.is_none() {
                state.queues.append(&mut state.tasks, QueueId::READY, prev)?;
            }
        }

        let next_desc = state.tasks.get_mut(next).ok_or(Error::InvalidArgs)?;
        next_desc.status = TaskStatus::Running;
        next_desc.acct.activations += 1;
        let next_ctx = next_desc.ctx.clone();

        state.current = next;
        state.quantum_left = self.config().get_quantum();
        self.preempt_info().clear_need_preempt();

        trace!("switch: task {} -> task {}", prev, next);
        Ok((prev_ctx, next_ctx))
    }

    fn assert_preemptive(&self) {
        let guards = self.preempt_info().guard_count();
        if guards != 0 {
            panic!("switching tasks while holding {} preemption guards", guards);
        }
    }
}

fn set_status(state: &mut SchedState, id: TaskId, status: TaskStatus) -> Result<()> {
    state.tasks.get_mut(id).ok_or(Error::InvalidArgs)?.status = status;
    Ok(())
}

/// The first and last frames of every task thread.
fn task_entry(kernel: Arc<Kernel>, ctx: Arc<ExecContext>, id: TaskId, func: Box<dyn FnOnce() + Send>) {
    // Wait until the task is switched to for the first time.
    ctx.park();
    drop(ctx);

    let exit_code = match panic::catch_unwind(AssertUnwindSafe(func)) {
        Ok(()) => 0,
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("<non-string payload>");
            error!("task {} panicked: {}", id, msg);
            -1
        }
    };
    kernel.exit(exit_code)
}
