// SPDX-License-Identifier: MPL-2.0

use log::{debug, error, warn};

use super::{QueueId, context::context_switch, scheduler::ReadyQueue};
use crate::{
    kernel::{Kernel, SchedState},
    prelude::*,
};

/// The outcome of one dispatch decision.
enum Dispatch {
    /// A task ran and control came back to the dispatcher.
    Switched,
    /// The scheduler declined to pick a queued task; ask again.
    Declined,
    /// No user task is left.
    Finished,
    /// User tasks exist but none of them is ready.
    Stalled(usize),
}

impl Kernel {
    /// The body of the dispatcher task.
    ///
    /// It keeps handing the CPU to the task chosen by the scheduler while
    /// user tasks remain, then exits, which returns control to the main task.
    pub(crate) fn dispatcher_body(&self) {
        debug!("dispatcher started");
        loop {
            match self.dispatch() {
                Ok(Dispatch::Switched | Dispatch::Declined) => {}
                Ok(Dispatch::Finished) => break,
                Ok(Dispatch::Stalled(pending)) => {
                    warn!(
                        "dispatcher stops with {} user tasks suspended and none ready",
                        pending
                    );
                    break;
                }
                Err(err) => {
                    error!("dispatcher failed: {}", err);
                    break;
                }
            }
        }
        debug!("dispatcher finished");
        self.exit(0)
    }

    fn dispatch(&self) -> Result<Dispatch> {
        let (prev, next) = {
            let mut guard = self.lock_state();
            let state: &mut SchedState = &mut guard;
            if state.user_tasks == 0 {
                return Ok(Dispatch::Finished);
            }

            let picked = self
                .scheduler()
                .pick_next(&mut ReadyQueue::new(&state.queues, &mut state.tasks));
            let Some(next) = picked else {
                return Ok(if state.queues.is_empty(QueueId::READY) {
                    Dispatch::Stalled(state.user_tasks)
                } else {
                    Dispatch::Declined
                });
            };

            state.queues.remove(&mut state.tasks, QueueId::READY, next)?;
            self.prepare_switch(state, next)?
        };

        context_switch(&prev, &next);
        Ok(Dispatch::Switched)
    }
}
