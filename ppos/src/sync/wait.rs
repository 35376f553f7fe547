// SPDX-License-Identifier: MPL-2.0

use core::fmt;

use log::trace;

use crate::prelude::*;

/// A wait queue.
///
/// One may wait on a wait queue to suspend the running task. Multiple tasks
/// may be the waiters of a wait queue. Other tasks may invoke the
/// `wake`-family methods of a wait queue to make waiting tasks ready again,
/// in the order they started to wait.
pub struct WaitQueue {
    kernel: Arc<Kernel>,
    queue: QueueId,
}

impl WaitQueue {
    /// Creates a new, empty wait queue on `kernel`.
    pub fn new(kernel: &Arc<Kernel>) -> Self {
        Self {
            kernel: kernel.clone(),
            queue: kernel.new_queue(),
        }
    }

    /// Returns the kernel queue backing this wait queue.
    pub fn id(&self) -> QueueId {
        self.queue
    }

    /// Suspends the running task on this queue until it is woken up and
    /// selected again.
    pub fn wait(&self) -> Result<()> {
        self.kernel.suspend(None, Some(self.queue))
    }

    /// Waits until some condition is met.
    ///
    /// The method only returns if the condition returns `Some(_)`. A waker
    /// should first make the condition `Some(_)`, then invoke the
    /// `wake`-family method.
    pub fn wait_until<F, R>(&self, mut cond: F) -> Result<R>
    where
        F: FnMut() -> Option<R>,
    {
        loop {
            if let Some(res) = cond() {
                return Ok(res);
            }
            self.wait()?;
        }
    }

    /// Wakes up the first waiting task, if there is one, returning whether
    /// such a task was woken up.
    pub fn wake_one(&self) -> Result<bool> {
        let Some(id) = self.kernel.queue_head(self.queue) else {
            return Ok(false);
        };
        self.kernel.resume(id)?;
        trace!("woke task {} from queue {:?}", id, self.queue);
        Ok(true)
    }

    /// Wakes up all waiting tasks, returning the number of tasks that were
    /// woken up.
    pub fn wake_all(&self) -> Result<usize> {
        let mut num_woken = 0;
        while self.wake_one()? {
            num_woken += 1;
        }
        Ok(num_woken)
    }

    pub fn len(&self) -> usize {
        self.kernel.queue_len(self.queue).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for WaitQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitQueue")
            .field("queue", &self.queue)
            .field("len", &self.len())
            .finish()
    }
}
