// SPDX-License-Identifier: MPL-2.0

use std::thread;

use log::trace;

use super::TaskId;
use crate::prelude::*;

/// The stack of a task, together with the host thread executing on it.
///
/// The stack is exclusively owned by its task and outlives it: a terminated
/// task keeps its stack until the process ends.
#[derive(Debug)]
pub(crate) struct TaskStack {
    size: usize,
}

impl TaskStack {
    /// Allocates a stack of `size` bytes and starts `entry` on it.
    pub(crate) fn spawn<F>(id: TaskId, name: Option<&str>, size: usize, entry: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let thread_name = match name {
            Some(name) => format!("task-{}-{}", id, name),
            None => format!("task-{}", id),
        };

        // The join handle is dropped: a task's thread is never joined.
        thread::Builder::new()
            .name(thread_name)
            .stack_size(size)
            .spawn(entry)
            .map_err(|_| Error::NoMemory)?;
        trace!("allocated a {} byte stack for task {}", size, id);

        Ok(Self { size })
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }
}
