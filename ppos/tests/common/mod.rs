// SPDX-License-Identifier: MPL-2.0

use std::sync::{Arc, Mutex};

use ppos::{Kernel, SchedConfig, task::TaskId};

/// Debug builds format log records on task stacks, so give them room.
pub const TEST_STACK_SIZE: usize = 256 * 1024;

pub fn config() -> SchedConfig {
    SchedConfig::default().stack_size(TEST_STACK_SIZE)
}

pub fn kernel() -> Arc<Kernel> {
    ppos::init(config()).unwrap()
}

/// Events recorded by task bodies and checked by the main task.
///
/// Assertions inside a task body would only make the task exit with -1, so
/// bodies record what they see and the test asserts afterwards.
#[derive(Clone)]
pub struct Trace<T>(Arc<Mutex<Vec<T>>>);

impl<T: Clone> Trace<T> {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn push(&self, event: T) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<T> {
        self.0.lock().unwrap().clone()
    }
}

/// Runs the dispatcher until every user task has exited or none is ready.
pub fn run(kernel: &Kernel) {
    kernel.yield_now().unwrap();
    assert_eq!(kernel.id(), TaskId::MAIN);
}
