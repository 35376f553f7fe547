// SPDX-License-Identifier: MPL-2.0

//! Circular doubly-linked queues of tasks.
//!
//! A queue does not own its tasks; it only links them. The links live in the
//! task descriptors (see [`Link`]) and name neighbours by [`TaskId`], so
//! appending and removing a known task takes constant time and a task can be
//! linked into at most one queue at a time.

use super::{
    TaskId,
    descriptor::{Link, TaskTable},
};
use crate::prelude::*;

/// The handle of a queue of tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueueId(usize);

impl QueueId {
    /// The queue of tasks that are ready to run.
    pub const READY: Self = Self(0);
}

#[derive(Clone, Copy, Debug, Default)]
struct QueueHead {
    head: Option<TaskId>,
    len: usize,
}

/// All queues of a kernel: the ready queue and the wait queues handed out
/// to callers.
#[derive(Debug)]
pub(crate) struct QueueTable {
    heads: Vec<QueueHead>,
}

impl QueueTable {
    pub(crate) fn new() -> Self {
        Self {
            heads: vec![QueueHead::default()],
        }
    }

    /// Creates a new, empty queue.
    pub(crate) fn create(&mut self) -> QueueId {
        self.heads.push(QueueHead::default());
        QueueId(self.heads.len() - 1)
    }

    pub(crate) fn contains(&self, queue: QueueId) -> bool {
        queue.0 < self.heads.len()
    }

    pub(crate) fn len(&self, queue: QueueId) -> Option<usize> {
        self.heads.get(queue.0).map(|head| head.len)
    }

    pub(crate) fn is_empty(&self, queue: QueueId) -> bool {
        self.len(queue).is_none_or(|len| len == 0)
    }

    pub(crate) fn head(&self, queue: QueueId) -> Option<TaskId> {
        self.heads.get(queue.0)?.head
    }

    /// Links `id` at the tail of `queue`.
    pub(crate) fn append(&mut self, tasks: &mut TaskTable, queue: QueueId, id: TaskId) -> Result<()> {
        let queue_head = self.heads.get_mut(queue.0).ok_or(Error::InvalidArgs)?;
        let task = tasks.get(id).ok_or(Error::InvalidArgs)?;
        if task.queue.is_some() {
            return Err(Error::AlreadyQueued);
        }

        let link = match queue_head.head {
            None => {
                queue_head.head = Some(id);
                Link::detached(id)
            }
            Some(head) => {
                let tail = tasks.get(head).ok_or(Error::InvalidArgs)?.link.prev;
                set_next(tasks, tail, id)?;
                set_prev(tasks, head, id)?;
                Link {
                    prev: tail,
                    next: head,
                }
            }
        };
        queue_head.len += 1;

        let task = tasks.get_mut(id).ok_or(Error::InvalidArgs)?;
        task.link = link;
        task.queue = Some(queue);
        Ok(())
    }

    /// Unlinks `id` from `queue`.
    pub(crate) fn remove(&mut self, tasks: &mut TaskTable, queue: QueueId, id: TaskId) -> Result<()> {
        let queue_head = self.heads.get_mut(queue.0).ok_or(Error::InvalidArgs)?;
        let task = tasks.get(id).ok_or(Error::InvalidArgs)?;
        if task.queue != Some(queue) {
            return Err(Error::NotQueued);
        }

        let Link { prev, next } = task.link;
        if next == id {
            queue_head.head = None;
        } else {
            set_next(tasks, prev, next)?;
            set_prev(tasks, next, prev)?;
            if queue_head.head == Some(id) {
                queue_head.head = Some(next);
            }
        }
        queue_head.len -= 1;

        let task = tasks.get_mut(id).ok_or(Error::InvalidArgs)?;
        task.link = Link::detached(id);
        task.queue = None;
        Ok(())
    }

    /// Unlinks `id` from whatever queue it occupies and links it at the tail
    /// of `queue`.
    pub(crate) fn move_to(&mut self, tasks: &mut TaskTable, queue: QueueId, id: TaskId) -> Result<()> {
        if !self.contains(queue) {
            return Err(Error::InvalidArgs);
        }
        self.detach(tasks, id)?;
        self.append(tasks, queue, id)
    }

    /// Unlinks `id` from whatever queue it occupies, if any.
    pub(crate) fn detach(&mut self, tasks: &mut TaskTable, id: TaskId) -> Result<()> {
        match tasks.get(id).ok_or(Error::InvalidArgs)?.queue {
            Some(current) => self.remove(tasks, current, id),
            None => Ok(()),
        }
    }

    /// Walks `queue` forward from its head.
    pub(crate) fn iter<'a>(&self, tasks: &'a TaskTable, queue: QueueId) -> QueueIter<'a> {
        QueueIter::new(tasks, self.head(queue))
    }
}

/// Walks a queue forward from a task until it arrives back at that task.
pub(crate) struct QueueIter<'a> {
    tasks: &'a TaskTable,
    start: Option<TaskId>,
    next: Option<TaskId>,
}

impl<'a> QueueIter<'a> {
    /// Starts the walk at `start`, which may be any task of the queue.
    pub(crate) fn new(tasks: &'a TaskTable, start: Option<TaskId>) -> Self {
        Self {
            tasks,
            start,
            next: start,
        }
    }
}

impl Iterator for QueueIter<'_> {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        let current = self.next?;
        let following = self.tasks.get(current)?.link.next;
        self.next = (Some(following) != self.start).then_some(following);
        Some(current)
    }
}

fn set_next(tasks: &mut TaskTable, id: TaskId, next: TaskId) -> Result<()> {
    tasks.get_mut(id).ok_or(Error::InvalidArgs)?.link.next = next;
    Ok(())
}

fn set_prev(tasks: &mut TaskTable, id: TaskId, prev: TaskId) -> Result<()> {
    tasks.get_mut(id).ok_or(Error::InvalidArgs)?.link.prev = prev;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::task::descriptor::test_util::user_tasks;

    fn collect(queues: &QueueTable, tasks: &TaskTable, queue: QueueId) -> Vec<TaskId> {
        queues.iter(tasks, queue).collect()
    }

    /// Checks that membership fields and physical links agree.
    fn assert_consistent(queues: &QueueTable, tasks: &TaskTable) {
        for task in tasks.iter() {
            match task.queue {
                Some(queue) => {
                    assert!(collect(queues, tasks, queue).contains(&task.id));
                    let prev = tasks.get(task.link.prev).unwrap();
                    let next = tasks.get(task.link.next).unwrap();
                    assert_eq!(prev.link.next, task.id);
                    assert_eq!(next.link.prev, task.id);
                }
                None => assert_eq!(task.link, Link::detached(task.id)),
            }
        }
        for index in 0..queues.heads.len() {
            let queue = QueueId(index);
            let members = collect(queues, tasks, queue);
            assert_eq!(members.len(), queues.len(queue).unwrap());
            for id in members {
                assert_eq!(tasks.get(id).unwrap().queue, Some(queue));
            }
        }
    }

    #[test]
    fn append_keeps_order() {
        let (mut tasks, ids) = user_tasks(&[0, 0, 0]);
        let mut queues = QueueTable::new();
        for id in &ids {
            queues.append(&mut tasks, QueueId::READY, *id).unwrap();
        }
        assert_eq!(collect(&queues, &tasks, QueueId::READY), ids);
        assert_eq!(queues.head(QueueId::READY), Some(ids[0]));
        assert_consistent(&queues, &tasks);
    }

    #[test]
    fn remove_head_middle_and_last() {
        let (mut tasks, ids) = user_tasks(&[0, 0, 0, 0]);
        let mut queues = QueueTable::new();
        for id in &ids {
            queues.append(&mut tasks, QueueId::READY, *id).unwrap();
        }

        queues.remove(&mut tasks, QueueId::READY, ids[0]).unwrap();
        assert_eq!(queues.head(QueueId::READY), Some(ids[1]));
        queues.remove(&mut tasks, QueueId::READY, ids[2]).unwrap();
        assert_eq!(collect(&queues, &tasks, QueueId::READY), [ids[1], ids[3]]);
        assert_consistent(&queues, &tasks);

        queues.remove(&mut tasks, QueueId::READY, ids[3]).unwrap();
        queues.remove(&mut tasks, QueueId::READY, ids[1]).unwrap();
        assert!(queues.is_empty(QueueId::READY));
        assert_eq!(queues.head(QueueId::READY), None);
        assert_consistent(&queues, &tasks);
    }

    #[test]
    fn single_membership_is_enforced() {
        let (mut tasks, ids) = user_tasks(&[0]);
        let mut queues = QueueTable::new();
        let wait = queues.create();

        queues.append(&mut tasks, QueueId::READY, ids[0]).unwrap();
        assert_eq!(
            queues.append(&mut tasks, wait, ids[0]),
            Err(Error::AlreadyQueued)
        );
        assert_eq!(queues.remove(&mut tasks, wait, ids[0]), Err(Error::NotQueued));
        assert_consistent(&queues, &tasks);
    }

    #[test]
    fn move_between_queues() {
        let (mut tasks, ids) = user_tasks(&[0, 0, 0]);
        let mut queues = QueueTable::new();
        let wait = queues.create();
        for id in &ids {
            queues.append(&mut tasks, QueueId::READY, *id).unwrap();
        }

        queues.move_to(&mut tasks, wait, ids[1]).unwrap();
        assert_eq!(collect(&queues, &tasks, QueueId::READY), [ids[0], ids[2]]);
        assert_eq!(collect(&queues, &tasks, wait), [ids[1]]);
        assert_consistent(&queues, &tasks);

        // Moving into the queue it already occupies sends it to the tail.
        queues.move_to(&mut tasks, QueueId::READY, ids[0]).unwrap();
        assert_eq!(collect(&queues, &tasks, QueueId::READY), [ids[2], ids[0]]);

        queues.detach(&mut tasks, ids[1]).unwrap();
        assert!(queues.is_empty(wait));
        queues.detach(&mut tasks, ids[1]).unwrap();
        assert_consistent(&queues, &tasks);
    }

    #[test]
    fn walk_from_any_member() {
        let (mut tasks, ids) = user_tasks(&[0, 0, 0]);
        let mut queues = QueueTable::new();
        for id in &ids {
            queues.append(&mut tasks, QueueId::READY, *id).unwrap();
        }
        let walk: Vec<_> = QueueIter::new(&tasks, Some(ids[1])).collect();
        assert_eq!(walk, [ids[1], ids[2], ids[0]]);
        assert_eq!(QueueIter::new(&tasks, None).count(), 0);
    }

    #[test]
    fn unknown_queue_or_task() {
        let (mut tasks, ids) = user_tasks(&[0]);
        let mut queues = QueueTable::new();
        let bogus = QueueId(42);
        assert_eq!(queues.append(&mut tasks, bogus, ids[0]), Err(Error::InvalidArgs));
        assert_eq!(
            queues.append(&mut tasks, QueueId::READY, TaskId::from_raw(77)),
            Err(Error::InvalidArgs)
        );
        assert_eq!(queues.move_to(&mut tasks, bogus, ids[0]), Err(Error::InvalidArgs));
        assert_eq!(queues.len(bogus), None);
        assert_consistent(&queues, &tasks);
    }
}
