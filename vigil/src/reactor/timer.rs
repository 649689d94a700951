use crate::runtime::task::{OnceCallback, TaskId};

use std::collections::{BTreeMap, HashMap};
use std::panic::Location;
use std::time::Instant;

/// A callback scheduled to run once its deadline is reached.
///
/// A `DelayedTask` is owned by the [`TimerQueue`] until it is either
/// popped for dispatch or cancelled; in both cases it leaves the queue
/// entirely.
pub(crate) struct DelayedTask {
    /// Identifier handed back to the caller.
    pub(crate) id: TaskId,

    /// The instant at or after which the task may run.
    pub(crate) deadline: Instant,

    /// Work to perform.
    pub(crate) callback: OnceCallback,

    /// Where the task was posted from.
    pub(crate) location: &'static Location<'static>,
}

/// Ordering key of a queued task.
///
/// Tasks are ordered by deadline, and tasks sharing a deadline by the order
/// in which they were inserted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TimerKey {
    deadline: Instant,
    seq: u64,
}

/// Pending delayed tasks ordered by deadline.
///
/// Unlike a plain binary heap, cancelled entries are removed immediately
/// rather than skipped lazily when they reach the front.
pub(crate) struct TimerQueue {
    /// Tasks sorted by `(deadline, insertion order)`.
    entries: BTreeMap<TimerKey, DelayedTask>,

    /// Lookup from task id to its position in `entries`.
    index: HashMap<TaskId, TimerKey>,

    /// Insertion counter used as tie-break.
    seq: u64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            index: HashMap::new(),
            seq: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `id` names a task still waiting in the queue.
    pub(crate) fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Queues a task under its already allocated id.
    ///
    /// Among tasks with equal deadlines, earlier insertions fire first.
    pub(crate) fn insert(&mut self, task: DelayedTask) -> TaskId {
        let key = TimerKey {
            deadline: task.deadline,
            seq: self.seq,
        };
        self.seq = self.seq.wrapping_add(1);

        let id = task.id;
        self.index.insert(id, key);
        self.entries.insert(key, task);

        id
    }

    /// Removes the task named `id`.
    ///
    /// Returns `None` if the task never existed, already fired, or was
    /// already cancelled. The removed task is handed back so the caller
    /// decides where its callback gets dropped.
    pub(crate) fn cancel(&mut self, id: TaskId) -> Option<DelayedTask> {
        let key = self.index.remove(&id)?;
        self.entries.remove(&key)
    }

    /// Earliest deadline among queued tasks.
    pub(crate) fn peek_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|key| key.deadline)
    }

    /// Removes and returns the earliest task if it is due at `now`.
    pub(crate) fn pop_ready(&mut self, now: Instant) -> Option<DelayedTask> {
        let entry = self.entries.first_entry()?;
        if entry.key().deadline > now {
            return None;
        }

        let task = entry.remove();
        self.index.remove(&task.id);

        Some(task)
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}
