use std::fmt;

/// Opaque handle naming a scheduled task.
///
/// The value `0` is reserved as [`TaskId::NULL`] and is never assigned to a
/// real task. It is returned by scheduling operations that rejected their
/// input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

/// The reserved identifier that never refers to a task.
pub const NULL_TASK: TaskId = TaskId::NULL;

impl TaskId {
    /// The reserved identifier that never refers to a task.
    pub const NULL: TaskId = TaskId(0);

    /// Builds an identifier from its raw value.
    ///
    /// Useful for diagnostics and tests; cancelling an identifier that was
    /// never handed out simply fails.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this identifier.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is [`TaskId::NULL`].
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic generator of task identifiers.
///
/// Each call to [`next`](Self::next) returns a value strictly greater than
/// the previous one, skipping [`TaskId::NULL`]. Once the `u64` range is
/// exhausted the counter wraps around, and from then on candidates that are
/// still live are skipped.
pub(crate) struct TaskIdAllocator {
    /// Last value handed out.
    last: u64,
}

impl TaskIdAllocator {
    /// Creates an allocator whose first identifier is `1`.
    pub(crate) const fn new() -> Self {
        Self { last: 0 }
    }

    /// Returns the next identifier not reported live by `is_live`.
    pub(crate) fn next(&mut self, is_live: impl Fn(TaskId) -> bool) -> TaskId {
        loop {
            self.last = self.last.wrapping_add(1);

            let id = TaskId(self.last);
            if id.is_null() || is_live(id) {
                continue;
            }

            return id;
        }
    }
}

impl Default for TaskIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
