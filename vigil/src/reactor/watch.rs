use super::event::Event;
use super::poller::common::Interest;
use crate::error::Error;
use crate::runtime::task::{TaskId, WatchCallback};

use std::collections::HashMap;
use std::os::fd::RawFd;
use std::panic::Location;

/// The readiness direction a watch waits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// A read on the descriptor would not block (data or end-of-stream).
    Read,
    /// A write on the descriptor would not block.
    Write,
}

/// A live watch on one direction of a file descriptor.
pub(crate) struct WatchedDescriptor {
    pub(crate) id: TaskId,
    pub(crate) fd: RawFd,
    pub(crate) direction: Direction,

    /// Whether the watch survives its own dispatch.
    pub(crate) persistent: bool,

    /// The callback, or `None` while it is being run.
    ///
    /// A persistent watch stays in the table during its own callback so
    /// the callback can cancel it; the closure itself is lent out for the
    /// duration of the call.
    pub(crate) callback: Option<WatchCallback>,

    /// Where the watch was requested from.
    pub(crate) location: &'static Location<'static>,
}

/// Live file-descriptor watches keyed by task id.
///
/// A descriptor holds at most one watch per direction. The table also
/// answers which directions a descriptor must be registered for with the
/// OS poller.
pub(crate) struct WatchTable {
    watches: HashMap<TaskId, WatchedDescriptor>,

    /// Reverse index enforcing one watch per `(fd, direction)`.
    slots: HashMap<(RawFd, Direction), TaskId>,
}

impl WatchTable {
    pub(crate) fn new() -> Self {
        Self {
            watches: HashMap::new(),
            slots: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.watches.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    pub(crate) fn contains(&self, id: TaskId) -> bool {
        self.watches.contains_key(&id)
    }

    /// Checks whether a new watch on `(fd, direction)` would be accepted.
    ///
    /// Negative descriptors are invalid, and a direction already watched on
    /// the descriptor is rejected rather than replaced.
    pub(crate) fn check(&self, fd: RawFd, direction: Direction) -> Result<(), Error> {
        if fd < 0 {
            return Err(Error::InvalidDescriptor { fd });
        }

        if let Some(&existing) = self.slots.get(&(fd, direction)) {
            return Err(Error::AlreadyWatched {
                fd,
                direction,
                existing,
            });
        }

        Ok(())
    }

    /// Installs a watch that passed [`check`](Self::check).
    pub(crate) fn add(&mut self, watch: WatchedDescriptor) -> TaskId {
        debug_assert!(self.check(watch.fd, watch.direction).is_ok());

        let id = watch.id;
        self.slots.insert((watch.fd, watch.direction), id);
        self.watches.insert(id, watch);

        id
    }

    /// Removes the watch named `id`, handing it back to the caller.
    ///
    /// Returns `None` if the id is unknown, already cancelled, or belonged
    /// to a non-persistent watch that already fired.
    pub(crate) fn remove(&mut self, id: TaskId) -> Option<WatchedDescriptor> {
        let watch = self.watches.remove(&id)?;
        self.slots.remove(&(watch.fd, watch.direction));

        Some(watch)
    }

    /// Directions `fd` must be registered for, given the remaining watches.
    pub(crate) fn interest(&self, fd: RawFd) -> Interest {
        [Direction::Read, Direction::Write]
            .into_iter()
            .filter(|&direction| self.slots.contains_key(&(fd, direction)))
            .fold(Interest::NONE, Interest::with)
    }

    /// Ids of the watches made ready by `events`, in ascending order.
    ///
    /// The result is a snapshot: callbacks dispatched afterwards may add or
    /// remove watches without disturbing it. Watches whose callback is
    /// currently running are left out.
    pub(crate) fn poll_ready(&self, events: &[Event]) -> Vec<TaskId> {
        let mut ready = Vec::new();

        for event in events {
            let directions = [
                (Direction::Read, event.readable),
                (Direction::Write, event.writable),
            ];

            for (direction, is_ready) in directions {
                if !is_ready {
                    continue;
                }

                if let Some(&id) = self.slots.get(&(event.fd, direction))
                    && self.watches[&id].callback.is_some()
                {
                    ready.push(id);
                }
            }
        }

        ready.sort_unstable();
        ready
    }

    /// Lends out the callback of a persistent watch for dispatch.
    pub(crate) fn take_callback(&mut self, id: TaskId) -> Option<WatchCallback> {
        self.watches.get_mut(&id)?.callback.take()
    }

    /// Returns a lent callback to its watch.
    ///
    /// If the watch was cancelled while its callback ran, the callback is
    /// handed back so the caller can drop it.
    pub(crate) fn restore_callback(
        &mut self,
        id: TaskId,
        callback: WatchCallback,
    ) -> Option<WatchCallback> {
        match self.watches.get_mut(&id) {
            Some(watch) if watch.callback.is_none() => {
                watch.callback = Some(callback);
                None
            }
            _ => Some(callback),
        }
    }

    pub(crate) fn get(&self, id: TaskId) -> Option<&WatchedDescriptor> {
        self.watches.get(&id)
    }
}

impl Default for WatchTable {
    fn default() -> Self {
        Self::new()
    }
}
