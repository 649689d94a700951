use crate::reactor::watch::Direction;

use std::time::Duration;

/// Directions a descriptor is registered for with the OS poller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Interest {
    pub(crate) read: bool,
    pub(crate) write: bool,
}

impl Interest {
    /// Interest with no direction set.
    pub(crate) const NONE: Interest = Interest {
        read: false,
        write: false,
    };

    pub(crate) fn is_empty(self) -> bool {
        !self.read && !self.write
    }

    /// Returns a copy of this interest with `direction` added.
    pub(crate) fn with(mut self, direction: Direction) -> Self {
        match direction {
            Direction::Read => self.read = true,
            Direction::Write => self.write = true,
        }
        self
    }
}

/// Converts an optional wait duration to a millisecond poll timeout.
///
/// `None` maps to `-1` (wait forever). Partial milliseconds round up so a
/// wait for a timer never returns before the timer is due.
pub(crate) fn timeout_millis(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(t) => t
            .as_nanos()
            .div_ceil(1_000_000)
            .min(libc::c_int::MAX as u128) as libc::c_int,
    }
}
