//! Reactor core and event handling.
//!
//! The reactor merges two scheduling primitives into one wait/dispatch
//! cycle:
//! - a timer queue of delayed callbacks ordered by deadline,
//! - a table of file-descriptor watches fed by the OS poller.
//!
//! Both draw their identifiers from one [`TaskId`](crate::TaskId) space, so
//! a single cancel operation serves either kind.

mod core;
mod event;
mod poller;
mod timer;
mod watch;

pub use self::core::{Reactor, ReactorHandle};
pub use watch::Direction;
