//! # Vigil
//!
//! **Vigil** is a single-threaded event loop. It multiplexes delayed
//! callbacks with readiness watches on file descriptors, and dispatches at
//! most one callback per loop iteration on the thread that drives it.
//!
//! It offers:
//!
//! - **Delayed tasks** posted with [`post_task`](ReactorHandle::post_task)
//!   and [`post_delayed_task`](ReactorHandle::post_delayed_task)
//! - **Descriptor watches**, one-shot or persistent, per read/write
//!   [`Direction`]
//! - **Cancellation** of either kind through one [`TaskId`] space, including
//!   from inside a running callback
//! - A **thread-local registry** of the current reactor, see [`current`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vigil::Reactor;
//!
//! let reactor = Reactor::new().unwrap();
//! let handle = reactor.handle();
//!
//! reactor.post_delayed_task(
//!     move || {
//!         println!("tick");
//!         handle.break_loop();
//!     },
//!     Duration::from_millis(100),
//! );
//!
//! reactor.run();
//! ```
//!
//! ## Error model
//!
//! Scheduling never panics on bad input: an invalid descriptor yields
//! [`NULL_TASK`], and cancelling a stale id yields `false`. Calling
//! [`Reactor::set_as_current`] twice without releasing is a precondition
//! violation and panics.
//!
//! ## Modules
//!
//! - [`task`] — Task identifiers
//! - [`tools`] — Helpers to step a loop by hand
//! - [`error`] — Error types

mod reactor;
mod runtime;

pub mod error;
pub mod tools;

pub use error::{Error, Result};
pub use reactor::{Direction, Reactor, ReactorHandle};
pub use runtime::builder::{MAX_EVENT_CAPACITY, ReactorBuilder};
pub use runtime::context::current;
pub use runtime::task;
pub use runtime::task::{NULL_TASK, TaskId};
