//! Loop configuration and per-thread context.
//!
//! This module holds the pieces around the reactor that are not part of
//! its dispatch cycle:
//! - the builder used to configure a reactor,
//! - the thread-local registry of the current reactor,
//! - task identifiers shared by timers and watches.

pub(crate) mod builder;
pub(crate) mod context;

pub mod task;
