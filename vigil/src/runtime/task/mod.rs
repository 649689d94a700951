//! Task identifiers and callback types.
//!
//! Every unit of work scheduled on a reactor, whether a delayed callback or
//! a file-descriptor watch, is named by a [`TaskId`] drawn from a single
//! identifier space. Identifiers are unique among live tasks only: once a
//! task fires (one-shot) or is cancelled, its id may be handed out again.

mod id;

pub(crate) use id::TaskIdAllocator;

pub use id::{NULL_TASK, TaskId};

/// Callback of a delayed task. Runs at most once.
pub(crate) type OnceCallback = Box<dyn FnOnce()>;

/// Callback of a file-descriptor watch.
///
/// Persistent watches invoke the same callback every time the descriptor
/// is reported ready.
pub(crate) type WatchCallback = Box<dyn FnMut()>;
