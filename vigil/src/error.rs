//! Error types used by the reactor.
//!
//! Scheduling operations never return these directly: they report failure
//! through [`NULL_TASK`](crate::NULL_TASK) or `false`. [`Error`] is returned
//! by the few genuinely fallible operations (creating a reactor) and is what
//! rejected requests are logged with.

use crate::reactor::Direction;
use crate::task::TaskId;

use std::io;
use std::os::fd::RawFd;
use thiserror::Error;

/// Errors produced by the reactor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// The OS polling primitive could not be created.
    #[error("failed to create poller: {0}")]
    PollerInit(#[source] io::Error),

    /// Waiting on the OS polling primitive failed.
    #[error("failed to wait for readiness: {0}")]
    Wait(#[source] io::Error),

    /// A watch was requested on a negative descriptor.
    #[error("invalid file descriptor {fd}")]
    InvalidDescriptor {
        /// The rejected descriptor.
        fd: RawFd,
    },

    /// The descriptor already carries a watch in that direction.
    #[error("fd {fd} is already watched for {direction:?} by task {existing}")]
    AlreadyWatched {
        /// The descriptor.
        fd: RawFd,
        /// The direction requested twice.
        direction: Direction,
        /// The task holding the existing watch.
        existing: TaskId,
    },

    /// The OS refused to watch the descriptor.
    #[error("failed to register fd {fd} with the poller: {source}")]
    Register {
        /// The descriptor.
        fd: RawFd,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::PollerInit(_) => "poller_init",
            Error::Wait(_) => "poller_wait",
            Error::InvalidDescriptor { .. } => "invalid_descriptor",
            Error::AlreadyWatched { .. } => "already_watched",
            Error::Register { .. } => "register_failed",
        }
    }
}

/// Result alias for reactor operations.
pub type Result<T> = std::result::Result<T, Error>;
