use std::os::fd::RawFd;

/// Readiness reported by the poller for one descriptor.
///
/// Produced by the poller and matched by the reactor against the
/// registered watches. A single event may report both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Event {
    /// The descriptor the readiness applies to.
    pub(crate) fd: RawFd,

    /// A read would not block. End-of-stream and errors count as readable.
    pub(crate) readable: bool,

    /// A write would not block. Hang-ups and errors count as writable.
    pub(crate) writable: bool,
}
