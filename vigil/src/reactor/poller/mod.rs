//! Platform-specific I/O poller abstraction.
//!
//! The reactor only needs three things from the OS: register a descriptor
//! for readiness in some directions, wait up to a timeout for ready
//! descriptors, and deregister a descriptor. Each backend provides exactly
//! that with the same method set:
//!
//! - `register(fd, interest)` / `reregister(fd, interest)` / `deregister(fd)`
//! - `poll(&mut events, timeout)`
//!
//! The concrete implementation is selected at compile time depending on
//! the target operating system.

pub(crate) mod common;

#[cfg(target_os = "linux")]
mod epoll;

#[cfg(all(unix, not(target_os = "linux")))]
mod poll;

#[cfg(target_os = "linux")]
pub(crate) type Poller = epoll::EpollPoller;

#[cfg(all(unix, not(target_os = "linux")))]
pub(crate) type Poller = poll::PollPoller;
