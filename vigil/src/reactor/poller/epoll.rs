//! Linux `epoll`-based poller implementation.
//!
//! Descriptors are registered level-triggered, so a descriptor that stays
//! ready keeps being reported on every wait until its watch goes away.
//! The epoll data word carries the descriptor itself.
//!
//! This backend is selected automatically on Linux targets.

use super::common::{Interest, timeout_millis};
use crate::reactor::event::Event;

use libc::{
    EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLL_CTL_MOD, EPOLLERR, EPOLLHUP, EPOLLIN,
    EPOLLOUT, EPOLLPRI, EPOLLRDHUP, epoll_create1, epoll_ctl, epoll_event, epoll_wait,
};
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Linux `epoll` poller.
///
/// This poller owns the `epoll` instance and a reusable buffer the kernel
/// fills on every wait.
pub(crate) struct EpollPoller {
    /// Epoll file descriptor.
    epoll: RawFd,

    /// Reusable buffer for epoll events.
    events: Vec<epoll_event>,
}

impl EpollPoller {
    /// Creates the epoll instance with room for `capacity` events per wait.
    pub(crate) fn new(capacity: usize) -> io::Result<Self> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            epoll,
            events: Vec::with_capacity(capacity.max(1)),
        })
    }

    /// Register a file descriptor with the poller.
    pub(crate) fn register(&mut self, fd: RawFd, interest: Interest) -> io::Result<()> {
        self.ctl(EPOLL_CTL_ADD, fd, interest)
    }

    /// Update interest flags for an already registered descriptor.
    ///
    /// A descriptor the kernel already forgot about (closed and reopened
    /// under the same number) is registered afresh.
    pub(crate) fn reregister(&mut self, fd: RawFd, interest: Interest) -> io::Result<()> {
        match self.ctl(EPOLL_CTL_MOD, fd, interest) {
            Err(e) if e.raw_os_error() == Some(libc::ENOENT) => self.register(fd, interest),
            other => other,
        }
    }

    /// Remove a file descriptor from the poller.
    ///
    /// Failures are ignored: a descriptor closed by its owner has already
    /// left the epoll set.
    pub(crate) fn deregister(&mut self, fd: RawFd) {
        unsafe {
            epoll_ctl(self.epoll, EPOLL_CTL_DEL, fd, std::ptr::null_mut());
        }
    }

    /// Poll for I/O readiness events.
    ///
    /// Blocks until at least one descriptor becomes ready or the optional
    /// timeout expires. An interrupted wait returns no events.
    pub(crate) fn poll(
        &mut self,
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        events.clear();

        let n = unsafe {
            epoll_wait(
                self.epoll,
                self.events.as_mut_ptr(),
                self.events.capacity().min(i32::MAX as usize) as i32,
                timeout_millis(timeout),
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        unsafe {
            self.events.set_len(n as usize);
        }

        for ev in &self.events {
            let fd = ev.u64 as RawFd;
            let flags = ev.events;

            let readable =
                flags & ((EPOLLIN | EPOLLPRI | EPOLLRDHUP | EPOLLHUP | EPOLLERR) as u32) != 0;
            let writable = flags & ((EPOLLOUT | EPOLLHUP | EPOLLERR) as u32) != 0;

            if let Some(e) = events.iter_mut().find(|e| e.fd == fd) {
                e.readable |= readable;
                e.writable |= writable;
            } else {
                events.push(Event {
                    fd,
                    readable,
                    writable,
                });
            }
        }

        Ok(())
    }

    fn ctl(&mut self, op: libc::c_int, fd: RawFd, interest: Interest) -> io::Result<()> {
        let mut flags = 0;

        if interest.read {
            flags |= EPOLLIN | EPOLLRDHUP;
        }
        if interest.write {
            flags |= EPOLLOUT;
        }

        let mut event = epoll_event {
            events: flags as u32,
            u64: fd as u64,
        };

        let rc = unsafe { epoll_ctl(self.epoll, op, fd, &mut event) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

impl Drop for EpollPoller {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.epoll);
        }
    }
}
