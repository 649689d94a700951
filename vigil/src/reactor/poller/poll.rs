//! Portable `poll(2)`-based poller implementation.
//!
//! Used on unix targets without epoll. Registration is bookkeeping only:
//! the interest set is rebuilt into a `pollfd` array on every wait.

use super::common::{Interest, timeout_millis};
use crate::reactor::event::Event;

use libc::{POLLERR, POLLHUP, POLLIN, POLLNVAL, POLLOUT, POLLPRI, nfds_t, pollfd};
use std::collections::HashMap;
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// `poll(2)` poller.
pub(crate) struct PollPoller {
    /// Registered descriptors and their interests.
    reg: HashMap<RawFd, Interest>,

    /// Reusable `pollfd` buffer.
    fds: Vec<pollfd>,
}

impl PollPoller {
    pub(crate) fn new(capacity: usize) -> io::Result<Self> {
        Ok(Self {
            reg: HashMap::with_capacity(capacity),
            fds: Vec::with_capacity(capacity),
        })
    }

    pub(crate) fn register(&mut self, fd: RawFd, interest: Interest) -> io::Result<()> {
        self.reg.insert(fd, interest);
        Ok(())
    }

    pub(crate) fn reregister(&mut self, fd: RawFd, interest: Interest) -> io::Result<()> {
        self.reg.insert(fd, interest);
        Ok(())
    }

    pub(crate) fn deregister(&mut self, fd: RawFd) {
        self.reg.remove(&fd);
    }

    /// Poll for I/O readiness events.
    ///
    /// Blocks until at least one registered descriptor becomes ready or the
    /// optional timeout expires. With nothing registered this simply
    /// sleeps for the timeout. An interrupted wait returns no events.
    pub(crate) fn poll(
        &mut self,
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        events.clear();
        self.fds.clear();

        for (&fd, &interest) in self.reg.iter() {
            let mut ev = 0;
            if interest.read {
                ev |= POLLIN;
            }
            if interest.write {
                ev |= POLLOUT;
            }

            self.fds.push(pollfd {
                fd,
                events: ev,
                revents: 0,
            });
        }

        let rc = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as nfds_t,
                timeout_millis(timeout),
            )
        };

        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        for pfd in &self.fds {
            let re = pfd.revents;
            if re == 0 {
                continue;
            }

            events.push(Event {
                fd: pfd.fd,
                readable: re & (POLLIN | POLLPRI | POLLHUP | POLLERR | POLLNVAL) != 0,
                writable: re & (POLLOUT | POLLHUP | POLLERR | POLLNVAL) != 0,
            });
        }

        Ok(())
    }
}
