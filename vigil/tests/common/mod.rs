#![allow(dead_code)]

use std::io;
use std::os::fd::RawFd;

/// A unidirectional pipe closed on drop.
pub struct ScopedPipe {
    pub reader: RawFd,
    pub writer: RawFd,
}

impl ScopedPipe {
    pub fn new() -> Self {
        let mut fds: [RawFd; 2] = [-1; 2];
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(rc, 0, "pipe: {}", io::Error::last_os_error());

        Self {
            reader: fds[0],
            writer: fds[1],
        }
    }

    /// Writes `bytes` to the writer end.
    pub fn write(&self, bytes: &[u8]) {
        write_fd(self.writer, bytes);
    }

    pub fn close_writer(&mut self) {
        close_fd(&mut self.writer);
    }
}

impl Drop for ScopedPipe {
    fn drop(&mut self) {
        close_fd(&mut self.reader);
        close_fd(&mut self.writer);
    }
}

pub fn write_fd(fd: RawFd, bytes: &[u8]) {
    let n = unsafe { libc::write(fd, bytes.as_ptr() as *const _, bytes.len()) };
    assert_eq!(n, bytes.len() as isize, "write: {}", io::Error::last_os_error());
}

fn close_fd(fd: &mut RawFd) {
    if *fd != -1 {
        unsafe { libc::close(*fd) };
        *fd = -1;
    }
}
