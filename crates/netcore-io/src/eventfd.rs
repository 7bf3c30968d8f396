use std::io;
use std::os::fd::RawFd;

/// Linux `eventfd(2)` wrapper used as the worker's wakeup and exit
/// notification channel. Registered in `mio::Poll` via `SourceFd`.
pub struct EventFd {
    fd: RawFd,
}

impl EventFd {
    pub fn new() -> io::Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { fd })
    }

    pub fn raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Adds `1` to the counter, waking anything blocked in `epoll_wait` on
    /// this fd.
    pub fn notify(&self) -> io::Result<()> {
        let buf: u64 = 1;
        let rc = unsafe {
            libc::write(self.fd, std::ptr::addr_of!(buf).cast(), std::mem::size_of::<u64>())
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock {
                return Ok(());
            }
            return Err(err);
        }
        Ok(())
    }

    /// Drains the counter. Returns the accumulated count, or `0` if nothing
    /// was pending (the fd is non-blocking).
    pub fn drain(&self) -> io::Result<u64> {
        let mut buf: u64 = 0;
        let rc = unsafe {
            libc::read(self.fd, std::ptr::addr_of_mut!(buf).cast(), std::mem::size_of::<u64>())
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock {
                return Ok(0);
            }
            return Err(err);
        }
        Ok(buf)
    }
}

impl Drop for EventFd {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_then_drain_sees_the_count() {
        let efd = EventFd::new().unwrap();
        efd.notify().unwrap();
        efd.notify().unwrap();
        assert_eq!(efd.drain().unwrap(), 2);
        assert_eq!(efd.drain().unwrap(), 0);
    }
}
