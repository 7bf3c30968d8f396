use std::io;
use std::os::fd::RawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mio::unix::SourceFd;
use mio::{Interest, Poll, Registry, Token};

use crate::eventfd::EventFd;

/// Reserved tokens every worker registers for itself before any socket fd is
/// added to its readiness set.
pub const NOTIFY_TOKEN: Token = Token(usize::MAX);
pub const EXIT_TOKEN: Token = Token(usize::MAX - 1);

/// One readiness loop. Each worker owns its own `mio::Poll` instance; a fd
/// is registered with exactly one worker for its lifetime (dispatch decides
/// which, up front, and never migrates a live fd between workers).
pub struct Worker {
    pub id: usize,
    poll: Poll,
    notify: EventFd,
    exit: EventFd,
    registered: Arc<AtomicUsize>,
}

impl Worker {
    pub fn new(id: usize) -> io::Result<Self> {
        let poll = Poll::new()?;
        let notify = EventFd::new()?;
        let exit = EventFd::new()?;
        poll.registry().register(
            &mut SourceFd(&notify.raw_fd()),
            NOTIFY_TOKEN,
            Interest::READABLE,
        )?;
        poll.registry().register(&mut SourceFd(&exit.raw_fd()), EXIT_TOKEN, Interest::READABLE)?;
        Ok(Self { id, poll, notify, exit, registered: Arc::new(AtomicUsize::new(0)) })
    }

    /// A cheap, `Send + Sync` handle another thread (typically the acceptor)
    /// can use to register fds onto this worker's readiness set and wake it,
    /// without needing `&mut` access to the `Worker` itself. Backed by
    /// `mio`'s documented support for registering from any thread while the
    /// owning thread is blocked in `poll`.
    pub fn handle(&self) -> io::Result<WorkerHandle> {
        Ok(WorkerHandle {
            id: self.id,
            registry: self.poll.registry().try_clone()?,
            notify_fd: self.notify.raw_fd(),
            registered: Arc::clone(&self.registered),
        })
    }

    pub fn register_fd(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        self.poll.registry().register(&mut SourceFd(&fd), token, interest)?;
        self.registered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn reregister_fd(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        self.poll.registry().reregister(&mut SourceFd(&fd), token, interest)
    }

    pub fn deregister_fd(&self, fd: RawFd) -> io::Result<()> {
        self.poll.registry().deregister(&mut SourceFd(&fd))?;
        self.registered.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn poll(
        &mut self,
        events: &mut mio::Events,
        timeout: Option<std::time::Duration>,
    ) -> io::Result<()> {
        self.poll.poll(events, timeout)
    }

    pub fn notify(&self) -> io::Result<()> {
        self.notify.notify()
    }

    pub fn drain_notify(&self) -> io::Result<u64> {
        self.notify.drain()
    }

    pub fn request_exit(&self) -> io::Result<()> {
        self.exit.notify()
    }

    pub fn drain_exit(&self) -> io::Result<u64> {
        self.exit.drain()
    }

    /// Number of fds currently registered on this worker, used by the
    /// accept-time least-loaded dispatch decision.
    pub fn load(&self) -> usize {
        self.registered.load(Ordering::Relaxed)
    }
}

/// Picks the index of the worker with the fewest registered fds, breaking
/// ties by lowest id (i.e. lowest index, since workers are id-ordered).
pub fn least_loaded(workers: &[Worker]) -> usize {
    workers
        .iter()
        .enumerate()
        .min_by_key(|(_, w)| w.load())
        .map(|(i, _)| i)
        .expect("worker pool must not be empty")
}

/// Remote-dispatch handle for a `Worker` living on another thread.
pub struct WorkerHandle {
    pub id: usize,
    registry: Registry,
    notify_fd: RawFd,
    registered: Arc<AtomicUsize>,
}

impl WorkerHandle {
    pub fn register_fd(&self, fd: RawFd, token: Token, interest: Interest) -> io::Result<()> {
        self.registry.register(&mut SourceFd(&fd), token, interest)?;
        self.registered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn deregister_fd(&self, fd: RawFd) -> io::Result<()> {
        self.registry.deregister(&mut SourceFd(&fd))?;
        self.registered.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn load(&self) -> usize {
        self.registered.load(Ordering::Relaxed)
    }

    /// Wakes the owning worker's `epoll_wait` without registering anything.
    pub fn notify(&self) -> io::Result<()> {
        let buf: u64 = 1;
        let rc = unsafe {
            libc::write(self.notify_fd, std::ptr::addr_of!(buf).cast(), std::mem::size_of::<u64>())
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
}

/// Picks the least-loaded handle out of a slice, breaking ties by lowest id.
pub fn least_loaded_handle(handles: &[WorkerHandle]) -> usize {
    handles
        .iter()
        .enumerate()
        .min_by_key(|(_, h)| h.load())
        .map(|(i, _)| i)
        .expect("worker pool must not be empty")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_loaded_picks_the_lowest_id_on_a_tie() {
        let workers = vec![Worker::new(0).unwrap(), Worker::new(1).unwrap()];
        assert_eq!(least_loaded(&workers), 0);
    }

    #[test]
    fn reregister_fd_toggles_interest_without_changing_load() {
        let w = Worker::new(0).unwrap();
        let (r, _w2) = std::os::unix::net::UnixStream::pair().unwrap();
        use std::os::fd::AsRawFd;
        let fd = r.as_raw_fd();
        w.register_fd(fd, Token(5), Interest::READABLE).unwrap();
        assert_eq!(w.load(), 1);
        w.reregister_fd(fd, Token(5), Interest::READABLE | Interest::WRITABLE).unwrap();
        assert_eq!(w.load(), 1);
        w.reregister_fd(fd, Token(5), Interest::READABLE).unwrap();
        assert_eq!(w.load(), 1);
    }

    #[test]
    fn load_tracks_register_and_deregister() {
        let w = Worker::new(0).unwrap();
        assert_eq!(w.load(), 0);
        // token/fd values below are throwaway; only registry bookkeeping is tested here
        let (r, _w2) = std::os::unix::net::UnixStream::pair().unwrap();
        use std::os::fd::AsRawFd;
        let fd = r.as_raw_fd();
        w.register_fd(fd, Token(5), Interest::READABLE).unwrap();
        assert_eq!(w.load(), 1);
        w.deregister_fd(fd).unwrap();
        assert_eq!(w.load(), 0);
    }
}
