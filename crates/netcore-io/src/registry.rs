use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::error::FdRegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    General,
    Pipe,
    Epoll,
    Event,
    Signal,
    Timer,
    Log,
    Server,
    Connector,
    Client,
    Shm,
    Exit,
    Unknown,
}

#[derive(Debug, Clone)]
struct Slot {
    kind: Kind,
    worker: Option<usize>,
    online: bool,
}

/// Process-wide table mapping a raw descriptor to its registered kind, the
/// worker thread that owns it, and whether it has a bound online-registry
/// entry. Sized at startup to the process's open-file limit so `register`
/// past that point is a hard, fatal condition rather than a silent resize.
pub struct FdRegistry {
    slots: Mutex<Vec<Option<Slot>>>,
    max_fd: AtomicI32,
}

impl FdRegistry {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots: Mutex::new(slots), max_fd: AtomicI32::new(-1) }
    }

    /// Sizes the table to `RLIMIT_NOFILE`, falling back to 4096 if the
    /// syscall fails.
    pub fn from_rlimit() -> Self {
        let cap = rlimit_nofile().unwrap_or(4096);
        Self::new(cap)
    }

    pub fn register(&self, fd: i32, kind: Kind) -> Result<(), FdRegistryError> {
        let mut slots = self.slots.lock().expect("fd registry mutex poisoned");
        let idx = usize::try_from(fd).map_err(|_| FdRegistryError::OutOfRange(fd, slots.len()))?;
        if idx >= slots.len() {
            return Err(FdRegistryError::TableFull(slots.len()));
        }
        slots[idx] = Some(Slot { kind, worker: None, online: false });
        drop(slots);
        self.max_fd.fetch_max(fd, Ordering::SeqCst);
        Ok(())
    }

    pub fn unregister(&self, fd: i32) -> Option<Kind> {
        let mut slots = self.slots.lock().expect("fd registry mutex poisoned");
        let idx = usize::try_from(fd).ok()?;
        let slot = slots.get_mut(idx)?.take()?;
        if fd == self.max_fd.load(Ordering::SeqCst) {
            let new_max =
                slots.iter().rposition(Option::is_some).map_or(-1, |i| i32::try_from(i).unwrap());
            self.max_fd.store(new_max, Ordering::SeqCst);
        }
        Some(slot.kind)
    }

    pub fn lookup(&self, fd: i32) -> Option<Kind> {
        let slots = self.slots.lock().expect("fd registry mutex poisoned");
        let idx = usize::try_from(fd).ok()?;
        slots.get(idx)?.as_ref().map(|s| s.kind)
    }

    pub fn set_worker(&self, fd: i32, worker: usize) {
        let mut slots = self.slots.lock().expect("fd registry mutex poisoned");
        if let Some(Some(slot)) = usize::try_from(fd).ok().and_then(|i| slots.get_mut(i)) {
            slot.worker = Some(worker);
        }
    }

    pub fn get_worker(&self, fd: i32) -> Option<usize> {
        let slots = self.slots.lock().expect("fd registry mutex poisoned");
        slots.get(usize::try_from(fd).ok()?)?.as_ref().and_then(|s| s.worker)
    }

    pub fn set_online(&self, fd: i32, online: bool) {
        let mut slots = self.slots.lock().expect("fd registry mutex poisoned");
        if let Some(Some(slot)) = usize::try_from(fd).ok().and_then(|i| slots.get_mut(i)) {
            slot.online = online;
        }
    }

    pub fn get_online(&self, fd: i32) -> Option<bool> {
        let slots = self.slots.lock().expect("fd registry mutex poisoned");
        slots.get(usize::try_from(fd).ok()?)?.as_ref().map(|s| s.online)
    }

    pub fn max_fd(&self) -> i32 {
        self.max_fd.load(Ordering::SeqCst)
    }

    pub fn capacity(&self) -> usize {
        self.slots.lock().expect("fd registry mutex poisoned").len()
    }
}

#[cfg(target_os = "linux")]
fn rlimit_nofile() -> Option<usize> {
    let mut rlim = libc::rlimit { rlim_cur: 0, rlim_max: 0 };
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
    if rc == 0 { usize::try_from(rlim.rlim_cur).ok() } else { None }
}

#[cfg(not(target_os = "linux"))]
fn rlimit_nofile() -> Option<usize> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup_round_trips() {
        let reg = FdRegistry::new(16);
        reg.register(3, Kind::Client).unwrap();
        assert_eq!(reg.lookup(3), Some(Kind::Client));
        assert_eq!(reg.max_fd(), 3);
    }

    #[test]
    fn unregister_clears_slot_and_recomputes_max() {
        let reg = FdRegistry::new(16);
        reg.register(3, Kind::Client).unwrap();
        reg.register(7, Kind::Server).unwrap();
        assert_eq!(reg.max_fd(), 7);
        assert_eq!(reg.unregister(7), Some(Kind::Server));
        assert_eq!(reg.max_fd(), 3);
        assert_eq!(reg.lookup(7), None);
    }

    #[test]
    fn register_past_capacity_is_table_full() {
        let reg = FdRegistry::new(4);
        let err = reg.register(10, Kind::General).unwrap_err();
        assert!(matches!(err, FdRegistryError::TableFull(4)));
    }

    #[test]
    fn worker_and_online_flags_round_trip() {
        let reg = FdRegistry::new(16);
        reg.register(2, Kind::Client).unwrap();
        reg.set_worker(2, 5);
        reg.set_online(2, true);
        assert_eq!(reg.get_worker(2), Some(5));
        assert_eq!(reg.get_online(2), Some(true));
    }
}
