use std::collections::HashMap;
use std::sync::Mutex;

/// Arbitrary application payload attached to an online entry. The scripting
/// layer is the only thing that ever interprets the bytes; the registry just
/// stores and returns them.
#[derive(Debug, Clone, Default)]
pub struct OnlineData(pub Vec<u8>);

#[derive(Debug, Clone)]
struct Entry {
    bind: Option<i32>,
    data: OnlineData,
}

/// Keyed registry of "online" entities (clients, rooms, whatever the
/// scripting layer chooses to key on), optionally bound to a socket fd.
///
/// A single mutex guards both maps: the critical section is a handful of
/// hash operations, never a syscall, so a blocking lock is simpler than a
/// spinlock here and costs nothing in practice.
#[derive(Default)]
pub struct OnlineRegistry {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    by_key: HashMap<String, Entry>,
    fd_to_key: HashMap<i32, String>,
}

impl OnlineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `key`. If `bind` was already
    /// registered under a different key, that key's `fd_to_key` row is
    /// overwritten so the reverse index stays consistent.
    pub fn put(&self, key: impl Into<String>, bind: Option<i32>, data: OnlineData) {
        let key = key.into();
        let mut inner = self.inner.lock().expect("online registry mutex poisoned");
        if let Some(old) = inner.by_key.get(&key) {
            if old.bind != bind {
                if let Some(old_fd) = old.bind {
                    inner.fd_to_key.remove(&old_fd);
                }
            }
        }
        if let Some(fd) = bind {
            inner.fd_to_key.insert(fd, key.clone());
        }
        inner.by_key.insert(key, Entry { bind, data });
    }

    pub fn get_by_key(&self, key: &str) -> Option<(Option<i32>, OnlineData)> {
        let inner = self.inner.lock().expect("online registry mutex poisoned");
        inner.by_key.get(key).map(|e| (e.bind, e.data.clone()))
    }

    pub fn get_by_fd(&self, fd: i32) -> Option<(String, OnlineData)> {
        let inner = self.inner.lock().expect("online registry mutex poisoned");
        let key = inner.fd_to_key.get(&fd)?.clone();
        let entry = inner.by_key.get(&key)?;
        Some((key, entry.data.clone()))
    }

    /// Removes the entry and its reverse-index row atomically under one lock
    /// acquisition, preserving the bind back-pointer invariant.
    pub fn remove_by_key(&self, key: &str) -> Option<OnlineData> {
        let mut inner = self.inner.lock().expect("online registry mutex poisoned");
        let entry = inner.by_key.remove(key)?;
        if let Some(fd) = entry.bind {
            inner.fd_to_key.remove(&fd);
        }
        Some(entry.data)
    }

    pub fn remove_by_fd(&self, fd: i32) -> Option<(String, OnlineData)> {
        let mut inner = self.inner.lock().expect("online registry mutex poisoned");
        let key = inner.fd_to_key.remove(&fd)?;
        let entry = inner.by_key.remove(&key)?;
        Some((key, entry.data))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("online registry mutex poisoned").by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_lookup_round_trips_both_directions() {
        let reg = OnlineRegistry::new();
        reg.put("alice", Some(7), OnlineData(b"hi".to_vec()));

        let (bind, data) = reg.get_by_key("alice").unwrap();
        assert_eq!(bind, Some(7));
        assert_eq!(data.0, b"hi");

        let (key, data) = reg.get_by_fd(7).unwrap();
        assert_eq!(key, "alice");
        assert_eq!(data.0, b"hi");
    }

    #[test]
    fn remove_by_fd_clears_both_indices() {
        let reg = OnlineRegistry::new();
        reg.put("bob", Some(3), OnlineData::default());
        assert!(reg.remove_by_fd(3).is_some());
        assert!(reg.get_by_key("bob").is_none());
        assert!(reg.get_by_fd(3).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_by_key_clears_reverse_index() {
        let reg = OnlineRegistry::new();
        reg.put("carol", Some(9), OnlineData::default());
        assert!(reg.remove_by_key("carol").is_some());
        assert!(reg.get_by_fd(9).is_none());
    }

    #[test]
    fn rebinding_a_key_to_a_new_fd_drops_the_old_reverse_entry() {
        let reg = OnlineRegistry::new();
        reg.put("dan", Some(1), OnlineData::default());
        reg.put("dan", Some(2), OnlineData::default());
        assert!(reg.get_by_fd(1).is_none());
        let (key, _) = reg.get_by_fd(2).unwrap();
        assert_eq!(key, "dan");
    }
}
