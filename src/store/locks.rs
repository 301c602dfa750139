use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Per-key mutual exclusion for writers of the same resource.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

fn recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut map = recover(&self.locks);
            Arc::clone(map.entry(key.to_string()).or_default())
        };
        let result = {
            let _guard = recover(&lock);
            f()
        };
        // Drop the entry once nobody else holds a handle to it.
        let mut map = recover(&self.locks);
        drop(lock);
        if map.get(key).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            map.remove(key);
        }
        result
    }

    pub fn held_keys(&self) -> usize {
        recover(&self.locks).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    for _ in 0..50 {
                        locks.with_lock("monsters/goblin", || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            thread::yield_now();
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread panicked");
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.held_keys(), 0);
    }

    #[test]
    fn contended_keys_are_released() {
        let locks = Arc::new(KeyedLocks::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let locks = Arc::clone(&locks);
                thread::spawn(move || {
                    for j in 0..200 {
                        let key = format!("templates/trait/t{}", (i + j) % 3);
                        locks.with_lock(&key, thread::yield_now);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread panicked");
        }
        assert_eq!(locks.held_keys(), 0);
    }

    #[test]
    fn returns_the_closure_result() {
        let locks = KeyedLocks::new();
        assert_eq!(locks.with_lock("a", || 41 + 1), 42);
    }
}
