//! Interceptors wrapped around tagged methods.
//!
//! `#[cached]` methods store one [`MemoCache`] per instance, keyed by the
//! argument tuple. `#[logged]` methods run through [`logged`].

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, trace};

/// Per-instance memo table for one cached method.
///
/// Each argument tuple owns a `OnceCell` slot. The map lock is held only
/// long enough to find or insert the slot, so distinct keys compute in
/// parallel while concurrent callers with the same key block on the slot and
/// observe a single computation.
///
/// The cache is invisible to the instance's identity: it compares equal to
/// every other cache, hashes to nothing and clones empty.
///
/// ## Examples
///
/// ```
/// use stencil_runtime::MemoCache;
///
/// let cache: MemoCache<(u64,), u64> = MemoCache::default();
/// let mut calls = 0;
/// assert_eq!(cache.get_or_compute((2,), || { calls += 1; 4 }), 4);
/// assert_eq!(cache.get_or_compute((2,), || { calls += 1; 5 }), 4);
/// assert_eq!(calls, 1);
/// ```
pub struct MemoCache<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, computing it at most once.
    pub fn get_or_compute<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key).or_default())
        };
        slot.get_or_init(compute).clone()
    }

    /// Number of argument tuples seen so far.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for MemoCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("entries", &self.slots.lock().len())
            .finish()
    }
}

impl<K, V> PartialEq for MemoCache<K, V> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<K, V> Eq for MemoCache<K, V> {}

impl<K, V> PartialOrd for MemoCache<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K, V> Ord for MemoCache<K, V> {
    fn cmp(&self, _other: &Self) -> std::cmp::Ordering {
        std::cmp::Ordering::Equal
    }
}

impl<K, V> Hash for MemoCache<K, V> {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

/// Runs `call` inside a `type_name::method` trace span.
pub fn logged<R>(type_name: &'static str, method: &'static str, call: impl FnOnce() -> R) -> R {
    let span = tracing::debug_span!("intercept", type_name, method);
    let _guard = span.enter();
    trace!("entering {}::{}", type_name, method);
    let started = Instant::now();
    let result = call();
    debug!(
        elapsed_us = started.elapsed().as_micros() as u64,
        "{}::{} returned", type_name, method
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;
    use tracing_test::traced_test;

    #[test]
    fn distinct_keys_compute_separately() {
        let cache: MemoCache<(u64, String), usize> = MemoCache::new();
        assert_eq!(cache.get_or_compute((1, "a".to_string()), || 1), 1);
        assert_eq!(cache.get_or_compute((1, "b".to_string()), || 2), 2);
        assert_eq!(cache.get_or_compute((1, "a".to_string()), || 3), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_callers_compute_at_most_once_per_key() {
        let cache: Arc<MemoCache<(u64,), u64>> = Arc::new(MemoCache::new());
        let computations = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let computations = Arc::clone(&computations);
                thread::spawn(move || {
                    cache.get_or_compute((42,), || {
                        computations.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        7
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 7);
        }
        assert_eq!(computations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_start_empty_and_compare_equal() {
        let cache: MemoCache<(u8,), u8> = MemoCache::new();
        cache.get_or_compute((1,), || 1);
        let copy = cache.clone();
        assert!(copy.is_empty());
        assert_eq!(cache, copy);
    }

    #[test]
    #[traced_test]
    fn logged_returns_the_inner_result_and_traces_it() {
        let value = logged("Dice", "describe", || "six".to_string());
        assert_eq!(value, "six");
        assert!(logs_contain("Dice::describe returned"));
    }
}
