//! Concurrent map whose values are constructed at most once per key.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

/// A map of lazily initialised slots.
///
/// Each key owns an `Arc<OnceCell<V>>`. The shard lock is held only while the
/// slot is looked up or inserted; initialisation awaits the slot's own cell,
/// so a slow constructor for one key never delays lookups of another.
///
/// A constructor that fails leaves nothing behind once the last caller waiting
/// on that slot has given up, so unknown keys do not accumulate. A slot whose
/// construction is still running is reported by [`OnceMap::drain`] as `None`.
pub struct OnceMap<K, V> {
    slots: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Returns the value for `key` if it has been constructed.
    pub fn get(&self, key: &K) -> Option<V> {
        self.slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Returns the value for `key`, running `init` if no value exists yet.
    ///
    /// Concurrent callers for the same key wait for the first one; only one
    /// `init` runs at a time per key and a successful result is shared by all
    /// of them.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `init`. The slot is removed unless
    /// another caller is still waiting on it.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let slot = self.slots.entry(key.clone()).or_default().value().clone();
        let result = slot.get_or_try_init(init).await.cloned();
        if result.is_err() {
            // Slot handles are only cloned under the shard lock, so a count of
            // two (the map and `slot`) means no one else can still pick it up.
            self.slots.remove_if(&key, |_, current| {
                Arc::ptr_eq(current, &slot)
                    && !current.initialized()
                    && Arc::strong_count(current) == 2
            });
        }
        result
    }

    /// Number of constructed values.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots, including ones whose construction is still running.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Removes every slot, yielding each key with its value if constructed.
    pub fn drain(&self) -> Vec<(K, Option<V>)> {
        let keys: Vec<K> = self.slots.iter().map(|slot| slot.key().clone()).collect();
        keys.into_iter()
            .filter_map(|key| self.slots.remove(&key))
            .map(|(key, slot)| {
                let value = slot.get().cloned();
                (key, value)
            })
            .collect()
    }
}

impl<K, V> Default for OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for OnceMap<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnceMap")
            .field("slots", &self.slots.len())
            .finish()
    }
}
