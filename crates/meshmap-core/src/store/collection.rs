// ── Generic reactive entity collection ──
//
// Concurrent keyed storage with push-based change notification via
// `watch` channels. Each mutation publishes exactly one new snapshot.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

/// A concurrent, reactive collection for a single entity type.
///
/// Uses `DashMap` for O(1) lookups and `watch` channels for push-based
/// change notification. Every mutation bumps a version counter and
/// rebuilds the snapshot subscribers receive, sorted by key so that
/// consumers iterate in a stable order.
pub(crate) struct EntityCollection<K, T>
where
    K: Eq + Hash + Ord + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    by_key: DashMap<K, Arc<T>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<K, T> EntityCollection<K, T>
where
    K: Eq + Hash + Ord + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or replace an entity. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: K, entity: T) -> bool {
        let is_new = self.by_key.insert(key, Arc::new(entity)).is_none();
        self.publish();
        is_new
    }

    /// Read-modify-write under the key's shard lock.
    ///
    /// `init` builds the entity when the key is absent; `update` then runs
    /// against it. Concurrent writers to the same key serialize here.
    pub(crate) fn modify(&self, key: K, init: impl FnOnce() -> T, update: impl FnOnce(&mut T))
    where
        T: Clone,
    {
        match self.by_key.entry(key) {
            Entry::Occupied(mut occupied) => {
                let mut entity = (**occupied.get()).clone();
                update(&mut entity);
                occupied.insert(Arc::new(entity));
            }
            Entry::Vacant(vacant) => {
                let mut entity = init();
                update(&mut entity);
                vacant.insert(Arc::new(entity));
            }
        }
        self.publish();
    }

    pub(crate) fn get(&self, key: &K) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn publish(&self) {
        self.rebuild_snapshot();
        self.bump_version();
    }

    /// Collect all values into a key-ordered snapshot and broadcast it.
    ///
    /// The map is read while the watch lock is held, so the last rebuild
    /// to publish always includes every write that finished before it.
    fn rebuild_snapshot(&self) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| {
            let mut entries: Vec<(K, Arc<T>)> = self
                .by_key
                .iter()
                .map(|r| (r.key().clone(), Arc::clone(r.value())))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            *snap = Arc::new(entries.into_iter().map(|(_, v)| v).collect());
        });
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
