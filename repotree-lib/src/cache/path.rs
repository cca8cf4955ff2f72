//! Path-keyed load cache with in-flight markers

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::future::Shared;
use futures::FutureExt;

use super::LoadState;

/// Completion signal of an in-flight load. Resolves once the load settles,
/// whatever the outcome.
pub type InFlight = Shared<BoxFuture<'static, ()>>;

enum Slot<T> {
    Loading { claim: u64, done: InFlight },
    Loaded(Arc<T>),
    Failed,
}

/// Outcome of [`PathCache::begin`].
pub enum Begin<T> {
    /// The value was already loaded.
    Cached(Arc<T>),
    /// Someone else's load is in flight for this path.
    Joined(InFlight),
    /// This call claimed the path and must run the load.
    Started { claim: Claim<T>, done: InFlight },
}

/// A cache of values keyed by tree path, loaded at most once per path.
///
/// The in-flight marker is claimed atomically in [`begin`](Self::begin), so
/// two callers racing for the same path on different threads still produce a
/// single load. Values are never evicted; [`clear`](Self::clear) discards
/// everything at once.
///
/// # Example
///
/// ```ignore
/// let cache = Arc::new(PathCache::new());
///
/// match cache.begin("src") {
///     Begin::Cached(children) => render(&children),
///     Begin::Joined(done) => done.await,
///     Begin::Started { claim, done } => {
///         tokio::spawn(load(claim));
///         done.await;
///     }
/// }
/// ```
pub struct PathCache<T> {
    slots: DashMap<String, Slot<T>>,
    next_claim: AtomicU64,
}

impl<T> Default for PathCache<T> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
            next_claim: AtomicU64::new(0),
        }
    }
}

impl<T> PathCache<T> {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the loaded value for `path`, if any.
    pub fn get(&self, path: &str) -> Option<Arc<T>> {
        match self.slots.get(path)?.value() {
            Slot::Loaded(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the load state of `path`.
    pub fn state(&self, path: &str) -> LoadState {
        match self.slots.get(path).as_deref() {
            None => LoadState::Unloaded,
            Some(Slot::Loading { .. }) => LoadState::Loading,
            Some(Slot::Loaded(_)) => LoadState::Loaded,
            Some(Slot::Failed) => LoadState::Failed,
        }
    }

    /// Returns `true` while a load for `path` is outstanding.
    pub fn is_loading(&self, path: &str) -> bool {
        self.state(path).is_loading()
    }

    /// Returns every path with an outstanding load, in no particular order.
    pub fn loading_paths(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Loading { .. }))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of loaded values.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Loaded(_)))
            .count()
    }

    /// Returns `true` if nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards every value and marker. Outstanding claims become stale.
    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Returns the cached value, joins the in-flight load, or claims `path`.
    ///
    /// The entry lock is released before this returns, so the claim can be
    /// settled or dropped anywhere, including on the calling thread.
    pub fn begin(self: &Arc<Self>, path: &str) -> Begin<T> {
        let (id, done, signal) = match self.slots.entry(path.to_string()) {
            Entry::Occupied(mut entry) => {
                match entry.get() {
                    Slot::Loaded(value) => return Begin::Cached(value.clone()),
                    Slot::Loading { done, .. } => return Begin::Joined(done.clone()),
                    Slot::Failed => {}
                }
                let (id, done, signal) = self.marker();
                entry.insert(Slot::Loading {
                    claim: id,
                    done: done.clone(),
                });
                (id, done, signal)
            }
            Entry::Vacant(entry) => {
                let (id, done, signal) = self.marker();
                entry.insert(Slot::Loading {
                    claim: id,
                    done: done.clone(),
                });
                (id, done, signal)
            }
        };
        Begin::Started {
            claim: self.claim(path, id, signal),
            done,
        }
    }

    /// Claims `path` unconditionally, superseding whatever is stored there.
    ///
    /// The path reads as `Loading` until the new claim settles, and any
    /// earlier claim on it becomes stale.
    pub fn restart(self: &Arc<Self>, path: &str) -> Claim<T> {
        let (id, done, signal) = self.marker();
        self.slots
            .insert(path.to_string(), Slot::Loading { claim: id, done });
        self.claim(path, id, signal)
    }

    fn marker(&self) -> (u64, InFlight, oneshot::Sender<()>) {
        let id = self.next_claim.fetch_add(1, Ordering::Relaxed);
        let (signal, settled) = oneshot::channel();
        (id, settled.map(|_| ()).boxed().shared(), signal)
    }

    fn claim(self: &Arc<Self>, path: &str, id: u64, signal: oneshot::Sender<()>) -> Claim<T> {
        Claim {
            cache: Arc::downgrade(self),
            path: path.to_string(),
            id,
            _signal: signal,
        }
    }
}

/// Exclusive right to settle one load of one path.
///
/// Settling is a no-op once the claim is stale: the cache was cleared or
/// dropped, or the path was claimed again by [`PathCache::restart`].
/// Dropping an unsettled claim releases the path back to `Unloaded`, so an
/// abandoned load never leaves a loading marker behind. Joiners wake when
/// the claim is gone.
pub struct Claim<T> {
    cache: Weak<PathCache<T>>,
    path: String,
    id: u64,
    _signal: oneshot::Sender<()>,
}

impl<T> Claim<T> {
    /// The claimed path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Stores the loaded value. Returns `false` if the claim was stale.
    pub fn complete(self, value: T) -> bool {
        self.store(Arc::new(value))
    }

    /// Stores an already shared value. Returns `false` if the claim was stale.
    pub fn store(self, value: Arc<T>) -> bool {
        self.settle(Some(Slot::Loaded(value)))
    }

    /// Marks the path as failed. Returns `false` if the claim was stale.
    pub fn fail(self) -> bool {
        self.settle(Some(Slot::Failed))
    }

    /// Returns the path to `Unloaded` without recording anything.
    pub fn release(self) -> bool {
        self.settle(None)
    }

    fn settle(&self, next: Option<Slot<T>>) -> bool {
        let Some(cache) = self.cache.upgrade() else {
            return false;
        };
        let Entry::Occupied(mut entry) = cache.slots.entry(self.path.clone()) else {
            return false;
        };
        let current = matches!(entry.get(), Slot::Loading { claim, .. } if *claim == self.id);
        if !current {
            return false;
        }
        match next {
            Some(slot) => {
                entry.insert(slot);
            }
            None => {
                entry.remove();
            }
        }
        true
    }
}

impl<T> Drop for Claim<T> {
    fn drop(&mut self) {
        self.settle(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Claims `path`, panicking if it was cached or already in flight.
    fn start<T>(cache: &Arc<PathCache<T>>, path: &str) -> (Claim<T>, InFlight) {
        match cache.begin(path) {
            Begin::Started { claim, done } => (claim, done),
            _ => panic!("'{path}' was not claimed"),
        }
    }

    #[test]
    fn test_second_begin_joins() {
        let cache = Arc::new(PathCache::<u32>::new());
        let (_claim, _) = start(&cache, "src");
        assert!(cache.is_loading("src"));

        assert!(matches!(cache.begin("src"), Begin::Joined(_)));
        assert_eq!(cache.loading_paths(), ["src"]);
    }

    #[test]
    fn test_complete_then_cached() {
        let cache = Arc::new(PathCache::<u32>::new());
        let (claim, done) = start(&cache, "src");

        assert!(done.clone().now_or_never().is_none());
        assert!(claim.complete(7));
        assert_eq!(done.now_or_never(), Some(()));

        assert_eq!(cache.state("src"), LoadState::Loaded);
        assert_eq!(cache.get("src").as_deref(), Some(&7));
        assert!(matches!(cache.begin("src"), Begin::Cached(v) if *v == 7));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_path_can_be_claimed_again() {
        let cache = Arc::new(PathCache::<u32>::new());
        let (claim, _) = start(&cache, "src");

        assert!(claim.fail());
        assert_eq!(cache.state("src"), LoadState::Failed);
        assert!(cache.get("src").is_none());
        assert!(cache.is_empty());

        assert!(matches!(cache.begin("src"), Begin::Started { .. }));
    }

    #[test]
    fn test_dropped_claim_releases_marker() {
        let cache = Arc::new(PathCache::<u32>::new());
        let (claim, done) = start(&cache, "src");

        drop(claim);
        assert_eq!(cache.state("src"), LoadState::Unloaded);
        assert!(cache.loading_paths().is_empty());
        assert_eq!(done.now_or_never(), Some(()));
    }

    #[test]
    fn test_claim_dropped_on_the_claiming_thread() {
        let cache = Arc::new(PathCache::<u32>::new());

        // Dropping straight away touches the same entry `begin` just locked.
        if let Begin::Started { claim, .. } = cache.begin("src") {
            drop(claim);
        }

        assert_eq!(cache.state("src"), LoadState::Unloaded);
        assert!(matches!(cache.begin("src"), Begin::Started { .. }));
    }

    #[test]
    fn test_stale_claim_after_clear_writes_nothing() {
        let cache = Arc::new(PathCache::<u32>::new());
        let (claim, _) = start(&cache, "src");

        cache.clear();
        assert!(!claim.complete(1));
        assert_eq!(cache.state("src"), LoadState::Unloaded);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_restart_supersedes_in_flight_load() {
        let cache = Arc::new(PathCache::<u32>::new());
        let (first, _) = start(&cache, "");

        let second = cache.restart("");
        assert!(!first.complete(1));
        assert!(cache.is_loading(""));

        assert!(second.store(Arc::new(2)));
        assert_eq!(cache.get("").as_deref(), Some(&2));
    }

    #[test]
    fn test_restart_over_loaded_value() {
        let cache = Arc::new(PathCache::<u32>::new());
        let (claim, _) = start(&cache, "");
        claim.complete(1);

        let again = cache.restart("");
        assert_eq!(cache.state(""), LoadState::Loading);
        assert!(again.fail());
        assert_eq!(cache.state(""), LoadState::Failed);
    }

    #[test]
    fn test_claim_outliving_cache() {
        let cache = Arc::new(PathCache::<u32>::new());
        let (claim, _) = start(&cache, "src");

        drop(cache);
        assert!(!claim.complete(1));
    }
}
